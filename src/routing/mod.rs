//! Routing module
//!
//! Segment-based request routing:
//! - Pattern parsing and path matching with named captures
//! - A route table keyed by pattern, each entry holding a method map
//! - The dispatcher with 404/405 fallbacks
//! - Path parameters carried in the request extensions

mod error;
mod handler;
mod matcher;
mod params;
mod router;
mod table;

pub use error::RouteError;
pub use handler::{BoxedHandler, Handler, HandlerFuture};
pub use matcher::{match_path, split_path, Pattern, Segment};
pub use params::{param, params, request_path, with_param, with_request_path, Params};
pub use router::{Router, RouterBuilder};
pub use table::{Resolution, RouteTable};
