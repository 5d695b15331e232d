//! hooked: a participant registry served over HTTP or from AWS Lambda
//!
//! The [`routing`] module holds the request router; [`handler::build_router`] wires
//! the participant API onto it, and [`server`] / [`lambda`] are the two transports.

pub mod config;
pub mod handler;
pub mod http;
pub mod lambda;
pub mod logger;
pub mod participant;
pub mod repository;
pub mod routing;
pub mod server;
