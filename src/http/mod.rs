//! HTTP protocol layer module
//!
//! Response builders shared by the router, the participant handlers and both transports.

pub mod response;

// Re-export commonly used types
pub use response::{
    build_404_response, build_405_response, build_413_response, build_error_response,
    build_json_response, build_options_response, build_text_response, join_methods,
    APPLICATION_JSON, TEXT_PLAIN,
};
