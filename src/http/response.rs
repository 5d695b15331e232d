//! HTTP response building module
//!
//! Provides builders for the status responses shared by the router and the handlers.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Response, StatusCode};
use serde::Serialize;

pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
pub const APPLICATION_JSON: &str = "application/json";

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", TEXT_PLAIN)
        .body(Full::new(Bytes::from("404 Not Found")))
        .unwrap_or_else(|e| {
            log_build_error("404", &e);
            Response::new(Full::new(Bytes::from("404 Not Found")))
        })
}

/// Build 405 Method Not Allowed response listing `allowed` in the `Allow` header
pub fn build_405_response(allowed: &[Method]) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header("Content-Type", TEXT_PLAIN)
        .header("Allow", join_methods(allowed))
        .body(Full::new(Bytes::from("Method Not Allowed")))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(Full::new(Bytes::from("Method Not Allowed")))
        })
}

/// Build 413 Payload Too Large response
pub fn build_413_response(max_body_size: u64) -> Response<Full<Bytes>> {
    build_error_response(
        StatusCode::PAYLOAD_TOO_LARGE,
        &format!("Request payload too large. Max {max_body_size} bytes."),
    )
}

/// Build a plain-text error response; the message is followed by a newline
pub fn build_error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", TEXT_PLAIN)
        .header("X-Content-Type-Options", "nosniff")
        .body(Full::new(Bytes::from(format!("{message}\n"))))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 200 plain-text response
pub fn build_text_response(body: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", TEXT_PLAIN)
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 200 JSON response; the document is followed by a newline
///
/// Falls back to a 500 plain-text response if `body` cannot be serialized.
pub fn build_json_response<T: Serialize + ?Sized>(body: &T) -> Response<Full<Bytes>> {
    let mut json = match serde_json::to_vec(body) {
        Ok(j) => j,
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response: {e}"));
            return build_error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error marshalling response",
            );
        }
    };
    json.push(b'\n');

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", APPLICATION_JSON)
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build CORS preflight response advertising `allowed`
pub fn build_options_response(allowed: &[Method]) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Access-Control-Allow-Methods", join_methods(allowed))
        .header("Access-Control-Allow-Headers", "Content-Type")
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Join methods as `"POST, PUT, DELETE"`
pub fn join_methods(methods: &[Method]) -> String {
    methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
