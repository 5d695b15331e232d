// Request service module
// Turns a hyper request into a routed response: size limit, body collection, access log

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::CONTENT_LENGTH;
use hyper::http::request::Parts;
use hyper::{Request, Response, StatusCode};
use std::convert::Infallible;
use std::error::Error as StdError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppState;
use crate::http;
use crate::logger::{self, AccessLogEntry};

/// Serve one request from a client connection
///
/// Reading the body and routing together must finish within the request timeout,
/// otherwise the client gets 503. A timeout of zero disables the bound.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let (parts, body) = req.into_parts();
    let access_log = state
        .config
        .logging
        .access_log
        .then(|| AccessLogEntry::start(peer_addr.ip().to_string(), &parts));

    let timeout = state.config.request_timeout_secs();
    let target = format!("{} {}", parts.method, parts.uri.path());
    let routed = route(parts, body, &state);
    let response = if timeout == 0 {
        routed.await
    } else {
        match tokio::time::timeout(Duration::from_secs(timeout), routed).await {
            Ok(response) => response,
            Err(_) => {
                logger::log_warning(&format!("Request timed out after {timeout}s: {target}"));
                http::build_error_response(StatusCode::SERVICE_UNAVAILABLE, "Request timed out")
            }
        }
    };

    if let Some(mut entry) = access_log {
        let size = response.body().size_hint().exact().unwrap_or(0);
        entry.finish(response.status().as_u16(), size);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

async fn route<B>(parts: Parts, body: B, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let max_body_size = state.config.http.max_body_size;

    if let Some(resp) = check_content_length(&parts, max_body_size) {
        return resp;
    }

    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let bytes = match Limited::new(body, limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<LengthLimitError>() => {
            logger::log_warning(&format!(
                "Request body exceeded {max_body_size} bytes: {} {}",
                parts.method,
                parts.uri.path()
            ));
            return http::build_413_response(max_body_size);
        }
        Err(e) => {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            return http::build_error_response(StatusCode::BAD_REQUEST, "Error reading request");
        }
    };

    state.router.serve(Request::from_parts(parts, bytes)).await
}

/// Reject early when the declared Content-Length is over the limit
fn check_content_length(parts: &Parts, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let size = parts
        .headers
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()?;

    (size > max_body_size).then(|| {
        logger::log_warning(&format!(
            "Request body too large: {size} bytes (max: {max_body_size})"
        ));
        http::build_413_response(max_body_size)
    })
}
