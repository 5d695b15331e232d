//! Serverless adapter
//!
//! Serves the participant router from AWS Lambda: invocations are pulled from the
//! Runtime API, translated from API Gateway proxy events, routed, and posted back.

mod event;
mod runtime;

pub use event::{ApiGatewayProxyRequest, ApiGatewayProxyResponse, Identity, ProxyRequestContext};
pub use runtime::{Invocation, RuntimeApiClient};

use hyper::StatusCode;
use thiserror::Error;

use crate::config::Config;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use crate::routing::Router;

/// Environment variable holding the Runtime API `host:port`
pub const RUNTIME_API_ENV: &str = "AWS_LAMBDA_RUNTIME_API";

#[derive(Debug, Error)]
pub enum LambdaError {
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),

    #[error("runtime API request failed: {0}")]
    Client(#[from] hyper_util::client::legacy::Error),

    #[error("runtime API body error: {0}")]
    Body(#[from] hyper::Error),

    #[error("invalid runtime API request: {0}")]
    Http(#[from] hyper::http::Error),

    #[error("runtime API /{endpoint} answered {status}")]
    Status {
        endpoint: &'static str,
        status: StatusCode,
    },

    #[error("runtime API response carried no request id")]
    MissingRequestId,

    #[error("malformed event: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported HTTP method `{0}`")]
    InvalidMethod(String),

    #[error("invalid request path `{0}`")]
    InvalidPath(String),

    #[error("invalid base64 body: {0}")]
    InvalidBody(#[from] base64::DecodeError),
}

impl LambdaError {
    /// `errorType` reported to the Runtime API
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Json(_) | Self::InvalidMethod(_) | Self::InvalidPath(_) | Self::InvalidBody(_) => {
                "InvalidEvent"
            }
            _ => "Runtime",
        }
    }
}

/// Serve one invocation payload
pub async fn handle_invocation(
    router: &Router,
    config: &Config,
    payload: &[u8],
) -> Result<ApiGatewayProxyResponse, LambdaError> {
    let event: ApiGatewayProxyRequest = serde_json::from_slice(payload)?;
    handle_event(router, config, event).await
}

/// Route one API Gateway event
///
/// Bodies over `http.max_body_size` are answered with 413 without routing.
pub async fn handle_event(
    router: &Router,
    config: &Config,
    event: ApiGatewayProxyRequest,
) -> Result<ApiGatewayProxyResponse, LambdaError> {
    let source_ip = event.source_ip().to_string();
    let req = event.into_request()?;

    let (parts, body) = req.into_parts();
    let mut entry = config
        .logging
        .access_log
        .then(|| AccessLogEntry::start(source_ip, &parts));

    let max_body_size = config.http.max_body_size;
    let response = if u64::try_from(body.len()).unwrap_or(u64::MAX) > max_body_size {
        http::build_413_response(max_body_size)
    } else {
        router
            .serve(hyper::Request::from_parts(parts, body))
            .await
    };

    let proxy = ApiGatewayProxyResponse::from_response(response).await;
    if let Some(entry) = entry.as_mut() {
        entry.finish(proxy.status_code, proxy.body_len());
        logger::log_access(entry, &config.logging.access_log_format);
    }
    Ok(proxy)
}

/// Poll the Runtime API forever
///
/// Translation failures are reported on the invocation's `/error` endpoint; only a
/// failure to fetch the next invocation ends the loop.
pub async fn run(router: Router, config: Config) -> Result<(), LambdaError> {
    let api = std::env::var(RUNTIME_API_ENV).map_err(|_| LambdaError::MissingEnv(RUNTIME_API_ENV))?;
    let client = RuntimeApiClient::new(&api);
    logger::log_info(&format!(
        "[Lambda] Polling runtime API at {api} with {} route(s)",
        router.route_count()
    ));

    loop {
        let invocation = client.next_invocation().await?;
        let id = invocation.request_id.as_str();

        let posted = match handle_invocation(&router, &config, &invocation.payload).await {
            Ok(response) => client.send_response(id, &response).await,
            Err(e) => {
                logger::log_error(&format!("[Lambda] Invocation {id} failed: {e}"));
                client.send_error(id, &e).await
            }
        };

        if let Err(e) = posted {
            logger::log_error(&format!("[Lambda] Could not report invocation {id}: {e}"));
        }
    }
}
