//! AWS Lambda Runtime API client

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::Serialize;

use super::LambdaError;

const API_VERSION: &str = "2018-06-01";
const REQUEST_ID_HEADER: &str = "Lambda-Runtime-Aws-Request-Id";
const ERROR_TYPE_HEADER: &str = "Lambda-Runtime-Function-Error-Type";

/// One pending invocation
#[derive(Debug)]
pub struct Invocation {
    pub request_id: String,
    pub payload: Bytes,
}

/// Error document posted to `/invocation/{id}/error`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorReport<'a> {
    error_message: String,
    error_type: &'a str,
}

/// Client for the runtime API at `host:port` (the `AWS_LAMBDA_RUNTIME_API` value)
#[derive(Clone)]
pub struct RuntimeApiClient {
    endpoint: String,
    http: Client<HttpConnector, Full<Bytes>>,
}

impl RuntimeApiClient {
    pub fn new(runtime_api: &str) -> Self {
        Self {
            endpoint: format!("http://{runtime_api}/{API_VERSION}/runtime"),
            http: Client::builder(TokioExecutor::new()).build_http(),
        }
    }

    /// Block until the next invocation is available
    pub async fn next_invocation(&self) -> Result<Invocation, LambdaError> {
        let req = Request::builder()
            .method(Method::GET)
            .uri(format!("{}/invocation/next", self.endpoint))
            .body(Full::new(Bytes::new()))?;

        let resp = self.http.request(req).await?;
        ensure_success(&resp, "next")?;

        let request_id = resp
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(LambdaError::MissingRequestId)?
            .to_string();

        let payload = resp.into_body().collect().await?.to_bytes();

        Ok(Invocation {
            request_id,
            payload,
        })
    }

    /// Report a successful invocation
    pub async fn send_response<T: Serialize + Sync>(
        &self,
        request_id: &str,
        body: &T,
    ) -> Result<(), LambdaError> {
        let req = Request::builder()
            .method(Method::POST)
            .uri(format!("{}/invocation/{request_id}/response", self.endpoint))
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(serde_json::to_vec(body)?)))?;

        let resp = self.http.request(req).await?;
        ensure_success(&resp, "response")
    }

    /// Report a failed invocation
    pub async fn send_error(&self, request_id: &str, error: &LambdaError) -> Result<(), LambdaError> {
        let report = ErrorReport {
            error_message: error.to_string(),
            error_type: error.kind(),
        };

        let req = Request::builder()
            .method(Method::POST)
            .uri(format!("{}/invocation/{request_id}/error", self.endpoint))
            .header(CONTENT_TYPE, "application/json")
            .header(ERROR_TYPE_HEADER, "Unhandled")
            .body(Full::new(Bytes::from(serde_json::to_vec(&report)?)))?;

        let resp = self.http.request(req).await?;
        ensure_success(&resp, "error")
    }
}

fn ensure_success<B>(resp: &Response<B>, endpoint: &'static str) -> Result<(), LambdaError> {
    let status: StatusCode = resp.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(LambdaError::Status { endpoint, status })
    }
}
