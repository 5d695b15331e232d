//! API Gateway REST proxy events
//!
//! Translation between the Lambda invocation payload and the `Request<Bytes>` /
//! `Response<Full<Bytes>>` pair the router works with.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{HeaderName, HeaderValue};
use hyper::{Method, Request, Response};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::LambdaError;
use crate::logger;
use crate::routing;

/// Bytes that cannot appear literally in a URI path
const PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Incoming API Gateway proxy event
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiGatewayProxyRequest {
    pub http_method: String,
    pub path: String,
    pub headers: Option<HashMap<String, String>>,
    pub multi_value_headers: Option<HashMap<String, Vec<String>>>,
    pub body: Option<String>,
    pub is_base64_encoded: Option<bool>,
    pub request_context: ProxyRequestContext,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProxyRequestContext {
    pub request_id: Option<String>,
    pub identity: Identity,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Identity {
    pub source_ip: Option<String>,
}

/// Outgoing API Gateway proxy response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayProxyResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub multi_value_headers: HashMap<String, Vec<String>>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl ApiGatewayProxyRequest {
    pub fn source_ip(&self) -> &str {
        self.request_context
            .identity
            .source_ip
            .as_deref()
            .unwrap_or("-")
    }

    /// Build the request the router serves
    ///
    /// API Gateway hands over the path already decoded. It is percent-encoded into
    /// the URI and also attached verbatim with [`routing::with_request_path`], so
    /// the router matches and captures it exactly as received. `multiValueHeaders`
    /// wins over `headers` when both are present; headers that are not valid HTTP
    /// are dropped.
    pub fn into_request(self) -> Result<Request<Bytes>, LambdaError> {
        let method = Method::from_bytes(self.http_method.as_bytes())
            .map_err(|_| LambdaError::InvalidMethod(self.http_method.clone()))?;

        let path = if self.path.is_empty() { "/" } else { self.path.as_str() };
        if !path.starts_with('/') {
            return Err(LambdaError::InvalidPath(self.path.clone()));
        }

        let body = match self.body {
            Some(body) if self.is_base64_encoded.unwrap_or(false) => {
                Bytes::from(STANDARD.decode(body)?)
            }
            Some(body) => Bytes::from(body),
            None => Bytes::new(),
        };

        let uri = utf8_percent_encode(path, PATH).to_string();
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(body)
            .map_err(|_| LambdaError::InvalidPath(self.path.clone()))?;
        let mut req = routing::with_request_path(req, path);

        let headers = req.headers_mut();
        match (self.multi_value_headers, self.headers) {
            (Some(multi), _) if !multi.is_empty() => {
                for (name, values) in multi {
                    for value in values {
                        append_header(headers, &name, &value);
                    }
                }
            }
            (_, Some(single)) => {
                for (name, value) in single {
                    append_header(headers, &name, &value);
                }
            }
            _ => {}
        }

        Ok(req)
    }
}

fn append_header(headers: &mut hyper::HeaderMap, name: &str, value: &str) {
    match (
        HeaderName::from_bytes(name.as_bytes()),
        HeaderValue::from_str(value),
    ) {
        (Ok(name), Ok(value)) => {
            headers.append(name, value);
        }
        _ => logger::log_warning(&format!("[Lambda] Dropping invalid header `{name}`")),
    }
}

impl ApiGatewayProxyResponse {
    /// Collect a router response into the proxy response shape
    ///
    /// Bodies that are not UTF-8 are base64 encoded.
    pub async fn from_response(response: Response<Full<Bytes>>) -> Self {
        let (parts, body) = response.into_parts();
        let bytes = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };

        let mut headers = HashMap::new();
        let mut multi_value_headers: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in &parts.headers {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            headers
                .entry(name.as_str().to_string())
                .or_insert_with(|| value.clone());
            multi_value_headers
                .entry(name.as_str().to_string())
                .or_default()
                .push(value);
        }

        let (body, is_base64_encoded) = match String::from_utf8(bytes.to_vec()) {
            Ok(text) => (text, false),
            Err(_) => (STANDARD.encode(&bytes), true),
        };

        Self {
            status_code: parts.status.as_u16(),
            headers,
            multi_value_headers,
            body,
            is_base64_encoded,
        }
    }

    /// Size of the body as the router produced it, before any base64 encoding
    pub fn body_len(&self) -> u64 {
        let len = if self.is_base64_encoded {
            let padding = self.body.bytes().rev().take_while(|&b| b == b'=').count();
            (self.body.len() / 4 * 3).saturating_sub(padding)
        } else {
            self.body.len()
        };
        u64::try_from(len).unwrap_or(u64::MAX)
    }
}
