//! Participant CRUD handlers

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN};
use hyper::{Method, Request, Response, StatusCode};
use std::sync::Arc;

use crate::http;
use crate::logger;
use crate::participant::Participant;
use crate::repository::{RepositoryError, SharedRepository};
use crate::routing::{self, Handler};

/// `GET /participants`
pub fn list(repo: SharedRepository) -> impl Handler {
    move |_req: Request<Bytes>| {
        let repo = Arc::clone(&repo);
        async move {
            match repo.get_all().await {
                Ok(participants) => http::build_json_response(&participants),
                Err(e) => {
                    logger::log_error(&format!("Error retrieving resources: {e}"));
                    http::build_error_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Error retrieving resources",
                    )
                }
            }
        }
    }
}

/// `POST /participant`
pub fn create(repo: SharedRepository) -> impl Handler {
    move |req: Request<Bytes>| {
        let repo = Arc::clone(&repo);
        async move {
            let mut participant = match decode(req.body()) {
                Ok(p) => p,
                Err(response) => return response,
            };
            participant.id = None;

            match repo.save(participant).await {
                Ok(saved) => http::build_json_response(&saved),
                Err(e) => {
                    logger::log_error(&format!("Error persisting resource: {e}"));
                    http::build_error_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Error persisting resource",
                    )
                }
            }
        }
    }
}

/// `PUT /participant/:id`
pub fn update(repo: SharedRepository) -> impl Handler {
    move |req: Request<Bytes>| {
        let repo = Arc::clone(&repo);
        async move {
            let id = match id_param(&req) {
                Ok(id) => id,
                Err(response) => return response,
            };
            let mut participant = match decode(req.body()) {
                Ok(p) => p,
                Err(response) => return response,
            };
            participant.id = Some(id);

            match repo.save(participant).await {
                Ok(saved) => http::build_json_response(&saved),
                Err(e) => storage_error(&e, "Error persisting resource"),
            }
        }
    }
}

/// `GET /participant/:id`
pub fn get(repo: SharedRepository) -> impl Handler {
    move |req: Request<Bytes>| {
        let repo = Arc::clone(&repo);
        async move {
            let id = match id_param(&req) {
                Ok(id) => id,
                Err(response) => return response,
            };

            match repo.get(&id).await {
                Ok(participant) => http::build_json_response(&participant),
                Err(e) => storage_error(&e, "Error retrieving resource"),
            }
        }
    }
}

/// `DELETE /participant/:id`
pub fn delete(repo: SharedRepository) -> impl Handler {
    move |req: Request<Bytes>| {
        let repo = Arc::clone(&repo);
        async move {
            let id = match id_param(&req) {
                Ok(id) => id,
                Err(response) => return response,
            };

            match repo.delete(&id).await {
                Ok(()) => http::build_text_response("Deleted"),
                Err(e) => storage_error(&e, "Error deleting resource"),
            }
        }
    }
}

/// CORS preflight for a resource accepting `allowed`
pub fn options(allowed: Vec<Method>) -> impl Handler {
    move |_req: Request<Bytes>| {
        let response = http::build_options_response(&allowed);
        async move { response }
    }
}

/// Add `Access-Control-Allow-Origin: *` to every response of `handler`
pub fn with_common_headers(handler: impl Handler) -> impl Handler {
    move |req: Request<Bytes>| {
        let response = handler.call(req);
        async move {
            let mut response: Response<Full<Bytes>> = response.await;
            response
                .headers_mut()
                .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
            response
        }
    }
}

fn id_param(req: &Request<Bytes>) -> Result<String, Response<Full<Bytes>>> {
    routing::param(req, "id").map(str::to_string).ok_or_else(|| {
        http::build_error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Unable to get request parameter",
        )
    })
}

fn decode(body: &Bytes) -> Result<Participant, Response<Full<Bytes>>> {
    serde_json::from_slice(body).map_err(|e| {
        logger::log_debug(&format!("Error unmarshalling request: {e}"));
        http::build_error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error unmarshalling request",
        )
    })
}

fn storage_error(error: &RepositoryError, message: &str) -> Response<Full<Bytes>> {
    match error {
        RepositoryError::NotFound(_) => {
            http::build_error_response(StatusCode::NOT_FOUND, "Resource not found")
        }
        RepositoryError::Backend(_) => {
            logger::log_error(&format!("{message}: {error}"));
            http::build_error_response(StatusCode::INTERNAL_SERVER_ERROR, message)
        }
    }
}
