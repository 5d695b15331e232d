//! Request handler module
//!
//! Wires the participant resource onto a [`Router`]. Both the HTTP server and the
//! serverless adapter serve the router returned by [`build_router`].

pub mod participants;

use hyper::Method;

use crate::repository::SharedRepository;
use crate::routing::{RouteError, Router};

use participants::with_common_headers;

/// Build the participant API router over `repo`
pub fn build_router(repo: SharedRepository) -> Result<Router, RouteError> {
    Router::builder()
        .get("/participants", with_common_headers(participants::list(repo.clone())))
        .post("/participant", with_common_headers(participants::create(repo.clone())))
        .put("/participant/:id", with_common_headers(participants::update(repo.clone())))
        .get("/participant/:id", with_common_headers(participants::get(repo.clone())))
        .delete("/participant/:id", with_common_headers(participants::delete(repo)))
        .options(
            "/participants",
            with_common_headers(participants::options(vec![Method::GET])),
        )
        .options(
            "/participant",
            with_common_headers(participants::options(vec![Method::POST])),
        )
        .options(
            "/participant/:id",
            with_common_headers(participants::options(vec![
                Method::PUT,
                Method::GET,
                Method::DELETE,
            ])),
        )
        .build()
}
