//! Request dispatcher
//!
//! Routes are collected on a [`RouterBuilder`] and frozen by [`RouterBuilder::build`];
//! a built [`Router`] is immutable and can serve from any number of tasks at once.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response};
use std::sync::Arc;

use super::error::RouteError;
use super::handler::{BoxedHandler, Handler};
use super::matcher::Pattern;
use super::params;
use super::table::{Resolution, RouteTable};
use crate::http;
use crate::logger;

/// Collects route registrations before the table is built
pub struct RouterBuilder {
    routes: Vec<(String, Method, BoxedHandler)>,
    not_found: Option<BoxedHandler>,
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            not_found: None,
        }
    }

    /// Register `handler` for requests with `method` whose path matches `path`
    #[must_use]
    pub fn handle(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes.push((path.to_string(), method, Arc::new(handler)));
        self
    }

    #[must_use]
    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.handle(Method::GET, path, handler)
    }

    #[must_use]
    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.handle(Method::POST, path, handler)
    }

    #[must_use]
    pub fn put(self, path: &str, handler: impl Handler) -> Self {
        self.handle(Method::PUT, path, handler)
    }

    #[must_use]
    pub fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.handle(Method::DELETE, path, handler)
    }

    #[must_use]
    pub fn options(self, path: &str, handler: impl Handler) -> Self {
        self.handle(Method::OPTIONS, path, handler)
    }

    /// Replace the default 404 handler
    #[must_use]
    pub fn not_found(mut self, handler: impl Handler) -> Self {
        self.not_found = Some(Arc::new(handler));
        self
    }

    /// Parse every pattern and freeze the route table
    pub fn build(self) -> Result<Router, RouteError> {
        let mut table = RouteTable::new();
        for (path, method, handler) in self.routes {
            let pattern = Pattern::parse(&path)?;
            logger::log_debug(&format!("[Router] {method} {pattern}"));
            table.register(pattern, method, handler);
        }

        let not_found = self
            .not_found
            .unwrap_or_else(|| Arc::new(default_not_found) as BoxedHandler);

        Ok(Router { table, not_found })
    }
}

/// Immutable request router
pub struct Router {
    table: RouteTable<BoxedHandler>,
    not_found: BoxedHandler,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Dispatch one request to its handler
    ///
    /// Matched requests carry their path parameters in the request extensions. A path
    /// set with [`params::with_request_path`] is matched instead of the URI path.
    pub async fn serve(&self, mut req: Request<Bytes>) -> Response<Full<Bytes>> {
        let path = params::request_path(&req).unwrap_or_else(|| req.uri().path());
        let resolution = self.table.resolve(req.method(), path);
        match resolution {
            Resolution::Matched { handler, params } => {
                params::attach(&mut req, params);
                handler.call(req).await
            }
            Resolution::MethodNotAllowed { allowed } => {
                logger::log_debug(&format!(
                    "[Router] Method not allowed: {} {}",
                    req.method(),
                    req.uri().path()
                ));
                http::build_405_response(&allowed)
            }
            Resolution::NoMatch => self.not_found.call(req).await,
        }
    }

    /// Resolve without dispatching
    pub fn resolve(&self, method: &Method, path: &str) -> Resolution<'_, BoxedHandler> {
        self.table.resolve(method, path)
    }

    /// Number of distinct route patterns
    pub fn route_count(&self) -> usize {
        self.table.len()
    }
}

async fn default_not_found(_req: Request<Bytes>) -> Response<Full<Bytes>> {
    http::build_404_response()
}
