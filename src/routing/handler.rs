use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Request, Response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by [`Handler::call`]
pub type HandlerFuture = Pin<Box<dyn Future<Output = Response<Full<Bytes>>> + Send>>;

/// A request handler registered on the router
///
/// Implemented for every `Fn(Request<Bytes>) -> impl Future<Output = Response<_>>`.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: Request<Bytes>) -> HandlerFuture;
}

impl<F, Fut> Handler for F
where
    F: Fn(Request<Bytes>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response<Full<Bytes>>> + Send + 'static,
{
    fn call(&self, req: Request<Bytes>) -> HandlerFuture {
        Box::pin(self(req))
    }
}

pub type BoxedHandler = Arc<dyn Handler>;
