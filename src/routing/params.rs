//! Path parameter context
//!
//! Parameters are attached to the request extensions under a private key type, so no
//! other layer can read, replace or collide with them.

use hyper::Request;

/// Named path parameters extracted by a successful route match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Return a copy with `name` bound to `value`
    ///
    /// A name that is already bound keeps its value.
    #[must_use]
    pub fn with(&self, name: &str, value: &str) -> Self {
        let mut params = self.clone();
        params.push(name, value);
        params
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub(crate) fn push(&mut self, name: &str, value: &str) {
        if self.get(name).is_none() {
            self.entries.push((name.to_string(), value.to_string()));
        }
    }
}

/// Extension key for [`Params`]
#[derive(Clone)]
struct RouteParams(Params);

/// All parameters attached to a request, if it was routed
pub fn params<B>(req: &Request<B>) -> Option<&Params> {
    req.extensions().get::<RouteParams>().map(|p| &p.0)
}

/// Look up a single path parameter
pub fn param<'r, B>(req: &'r Request<B>, name: &str) -> Option<&'r str> {
    params(req)?.get(name)
}

/// Return the request with `name` bound to `value` in its parameter context
///
/// Existing bindings are never overwritten.
#[must_use]
pub fn with_param<B>(mut req: Request<B>, name: &str, value: &str) -> Request<B> {
    let params = params(&req).map_or_else(
        || Params::new().with(name, value),
        |existing| existing.with(name, value),
    );
    req.extensions_mut().insert(RouteParams(params));
    req
}

pub(crate) fn attach<B>(req: &mut Request<B>, params: Params) {
    req.extensions_mut().insert(RouteParams(params));
}

/// Extension key for a path that the URI cannot hold verbatim
#[derive(Clone)]
struct RequestPath(String);

/// Return the request with `path` as the path the router matches on
///
/// Transports whose paths arrive already decoded (API Gateway) set this, so a `?`,
/// `#` or space inside a segment is matched and captured as received.
#[must_use]
pub fn with_request_path<B>(mut req: Request<B>, path: &str) -> Request<B> {
    req.extensions_mut().insert(RequestPath(path.to_string()));
    req
}

/// The path set by [`with_request_path`], if any
pub fn request_path<B>(req: &Request<B>) -> Option<&str> {
    req.extensions().get::<RequestPath>().map(|p| p.0.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> Request<()> {
        Request::builder().uri("/").body(()).unwrap()
    }

    #[test]
    fn test_with_leaves_original_untouched() {
        let base = Params::new().with("id", "1");
        let extended = base.with("name", "x");
        assert_eq!(base.len(), 1);
        assert_eq!(base.get("name"), None);
        assert_eq!(extended.get("id"), Some("1"));
        assert_eq!(extended.get("name"), Some("x"));
    }

    #[test]
    fn test_existing_binding_is_not_overwritten() {
        let params = Params::new().with("id", "1").with("id", "2");
        assert_eq!(params.get("id"), Some("1"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_param_lookup_on_request() {
        let req = with_param(request(), "id", "42");
        assert_eq!(param(&req, "id"), Some("42"));
        assert_eq!(param(&req, "missing"), None);

        let req = with_param(req, "id", "7");
        assert_eq!(param(&req, "id"), Some("42"));
    }

    #[test]
    fn test_unrouted_request_has_no_params() {
        let req = request();
        assert!(params(&req).is_none());
        assert_eq!(param(&req, "id"), None);
    }

    #[test]
    fn test_plain_string_extension_does_not_collide() {
        let mut req = request();
        req.extensions_mut().insert(String::from("id"));
        assert_eq!(param(&req, "id"), None);

        let req = with_param(req, "id", "9");
        assert_eq!(param(&req, "id"), Some("9"));
        assert_eq!(req.extensions().get::<String>().map(String::as_str), Some("id"));
    }

    #[test]
    fn test_request_path_extension() {
        let req = request();
        assert_eq!(request_path(&req), None);

        let req = with_request_path(req, "/participant/a b");
        assert_eq!(request_path(&req), Some("/participant/a b"));
        assert_eq!(req.uri().path(), "/");
        assert!(params(&req).is_none());
    }

    #[test]
    fn test_iter_keeps_pattern_order() {
        let params = Params::new().with("b", "2").with("a", "1");
        let collected: Vec<_> = params.iter().collect();
        assert_eq!(collected, vec![("b", "2"), ("a", "1")]);
    }
}
