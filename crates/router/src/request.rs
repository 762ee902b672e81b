use crate::params::Params;

/// A host request the router can route by itself.
///
/// Implemented for [`http::Request`] and for `(method, path)` tuples.
pub trait RouteRequest {
    fn route_path(&self) -> &str;

    /// The request method, `None` matches routes regardless of their methods
    fn route_method(&self) -> Option<&str>;

    /// Called with the params of the matched route before its chain runs
    fn attach_params(&mut self, _params: &Params) {}
}

impl<B> RouteRequest for http::Request<B> {
    fn route_path(&self) -> &str {
        self.uri().path()
    }

    fn route_method(&self) -> Option<&str> {
        Some(self.method().as_str())
    }

    /// Stores the params in the request extensions
    fn attach_params(&mut self, params: &Params) {
        self.extensions_mut().insert(params.clone());
    }
}

impl RouteRequest for (&str, &str) {
    fn route_path(&self) -> &str {
        self.1
    }

    fn route_method(&self) -> Option<&str> {
        Some(self.0)
    }
}
