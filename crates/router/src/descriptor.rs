//! Route descriptors: the externally supplied, not yet compiled form of a route.

use crate::handler::{RequestHandler, SharedHandler};
use crate::module::{Export, ModuleRef};
use crate::pattern::MatchOptions;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// How a route names its handler
pub enum HandlerRef<Req, Res> {
    /// the handler itself, composed at build time
    Direct(SharedHandler<Req, Res>),
    /// a module reference loaded on first use
    Module(ModuleRef),
}

impl<Req, Res> Clone for HandlerRef<Req, Res> {
    fn clone(&self) -> Self {
        match self {
            HandlerRef::Direct(handler) => HandlerRef::Direct(Arc::clone(handler)),
            HandlerRef::Module(module) => HandlerRef::Module(module.clone()),
        }
    }
}

impl<Req, Res> fmt::Debug for HandlerRef<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerRef::Direct(_) => f.write_str("Direct"),
            HandlerRef::Module(module) => f.debug_tuple("Module").field(module).finish(),
        }
    }
}

impl<Req, Res> From<&str> for HandlerRef<Req, Res> {
    fn from(reference: &str) -> Self {
        HandlerRef::Module(ModuleRef::parse(reference))
    }
}

impl<Req, Res> From<String> for HandlerRef<Req, Res> {
    fn from(reference: String) -> Self {
        HandlerRef::from(reference.as_str())
    }
}

impl<Req, Res> From<SharedHandler<Req, Res>> for HandlerRef<Req, Res> {
    fn from(handler: SharedHandler<Req, Res>) -> Self {
        HandlerRef::Direct(handler)
    }
}

/// A middleware entry of a route descriptor
pub enum MiddlewareSpec<Req, Res> {
    Direct(SharedHandler<Req, Res>),
    /// use the export, or its `method` export, as the middleware
    FromModule { module: Export<Req, Res>, method: Option<String>, enabled: bool },
    /// call the factory, or its `method` export, with `arguments` to create the middleware
    FromFactory { factory: Export<Req, Res>, method: Option<String>, arguments: Vec<Value>, enabled: bool },
}

impl<Req: Send + 'static, Res: Send + 'static> MiddlewareSpec<Req, Res> {
    pub fn direct(handler: impl RequestHandler<Req, Res> + 'static) -> Self {
        MiddlewareSpec::Direct(Arc::new(handler))
    }
}

impl<Req, Res> MiddlewareSpec<Req, Res> {
    pub fn from_module(module: Export<Req, Res>) -> Self {
        MiddlewareSpec::FromModule { module, method: None, enabled: true }
    }

    pub fn from_factory(factory: Export<Req, Res>, arguments: Vec<Value>) -> Self {
        MiddlewareSpec::FromFactory { factory, method: None, arguments, enabled: true }
    }

    /// Picks the named export of the module or factory
    #[must_use]
    pub fn method(self, name: impl Into<String>) -> Self {
        match self {
            MiddlewareSpec::FromModule { module, enabled, .. } => {
                MiddlewareSpec::FromModule { module, method: Some(name.into()), enabled }
            }
            MiddlewareSpec::FromFactory { factory, arguments, enabled, .. } => {
                MiddlewareSpec::FromFactory { factory, method: Some(name.into()), arguments, enabled }
            }
            direct @ MiddlewareSpec::Direct(_) => direct,
        }
    }

    #[must_use]
    pub fn enabled(self, enabled: bool) -> Self {
        match self {
            MiddlewareSpec::FromModule { module, method, .. } => MiddlewareSpec::FromModule { module, method, enabled },
            MiddlewareSpec::FromFactory { factory, method, arguments, .. } => {
                MiddlewareSpec::FromFactory { factory, method, arguments, enabled }
            }
            direct @ MiddlewareSpec::Direct(_) => direct,
        }
    }
}

impl<Req, Res> fmt::Debug for MiddlewareSpec<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MiddlewareSpec::Direct(_) => f.write_str("Direct"),
            MiddlewareSpec::FromModule { module, method, enabled } => f
                .debug_struct("FromModule")
                .field("module", module)
                .field("method", method)
                .field("enabled", enabled)
                .finish(),
            MiddlewareSpec::FromFactory { factory, method, arguments, enabled } => f
                .debug_struct("FromFactory")
                .field("factory", factory)
                .field("method", method)
                .field("arguments", arguments)
                .field("enabled", enabled)
                .finish(),
        }
    }
}

/// A route descriptor, either shorthand text or a structured record.
///
/// ```
/// use meta_router::RouteDescriptor;
///
/// let shorthand: RouteDescriptor<(), ()> = "GET,POST /users/:id => ./users#show".into();
/// let record: RouteDescriptor<(), ()> = RouteDescriptor::new("/users/:id")
///     .method("GET")
///     .handler("./users#show")
///     .meta("auth", true);
/// # let _ = (shorthand, record);
/// ```
pub struct RouteDescriptor<Req, Res> {
    pub(crate) path: Option<String>,
    pub(crate) route: Option<String>,
    pub(crate) method: Option<String>,
    pub(crate) methods: Option<Vec<String>>,
    pub(crate) handler: Option<HandlerRef<Req, Res>>,
    pub(crate) middleware: Vec<Option<MiddlewareSpec<Req, Res>>>,
    pub(crate) match_options: Option<MatchOptions>,
    pub(crate) metadata: Map<String, Value>,
}

impl<Req, Res> RouteDescriptor<Req, Res> {
    /// A descriptor with the given path, which may use the shorthand syntax
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: Some(path.into()), ..Self::empty() }
    }

    /// A descriptor without path, building it fails unless [`route`](Self::route) is set
    pub fn empty() -> Self {
        Self {
            path: None,
            route: None,
            method: None,
            methods: None,
            handler: None,
            middleware: vec![],
            match_options: None,
            metadata: Map::new(),
        }
    }

    /// Sets the `route` field, it takes precedence over `path`
    #[must_use]
    pub fn route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    #[must_use]
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    #[must_use]
    pub fn methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods = Some(methods.into_iter().map(Into::into).collect());
        self
    }

    /// Sets a module reference (`module` or `module#export`) or a direct handler
    #[must_use]
    pub fn handler(mut self, handler: impl Into<HandlerRef<Req, Res>>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    #[must_use]
    pub fn middleware(mut self, middleware: MiddlewareSpec<Req, Res>) -> Self {
        self.middleware.push(Some(middleware));
        self
    }

    /// Appends a middleware slot that may be empty, empty slots are skipped
    #[must_use]
    pub fn optional_middleware(mut self, middleware: Option<MiddlewareSpec<Req, Res>>) -> Self {
        self.middleware.push(middleware);
        self
    }

    #[must_use]
    pub fn match_options(mut self, options: MatchOptions) -> Self {
        self.match_options = Some(options);
        self
    }

    /// Adds arbitrary metadata copied to the route config
    #[must_use]
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl<Req, Res> From<&str> for RouteDescriptor<Req, Res> {
    fn from(shorthand: &str) -> Self {
        RouteDescriptor::new(shorthand)
    }
}

impl<Req, Res> From<String> for RouteDescriptor<Req, Res> {
    fn from(shorthand: String) -> Self {
        RouteDescriptor::new(shorthand)
    }
}

impl<Req, Res> fmt::Debug for RouteDescriptor<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDescriptor")
            .field("path", &self.path)
            .field("route", &self.route)
            .field("method", &self.method)
            .field("methods", &self.methods)
            .field("handler", &self.handler)
            .field("middleware", &self.middleware)
            .field("match_options", &self.match_options)
            .field("metadata", &self.metadata)
            .finish()
    }
}
