//! Compiled routes.

mod normalize;
mod slot;

pub use slot::{HandlerState, Resolution};

use crate::error::RouteError;
use crate::method::MethodSet;
use crate::module::{ModuleRef, SharedLoader};
use crate::params::Params;
use crate::pattern::CompiledPattern;
use serde_json::{Map, Value};
use slot::HandlerSlot;
use std::fmt;
use std::sync::Arc;

pub(crate) use normalize::normalize;

pub(crate) const METHODS_KEY: &str = "methods";
pub(crate) const PATH_KEY: &str = "path";

/// The resolved configuration of a route.
///
/// Holds the descriptor metadata plus the normalized `methods` and `path`
/// entries. It never holds the handler, see [`Route::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct RouteConfig {
    path: String,
    methods: Vec<String>,
    metadata: Map<String, Value>,
}

impl RouteConfig {
    pub(crate) fn new(path: String, methods: &MethodSet, mut metadata: Map<String, Value>) -> Self {
        let methods = methods.names();
        metadata.insert(METHODS_KEY.to_string(), Value::from(methods.clone()));
        metadata.insert(PATH_KEY.to_string(), Value::from(path.clone()));
        Self { path, methods, metadata }
    }

    /// The route pattern without method prefix
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Sorted method names, `["*"]` when the route accepts any method
    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }
}

/// A normalized, compiled route ready for matching
pub struct Route<Req, Res> {
    pattern: CompiledPattern,
    methods: MethodSet,
    config: Arc<RouteConfig>,
    handler: HandlerSlot<Req, Res>,
}

impl<Req, Res> Route<Req, Res> {
    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    pub fn methods(&self) -> &MethodSet {
        &self.methods
    }

    pub fn config(&self) -> &Arc<RouteConfig> {
        &self.config
    }

    /// The handler module, for routes whose handler loads on first use
    pub fn module(&self) -> Option<&ModuleRef> {
        self.handler.module()
    }

    pub fn handler_state(&self) -> HandlerState {
        self.handler.state()
    }

    /// Tests the route, the method is checked before the pattern.
    ///
    /// Returns the matched path and the decoded params. A param that fails to
    /// decode is an error rather than a miss.
    pub fn exec(&self, path: &str, method: Option<&str>) -> Result<Option<(String, Params)>, RouteError> {
        if !self.methods.accepts(method) {
            return Ok(None);
        }

        let Some(matched) = self.pattern.exec(path) else {
            return Ok(None);
        };

        let params = Params::bind(self.pattern.keys(), &matched.values)?;
        Ok(Some((matched.path.to_string(), params)))
    }
}

impl<Req: 'static, Res: 'static> Route<Req, Res> {
    /// Returns the composed chain of the route, loading the handler module on first use.
    ///
    /// Must be called from within a tokio runtime, the load runs as a spawned task.
    pub async fn resolve(&self, loader: &SharedLoader<Req, Res>) -> Resolution<Req, Res> {
        self.handler.resolve(loader).await
    }
}

impl<Req, Res> fmt::Debug for Route<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern.source())
            .field("methods", &self.methods)
            .field("config", &self.config)
            .field("handler", &self.handler)
            .finish()
    }
}
