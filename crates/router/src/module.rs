//! Loadable modules and their exports.
//!
//! A route may name its handler by module id (`./users` or `./users#show`) instead of
//! passing the handler itself. The id is handed to a [`ModuleLoader`] the first time
//! the route is used and the loaded [`Export`] is reduced to a handler.

use crate::error::{BoxError, RouteError};
use crate::handler::{RequestHandler, SharedHandler};
use async_trait::async_trait;
use futures::future::BoxFuture;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

static MODULE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.+?)(?:#(.+?))?\s*$").expect("module reference regex is valid"));

const DEFAULT_EXPORT: &str = "default";

/// A function producing a step from configuration arguments
pub type SharedFactory<Req, Res> = Arc<dyn Fn(&[Value]) -> Result<SharedHandler<Req, Res>, BoxError> + Send + Sync>;

/// Anything a module can export
pub enum Export<Req, Res> {
    Handler(SharedHandler<Req, Res>),
    Factory(SharedFactory<Req, Res>),
    Module(Arc<Module<Req, Res>>),
    /// plain data, never usable as a step
    Value(Value),
}

impl<Req: Send + 'static, Res: Send + 'static> Export<Req, Res> {
    pub fn handler(handler: impl RequestHandler<Req, Res> + 'static) -> Self {
        Export::Handler(Arc::new(handler))
    }

    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn(&[Value]) -> Result<SharedHandler<Req, Res>, BoxError> + Send + Sync + 'static,
    {
        Export::Factory(Arc::new(factory))
    }

    pub fn module(module: Module<Req, Res>) -> Self {
        Export::Module(Arc::new(module))
    }
}

impl<Req, Res> Export<Req, Res> {
    /// Picks a named export, only modules have named exports
    pub fn get(&self, name: &str) -> Option<&Export<Req, Res>> {
        match self {
            Export::Module(module) => module.get(name),
            _ => None,
        }
    }

    pub fn as_handler(&self) -> Option<&SharedHandler<Req, Res>> {
        match self {
            Export::Handler(handler) => Some(handler),
            _ => None,
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Export::Handler(_) => "handler",
            Export::Factory(_) => "factory",
            Export::Module(_) => "module",
            Export::Value(_) => "value",
        }
    }
}

impl<Req, Res> Clone for Export<Req, Res> {
    fn clone(&self) -> Self {
        match self {
            Export::Handler(handler) => Export::Handler(Arc::clone(handler)),
            Export::Factory(factory) => Export::Factory(Arc::clone(factory)),
            Export::Module(module) => Export::Module(Arc::clone(module)),
            Export::Value(value) => Export::Value(value.clone()),
        }
    }
}

impl<Req, Res> fmt::Debug for Export<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Export::Module(module) => f.debug_tuple("Module").field(module).finish(),
            Export::Value(value) => f.debug_tuple("Value").field(value).finish(),
            other => f.write_str(other.kind()),
        }
    }
}

/// A named set of exports, the `default` export is used when no export name is given
pub struct Module<Req, Res> {
    exports: HashMap<String, Export<Req, Res>>,
}

impl<Req, Res> Module<Req, Res> {
    pub fn new() -> Self {
        Self { exports: HashMap::new() }
    }

    pub fn export(mut self, name: impl Into<String>, export: Export<Req, Res>) -> Self {
        self.exports.insert(name.into(), export);
        self
    }

    pub fn with_default(self, export: Export<Req, Res>) -> Self {
        self.export(DEFAULT_EXPORT, export)
    }

    pub fn get(&self, name: &str) -> Option<&Export<Req, Res>> {
        self.exports.get(name)
    }
}

impl<Req, Res> Default for Module<Req, Res> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Req, Res> fmt::Debug for Module<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = self.exports.keys().collect::<Vec<_>>();
        names.sort();
        f.debug_struct("Module").field("exports", &names).finish()
    }
}

/// A module id with an optional export name, parsed from `module#export`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleRef {
    id: String,
    export: Option<String>,
}

impl ModuleRef {
    pub fn new(id: impl Into<String>, export: Option<String>) -> Self {
        Self { id: id.into(), export }
    }

    /// Splits `path#export`, without a `#` the whole string is the module id
    pub fn parse(reference: &str) -> Self {
        match MODULE_REGEX.captures(reference) {
            Some(captures) => Self {
                id: captures[1].to_string(),
                export: captures.get(2).map(|m| m.as_str().to_string()),
            },
            None => Self { id: reference.to_string(), export: None },
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn export(&self) -> Option<&str> {
        self.export.as_deref()
    }

    /// Reduces a loaded export to a handler: the named export when one was given,
    /// otherwise the `default` export, falling back to the export itself.
    pub fn pick<Req, Res>(&self, loaded: &Export<Req, Res>) -> Result<SharedHandler<Req, Res>, RouteError> {
        let picked = match &self.export {
            Some(name) => loaded.get(name),
            None => loaded.get(DEFAULT_EXPORT).or(Some(loaded)),
        };

        picked
            .and_then(Export::as_handler)
            .map(Arc::clone)
            .ok_or_else(|| RouteError::invalid_handler(&self.id, self.export()))
    }
}

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.export {
            Some(export) => write!(f, "{}#{}", self.id, export),
            None => f.write_str(&self.id),
        }
    }
}

/// Loads modules by id.
///
/// Module resolution depends on the host, the router only calls `load` once per route.
#[async_trait]
pub trait ModuleLoader<Req, Res>: Send + Sync {
    async fn load(&self, id: &str) -> Result<Export<Req, Res>, BoxError>;
}

/// A shared, type erased module loader
pub type SharedLoader<Req, Res> = Arc<dyn ModuleLoader<Req, Res>>;

/// A loader backed by a synchronous closure
pub struct FnLoader<F> {
    f: F,
}

pub fn loader_fn<F, Req, Res>(f: F) -> FnLoader<F>
where
    F: Fn(&str) -> Result<Export<Req, Res>, BoxError> + Send + Sync,
{
    FnLoader { f }
}

impl<F> fmt::Debug for FnLoader<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnLoader").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Req, Res> ModuleLoader<Req, Res> for FnLoader<F>
where
    F: Fn(&str) -> Result<Export<Req, Res>, BoxError> + Send + Sync,
{
    async fn load(&self, id: &str) -> Result<Export<Req, Res>, BoxError> {
        (self.f)(id)
    }
}

/// A loader backed by an asynchronous closure
pub struct AsyncFnLoader<F> {
    f: F,
}

pub fn async_loader_fn<F, Req, Res>(f: F) -> AsyncFnLoader<F>
where
    F: Fn(String) -> BoxFuture<'static, Result<Export<Req, Res>, BoxError>> + Send + Sync,
{
    AsyncFnLoader { f }
}

impl<F> fmt::Debug for AsyncFnLoader<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncFnLoader").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Req, Res> ModuleLoader<Req, Res> for AsyncFnLoader<F>
where
    F: Fn(String) -> BoxFuture<'static, Result<Export<Req, Res>, BoxError>> + Send + Sync,
{
    async fn load(&self, id: &str) -> Result<Export<Req, Res>, BoxError> {
        (self.f)(id.to_string()).await
    }
}

/// The loader used when none is configured, every load fails
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLoader;

#[async_trait]
impl<Req, Res> ModuleLoader<Req, Res> for NoopLoader {
    async fn load(&self, id: &str) -> Result<Export<Req, Res>, BoxError> {
        Err(format!("no module loader configured, cannot load \"{id}\"").into())
    }
}
