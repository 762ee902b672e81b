//! Route steps: middleware and terminal handlers share the [`RequestHandler`] trait.
//!
//! A step receives the host's request and response values and tells the chain how to
//! continue:
//!
//! - `Ok(Flow::Continue)` is the equivalent of calling `next()`
//! - `Err(e)` is the equivalent of calling `next(e)`, the chain stops and the error is
//!   forwarded to the caller
//! - `Ok(Flow::Halt)` means the step handled the request and never calls `next`

use crate::error::BoxError;
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// How the chain proceeds after a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Halt,
}

pub type StepResult = Result<Flow, BoxError>;

/// A shared, type erased step
pub type SharedHandler<Req, Res> = Arc<dyn RequestHandler<Req, Res>>;

#[async_trait]
pub trait RequestHandler<Req, Res>: Send + Sync {
    async fn invoke(&self, req: &mut Req, res: &mut Res) -> StepResult;

    /// Metadata merged into the config of the route this handler is attached to
    fn route_metadata(&self) -> Option<&Map<String, Value>> {
        None
    }

    /// Middleware that runs right before this handler when it is a route handler
    fn route_middleware(&self) -> &[SharedHandler<Req, Res>] {
        &[]
    }
}

/// A step built from a closure returning a boxed future
pub struct FnHandler<F> {
    f: F,
}

/// Creates a step from a closure.
///
/// ```
/// use futures::FutureExt;
/// use meta_router::{handler_fn, Flow};
///
/// let step = handler_fn(|req: &mut Vec<&'static str>, _res: &mut String| {
///     async move {
///         req.push("auth");
///         Ok(Flow::Continue)
///     }
///     .boxed()
/// });
/// # let _ = step;
/// ```
pub fn handler_fn<F, Req, Res>(f: F) -> FnHandler<F>
where
    F: for<'a> Fn(&'a mut Req, &'a mut Res) -> BoxFuture<'a, StepResult> + Send + Sync,
{
    FnHandler { f }
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Req, Res> RequestHandler<Req, Res> for FnHandler<F>
where
    F: for<'a> Fn(&'a mut Req, &'a mut Res) -> BoxFuture<'a, StepResult> + Send + Sync,
    Req: Send,
    Res: Send,
{
    async fn invoke(&self, req: &mut Req, res: &mut Res) -> StepResult {
        (self.f)(req, res).await
    }
}

/// A route handler decorated with route metadata and route middleware
pub struct RouteHandler<Req, Res> {
    handler: SharedHandler<Req, Res>,
    metadata: Map<String, Value>,
    middleware: Vec<SharedHandler<Req, Res>>,
}

impl<Req: Send + 'static, Res: Send + 'static> RouteHandler<Req, Res> {
    pub fn new(handler: impl RequestHandler<Req, Res> + 'static) -> Self {
        Self { handler: Arc::new(handler), metadata: Map::new(), middleware: vec![] }
    }

    /// Adds one metadata entry, merged into the route config
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Adds a middleware that runs before this handler
    pub fn middleware(mut self, middleware: impl RequestHandler<Req, Res> + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    pub fn into_shared(self) -> SharedHandler<Req, Res> {
        Arc::new(self)
    }
}

impl<Req, Res> fmt::Debug for RouteHandler<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteHandler")
            .field("metadata", &self.metadata)
            .field("middleware", &self.middleware.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<Req: Send, Res: Send> RequestHandler<Req, Res> for RouteHandler<Req, Res> {
    async fn invoke(&self, req: &mut Req, res: &mut Res) -> StepResult {
        self.handler.invoke(req, res).await
    }

    fn route_metadata(&self) -> Option<&Map<String, Value>> {
        (!self.metadata.is_empty()).then_some(&self.metadata)
    }

    fn route_middleware(&self) -> &[SharedHandler<Req, Res>] {
        &self.middleware
    }
}
