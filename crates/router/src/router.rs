//! The router facade.
//!
//! A [`Router`] owns the active matcher together with the module loader used to
//! resolve lazily loaded handlers. Reconfiguring builds a complete new matcher first
//! and then publishes it with a single atomic swap, requests in flight keep using the
//! snapshot they started with.

use crate::descriptor::RouteDescriptor;
use crate::error::{InvokeError, RouteError};
use crate::handler::Flow;
use crate::matcher::{Matcher, RouteMatch};
use crate::module::{ModuleLoader, NoopLoader, SharedLoader};
use crate::request::RouteRequest;
use arc_swap::ArcSwapOption;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Routes and loader used to configure a [`Router`]
pub struct RouterOptions<Req, Res> {
    routes: Vec<RouteDescriptor<Req, Res>>,
    loader: SharedLoader<Req, Res>,
}

impl<Req, Res> RouterOptions<Req, Res> {
    /// Options with the given routes and a loader that fails every load
    pub fn new<I, D>(routes: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<RouteDescriptor<Req, Res>>,
    {
        Self { routes: routes.into_iter().map(Into::into).collect(), loader: Arc::new(NoopLoader) }
    }

    /// Sets the loader resolving module handlers
    #[must_use]
    pub fn loader(mut self, loader: impl ModuleLoader<Req, Res> + 'static) -> Self {
        self.loader = Arc::new(loader);
        self
    }

    #[must_use]
    pub fn shared_loader(mut self, loader: SharedLoader<Req, Res>) -> Self {
        self.loader = loader;
        self
    }
}

impl<Req, Res> fmt::Debug for RouterOptions<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterOptions").field("routes", &self.routes).finish_non_exhaustive()
    }
}

struct Snapshot<Req, Res> {
    matcher: Matcher<Req, Res>,
    loader: SharedLoader<Req, Res>,
}

pub struct Router<Req, Res> {
    current: ArcSwapOption<Snapshot<Req, Res>>,
}

impl<Req, Res> Router<Req, Res> {
    /// An unconfigured router, lookups fail until [`configure`](Self::configure) succeeds
    pub fn new() -> Self {
        Self { current: ArcSwapOption::empty() }
    }

    /// Builds a matcher from the options and makes it the active one.
    ///
    /// On error the previously active matcher stays in place.
    pub fn configure(&self, options: RouterOptions<Req, Res>) -> Result<(), RouteError> {
        let matcher = Matcher::build(options.routes)?;
        self.publish(matcher, options.loader);
        Ok(())
    }

    /// Same as [`configure`](Self::configure) with the routes read from a route file
    pub async fn configure_from_file(
        &self,
        path: impl AsRef<Path>,
        loader: impl ModuleLoader<Req, Res> + 'static,
    ) -> Result<(), RouteError> {
        let matcher = Matcher::build_from_file(path).await?;
        self.publish(matcher, Arc::new(loader));
        Ok(())
    }

    fn publish(&self, matcher: Matcher<Req, Res>, loader: SharedLoader<Req, Res>) {
        let routes = matcher.len();
        let previous = self.current.swap(Some(Arc::new(Snapshot { matcher, loader })));
        info!(routes, replaced = previous.is_some(), "router configured");
    }

    pub fn is_configured(&self) -> bool {
        self.current.load().is_some()
    }

    fn snapshot(&self) -> Result<Arc<Snapshot<Req, Res>>, RouteError> {
        self.current.load_full().ok_or(RouteError::NotConfigured)
    }

    /// Finds the route for `path` and `method`, see [`Matcher::match_route`]
    pub fn find(&self, path: &str, method: Option<&str>) -> Result<Option<RouteMatch<Req, Res>>, RouteError> {
        self.snapshot()?.matcher.match_route(path, method)
    }

    pub fn find_request<R: RouteRequest + ?Sized>(&self, req: &R) -> Result<Option<RouteMatch<Req, Res>>, RouteError> {
        self.find(req.route_path(), req.route_method())
    }
}

impl<Req: Send + 'static, Res: Send + 'static> Router<Req, Res> {
    /// Eagerly resolves every module handler of the active routes.
    ///
    /// Fails with the first resolution error, which stays cached on its route.
    pub async fn preload(&self) -> Result<(), InvokeError> {
        let snapshot = self.snapshot().map_err(InvokeError::Match)?;
        for route in snapshot.matcher.routes() {
            if let Some(module) = route.module() {
                debug!(module = %module, "preloading route handler");
                route.resolve(&snapshot.loader).await.map_err(InvokeError::Unresolved)?;
            }
        }
        Ok(())
    }

    /// Runs the chain of a matched route, loading its handler with the active loader
    /// on first use.
    pub async fn invoke(&self, matched: &RouteMatch<Req, Res>, req: &mut Req, res: &mut Res) -> Result<Flow, InvokeError> {
        let snapshot = self.snapshot().map_err(InvokeError::Match)?;
        matched.invoke(&snapshot.loader, req, res).await
    }

    /// Finds the route for the request and runs it.
    ///
    /// Returns `Ok(None)` when no route matched so the host can fall through to its
    /// own handling.
    pub async fn handle(&self, req: &mut Req, res: &mut Res) -> Result<Option<Flow>, InvokeError>
    where
        Req: RouteRequest,
    {
        let snapshot = self.snapshot().map_err(InvokeError::Match)?;
        let matched = snapshot.matcher.match_route(req.route_path(), req.route_method()).map_err(InvokeError::Match)?;

        let Some(matched) = matched else {
            return Ok(None);
        };

        req.attach_params(matched.params());
        matched.invoke(&snapshot.loader, req, res).await.map(Some)
    }
}

impl<Req, Res> Default for Router<Req, Res> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Req, Res> fmt::Debug for Router<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.current.load().as_ref() {
            Some(snapshot) => f.debug_struct("Router").field("matcher", &snapshot.matcher).finish(),
            None => f.debug_struct("Router").field("matcher", &"<unconfigured>").finish(),
        }
    }
}
