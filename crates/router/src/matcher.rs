use crate::descriptor::RouteDescriptor;
use crate::error::{InvokeError, RouteError};
use crate::handler::{Flow, RequestHandler};
use crate::module::SharedLoader;
use crate::params::Params;
use crate::route::{self, Route, RouteConfig};
use crate::routes_file;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// An ordered list of compiled routes.
///
/// Matching walks the routes in declaration order and the first route whose
/// method and pattern both match wins, so more specific routes must be declared
/// first.
pub struct Matcher<Req, Res> {
    routes: Vec<Arc<Route<Req, Res>>>,
}

/// A successful match
pub struct RouteMatch<Req, Res> {
    path: String,
    params: Params,
    route: Arc<Route<Req, Res>>,
}

impl<Req, Res> Matcher<Req, Res> {
    /// Compiles every descriptor, the first invalid descriptor fails the whole build
    pub fn build<I, D>(descriptors: I) -> Result<Self, RouteError>
    where
        I: IntoIterator<Item = D>,
        D: Into<RouteDescriptor<Req, Res>>,
    {
        let routes = descriptors
            .into_iter()
            .map(|descriptor| route::normalize(descriptor.into()).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        info!(routes = routes.len(), "built route matcher");
        Ok(Self { routes })
    }

    /// Reads a route file and builds a matcher from it, see [`routes_file`](crate::routes_file)
    pub async fn build_from_file(path: impl AsRef<Path>) -> Result<Self, RouteError> {
        let descriptors = routes_file::read(path.as_ref()).await?;
        Self::build(descriptors)
    }

    /// Finds the first route matching `path` and `method`, a `None` method matches any route.
    ///
    /// Fails when a captured value of the first matching route cannot be decoded, later
    /// routes are not tried in that case.
    pub fn match_route(&self, path: &str, method: Option<&str>) -> Result<Option<RouteMatch<Req, Res>>, RouteError> {
        for route in &self.routes {
            if let Some((matched, params)) = route.exec(path, method)? {
                return Ok(Some(RouteMatch { path: matched, params, route: Arc::clone(route) }));
            }
        }
        Ok(None)
    }

    pub fn routes(&self) -> &[Arc<Route<Req, Res>>] {
        &self.routes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<Req, Res> fmt::Debug for Matcher<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.routes.iter().map(|route| route.pattern().source())).finish()
    }
}

impl<Req, Res> RouteMatch<Req, Res> {
    /// The part of the path matched by the route pattern
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn config(&self) -> &Arc<RouteConfig> {
        self.route.config()
    }

    pub fn route(&self) -> &Arc<Route<Req, Res>> {
        &self.route
    }
}

impl<Req: Send + 'static, Res: Send + 'static> RouteMatch<Req, Res> {
    /// Resolves the route chain and runs it
    pub async fn invoke(&self, loader: &SharedLoader<Req, Res>, req: &mut Req, res: &mut Res) -> Result<Flow, InvokeError> {
        let chain = self.route.resolve(loader).await.map_err(InvokeError::Unresolved)?;
        chain.invoke(req, res).await.map_err(InvokeError::Step)
    }
}

impl<Req, Res> Clone for RouteMatch<Req, Res> {
    fn clone(&self) -> Self {
        Self { path: self.path.clone(), params: self.params.clone(), route: Arc::clone(&self.route) }
    }
}

impl<Req, Res> fmt::Debug for RouteMatch<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch")
            .field("path", &self.path)
            .field("params", &self.params)
            .field("config", self.config())
            .finish()
    }
}
