//! A declarative, first-match HTTP request router.
//!
//! Routes are described by [`RouteDescriptor`]s, either in the shorthand form
//! `"GET,POST /users/:id => ./users#show"` or built field by field, and compiled into a
//! [`Matcher`]. For a path and a method the matcher returns the first route that
//! accepts both, with the decoded path params and the route config.
//!
//! Every route runs a [`Chain`]: its middleware followed by its handler. Handlers can be
//! given directly or as a module reference which is loaded through a [`ModuleLoader`]
//! the first time the route runs. Concurrent first runs share one load and the outcome,
//! failures included, is kept for the lifetime of the route.
//!
//! The router is agnostic of the host server: request and response are opaque type
//! parameters handed to every step.
//!
//! # Example
//!
//! ```
//! use futures::FutureExt;
//! use meta_router::{Flow, RouteDescriptor, Router, RouterOptions, SharedHandler, handler_fn};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let show: SharedHandler<Vec<String>, String> = Arc::new(handler_fn(|_req: &mut Vec<String>, res: &mut String| {
//!         async move {
//!             res.push_str("user");
//!             Ok(Flow::Halt)
//!         }
//!         .boxed()
//!     }));
//!
//!     let router = Router::new();
//!     router.configure(RouterOptions::new([RouteDescriptor::new("GET /users/:id").handler(show)]))?;
//!
//!     let matched = router.find("/users/42", Some("GET"))?.expect("route matches");
//!     assert_eq!(matched.params().get_str("id"), Some("42"));
//!
//!     let mut res = String::new();
//!     router.invoke(&matched, &mut vec![], &mut res).await?;
//!     assert_eq!(res, "user");
//!     Ok(())
//! }
//! ```

mod chain;
mod descriptor;
mod error;
mod handler;
mod matcher;
mod method;
mod module;
mod params;
mod request;
mod route;
mod router;

pub mod pattern;
pub mod routes_file;

pub use chain::Chain;
pub use descriptor::{HandlerRef, MiddlewareSpec, RouteDescriptor};
pub use error::{BoxError, InvokeError, RouteError, RoutesFileError};
pub use handler::{FnHandler, Flow, RequestHandler, RouteHandler, SharedHandler, StepResult, handler_fn};
pub use matcher::{Matcher, RouteMatch};
pub use method::MethodSet;
pub use module::{
    AsyncFnLoader, Export, FnLoader, Module, ModuleLoader, ModuleRef, NoopLoader, SharedFactory, SharedLoader,
    async_loader_fn, loader_fn,
};
pub use params::{ParamValue, Params};
pub use pattern::{MatchOptions, ParamKey};
pub use request::RouteRequest;
pub use route::{HandlerState, Resolution, Route, RouteConfig};
pub use router::{Router, RouterOptions};
