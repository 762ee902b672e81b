//! One-time handler resolution for routes whose handler is a module reference.

use crate::chain::Chain;
use crate::error::RouteError;
use crate::handler::SharedHandler;
use crate::module::{ModuleRef, SharedLoader};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// The outcome of resolving a route handler, shared by every caller
pub type Resolution<Req, Res> = Result<Chain<Req, Res>, Arc<RouteError>>;

type PendingLoad<Req, Res> = Shared<BoxFuture<'static, Resolution<Req, Res>>>;

/// Observable state of a route handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerState {
    Unresolved,
    Loading,
    Resolved,
    Failed,
}

pub(crate) enum HandlerSlot<Req, Res> {
    Ready(Chain<Req, Res>),
    Deferred(Deferred<Req, Res>),
}

pub(crate) struct Deferred<Req, Res> {
    module: ModuleRef,
    middleware: Vec<SharedHandler<Req, Res>>,
    loading: Arc<AtomicBool>,
    outcome: Arc<OnceCell<Resolution<Req, Res>>>,
    pending: Mutex<Option<PendingLoad<Req, Res>>>,
}

impl<Req, Res> HandlerSlot<Req, Res> {
    pub(crate) fn deferred(module: ModuleRef, middleware: Vec<SharedHandler<Req, Res>>) -> Self {
        HandlerSlot::Deferred(Deferred {
            module,
            middleware,
            loading: Arc::new(AtomicBool::new(false)),
            outcome: Arc::new(OnceCell::new()),
            pending: Mutex::new(None),
        })
    }

    pub(crate) fn state(&self) -> HandlerState {
        match self {
            HandlerSlot::Ready(_) => HandlerState::Resolved,
            HandlerSlot::Deferred(deferred) => match deferred.outcome.get() {
                Some(Ok(_)) => HandlerState::Resolved,
                Some(Err(_)) => HandlerState::Failed,
                None if deferred.loading.load(Ordering::Acquire) => HandlerState::Loading,
                None => HandlerState::Unresolved,
            },
        }
    }

    pub(crate) fn module(&self) -> Option<&ModuleRef> {
        match self {
            HandlerSlot::Ready(_) => None,
            HandlerSlot::Deferred(deferred) => Some(&deferred.module),
        }
    }
}

impl<Req: 'static, Res: 'static> HandlerSlot<Req, Res> {
    /// Returns the chain, loading the handler module on first use.
    ///
    /// The load runs as its own task on the current tokio runtime, so a caller
    /// that goes away mid-load neither cancels it nor causes a second load.
    /// Concurrent callers wait on the same load. The outcome is kept for the
    /// lifetime of the slot, failures included.
    pub(crate) async fn resolve(&self, loader: &SharedLoader<Req, Res>) -> Resolution<Req, Res> {
        let deferred = match self {
            HandlerSlot::Ready(chain) => return Ok(chain.clone()),
            HandlerSlot::Deferred(deferred) => deferred,
        };

        if let Some(resolution) = deferred.outcome.get() {
            if let Err(e) = resolution {
                warn!(module = %deferred.module, cause = %e, "route handler failed to resolve earlier");
            }
            return resolution.clone();
        }

        deferred.pending(loader).await
    }
}

impl<Req: 'static, Res: 'static> Deferred<Req, Res> {
    fn pending(&self, loader: &SharedLoader<Req, Res>) -> PendingLoad<Req, Res> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.get_or_insert_with(|| self.spawn(loader)).clone()
    }

    fn spawn(&self, loader: &SharedLoader<Req, Res>) -> PendingLoad<Req, Res> {
        self.loading.store(true, Ordering::Release);

        let load = Load {
            module: self.module.clone(),
            middleware: self.middleware.clone(),
            loader: Arc::clone(loader),
            loading: LoadingGuard(Arc::clone(&self.loading)),
            outcome: Arc::clone(&self.outcome),
        };
        let task = tokio::spawn(load.run());

        let module = self.module.clone();
        let outcome = Arc::clone(&self.outcome);
        async move {
            task.await.unwrap_or_else(|e| {
                warn!(module = %module, cause = %e, "route handler load was aborted");
                let failed: Resolution<Req, Res> = Err(Arc::new(RouteError::loader_failure(module.id(), e)));
                let _ = outcome.set(failed.clone());
                outcome.get().cloned().unwrap_or(failed)
            })
        }
        .boxed()
        .shared()
    }
}

/// Clears the loading flag once the load task ends, however it ends
struct LoadingGuard(Arc<AtomicBool>);

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct Load<Req, Res> {
    module: ModuleRef,
    middleware: Vec<SharedHandler<Req, Res>>,
    loader: SharedLoader<Req, Res>,
    loading: LoadingGuard,
    outcome: Arc<OnceCell<Resolution<Req, Res>>>,
}

impl<Req, Res> Load<Req, Res> {
    async fn run(self) -> Resolution<Req, Res> {
        debug!(module = %self.module, "resolving route handler");

        let resolution = match self.loader.load(self.module.id()).await {
            Ok(export) => self.module.pick(&export).and_then(|handler| self.compose(handler)),
            Err(e) => Err(RouteError::loader_failure(self.module.id(), e)),
        };
        let resolution = resolution.map_err(|e| {
            warn!(module = %self.module, cause = %e, "failed to resolve route handler");
            Arc::new(e)
        });

        // published before the guard clears the loading flag
        let _ = self.outcome.set(resolution.clone());
        drop(self.loading);
        resolution
    }

    fn compose(&self, handler: SharedHandler<Req, Res>) -> Result<Chain<Req, Res>, RouteError> {
        let mut steps = Vec::with_capacity(self.middleware.len() + handler.route_middleware().len() + 1);
        steps.extend(self.middleware.iter().cloned());
        steps.extend(handler.route_middleware().iter().cloned());
        steps.push(handler);

        Chain::build(steps).ok_or_else(|| RouteError::invalid_handler(self.module.id(), self.module.export()))
    }
}

impl<Req, Res> fmt::Debug for HandlerSlot<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerSlot::Ready(chain) => f.debug_tuple("Ready").field(chain).finish(),
            HandlerSlot::Deferred(deferred) => f
                .debug_struct("Deferred")
                .field("module", &deferred.module)
                .field("middleware", &deferred.middleware.len())
                .field("state", &self.state())
                .finish(),
        }
    }
}
