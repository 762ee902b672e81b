use crate::handler::{Flow, RequestHandler, SharedHandler, StepResult};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// An ordered list of steps composed into a single handler.
///
/// Steps run strictly one after another. The first error stops the chain and is
/// returned as is, a step returning [`Flow::Halt`] stops the chain without an error.
/// When every step continues, the chain itself resolves to [`Flow::Continue`] so the
/// caller's own continuation runs.
pub struct Chain<Req, Res> {
    steps: Arc<[SharedHandler<Req, Res>]>,
}

impl<Req, Res> Chain<Req, Res> {
    /// Composes the steps, returns `None` when there is nothing to run
    pub fn build(steps: Vec<SharedHandler<Req, Res>>) -> Option<Self> {
        if steps.is_empty() {
            return None;
        }
        Some(Self { steps: steps.into() })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[SharedHandler<Req, Res>] {
        &self.steps
    }
}

impl<Req, Res> Clone for Chain<Req, Res> {
    fn clone(&self) -> Self {
        Self { steps: Arc::clone(&self.steps) }
    }
}

impl<Req, Res> fmt::Debug for Chain<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain").field("steps", &self.steps.len()).finish()
    }
}

#[async_trait]
impl<Req: Send, Res: Send> RequestHandler<Req, Res> for Chain<Req, Res> {
    async fn invoke(&self, req: &mut Req, res: &mut Res) -> StepResult {
        for step in self.steps.iter() {
            if step.invoke(req, res).await? == Flow::Halt {
                return Ok(Flow::Halt);
            }
        }
        Ok(Flow::Continue)
    }
}
