//! The action value
//!
//! An [`Action`] is a cheaply clonable, type-erased async function of a
//! [`Context`]. Actions are built eagerly and run lazily; running the same
//! action twice runs its effects twice.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use super::context::Context;
use super::error::ActionError;

/// Result of running an action
pub type ActionResult<T = ()> = Result<T, ActionError>;

type ActionFn = dyn Fn(Context) -> BoxFuture<'static, ActionResult> + Send + Sync;

#[derive(Clone)]
pub struct Action {
    label: Option<Arc<str>>,
    body: Arc<ActionFn>,
}

impl Action {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ActionResult> + Send + 'static,
    {
        Self {
            label: None,
            body: Arc::new(move |ctx| f(ctx).boxed()),
        }
    }

    /// An action that always succeeds
    pub fn ok() -> Self {
        Self::new(|_| async { Ok(()) })
    }

    /// An action that always fails with `err`
    pub fn fail(err: ActionError) -> Self {
        Self::new(move |_| {
            let err = err.clone();
            async move { Err(err) }
        })
    }

    /// Diagnostic label, set by combinators that name their result
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub(crate) fn with_label(mut self, label: impl Into<Arc<str>>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub async fn run(&self, ctx: &Context) -> ActionResult {
        (self.body)(ctx.clone()).await
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}
