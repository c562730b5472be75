//! Execution context carried through every action
//!
//! A [`Context`] bundles a cancellation token, an optional deadline and a
//! diagnostic scope. Derived contexts share the parent's cancellation (a
//! cancelled parent cancels every child) but never extend its deadline.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::error::ActionError;

#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
    scope: Option<Arc<str>>,
}

impl Context {
    /// A root context with no deadline
    pub fn new() -> Self {
        Self::default()
    }

    /// A child context that expires after `timeout`, or at the parent's
    /// deadline if that comes first.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// A child context that expires at `deadline`, or at the parent's
    /// deadline if that comes first.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
            scope: self.scope.clone(),
        }
    }

    /// A child context whose deadline is `reserve` earlier than this one's.
    /// Without a deadline the child only inherits cancellation.
    pub fn shorten(&self, reserve: Duration) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self
                .deadline
                .map(|d| d.checked_sub(reserve).unwrap_or_else(Instant::now)),
            scope: self.scope.clone(),
        }
    }

    /// Split off time for teardown: returns the shortened context for the
    /// main work and the context that cleanup must use. The cleanup context
    /// outlives the work context by `reserve`.
    pub fn reserve_for_cleanup(&self, reserve: Duration) -> (Context, Context) {
        (self.shorten(reserve), self.clone())
    }

    /// A context whose diagnostic scope has `label` appended
    pub fn named(&self, label: &str) -> Self {
        let scope = match &self.scope {
            Some(parent) => format!("{} > {}", parent, label),
            None => label.to_string(),
        };
        Self {
            token: self.token.clone(),
            deadline: self.deadline,
            scope: Some(scope.into()),
        }
    }

    pub fn scope(&self) -> &str {
        self.scope.as_deref().unwrap_or("")
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `None` when unbounded
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        matches!(self.deadline, Some(d) if Instant::now() >= d)
    }

    /// `Cancelled` if the context was cancelled, `Timeout` if the deadline
    /// passed, `Ok` otherwise. Cancellation wins when both hold.
    pub fn err(&self) -> Result<(), ActionError> {
        if self.is_cancelled() {
            return Err(ActionError::cancelled());
        }
        if self.is_expired() {
            return Err(ActionError::deadline_exceeded());
        }
        Ok(())
    }

    /// Resolves once the context is cancelled or its deadline passes
    pub async fn done(&self) -> ActionError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.token.cancelled() => ActionError::cancelled(),
                _ = tokio::time::sleep_until(deadline) => ActionError::deadline_exceeded(),
            },
            None => {
                self.token.cancelled().await;
                ActionError::cancelled()
            }
        }
    }

    /// Run a suspension point, abandoning it as soon as the context is
    /// cancelled or expires.
    pub async fn guard<F, T, E>(&self, fut: F) -> Result<T, ActionError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<ActionError>,
    {
        tokio::select! {
            biased;
            err = self.done() => Err(err),
            res = fut => res.map_err(Into::into),
        }
    }
}
