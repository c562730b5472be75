//! Polling and sleeping under a context
//!
//! [`poll`] repeats a probe until it succeeds, the deadline fires, or the
//! probe asks to stop with a poll break.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

use super::context::Context;
use super::error::{ActionError, ErrorKind};
use super::action::ActionResult;

/// Default polling interval
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(300);

/// Default timeout for waiting operations
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout and interval for a polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Upper bound on the whole loop; `None` means only the context deadline applies
    pub timeout: Option<Duration>,
    /// Pause between two probes
    pub interval: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_TIMEOUT),
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl PollOptions {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            interval,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Same interval, bounded only by the context deadline
    pub fn unbounded(mut self) -> Self {
        self.timeout = None;
        self
    }

    fn bound(&self, ctx: &Context) -> Context {
        match self.timeout {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx.clone(),
        }
    }
}

/// Run `probe` until it succeeds.
///
/// A poll-break error or a non-retryable error (cancellation, caller error)
/// is returned as-is. When the deadline passes, the last probe error is
/// returned wrapped as a timeout.
pub async fn poll<T, F, Fut>(ctx: &Context, opts: &PollOptions, mut probe: F) -> ActionResult<T>
where
    F: FnMut(Context) -> Fut,
    Fut: Future<Output = ActionResult<T>>,
{
    let ctx = opts.bound(ctx);
    let start = Instant::now();
    let mut last: Option<ActionError> = None;
    let mut attempt = 0u32;

    loop {
        if let Err(err) = ctx.err() {
            return Err(expired(err, last, start));
        }
        attempt += 1;

        let err = match ctx.guard(probe(ctx.clone())).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if err.is_poll_break() {
            return Err(err.clear_poll_break());
        }
        if ctx.is_cancelled() {
            return Err(ActionError::cancelled());
        }
        if !err.kind().is_retryable() {
            return Err(err);
        }
        // A bare deadline error from the guard says nothing about the probe
        let err = if err.is_deadline_exceeded() {
            last.take().unwrap_or(err)
        } else {
            err
        };
        if ctx.is_expired() {
            return Err(ActionError::timed_out(err, start.elapsed()));
        }
        trace!(attempt, error = %err, "poll attempt failed");
        last = Some(err);

        if let Err(err) = sleep(&ctx, opts.interval).await {
            return Err(expired(err, last, start));
        }
    }
}

/// Turn a context error seen by a waiting loop into the error it reports
pub(crate) fn expired(err: ActionError, last: Option<ActionError>, start: Instant) -> ActionError {
    match (err.kind(), last) {
        (ErrorKind::Cancelled, _) => err,
        (_, Some(last)) => ActionError::timed_out(last, start.elapsed()),
        (_, None) => err,
    }
}

/// Sleep for `duration` unless the context is cancelled or expires first
pub async fn sleep(ctx: &Context, duration: Duration) -> ActionResult {
    ctx.guard(async {
        tokio::time::sleep(duration).await;
        Ok::<(), ActionError>(())
    })
    .await
}
