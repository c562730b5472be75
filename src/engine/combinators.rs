//! Higher-order actions
//!
//! Sequencing, naming, bounded retries, condition-driven retries and
//! conditional branching. Every combinator checks the context before each
//! child runs, so cancellation stops a sequence between steps.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::action::{Action, ActionResult};
use super::context::Context;
use super::error::{ActionError, ErrorKind};
use super::poll::{self, PollOptions};

/// Run `steps` in order, stopping at the first failure.
///
/// A failing step's error is labelled `"<name> (step i/n)"`.
pub fn combine<I>(name: impl Into<String>, steps: I) -> Action
where
    I: IntoIterator<Item = Action>,
{
    let name: Arc<str> = name.into().into();
    let steps: Arc<[Action]> = steps.into_iter().collect();
    let label = name.clone();

    Action::new(move |ctx| {
        let name = name.clone();
        let steps = steps.clone();
        async move {
            let total = steps.len();
            for (i, step) in steps.iter().enumerate() {
                let tag = || format!("{} (step {}/{})", name, i + 1, total);
                ctx.err().map_err(|e| e.with_label(tag()))?;
                debug!(action = %name, step = i + 1, total, "running step");
                step.run(&ctx).await.map_err(|e| e.with_label(tag()))?;
            }
            Ok(())
        }
    })
    .with_label(label)
}

/// Attach a label to an action: logged at start, pushed onto its error chain
pub fn named(name: impl Into<String>, action: Action) -> Action {
    let name: Arc<str> = name.into().into();
    let label = name.clone();

    Action::new(move |ctx| {
        let name = name.clone();
        let action = action.clone();
        async move {
            let ctx = ctx.named(&name);
            info!(scope = ctx.scope(), "Start action: {}", name);
            action
                .run(&ctx)
                .await
                .map_err(|e| e.with_label(name.to_string()))
        }
    })
    .with_label(label)
}

/// Run `action` up to `attempts` times back to back
pub fn retry(attempts: usize, action: Action) -> Action {
    retry_inner(attempts, action, Duration::ZERO, false)
}

/// Like [`retry`] but intermediate failures are only logged at debug level
pub fn retry_silently(attempts: usize, action: Action) -> Action {
    retry_inner(attempts, action, Duration::ZERO, true)
}

/// Like [`retry`] with a pause of `interval` between attempts
pub fn retry_with_interval(attempts: usize, action: Action, interval: Duration) -> Action {
    retry_inner(attempts, action, interval, false)
}

pub(crate) fn retry_inner(
    attempts: usize,
    action: Action,
    interval: Duration,
    silent: bool,
) -> Action {
    Action::new(move |ctx| {
        let action = action.clone();
        async move {
            if attempts == 0 {
                return Err(ActionError::caller("retry needs at least one attempt"));
            }

            let mut last = None;
            for attempt in 1..=attempts {
                ctx.err()?;
                let err = match action.run(&ctx).await {
                    Ok(()) => return Ok(()),
                    Err(err) => err,
                };
                if !err.kind().is_retryable() {
                    return Err(err);
                }
                if silent {
                    debug!("Attempt {}/{} failed: {}", attempt, attempts, err);
                } else {
                    warn!("Attempt {}/{} failed: {}", attempt, attempts, err);
                }
                last = Some(err);
                if attempt < attempts && !interval.is_zero() {
                    poll::sleep(&ctx, interval).await?;
                }
            }
            Err(last.unwrap_or_else(|| ActionError::caller("retry ran no attempts")))
        }
    })
}

/// Run `action` once; then, until `condition` succeeds, wait one interval,
/// check `condition` and redo `action` if it fails.
///
/// Failure of the initial run is fatal.
pub fn retry_until(action: Action, condition: Action, opts: PollOptions) -> Action {
    Action::new(move |ctx| {
        let action = action.clone();
        let condition = condition.clone();
        async move {
            action
                .run(&ctx)
                .await
                .map_err(|e| e.with_label("failed to initially do action"))?;
            poll::sleep(&ctx, opts.interval).await?;

            poll::poll(&ctx, &opts, |ctx| {
                let action = action.clone();
                let condition = condition.clone();
                async move {
                    let err = match condition.run(&ctx).await {
                        Ok(()) => return Ok(()),
                        Err(err) => err,
                    };
                    if !err.kind().is_retryable() {
                        return Err(err);
                    }
                    action
                        .run(&ctx)
                        .await
                        .map_err(|e| e.with_label("failed to redo action"))?;
                    Err(err.with_label("action has been done but condition is not met"))
                }
            })
            .await
        }
    })
}

/// Run `then` only if `probe` succeeds; a failing probe is swallowed
pub fn if_success_then(probe: Action, then: Action) -> Action {
    Action::new(move |ctx| {
        let probe = probe.clone();
        let then = then.clone();
        async move {
            match probe.run(&ctx).await {
                Ok(()) => then.run(&ctx).await,
                Err(err) if err.kind() == ErrorKind::Cancelled => Err(err),
                Err(err) => {
                    debug!("Probe failed, skipping: {}", err);
                    Ok(())
                }
            }
        }
    })
}

/// Run `then` only if `probe` fails; a successful probe short-circuits
pub fn if_fail_then(probe: Action, then: Action) -> Action {
    Action::new(move |ctx| {
        let probe = probe.clone();
        let then = then.clone();
        async move {
            match probe.run(&ctx).await {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == ErrorKind::Cancelled => Err(err),
                Err(err) => {
                    debug!("Probe failed, running fallback: {}", err);
                    then.run(&ctx).await
                }
            }
        }
    })
}

/// An action that sleeps for `duration`
pub fn sleep(duration: Duration) -> Action {
    Action::new(move |ctx| async move { poll::sleep(&ctx, duration).await })
}

/// Run `action` exactly `times` times, stopping at the first failure
pub fn repeat(times: usize, action: Action) -> Action {
    Action::new(move |ctx| {
        let action = action.clone();
        async move {
            for i in 0..times {
                ctx.err()?;
                action
                    .run(&ctx)
                    .await
                    .map_err(|e| e.with_label(format!("repetition {}/{}", i + 1, times)))?;
            }
            Ok(())
        }
    })
}

/// Run an action bounded by `timeout`
pub fn with_timeout(timeout: Duration, action: Action) -> Action {
    Action::new(move |ctx: Context| {
        let action = action.clone();
        async move {
            let start = Instant::now();
            let ctx = ctx.with_timeout(timeout);
            let res: ActionResult = action.run(&ctx).await;
            res.map_err(|e| {
                if e.is_deadline_exceeded() {
                    ActionError::timed_out(e, start.elapsed())
                } else {
                    e
                }
            })
        }
    })
}
