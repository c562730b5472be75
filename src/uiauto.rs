//! UI automation context
//!
//! A [`UiContext`] pairs a driver with default polling options and builds
//! actions over finders. Waiting operations are bounded by the context's
//! timeout or the caller's deadline, whichever is smaller.
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use ui_actions::prelude::*;
//!
//! # async fn demo(driver: Arc<dyn Driver>) -> ActionResult {
//! let ui = UiContext::new(driver);
//! let dialog = finder::role(Role::Dialog).name("Sign out");
//! let confirm = finder::name("Sign out").role(Role::Button).ancestor(&dialog);
//!
//! let sign_out = named(
//!     "sign out",
//!     combine(
//!         "confirm dialog",
//!         vec![
//!             ui.with_timeout(Duration::from_secs(5)).wait_until_exists(&dialog),
//!             ui.left_click(&confirm),
//!             ui.wait_until_gone(&dialog),
//!         ],
//!     ),
//! );
//! sign_out.run(&Context::new()).await
//! # }
//! ```

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::time::Instant;
use tracing::debug;

use crate::config::EngineConfig;
use crate::driver::{Driver, MouseClick, NodeInfo, Point, Rect, ScrollDirection};
use crate::engine::action::{Action, ActionResult};
use crate::engine::combinators;
use crate::engine::context::Context;
use crate::engine::error::{ActionError, ErrorKind};
use crate::engine::poll::{self, expired, poll, PollOptions};
use crate::finder::{Checked, Finder, Restriction, State};

/// Delivers one press (click or tap) at a screen point
pub type Press = Arc<dyn Fn(Context, Point) -> BoxFuture<'static, ActionResult> + Send + Sync>;

#[derive(Clone)]
pub struct UiContext {
    driver: Arc<dyn Driver>,
    opts: PollOptions,
}

impl fmt::Debug for UiContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiContext")
            .field("opts", &self.opts)
            .finish_non_exhaustive()
    }
}

/// Steps of the click-until loop
enum ClickUntil {
    Idle,
    Clicked,
    Checked(ActionResult),
    Done,
    Failed(ActionError),
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl UiContext {
    /// A context with the default 15s timeout and 300ms interval
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self {
            driver,
            opts: PollOptions::default(),
        }
    }

    pub fn from_config(driver: Arc<dyn Driver>, config: &EngineConfig) -> Self {
        Self {
            driver,
            opts: config.poll_options(),
        }
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_poll_opts(self.opts.with_timeout(timeout))
    }

    pub fn with_interval(&self, interval: Duration) -> Self {
        self.with_poll_opts(self.opts.with_interval(interval))
    }

    pub fn with_poll_opts(&self, opts: PollOptions) -> Self {
        Self {
            driver: self.driver.clone(),
            opts,
        }
    }

    pub fn poll_opts(&self) -> PollOptions {
        self.opts
    }

    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    fn bounded(&self, ctx: &Context) -> Context {
        match self.opts.timeout {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx.clone(),
        }
    }

    /// Build an action from a body that gets this context and a finder
    fn finder_action<F, Fut>(&self, finder: &Finder, body: F) -> Action
    where
        F: Fn(UiContext, Finder, Context) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ActionResult> + Send + 'static,
    {
        let ui = self.clone();
        let finder = finder.clone();
        Action::new(move |ctx| body(ui.clone(), finder.clone(), ctx))
    }

    // One-shot queries

    /// Properties of the unique node `finder` designates. Not polled.
    pub async fn info(&self, ctx: &Context, finder: &Finder) -> ActionResult<NodeInfo> {
        ctx.guard(self.driver.snapshot(finder))
            .await
            .map_err(|e| e.with_finder(finder))
    }

    /// Properties of every match, possibly none
    pub async fn nodes_info(&self, ctx: &Context, finder: &Finder) -> ActionResult<Vec<NodeInfo>> {
        ctx.guard(self.driver.snapshot_all(finder))
            .await
            .map_err(|e| e.with_finder(finder))
    }

    pub async fn is_node_found(&self, ctx: &Context, finder: &Finder) -> ActionResult<bool> {
        Ok(!self.nodes_info(ctx, finder).await?.is_empty())
    }

    /// Location as currently reported, without waiting for it to settle
    pub async fn immediate_location(&self, ctx: &Context, finder: &Finder) -> ActionResult<Rect> {
        ctx.guard(self.driver.location(finder))
            .await
            .map_err(|e| e.with_finder(finder))
    }

    /// Location once two consecutive snapshots agree
    pub async fn location(&self, ctx: &Context, finder: &Finder) -> ActionResult<Rect> {
        let previous: Mutex<Option<Rect>> = Mutex::new(None);
        let previous = &previous;
        poll(ctx, &self.opts, |ctx| async move {
            let current = match self.immediate_location(&ctx, finder).await {
                Ok(rect) => rect,
                Err(err) => {
                    *lock(previous) = None;
                    return Err(err);
                }
            };
            if lock(previous).replace(current) == Some(current) {
                Ok(current)
            } else {
                Err(ActionError::state_mismatch("node has not stopped changing location")
                    .with_finder(finder))
            }
        })
        .await
    }

    async fn check_exists(&self, ctx: &Context, finder: &Finder) -> ActionResult {
        if self.is_node_found(ctx, finder).await? {
            Ok(())
        } else {
            Err(ActionError::not_found(format!(
                "failed to find node with properties: {}",
                finder
            ))
            .with_finder(finder))
        }
    }

    async fn check_gone(&self, ctx: &Context, finder: &Finder) -> ActionResult {
        if self.is_node_found(ctx, finder).await? {
            Err(ActionError::state_mismatch("node still exists").with_finder(finder))
        } else {
            Ok(())
        }
    }

    // Existence

    /// Succeeds iff at least one node matches right now
    pub fn exists(&self, finder: &Finder) -> Action {
        self.finder_action(finder, |ui, finder, ctx| async move {
            ui.check_exists(&ctx, &finder).await
        })
    }

    /// Succeeds iff no node matches right now
    pub fn gone(&self, finder: &Finder) -> Action {
        self.finder_action(finder, |ui, finder, ctx| async move {
            ui.check_gone(&ctx, &finder).await
        })
    }

    pub fn wait_until_exists(&self, finder: &Finder) -> Action {
        self.finder_action(finder, |ui, finder, ctx| async move {
            let (ui, finder) = (&ui, &finder);
            poll(&ctx, &ui.opts, |ctx| async move { ui.check_exists(&ctx, finder).await }).await
        })
    }

    pub fn wait_until_gone(&self, finder: &Finder) -> Action {
        self.finder_action(finder, |ui, finder, ctx| async move {
            let (ui, finder) = (&ui, &finder);
            poll(&ctx, &ui.opts, |ctx| async move { ui.check_gone(&ctx, finder).await }).await
        })
    }

    /// Require the node to stay absent for `duration`. Fails as soon as it
    /// appears.
    pub fn ensure_gone_for(&self, finder: &Finder, duration: Duration) -> Action {
        self.finder_action(finder, move |ui, finder, ctx| async move {
            let opts = PollOptions {
                timeout: ui.opts.timeout.map(|t| t.max(duration + ui.opts.interval)),
                interval: ui.opts.interval,
            };
            let start = Instant::now();
            let (ui, finder) = (&ui, &finder);
            poll(&ctx, &opts, |ctx| async move {
                match ui.check_exists(&ctx, finder).await {
                    Ok(()) => Err(ActionError::state_mismatch("node appeared when it should not")
                        .with_finder(finder)
                        .into_poll_break()),
                    Err(err) if err.kind() == ErrorKind::NotFound => {
                        if start.elapsed() >= duration {
                            Ok(())
                        } else {
                            Err(ActionError::state_mismatch(format!(
                                "node has been gone for {:?} of {:?}",
                                start.elapsed(),
                                duration
                            )))
                        }
                    }
                    Err(err) => Err(err),
                }
            })
            .await
        })
    }

    /// Poll until the node's location stops changing
    pub fn wait_for_location(&self, finder: &Finder) -> Action {
        self.finder_action(finder, |ui, finder, ctx| async move {
            ui.location(&ctx, &finder).await.map(|_| ())
        })
    }

    // Pointer

    async fn click_node(&self, ctx: &Context, finder: &Finder, click: MouseClick, settle: bool) -> ActionResult {
        let rect = if settle {
            self.location(ctx, finder).await?
        } else {
            self.immediate_location(ctx, finder).await?
        };
        debug!("{:?} click at {} on {}", click, rect.center_point(), finder);
        ctx.guard(self.driver.mouse_click(rect.center_point(), click)).await
    }

    fn click(&self, finder: &Finder, click: MouseClick, settle: bool) -> Action {
        self.finder_action(finder, move |ui, finder, ctx| async move {
            ui.click_node(&ctx, &finder, click, settle).await
        })
    }

    /// Left click at the center of the node once its location has settled
    pub fn left_click(&self, finder: &Finder) -> Action {
        self.click(finder, MouseClick::Left, true)
    }

    pub fn right_click(&self, finder: &Finder) -> Action {
        self.click(finder, MouseClick::Right, true)
    }

    pub fn double_click(&self, finder: &Finder) -> Action {
        self.click(finder, MouseClick::Double, true)
    }

    /// Left click at the node's current location without waiting for it to settle
    pub fn immediate_left_click(&self, finder: &Finder) -> Action {
        self.click(finder, MouseClick::Left, false)
    }

    pub fn mouse_click_at(&self, point: Point, click: MouseClick) -> Action {
        let driver = self.driver.clone();
        Action::new(move |ctx| {
            let driver = driver.clone();
            async move { ctx.guard(driver.mouse_click(point, click)).await }
        })
    }

    /// Left click the node until `condition` holds
    pub fn left_click_until(&self, finder: &Finder, condition: Action) -> Action {
        let driver = self.driver.clone();
        let press: Press = Arc::new(move |ctx, point| {
            let driver = driver.clone();
            async move { ctx.guard(driver.mouse_click(point, MouseClick::Left)).await }.boxed()
        });
        self.press_until(finder, condition, press)
    }

    /// Press the node with `press` until `condition` holds.
    ///
    /// The condition is checked one interval after every press, never before
    /// the first one. The first press waits for a settled location and its
    /// failure is fatal; later presses use the immediate location.
    pub fn press_until(&self, finder: &Finder, condition: Action, press: Press) -> Action {
        self.finder_action(finder, move |ui, finder, ctx| {
            let condition = condition.clone();
            let press = press.clone();
            async move { ui.run_press_until(&ctx, &finder, &condition, &press).await }
        })
    }

    async fn run_press_until(
        &self,
        ctx: &Context,
        finder: &Finder,
        condition: &Action,
        press: &Press,
    ) -> ActionResult {
        let ctx = self.bounded(ctx);
        let start = Instant::now();
        let mut presses = 0u32;
        let mut last: Option<ActionError> = None;
        let mut state = ClickUntil::Idle;

        loop {
            state = match state {
                ClickUntil::Idle => {
                    let located = if presses == 0 {
                        self.location(&ctx, finder).await
                    } else {
                        self.immediate_location(&ctx, finder).await
                    };
                    let pressed = match located {
                        Ok(rect) => press(ctx.clone(), rect.center_point()).await,
                        Err(err) => Err(err),
                    };
                    match pressed {
                        Ok(()) => {
                            presses += 1;
                            debug!(presses, "pressed {}", finder);
                            ClickUntil::Clicked
                        }
                        Err(err) if presses == 0 => {
                            ClickUntil::Failed(err.with_label("failed to initially click the node"))
                        }
                        Err(err) if !err.kind().is_retryable() => ClickUntil::Failed(err),
                        Err(err) => {
                            last = Some(err);
                            ClickUntil::Clicked
                        }
                    }
                }
                ClickUntil::Clicked => match poll::sleep(&ctx, self.opts.interval).await {
                    Err(err) => ClickUntil::Failed(expired(err, last.take(), start)),
                    Ok(()) => ClickUntil::Checked(condition.run(&ctx).await),
                },
                ClickUntil::Checked(Ok(())) => ClickUntil::Done,
                ClickUntil::Checked(Err(err)) => {
                    let err = if err.is_deadline_exceeded() {
                        last.take().unwrap_or(err)
                    } else {
                        err
                    };
                    if ctx.is_cancelled() {
                        ClickUntil::Failed(ActionError::cancelled())
                    } else if !err.kind().is_retryable() {
                        ClickUntil::Failed(err)
                    } else if ctx.is_expired() {
                        ClickUntil::Failed(ActionError::timed_out(err, start.elapsed()))
                    } else {
                        last = Some(err);
                        ClickUntil::Idle
                    }
                }
                ClickUntil::Done => return Ok(()),
                ClickUntil::Failed(err) => return Err(err),
            };
        }
    }

    // Retries bound to this context

    /// Up to `attempts` runs of `action`, one interval apart
    pub fn retry(&self, attempts: usize, action: Action) -> Action {
        combinators::retry_inner(attempts, action, self.opts.interval, false)
    }

    pub fn retry_silently(&self, attempts: usize, action: Action) -> Action {
        combinators::retry_inner(attempts, action, self.opts.interval, true)
    }

    pub fn retry_until(&self, action: Action, condition: Action) -> Action {
        combinators::retry_until(action, condition, self.opts)
    }

    // Accessibility actions

    /// Invoke the node's default action, polling until the node can be found
    pub fn do_default(&self, finder: &Finder) -> Action {
        self.finder_action(finder, |ui, finder, ctx| async move {
            let (ui, finder) = (&ui, &finder);
            poll(&ctx, &ui.opts, |ctx| async move {
                ctx.guard(ui.driver.do_default(finder))
                    .await
                    .map_err(|e| e.with_finder(finder))
            })
            .await
        })
    }

    pub fn do_default_until(&self, finder: &Finder, condition: Action) -> Action {
        self.retry_until(self.do_default(finder), condition)
    }

    /// Focus the node and wait until it reports the focused state
    pub fn focus_and_wait(&self, finder: &Finder) -> Action {
        self.finder_action(finder, |ui, finder, ctx| async move {
            ui.run_focus_and_wait(&ctx, &finder).await
        })
    }

    async fn run_focus_and_wait(&self, ctx: &Context, finder: &Finder) -> ActionResult {
        poll(ctx, &self.opts, |ctx| async move {
            ctx.guard(self.driver.focus(finder))
                .await
                .map_err(|e| e.with_finder(finder))
        })
        .await
        .map_err(|e| e.with_label("failed to focus the node"))?;

        poll(ctx, &self.opts, |ctx| async move {
            if self.info(&ctx, finder).await?.is(State::Focused) {
                Ok(())
            } else {
                Err(ActionError::state_mismatch("node is not focused yet").with_finder(finder))
            }
        })
        .await
    }

    /// Focus the node unless it already has focus
    pub fn ensure_focused(&self, finder: &Finder) -> Action {
        self.finder_action(finder, |ui, finder, ctx| async move {
            let (ui, finder) = (&ui, &finder);
            let already = poll(&ctx, &ui.opts, |ctx| async move { ui.info(&ctx, finder).await })
                .await?
                .is(State::Focused);
            if already {
                return Ok(());
            }
            ui.run_focus_and_wait(&ctx, finder).await
        })
    }

    /// Scroll the node into the viewport and wait until it is inside
    pub fn make_visible(&self, finder: &Finder) -> Action {
        self.finder_action(finder, |ui, finder, ctx| async move {
            let (ui, finder) = (&ui, &finder);
            poll(&ctx, &ui.opts, |ctx| async move {
                ctx.guard(ui.driver.make_visible(finder))
                    .await
                    .map_err(|e| e.with_finder(finder))
            })
            .await?;

            poll(&ctx, &ui.opts, |ctx| async move {
                let viewport = ui.info(&ctx, &Finder::root()).await?.location;
                let node = ui.info(&ctx, finder).await?;
                if node.is(State::Offscreen) || !(viewport.is_empty() || viewport.contains(&node.location)) {
                    return Err(ActionError::state_mismatch(format!(
                        "node at {} is not inside the viewport {}",
                        node.location, viewport
                    ))
                    .with_finder(finder));
                }
                Ok(())
            })
            .await
        })
    }

    pub fn scroll(&self, finder: &Finder, direction: ScrollDirection) -> Action {
        self.finder_action(finder, move |ui, finder, ctx| async move {
            let (ui, finder) = (&ui, &finder);
            poll(&ctx, &ui.opts, |ctx| async move {
                ctx.guard(ui.driver.scroll(finder, direction))
                    .await
                    .map_err(|e| e.with_finder(finder))
            })
            .await
        })
    }

    // State checks

    pub fn check_restriction(&self, finder: &Finder, want: Restriction) -> Action {
        self.finder_action(finder, move |ui, finder, ctx| async move {
            let node = ui.info(&ctx, &finder).await?;
            if node.restriction == want {
                Ok(())
            } else {
                Err(ActionError::state_mismatch(format!(
                    "restriction is {}, want {}",
                    node.restriction, want
                ))
                .with_finder(&finder))
            }
        })
    }

    pub fn check_checked(&self, finder: &Finder, want: Checked) -> Action {
        self.finder_action(finder, move |ui, finder, ctx| async move {
            let node = ui.info(&ctx, &finder).await?;
            if node.checked == want {
                Ok(())
            } else {
                Err(ActionError::state_mismatch(format!(
                    "checked state is {}, want {}",
                    node.checked, want
                ))
                .with_finder(&finder))
            }
        })
    }
}
