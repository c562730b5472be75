use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tracing::info;

use super::{DeviceMode, UiActionHandler, NEXT_TAB_ACCEL};
use crate::driver::{NodeInfo, Point};
use crate::engine::action::{Action, ActionResult};
use crate::engine::combinators::{combine, if_fail_then, named};
use crate::engine::context::Context;
use crate::engine::error::ActionError;
use crate::finder::{self, Finder, Role, State};
use crate::input::{accel_action, swipe_action, Keyboard, TouchScreen};
use crate::uiauto::{Press, UiContext};

const SWIPE_DURATION: Duration = Duration::from_millis(1500);
const TAB_SWIPE_DURATION: Duration = Duration::from_millis(500);

/// Touch variant
#[derive(Clone)]
pub struct TabletActionHandler {
    ui: UiContext,
    keyboard: Arc<dyn Keyboard>,
    touch: Arc<dyn TouchScreen>,
}

impl TabletActionHandler {
    pub fn new(ui: UiContext, keyboard: Arc<dyn Keyboard>, touch: Arc<dyn TouchScreen>) -> Self {
        Self {
            ui,
            keyboard,
            touch,
        }
    }

    fn tab_list() -> Finder {
        finder::role(Role::TabList).ancestor(&finder::role(Role::RootWebArea).name("Tab list"))
    }

    fn tabs() -> Finder {
        finder::role(Role::Tab).ancestor(&Self::tab_list())
    }

    fn press(&self) -> Press {
        let touch = self.touch.clone();
        Arc::new(move |ctx: Context, point: Point| {
            let touch = touch.clone();
            async move { ctx.guard(touch.tap(point)).await }.boxed()
        })
    }

    /// Tap the center of the node once its location has settled
    fn tap(&self, finder: &Finder) -> Action {
        let ui = self.ui.clone();
        let finder = finder.clone();
        let press = self.press();
        Action::new(move |ctx| {
            let (ui, finder, press) = (ui.clone(), finder.clone(), press.clone());
            async move {
                let rect = ui.location(&ctx, &finder).await?;
                press(ctx, rect.center_point()).await
            }
        })
    }

    /// Open the tab strip unless it is already showing
    fn show_tab_list(&self) -> Action {
        let toggle = finder::name_containing("press to toggle tab strip")
            .class_name("WebUITabCounterButton")
            .role(Role::Button)
            .first();
        let list = Self::tab_list();
        if_fail_then(
            self.ui.exists(&list),
            combine(
                "open the tab list",
                vec![self.tap(&toggle), self.ui.wait_until_exists(&list)],
            ),
        )
    }

    async fn tap_tab(&self, ctx: &Context, index: usize) -> ActionResult {
        let tab = Self::tabs().nth(index);
        let tabs = self.ui.nodes_info(ctx, &Self::tabs()).await?;
        let target = tabs.get(index).ok_or_else(|| {
            ActionError::not_found(format!("failed to find node with properties: {}", tab))
                .with_finder(&tab)
        })?;

        // Center spacing and width of two adjacent tabs that are fully on screen
        let step = tabs.windows(2).find_map(|pair| {
            let (a, b) = (&pair[0], &pair[1]);
            let distance = b.location.center_point().x - a.location.center_point().x;
            let visible = !a.is(State::Offscreen) && !b.is(State::Offscreen);
            (visible && a.location.width == b.location.width && distance > 0)
                .then_some((distance, a.location.width))
        });
        match step {
            Some((distance, width)) if target.is(State::Offscreen) || target.location.width < width => {
                self.scroll_tab_list(ctx, target, distance).await?;
                self.ui.wait_for_location(&tab).run(ctx).await?;
            }
            None if target.is(State::Offscreen) => {
                return Err(ActionError::state_mismatch(
                    "failed to find two adjacent tabs on screen to measure a swipe",
                ));
            }
            _ => {}
        }
        self.tap(&tab).run(ctx).await
    }

    /// Swipe the tab list sideways, one tab spacing per swipe, until `target`
    /// has been brought over the list's center
    async fn scroll_tab_list(&self, ctx: &Context, target: &NodeInfo, distance: i32) -> ActionResult {
        let center = self.ui.location(ctx, &Self::tab_list()).await?.center_point();
        let offset = target.location.center_point().x - center.x;
        let swipes = ((offset.abs() + distance - 1) / distance).max(1);
        // The finger moves against the direction the strip has to scroll
        let step = if offset < 0 { -distance } else { distance };
        let start = Point::new(center.x + step, center.y);
        info!("Scrolling the tab list with {} swipe(s) towards {:?}", swipes, target.name);

        let steps: Vec<Action> = (0..swipes)
            .map(|_| swipe_action(self.touch.clone(), start, center, TAB_SWIPE_DURATION))
            .collect();
        combine("scroll by multiple swipes", steps).run(ctx).await
    }

    /// Top and bottom quarter points of the screen, horizontally centered
    async fn swipe_points(&self, ctx: &Context) -> ActionResult<(Point, Point)> {
        let screen = self.ui.info(ctx, &finder::root()).await?.location;
        if screen.is_empty() {
            return Err(ActionError::state_mismatch("screen has no bounds"));
        }
        let x = screen.left + screen.width / 2;
        let upper = Point::new(x, screen.top + screen.height / 4);
        let lower = Point::new(x, screen.top + screen.height * 3 / 4);
        Ok((upper, lower))
    }

    fn swipe(&self, down: bool) -> Action {
        let handler = self.clone();
        Action::new(move |ctx| {
            let handler = handler.clone();
            async move {
                let (upper, lower) = handler.swipe_points(&ctx).await?;
                let (from, to) = if down { (lower, upper) } else { (upper, lower) };
                swipe_action(handler.touch.clone(), from, to, SWIPE_DURATION)
                    .run(&ctx)
                    .await
            }
        })
    }
}

impl UiActionHandler for TabletActionHandler {
    fn mode(&self) -> DeviceMode {
        DeviceMode::Tablet
    }

    fn click(&self, finder: &Finder) -> Action {
        self.tap(finder)
    }

    fn click_until(&self, finder: &Finder, condition: Action) -> Action {
        self.ui.press_until(finder, condition, self.press())
    }

    fn switch_to_chrome_tab_by_name(&self, name: &str) -> Action {
        let handler = self.clone();
        let wanted = name.to_string();
        let switch = Action::new(move |ctx| {
            let handler = handler.clone();
            let wanted = wanted.clone();
            async move {
                let tabs = handler.ui.nodes_info(&ctx, &Self::tabs()).await?;
                let index = tabs
                    .iter()
                    .position(|tab| tab.name.contains(&wanted))
                    .ok_or_else(|| {
                        ActionError::not_found(format!(
                            "failed to find destination tab with name {:?}",
                            wanted
                        ))
                    })?;
                info!("Switching to tab {} ({:?})", index, wanted);
                handler.tap_tab(&ctx, index).await
            }
        });
        named(
            format!("switch to tab with name {:?}", name),
            combine("open tab list and tap", vec![self.show_tab_list(), switch]),
        )
    }

    fn switch_to_chrome_tab_by_index(&self, index: usize) -> Action {
        let handler = self.clone();
        let switch = Action::new(move |ctx| {
            let handler = handler.clone();
            async move { handler.tap_tab(&ctx, index).await }
        });
        named(
            format!("switch to tab index {}", index),
            combine("open tab list and tap", vec![self.show_tab_list(), switch]),
        )
    }

    fn switch_to_next_chrome_tab(&self) -> Action {
        accel_action(self.keyboard.clone(), NEXT_TAB_ACCEL)
    }

    fn swipe_up(&self) -> Action {
        self.swipe(false)
    }

    /// Finger moves up the screen, so the page scrolls down
    fn swipe_down(&self) -> Action {
        self.swipe(true)
    }
}
