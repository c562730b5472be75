use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::{web_page, DeviceMode, UiActionHandler, NEXT_TAB_ACCEL};
use crate::driver::ScrollDirection;
use crate::engine::action::{Action, ActionResult};
use crate::engine::combinators::{combine, named};
use crate::engine::context::Context;
use crate::engine::error::ActionError;
use crate::engine::poll::poll;
use crate::finder::{self, Finder, Role};
use crate::input::{accel_action, Keyboard};
use crate::uiauto::UiContext;

/// Pointer and keyboard variant
pub struct ClamshellActionHandler {
    ui: UiContext,
    keyboard: Arc<dyn Keyboard>,
}

impl ClamshellActionHandler {
    pub fn new(ui: UiContext, keyboard: Arc<dyn Keyboard>) -> Self {
        Self { ui, keyboard }
    }

    fn browser_windows() -> Finder {
        finder::role(Role::Window).class_name("BrowserFrame")
    }

    fn tab_strip() -> Finder {
        finder::class_name("TabStripRegionView").role(Role::TabList)
    }

    /// The browser window to switch tabs in. When several are open only the
    /// focused one qualifies.
    async fn active_window(ui: &UiContext, ctx: &Context) -> ActionResult<Finder> {
        let windows = Self::browser_windows();
        match ui.nodes_info(ctx, &windows).await?.len() {
            0 => Err(ActionError::not_found("no browser window is open").with_finder(&windows)),
            1 => Ok(windows),
            count => {
                let active = windows.focused();
                if ui.is_node_found(ctx, &active).await? {
                    debug!("{} browser windows open, using the focused one", count);
                    Ok(active)
                } else {
                    Err(ActionError::state_mismatch(format!(
                        "none of the {} browser windows is focused",
                        count
                    )))
                }
            }
        }
    }

    /// Pick the active window, wait briefly for the tab in its strip, then
    /// click it with a longer budget
    fn switch_tab(&self, name: String, tab: Finder) -> Action {
        let ui = self.ui.clone();
        let switch = Action::new(move |ctx| {
            let (ui, tab) = (ui.clone(), tab.clone());
            async move {
                let opts = ui.poll_opts();
                let ui_ref = &ui;
                let window = poll(&ctx, &opts, |ctx| async move {
                    Self::active_window(ui_ref, &ctx).await
                })
                .await?;
                let tab = tab.ancestor(&Self::tab_strip().ancestor(&window));
                combine(
                    "find tab and click",
                    vec![
                        ui.with_timeout(Duration::from_secs(5)).wait_until_exists(&tab),
                        ui.with_timeout(Duration::from_secs(15)).left_click(&tab),
                    ],
                )
                .run(&ctx)
                .await
            }
        });
        named(name, switch)
    }

    fn scroll_page(&self, direction: ScrollDirection) -> Action {
        self.ui.scroll(&web_page(), direction)
    }
}

impl UiActionHandler for ClamshellActionHandler {
    fn mode(&self) -> DeviceMode {
        DeviceMode::Clamshell
    }

    fn click(&self, finder: &Finder) -> Action {
        self.ui.left_click(finder)
    }

    fn click_until(&self, finder: &Finder, condition: Action) -> Action {
        self.ui.left_click_until(finder, condition)
    }

    fn switch_to_chrome_tab_by_name(&self, name: &str) -> Action {
        let tab = finder::name_containing(name).role(Role::Tab).first();
        self.switch_tab(format!("switch to tab with name {:?}", name), tab)
    }

    fn switch_to_chrome_tab_by_index(&self, index: usize) -> Action {
        let tab = finder::role(Role::Tab).class_name("Tab").nth(index);
        self.switch_tab(format!("switch to tab index {}", index), tab)
    }

    fn switch_to_next_chrome_tab(&self) -> Action {
        accel_action(self.keyboard.clone(), NEXT_TAB_ACCEL)
    }

    fn swipe_up(&self) -> Action {
        self.scroll_page(ScrollDirection::Up)
    }

    fn swipe_down(&self) -> Action {
        self.scroll_page(ScrollDirection::Down)
    }
}
