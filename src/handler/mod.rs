//! Device-mode dependent UI actions
//!
//! Scenarios that must work in both laptop and tablet posture take a
//! [`UiActionHandler`] instead of calling the UI context directly. The
//! clamshell variant uses the pointer and keyboard, the tablet variant taps
//! and swipes. Both return plain [`Action`]s, so callers cannot tell which
//! one they were given.

mod clamshell;
mod tablet;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::engine::action::Action;
use crate::engine::error::ActionError;
use crate::finder::{self, Finder, Role};
use crate::input::{Keyboard, TouchScreen};
use crate::uiauto::UiContext;

pub use clamshell::ClamshellActionHandler;
pub use tablet::TabletActionHandler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceMode {
    #[default]
    Clamshell,
    Tablet,
}

impl fmt::Display for DeviceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceMode::Clamshell => write!(f, "clamshell"),
            DeviceMode::Tablet => write!(f, "tablet"),
        }
    }
}

pub trait UiActionHandler: Send + Sync {
    fn mode(&self) -> DeviceMode;

    /// Press the node once
    fn click(&self, finder: &Finder) -> Action;

    /// Press the node until `condition` holds. The node is pressed before the
    /// condition is first checked.
    fn click_until(&self, finder: &Finder, condition: Action) -> Action;

    /// Activate the first browser tab whose name contains `name`
    fn switch_to_chrome_tab_by_name(&self, name: &str) -> Action;

    /// Activate the browser tab at `index`, counted from zero
    fn switch_to_chrome_tab_by_index(&self, index: usize) -> Action;

    fn switch_to_next_chrome_tab(&self) -> Action;

    fn swipe_up(&self) -> Action;

    fn swipe_down(&self) -> Action;
}

/// Accelerator that moves to the next browser tab in either mode
pub(crate) const NEXT_TAB_ACCEL: &str = "Ctrl+Tab";

/// The web page content area the swipe gestures act on
pub(crate) fn web_page() -> Finder {
    finder::role(Role::RootWebArea).first()
}

/// Handler for `mode`. Tablet mode needs a touch screen.
pub fn new_action_handler(
    mode: DeviceMode,
    ui: UiContext,
    keyboard: Arc<dyn Keyboard>,
    touch: Option<Arc<dyn TouchScreen>>,
) -> Result<Arc<dyn UiActionHandler>, ActionError> {
    match mode {
        DeviceMode::Clamshell => Ok(Arc::new(ClamshellActionHandler::new(ui, keyboard))),
        DeviceMode::Tablet => {
            let touch = touch.ok_or_else(|| {
                ActionError::caller("tablet mode requires a touch screen")
            })?;
            Ok(Arc::new(TabletActionHandler::new(ui, keyboard, touch)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{MemoryDriver, NodeInfo, TreeNode};
    use crate::engine::error::ErrorKind;
    use crate::input::{RecordingKeyboard, RecordingTouchScreen};

    fn ui() -> UiContext {
        let driver = MemoryDriver::new(TreeNode::new(NodeInfo::new(Role::Desktop, "")));
        UiContext::new(Arc::new(driver))
    }

    #[test]
    fn test_factory_selects_variant() {
        let keyboard = Arc::new(RecordingKeyboard::new());
        let handler = new_action_handler(DeviceMode::Clamshell, ui(), keyboard.clone(), None).unwrap();
        assert_eq!(handler.mode(), DeviceMode::Clamshell);

        let touch = Arc::new(RecordingTouchScreen::new());
        let handler = new_action_handler(DeviceMode::Tablet, ui(), keyboard, Some(touch)).unwrap();
        assert_eq!(handler.mode(), DeviceMode::Tablet);
    }

    #[test]
    fn test_tablet_without_touch_screen_is_rejected() {
        let keyboard = Arc::new(RecordingKeyboard::new());
        let err = match new_action_handler(DeviceMode::Tablet, ui(), keyboard, None) {
            Err(err) => err,
            Ok(_) => panic!("tablet handler built without a touch screen"),
        };
        assert_eq!(err.kind(), ErrorKind::CallerError);
    }

    #[test]
    fn test_device_mode_serde() {
        let mode: DeviceMode = serde_yaml::from_str("tablet").unwrap();
        assert_eq!(mode, DeviceMode::Tablet);
        assert_eq!(mode.to_string(), "tablet");
    }
}
