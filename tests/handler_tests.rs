mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use tokio_test::{assert_err, assert_ok};
use ui_actions::driver::{DriverEvent, Point, Rect, ScrollDirection};
use ui_actions::input::{Gesture, RecordingKeyboard, RecordingTouchScreen};
use ui_actions::prelude::*;

fn clamshell(driver: &MemoryDriver) -> (Arc<dyn UiActionHandler>, RecordingKeyboard) {
    let keyboard = RecordingKeyboard::new();
    let handler = new_action_handler(
        DeviceMode::Clamshell,
        fast_ui(driver),
        Arc::new(keyboard.clone()),
        None,
    )
    .unwrap();
    (handler, keyboard)
}

fn tablet(driver: &MemoryDriver) -> (Arc<dyn UiActionHandler>, RecordingTouchScreen) {
    let touch = RecordingTouchScreen::new();
    let handler = new_action_handler(
        DeviceMode::Tablet,
        fast_ui(driver),
        Arc::new(RecordingKeyboard::new()),
        Some(Arc::new(touch.clone())),
    )
    .unwrap();
    (handler, touch)
}

#[tokio::test(start_paused = true)]
async fn test_clamshell_switch_tab_by_name_clicks_tab() {
    let driver = memory_driver(browser_tree(&["Inbox - Mail", "Quarterly report - Docs"]));
    let (handler, _) = clamshell(&driver);

    handler
        .switch_to_chrome_tab_by_name("Docs")
        .run(&Context::new())
        .await
        .unwrap();
    assert_eq!(driver.clicks(), vec![Point::new(300, 20)]);
}

#[tokio::test(start_paused = true)]
async fn test_clamshell_switch_tab_by_index() {
    let driver = memory_driver(browser_tree(&["One", "Two", "Three"]));
    let (handler, _) = clamshell(&driver);

    handler
        .switch_to_chrome_tab_by_index(2)
        .run(&Context::new())
        .await
        .unwrap();
    assert_eq!(driver.clicks(), vec![Point::new(500, 20)]);
}

#[tokio::test(start_paused = true)]
async fn test_clamshell_missing_tab_fails_with_name() {
    let driver = memory_driver(browser_tree(&["One"]));
    let (handler, _) = clamshell(&driver);

    let err = assert_err!(handler.switch_to_chrome_tab_by_name("Missing").run(&Context::new()).await);
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(err.to_string().starts_with("switch to tab with name \"Missing\""));
    assert!(driver.clicks().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_clamshell_switches_tab_in_focused_window() {
    let mut active = browser_window(&["News", "Budget - Docs"], 1280);
    active.info = active.info.with_state(State::Focused, true);
    let driver = memory_driver(desktop(vec![browser_window(&["Notes - Docs"], 0), active]));
    let (handler, _) = clamshell(&driver);

    assert_ok!(handler.switch_to_chrome_tab_by_name("Docs").run(&Context::new()).await);
    assert_eq!(driver.clicks(), vec![Point::new(1580, 20)]);

    assert_ok!(handler.switch_to_chrome_tab_by_index(0).run(&Context::new()).await);
    assert_eq!(driver.clicks()[1], Point::new(1380, 20));
}

#[tokio::test(start_paused = true)]
async fn test_clamshell_waits_for_a_focused_window() {
    let driver = memory_driver(desktop(vec![
        browser_window(&["Mail"], 0),
        browser_window(&["Docs"], 1280),
    ]));
    let (handler, _) = clamshell(&driver);

    let err = assert_err!(handler.switch_to_chrome_tab_by_name("Docs").run(&Context::new()).await);
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(err.to_string().contains("none of the 2 browser windows is focused"));
    assert!(driver.clicks().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_clamshell_swipes_scroll_the_page() {
    let driver = memory_driver(browser_tree(&["One"]));
    let (handler, _) = clamshell(&driver);

    handler.swipe_down().run(&Context::new()).await.unwrap();
    handler.swipe_up().run(&Context::new()).await.unwrap();
    assert_eq!(
        driver.events(),
        vec![
            DriverEvent::Scroll { node: "Page".into(), direction: ScrollDirection::Down },
            DriverEvent::Scroll { node: "Page".into(), direction: ScrollDirection::Up },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_next_tab_uses_keyboard_in_both_modes() {
    let driver = memory_driver(browser_tree(&["One", "Two"]));
    let (handler, keyboard) = clamshell(&driver);
    handler.switch_to_next_chrome_tab().run(&Context::new()).await.unwrap();
    assert_eq!(keyboard.pressed(), vec!["Ctrl+Tab"]);

    let keyboard = RecordingKeyboard::new();
    let handler = new_action_handler(
        DeviceMode::Tablet,
        fast_ui(&driver),
        Arc::new(keyboard.clone()),
        Some(Arc::new(RecordingTouchScreen::new())),
    )
    .unwrap();
    handler.switch_to_next_chrome_tab().run(&Context::new()).await.unwrap();
    assert_eq!(keyboard.pressed(), vec!["Ctrl+Tab"]);
}

#[tokio::test(start_paused = true)]
async fn test_tablet_click_taps_instead_of_clicking() {
    let driver = memory_driver(settings_tree());
    let (handler, touch) = tablet(&driver);

    handler
        .click(&finder::name("Bluetooth"))
        .run(&Context::new())
        .await
        .unwrap();
    assert_eq!(touch.gestures(), vec![Gesture::Tap(Point::new(170, 160))]);
    assert!(driver.clicks().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_tablet_click_until_checks_after_tap() {
    let driver = memory_driver(settings_tree());
    let (handler, touch) = tablet(&driver);
    let ui = fast_ui(&driver);

    handler
        .click_until(&finder::name("Network"), ui.exists(&finder::role(Role::Window)))
        .run(&Context::new())
        .await
        .unwrap();
    assert_eq!(touch.gestures().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_tablet_switch_tab_by_name_with_open_strip() {
    let driver = memory_driver(desktop(vec![tablet_tab_strip(&["Mail", "Docs", "News"])]));
    let (handler, touch) = tablet(&driver);

    handler
        .switch_to_chrome_tab_by_name("Docs")
        .run(&Context::new())
        .await
        .unwrap();
    assert_eq!(touch.gestures(), vec![Gesture::Tap(Point::new(370, 140))]);
}

#[tokio::test(start_paused = true)]
async fn test_tablet_opens_strip_before_switching() {
    let toggle = TreeNode::new(
        NodeInfo::new(Role::Button, "2 tabs, press to toggle tab strip")
            .with_class("WebUITabCounterButton")
            .with_location(Rect::new(900, 0, 40, 40)),
    );
    let driver = memory_driver(desktop(vec![toggle]));
    let (handler, touch) = tablet(&driver);

    let opener = driver.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        opener.update(|tree| tree.children.push(tablet_tab_strip(&["Mail", "Docs"])));
    });

    handler
        .switch_to_chrome_tab_by_index(0)
        .run(&Context::new())
        .await
        .unwrap();
    assert_eq!(
        touch.gestures(),
        vec![Gesture::Tap(Point::new(920, 20)), Gesture::Tap(Point::new(120, 140))]
    );
}

#[tokio::test(start_paused = true)]
async fn test_tablet_swipes_strip_to_offscreen_tab() {
    let mut strip = tablet_tab_strip(&["Mail", "Docs", "News", "Maps", "Music"]);
    let last = strip.get_mut(&[0, 4]).unwrap();
    last.info = last.info.clone().with_state(State::Offscreen, true);
    let driver = memory_driver(desktop(vec![strip]));
    let (handler, touch) = tablet(&driver);

    assert_ok!(handler.switch_to_chrome_tab_by_name("Music").run(&Context::new()).await);

    let swipe = Gesture::Swipe {
        from: Point::new(750, 140),
        to: Point::new(500, 140),
        duration: Duration::from_millis(500),
    };
    assert_eq!(
        touch.gestures(),
        vec![swipe.clone(), swipe.clone(), swipe, Gesture::Tap(Point::new(1120, 140))]
    );
    assert!(driver.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_tablet_tab_index_out_of_range() {
    let driver = memory_driver(desktop(vec![tablet_tab_strip(&["Mail", "Docs"])]));
    let (handler, touch) = tablet(&driver);

    let err = assert_err!(handler.switch_to_chrome_tab_by_index(5).run(&Context::new()).await);
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(touch.gestures().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_tablet_unknown_tab_name() {
    let driver = memory_driver(desktop(vec![tablet_tab_strip(&["Mail"])]));
    let (handler, touch) = tablet(&driver);

    let err = assert_err!(handler.switch_to_chrome_tab_by_name("Docs").run(&Context::new()).await);
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().contains("failed to find destination tab"));
    assert!(touch.gestures().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_tablet_swipes_use_screen_quarters() {
    let driver = memory_driver(desktop(vec![]));
    let (handler, touch) = tablet(&driver);

    assert_ok!(handler.swipe_down().run(&Context::new()).await);
    assert_ok!(handler.swipe_up().run(&Context::new()).await);

    let duration = Duration::from_millis(1500);
    assert_eq!(
        touch.gestures(),
        vec![
            Gesture::Swipe { from: Point::new(640, 600), to: Point::new(640, 200), duration },
            Gesture::Swipe { from: Point::new(640, 200), to: Point::new(640, 600), duration },
        ]
    );
}
