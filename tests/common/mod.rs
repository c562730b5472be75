#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use ui_actions::driver::{MemoryDriver, NodeInfo, Rect, TreeNode};
use ui_actions::finder::Role;
use ui_actions::UiContext;

pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

pub fn write_file(dir: &Path, filename: &str, content: &str) {
    fs::write(dir.join(filename), content).expect("Failed to write file");
}

pub fn node(role: Role, name: &str, rect: Rect) -> TreeNode {
    TreeNode::new(NodeInfo::new(role, name).with_location(rect))
}

pub fn desktop(children: Vec<TreeNode>) -> TreeNode {
    node(Role::Desktop, "", Rect::new(0, 0, 1280, 800)).with_children(children)
}

/// A settings window with a couple of buttons and a toggle
pub fn settings_tree() -> TreeNode {
    desktop(vec![node(Role::Window, "Settings", Rect::new(100, 100, 600, 400))
        .with_children(vec![
            node(Role::Button, "Bluetooth", Rect::new(120, 140, 100, 40)),
            node(Role::Button, "Network", Rect::new(120, 200, 100, 40)),
            node(Role::ToggleButton, "Wi-Fi", Rect::new(400, 200, 60, 30)),
        ])])
}

pub fn dialog(name: &str, buttons: &[&str]) -> TreeNode {
    let mut dialog = node(Role::Dialog, name, Rect::new(400, 300, 400, 200));
    for (i, label) in buttons.iter().enumerate() {
        let left = 420 + 120 * i as i32;
        dialog = dialog.with_child(node(Role::Button, label, Rect::new(left, 440, 100, 40)));
    }
    dialog
}

/// Desktop browser window with a tab strip and a page
pub fn browser_tree(tabs: &[&str]) -> TreeNode {
    desktop(vec![browser_window(tabs, 0)])
}

/// Browser frame whose left edge is at `left`
pub fn browser_window(tabs: &[&str], left: i32) -> TreeNode {
    let mut strip = TreeNode::new(
        NodeInfo::new(Role::TabList, "")
            .with_class("TabStripRegionView")
            .with_location(Rect::new(left, 0, 1280, 40)),
    );
    for (i, title) in tabs.iter().enumerate() {
        strip = strip.with_child(TreeNode::new(
            NodeInfo::new(Role::Tab, title)
                .with_class("Tab")
                .with_location(Rect::new(left + 200 * i as i32, 0, 200, 40)),
        ));
    }
    TreeNode::new(
        NodeInfo::new(Role::Window, "Browser")
            .with_class("BrowserFrame")
            .with_location(Rect::new(left, 0, 1280, 800)),
    )
    .with_children(vec![
        strip,
        node(Role::RootWebArea, "Page", Rect::new(left, 40, 1280, 760)),
    ])
}

/// Tablet browser whose tab strip is a web page named "Tab list"
pub fn tablet_tab_strip(tabs: &[&str]) -> TreeNode {
    let mut list = node(Role::TabList, "", Rect::new(0, 40, 1000, 200));
    for (i, title) in tabs.iter().enumerate() {
        list = list.with_child(node(Role::Tab, title, Rect::new(250 * i as i32, 60, 240, 160)));
    }
    node(Role::RootWebArea, "Tab list", Rect::new(0, 40, 1000, 200)).with_child(list)
}

pub fn memory_driver(tree: TreeNode) -> MemoryDriver {
    MemoryDriver::new(tree)
}

/// UI context with a short timeout so failures show up quickly
pub fn fast_ui(driver: &MemoryDriver) -> UiContext {
    UiContext::new(Arc::new(driver.clone()))
        .with_timeout(Duration::from_secs(2))
        .with_interval(Duration::from_millis(100))
}
