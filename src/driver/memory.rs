//! In-memory driver
//!
//! Holds an accessibility tree in process and applies actions to it. Tests
//! script UI behaviour by mutating the tree from another task, by queueing
//! one-shot failures, or by registering hooks that react to driver events.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use super::node::{MouseClick, NodeInfo, Point, Rect, ScrollDirection};
use super::tree::TreeNode;
use super::{Driver, DriverError};
use crate::finder::resolve::{resolve_all_paths, resolve_one_path};
use crate::finder::{Finder, State};

/// Something the driver was asked to do
#[derive(Debug, Clone, PartialEq)]
pub enum DriverEvent {
    MouseClick { point: Point, click: MouseClick },
    DoDefault { node: String },
    Focus { node: String },
    MakeVisible { node: String },
    Scroll { node: String, direction: ScrollDirection },
}

/// Reaction to a driver event; may rewrite the tree
pub type EventHook = Arc<dyn Fn(&DriverEvent, &mut TreeNode) + Send + Sync>;

#[derive(Default)]
struct Inner {
    tree: TreeNode,
    events: Vec<DriverEvent>,
    failures: VecDeque<DriverError>,
    hooks: Vec<EventHook>,
    snapshots: usize,
}

#[derive(Clone)]
pub struct MemoryDriver {
    inner: Arc<Mutex<Inner>>,
    latency: Duration,
}

impl MemoryDriver {
    pub fn new(tree: TreeNode) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                tree,
                ..Inner::default()
            })),
            latency: Duration::ZERO,
        }
    }

    /// Every call first sleeps for `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn tree(&self) -> TreeNode {
        self.lock().tree.clone()
    }

    pub fn set_tree(&self, tree: TreeNode) {
        self.lock().tree = tree;
    }

    pub fn update(&self, f: impl FnOnce(&mut TreeNode)) {
        f(&mut self.lock().tree);
    }

    /// Append `node` as the last child of the unique node `parent` matches
    pub fn insert(&self, parent: &Finder, node: TreeNode) -> Result<(), DriverError> {
        let mut inner = self.lock();
        let path = resolve_one_path(parent, &inner.tree)?;
        if let Some(parent) = inner.tree.get_mut(&path) {
            parent.children.push(node);
        }
        Ok(())
    }

    /// Remove every node `finder` matches, with its subtree. Returns how many
    /// matches were removed.
    pub fn remove(&self, finder: &Finder) -> Result<usize, DriverError> {
        let mut inner = self.lock();
        let paths = resolve_all_paths(finder, &inner.tree)?;
        let mut removed = 0;
        for path in paths.iter().rev() {
            if inner.tree.remove(path).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Rewrite the properties of the unique node `finder` matches
    pub fn modify(&self, finder: &Finder, f: impl FnOnce(&mut NodeInfo)) -> Result<(), DriverError> {
        let mut inner = self.lock();
        let path = resolve_one_path(finder, &inner.tree)?;
        if let Some(node) = inner.tree.get_mut(&path) {
            f(&mut node.info);
        }
        Ok(())
    }

    pub fn set_state(&self, finder: &Finder, state: State, value: bool) -> Result<(), DriverError> {
        self.modify(finder, |info| {
            info.state.insert(state, value);
        })
    }

    pub fn set_location(&self, finder: &Finder, location: Rect) -> Result<(), DriverError> {
        self.modify(finder, |info| info.location = location)
    }

    /// Make the next driver call fail with `err`
    pub fn fail_next(&self, err: DriverError) {
        self.lock().failures.push_back(err);
    }

    pub fn on_event(&self, hook: impl Fn(&DriverEvent, &mut TreeNode) + Send + Sync + 'static) {
        self.lock().hooks.push(Arc::new(hook));
    }

    pub fn events(&self) -> Vec<DriverEvent> {
        self.lock().events.clone()
    }

    /// Points of every mouse click so far
    pub fn clicks(&self) -> Vec<Point> {
        self.lock()
            .events
            .iter()
            .filter_map(|e| match e {
                DriverEvent::MouseClick { point, .. } => Some(*point),
                _ => None,
            })
            .collect()
    }

    pub fn clear_events(&self) {
        self.lock().events.clear();
    }

    /// Number of snapshot queries served
    pub fn snapshot_count(&self) -> usize {
        self.lock().snapshots
    }

    async fn enter(&self) -> Result<MutexGuard<'_, Inner>, DriverError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let mut inner = self.lock();
        match inner.failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(inner),
        }
    }

    fn record(inner: &mut Inner, event: DriverEvent) {
        let hooks = inner.hooks.clone();
        for hook in &hooks {
            hook(&event, &mut inner.tree);
        }
        inner.events.push(event);
    }

    fn target_name(inner: &Inner, finder: &Finder) -> Result<(Vec<usize>, String), DriverError> {
        let path = resolve_one_path(finder, &inner.tree)?;
        let name = inner
            .tree
            .get(&path)
            .map(|n| n.info.name.clone())
            .unwrap_or_default();
        Ok((path, name))
    }
}

#[async_trait]
impl Driver for MemoryDriver {
    async fn snapshot(&self, finder: &Finder) -> Result<NodeInfo, DriverError> {
        let mut inner = self.enter().await?;
        inner.snapshots += 1;
        let path = resolve_one_path(finder, &inner.tree)?;
        inner
            .tree
            .get(&path)
            .map(|n| n.info.clone())
            .ok_or_else(|| DriverError::NotFound(finder.pretty()))
    }

    async fn snapshot_all(&self, finder: &Finder) -> Result<Vec<NodeInfo>, DriverError> {
        let mut inner = self.enter().await?;
        inner.snapshots += 1;
        let paths = resolve_all_paths(finder, &inner.tree)?;
        Ok(paths
            .iter()
            .filter_map(|p| inner.tree.get(p))
            .map(|n| n.info.clone())
            .collect())
    }

    async fn mouse_click(&self, point: Point, click: MouseClick) -> Result<(), DriverError> {
        let mut inner = self.enter().await?;
        Self::record(&mut inner, DriverEvent::MouseClick { point, click });
        Ok(())
    }

    async fn do_default(&self, finder: &Finder) -> Result<(), DriverError> {
        let mut inner = self.enter().await?;
        let (_, node) = Self::target_name(&inner, finder)?;
        Self::record(&mut inner, DriverEvent::DoDefault { node });
        Ok(())
    }

    async fn focus(&self, finder: &Finder) -> Result<(), DriverError> {
        let mut inner = self.enter().await?;
        let (path, node) = Self::target_name(&inner, finder)?;
        inner.tree.walk_mut(&mut |n| {
            n.info.state.remove(&State::Focused);
        });
        if let Some(target) = inner.tree.get_mut(&path) {
            target.info.state.insert(State::Focused, true);
        }
        Self::record(&mut inner, DriverEvent::Focus { node });
        Ok(())
    }

    async fn make_visible(&self, finder: &Finder) -> Result<(), DriverError> {
        let mut inner = self.enter().await?;
        let (path, node) = Self::target_name(&inner, finder)?;
        let viewport = inner.tree.info.location;
        if let Some(target) = inner.tree.get_mut(&path) {
            let loc = &mut target.info.location;
            if !viewport.is_empty() && !viewport.contains(loc) {
                loc.left = loc.left.min(viewport.right() - loc.width).max(viewport.left);
                loc.top = loc.top.min(viewport.bottom() - loc.height).max(viewport.top);
            }
            target.info.state.remove(&State::Offscreen);
        }
        Self::record(&mut inner, DriverEvent::MakeVisible { node });
        Ok(())
    }

    async fn scroll(&self, finder: &Finder, direction: ScrollDirection) -> Result<(), DriverError> {
        let mut inner = self.enter().await?;
        let (_, node) = Self::target_name(&inner, finder)?;
        Self::record(&mut inner, DriverEvent::Scroll { node, direction });
        Ok(())
    }

    async fn dump_tree(&self) -> Result<String, DriverError> {
        let inner = self.enter().await?;
        Ok(inner.tree.dump())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finder::{self, Role};

    fn tree() -> TreeNode {
        TreeNode::new(NodeInfo::new(Role::Desktop, "").with_location(Rect::new(0, 0, 1000, 800)))
            .with_child(
                TreeNode::new(NodeInfo::new(Role::Window, "Settings"))
                    .with_child(TreeNode::new(
                        NodeInfo::new(Role::TextField, "Search").with_state(State::Focused, true),
                    ))
                    .with_child(TreeNode::new(
                        NodeInfo::new(Role::Button, "Bluetooth")
                            .with_location(Rect::new(100, 900, 80, 40))
                            .with_state(State::Offscreen, true),
                    )),
            )
    }

    #[tokio::test]
    async fn test_focus_is_exclusive() {
        let driver = MemoryDriver::new(tree());
        driver.focus(&finder::name("Bluetooth")).await.unwrap();

        let search = driver.snapshot(&finder::name("Search")).await.unwrap();
        let bt = driver.snapshot(&finder::name("Bluetooth")).await.unwrap();
        assert!(!search.is(State::Focused));
        assert!(bt.is(State::Focused));
        assert_eq!(
            driver.events(),
            vec![DriverEvent::Focus { node: "Bluetooth".into() }]
        );
    }

    #[tokio::test]
    async fn test_make_visible_moves_node_into_viewport() {
        let driver = MemoryDriver::new(tree());
        driver.make_visible(&finder::name("Bluetooth")).await.unwrap();

        let bt = driver.snapshot(&finder::name("Bluetooth")).await.unwrap();
        assert_eq!(bt.location, Rect::new(100, 760, 80, 40));
        assert!(!bt.is(State::Offscreen));
    }

    #[tokio::test]
    async fn test_fail_next_is_one_shot() {
        let driver = MemoryDriver::new(tree());
        driver.fail_next(DriverError::Disconnected);

        let f = finder::name("Search");
        assert!(matches!(driver.snapshot(&f).await, Err(DriverError::Disconnected)));
        assert!(driver.snapshot(&f).await.is_ok());
    }

    #[tokio::test]
    async fn test_hooks_see_events() {
        let driver = MemoryDriver::new(tree());
        driver.on_event(|event, tree| {
            if matches!(event, DriverEvent::MouseClick { .. }) {
                tree.children.clear();
            }
        });

        driver.mouse_click(Point::new(1, 1), MouseClick::Left).await.unwrap();
        assert!(driver.snapshot_all(&finder::role(Role::Window)).await.unwrap().is_empty());
        assert_eq!(driver.clicks(), vec![Point::new(1, 1)]);
    }

    #[tokio::test]
    async fn test_remove_and_insert() {
        let driver = MemoryDriver::new(tree());
        assert_eq!(driver.remove(&finder::role(Role::Button)).unwrap(), 1);
        assert!(matches!(
            driver.snapshot(&finder::name("Bluetooth")).await,
            Err(DriverError::NotFound(_))
        ));

        driver
            .insert(
                &finder::role(Role::Window),
                TreeNode::new(NodeInfo::new(Role::Button, "Wi-Fi")),
            )
            .unwrap();
        assert!(driver.snapshot(&finder::name("Wi-Fi")).await.is_ok());
    }
}
