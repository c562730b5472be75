//! Accessibility backend drivers
//!
//! A [`Driver`] is the narrow interface the engine uses to query and act on
//! the live accessibility tree. Two implementations ship with the crate:
//! - `memory`: an in-process tree, for tests and offline plans
//! - `rpc`: an external backend process spoken to with JSON-RPC over stdio

use std::path::Path;

use async_trait::async_trait;

use crate::finder::{Finder, ResolveError};

pub mod memory;
pub mod node;
pub mod rpc;
pub mod tree;

pub use memory::{DriverEvent, MemoryDriver};
pub use node::{MouseClick, NodeInfo, Point, Rect, ScrollDirection};
pub use rpc::RpcDriver;
pub use tree::{TreeLoadError, TreeNode};

/// Common error type for driver operations
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("failed to find node with properties: {0}")]
    NotFound(String),

    #[error("multiple nodes matched, if you expect this and only want the first use first(): {0}")]
    Ambiguous(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("Failed to start backend: {0}")]
    StartupFailed(String),

    #[error("Backend disconnected")]
    Disconnected,

    #[error("Backend error: {0}")]
    ServerError(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<ResolveError> for DriverError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Empty => DriverError::InvalidQuery(err.to_string()),
            ResolveError::NotFound(f) => DriverError::NotFound(f),
            ResolveError::Ambiguous(f) => DriverError::Ambiguous(f),
        }
    }
}

/// Operations on the live accessibility tree.
///
/// Single-node methods resolve their finder to exactly one node and fail
/// with `NotFound` or `Ambiguous` otherwise.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Properties of the unique node `finder` designates
    async fn snapshot(&self, finder: &Finder) -> Result<NodeInfo, DriverError>;

    /// Properties of every node `finder` matches, possibly none
    async fn snapshot_all(&self, finder: &Finder) -> Result<Vec<NodeInfo>, DriverError>;

    /// Screen rectangle of the unique node `finder` designates
    async fn location(&self, finder: &Finder) -> Result<Rect, DriverError> {
        Ok(self.snapshot(finder).await?.location)
    }

    async fn mouse_click(&self, point: Point, click: MouseClick) -> Result<(), DriverError>;

    /// Invoke the node's default activation
    async fn do_default(&self, finder: &Finder) -> Result<(), DriverError>;

    async fn focus(&self, finder: &Finder) -> Result<(), DriverError>;

    /// Scroll the node's scrollable ancestors until it is inside the viewport
    async fn make_visible(&self, finder: &Finder) -> Result<(), DriverError>;

    async fn scroll(&self, finder: &Finder, direction: ScrollDirection) -> Result<(), DriverError>;

    /// Textual dump of the whole tree
    async fn dump_tree(&self) -> Result<String, DriverError>;

    /// Write a screenshot to `path`. Returns false when the backend cannot
    /// take screenshots.
    async fn capture_screenshot(&self, _path: &Path) -> Result<bool, DriverError> {
        Ok(false)
    }
}
