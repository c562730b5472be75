//! Accessibility tree snapshots

use std::fmt::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::node::NodeInfo;

#[derive(Debug, Error)]
pub enum TreeLoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error in {file}: {error}")]
    Yaml {
        file: String,
        error: serde_yaml::Error,
    },
}

/// A node and its children. Loads from YAML with the node's properties and
/// a `children` list side by side:
///
/// ```yaml
/// role: desktop
/// location: { left: 0, top: 0, width: 1920, height: 1080 }
/// children:
///   - role: button
///     name: OK
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub info: NodeInfo,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(info: NodeInfo) -> Self {
        Self {
            info,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: TreeNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = TreeNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn load(path: &Path) -> Result<Self, TreeLoadError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|error| TreeLoadError::Yaml {
            file: path.display().to_string(),
            error,
        })
    }

    /// The node at `path`, where each entry indexes into `children`
    pub fn get(&self, path: &[usize]) -> Option<&TreeNode> {
        path.iter().try_fold(self, |node, &i| node.children.get(i))
    }

    pub fn get_mut(&mut self, path: &[usize]) -> Option<&mut TreeNode> {
        path.iter()
            .try_fold(self, |node, &i| node.children.get_mut(i))
    }

    /// Remove and return the node at `path`. The root cannot be removed.
    pub fn remove(&mut self, path: &[usize]) -> Option<TreeNode> {
        let (last, parent) = path.split_last()?;
        let parent = self.get_mut(parent)?;
        if *last < parent.children.len() {
            Some(parent.children.remove(*last))
        } else {
            None
        }
    }

    /// Visit this node and its descendants in depth-first pre-order
    pub fn walk_mut(&mut self, f: &mut impl FnMut(&mut TreeNode)) {
        f(self);
        for child in &mut self.children {
            child.walk_mut(f);
        }
    }

    /// Number of nodes in this subtree, this node included
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(TreeNode::len).sum::<usize>()
    }

    /// Indented one-line-per-node text dump
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, 0);
        out
    }

    fn dump_into(&self, out: &mut String, depth: usize) {
        let _ = writeln!(out, "{}{}", "  ".repeat(depth), self.info);
        for child in &self.children {
            child.dump_into(out, depth + 1);
        }
    }
}
