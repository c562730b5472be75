//! Resolving finders against an accessibility tree snapshot
//!
//! Candidates are the descendants of the search scope in depth-first
//! pre-order. The scope is the tree root, or the unique node the finder's
//! ancestor resolves to; the scope itself is never a candidate. `first` and
//! `nth` apply after filtering.

use thiserror::Error;

use super::Finder;
use crate::driver::TreeNode;

/// Child indices leading from the root to a node
pub type NodePath = Vec<usize>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("finder has no constraints")]
    Empty,

    #[error("failed to find node with properties: {0}")]
    NotFound(String),

    #[error("multiple nodes matched, if you expect this and only want the first use first(): {0}")]
    Ambiguous(String),
}

/// The unique node `finder` designates
pub fn resolve_one<'a>(finder: &Finder, root: &'a TreeNode) -> Result<&'a TreeNode, ResolveError> {
    let path = resolve_one_path(finder, root)?;
    root.get(&path)
        .ok_or_else(|| ResolveError::NotFound(finder.pretty()))
}

/// Every node `finder` matches, in document order; empty when nothing
/// matches or the ancestor is missing
pub fn resolve_all<'a>(finder: &Finder, root: &'a TreeNode) -> Result<Vec<&'a TreeNode>, ResolveError> {
    Ok(resolve_all_paths(finder, root)?
        .iter()
        .filter_map(|path| root.get(path))
        .collect())
}

pub fn resolve_one_path(finder: &Finder, root: &TreeNode) -> Result<NodePath, ResolveError> {
    if finder.is_empty() {
        return Err(ResolveError::Empty);
    }
    if finder.is_root() {
        return root_match(finder, root).ok_or_else(|| ResolveError::NotFound(finder.pretty()));
    }

    let scope = match finder.get_ancestor() {
        Some(ancestor) => resolve_one_path(ancestor, root)?,
        None => Vec::new(),
    };
    let mut matches = candidates(finder, root, &scope);

    if finder.is_first() {
        return matches
            .into_iter()
            .next()
            .ok_or_else(|| ResolveError::NotFound(finder.pretty()));
    }
    let nth = finder.index();
    if matches.len() <= nth {
        return Err(ResolveError::NotFound(finder.pretty()));
    }
    if nth == 0 && matches.len() > 1 {
        return Err(ResolveError::Ambiguous(finder.pretty()));
    }
    Ok(matches.swap_remove(nth))
}

pub fn resolve_all_paths(finder: &Finder, root: &TreeNode) -> Result<Vec<NodePath>, ResolveError> {
    if finder.is_empty() {
        return Err(ResolveError::Empty);
    }
    if finder.is_root() {
        return Ok(root_match(finder, root).into_iter().collect());
    }

    let scope = match finder.get_ancestor() {
        Some(ancestor) => match resolve_one_path(ancestor, root) {
            Ok(path) => path,
            Err(ResolveError::NotFound(_)) => return Ok(Vec::new()),
            Err(err) => return Err(err),
        },
        None => Vec::new(),
    };
    let matches = candidates(finder, root, &scope);

    if finder.is_first() {
        return Ok(matches.into_iter().take(1).collect());
    }
    match finder.index() {
        0 => Ok(matches),
        nth => Ok(matches.into_iter().nth(nth).into_iter().collect()),
    }
}

/// The root still has to satisfy the finder's other predicates
fn root_match(finder: &Finder, root: &TreeNode) -> Option<NodePath> {
    (finder.matches(&root.info) && finder.index() == 0).then(Vec::new)
}

fn candidates(finder: &Finder, root: &TreeNode, scope: &[usize]) -> Vec<NodePath> {
    let mut out = Vec::new();
    if let Some(scope_node) = root.get(scope) {
        let mut path = scope.to_vec();
        collect(finder, scope_node, &mut path, &mut out);
    }
    out
}

fn collect(finder: &Finder, node: &TreeNode, path: &mut NodePath, out: &mut Vec<NodePath>) {
    for (i, child) in node.children.iter().enumerate() {
        path.push(i);
        if finder.matches(&child.info) {
            out.push(path.clone());
        }
        collect(finder, child, path, out);
        path.pop();
    }
}
