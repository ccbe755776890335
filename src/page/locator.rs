//! Structural locators: synthesize a root-to-leaf path for the node
//! holding the target value, then re-find it by tree descent on later
//! polls instead of re-scanning the whole page.

use crate::error::LocateError;
use crate::page::dom::{DomTree, NodeId};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// One step of a structural path: a tag name plus the 1-based position
/// among preceding siblings with the same tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStep {
    pub tag: String,
    pub index: usize,
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.tag, self.index)
    }
}

/// A root-to-leaf structural path identifying one element.
///
/// Renders in the familiar absolute-XPath shape,
/// `/html[1]/body[1]/div[2]/span[1]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    pub path: Vec<PathStep>,
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.path {
            write!(f, "/{}", step)?;
        }
        Ok(())
    }
}

/// Finds the element whose text equals `target` and synthesizes its
/// structural path.
///
/// The scan is exact trimmed-text equality over leaf text nodes. When
/// several nodes match, the first in document order wins; this is
/// deterministic but may not be the node the operator meant, so it is
/// logged rather than silently accepted.
pub fn resolve(tree: &DomTree, target: &str) -> Result<Locator, LocateError> {
    let target = target.trim();

    let mut matches = tree.text_nodes().filter(|(_, text)| *text == target).map(|(id, _)| id);
    let first = matches.next().ok_or_else(|| LocateError::NotFound(target.to_string()))?;
    let others = matches.count();
    if others > 0 {
        warn!(
            "{} nodes carry the text '{}'; locking onto the first in document order",
            others + 1,
            target
        );
    }

    // The locator addresses the element containing the matched text node.
    let element = tree.parent(first).ok_or_else(|| LocateError::NotFound(target.to_string()))?;
    Ok(Locator { path: path_to(tree, element) })
}

fn path_to(tree: &DomTree, leaf: NodeId) -> Vec<PathStep> {
    let mut steps = Vec::new();
    let mut current = Some(leaf);
    while let Some(id) = current {
        if let Some(tag) = tree.tag(id) {
            steps.push(PathStep { tag: tag.to_string(), index: 1 + tree.preceding_same_tag(id) });
        }
        current = tree.parent(id);
    }
    steps.reverse();
    steps
}

/// Walks the path top-down against current content and returns the
/// target element's text.
///
/// Any tag mismatch or out-of-range index fails with
/// [`LocateError::Stale`]; a stale path must never be silently mapped
/// onto a different node.
pub fn reresolve(tree: &DomTree, locator: &Locator) -> Result<String, LocateError> {
    let mut steps = locator.path.iter();
    let first = steps
        .next()
        .ok_or_else(|| LocateError::Stale { step: 0, detail: "empty path".into() })?;

    let root = tree.root();
    if tree.tag(root) != Some(first.tag.as_str()) || first.index != 1 {
        return Err(LocateError::Stale { step: 0, detail: first.to_string() });
    }

    let mut current = root;
    for (depth, step) in steps.enumerate() {
        if step.index == 0 {
            return Err(LocateError::Stale { step: depth + 1, detail: step.to_string() });
        }
        current = tree
            .element_children(current)
            .filter(|&child| tree.tag(child) == Some(step.tag.as_str()))
            .nth(step.index - 1)
            .ok_or_else(|| LocateError::Stale { step: depth + 1, detail: step.to_string() })?;
    }

    Ok(tree.descendant_text(current))
}
