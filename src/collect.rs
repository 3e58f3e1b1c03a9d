//! Collection of text-bearing leaves.
//!
//! Walks a subtree in document order with the tree's pre-order links (no
//! recursion) and returns the non-empty text nodes that are eligible for
//! matching. Ineligible regions are skipped whole:
//! - elements matching the exclude selectors
//! - `script`, `style`, `title` and `head` elements
//! - sealed elements (content the host cannot read)
//! - elements rejected by the caller's predicate

use crate::tree::{ContentTree, NodeId, NodeKind, SelectorList};

/// Elements whose content is never searched.
pub const IGNORED_TAGS: &[&str] = &["script", "style", "title", "head"];

/// Caller-supplied exclusion predicate.
pub type ExcludePredicate<'a> = &'a dyn Fn(&ContentTree, NodeId) -> bool;

/// Collects eligible text nodes under a root.
pub struct NodeCollector<'a> {
    exclude: &'a SelectorList,
    predicate: Option<ExcludePredicate<'a>>,
}

impl<'a> NodeCollector<'a> {
    /// Collector honoring an exclude selector list.
    pub fn new(exclude: &'a SelectorList) -> Self {
        Self {
            exclude,
            predicate: None,
        }
    }

    /// Also skip elements for which `predicate` returns true.
    pub fn with_predicate(mut self, predicate: ExcludePredicate<'a>) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Should the subtree rooted at element `node` be skipped?
    pub fn skips(&self, tree: &ContentTree, node: NodeId) -> bool {
        let Some(data) = tree.element(node) else {
            return false;
        };
        if data.sealed {
            log::debug!("Skipping sealed element {} <{}>", node, data.tag);
            return true;
        }
        IGNORED_TAGS.contains(&data.tag.as_str())
            || self.exclude.matches(tree, node)
            || self.predicate.is_some_and(|p| p(tree, node))
    }

    /// Non-empty text nodes under `root` in document order.
    pub fn collect(&self, tree: &ContentTree, root: NodeId) -> Vec<NodeId> {
        let mut nodes = Vec::new();
        if let Some(text) = tree.text(root) {
            if !text.is_empty() {
                nodes.push(root);
            }
            return nodes;
        }
        if self.skips(tree, root) {
            return nodes;
        }

        let mut current = tree.first_child(root);
        while let Some(node) = current {
            let descend = match tree.get(node).map(|n| &n.kind) {
                Some(NodeKind::Text(text)) => {
                    if !text.is_empty() {
                        nodes.push(node);
                    }
                    false
                },
                Some(NodeKind::Element(_)) => !self.skips(tree, node),
                _ => true,
            };
            current = tree.following(node, root, descend);
        }
        log::debug!("Collected {} text nodes under {}", nodes.len(), root);
        nodes
    }
}
