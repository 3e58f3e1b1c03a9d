//! Arena-based content tree.
//!
//! Nodes are stored in a single vector and linked through [`NodeId`]s:
//! - O(1) insert, detach and split
//! - ids stay valid for the lifetime of the tree (detached nodes are kept)
//! - every traversal is iterative, so deep trees cannot exhaust the stack

use super::node::{ElementData, Node, NodeId, NodeKind, SharedText};
use crate::error::{Error, Result};

/// A tree of elements and text leaves rooted at a document node.
#[derive(Debug, Clone)]
pub struct ContentTree {
    nodes: Vec<Node>,
}

impl Default for ContentTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentTree {
    /// Create an empty tree holding only the document root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Document)],
        }
    }

    /// The document root.
    pub fn root(&self) -> NodeId {
        NodeId::from_index(0)
    }

    /// Number of nodes ever allocated (attached or not).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A fresh tree always holds its root, so it is never empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Look up a node, failing for foreign ids.
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.get(id).ok_or(Error::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(id.index()).ok_or(Error::NodeNotFound(id))
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(Node::new(kind));
        id
    }

    /// Create a detached element.
    pub fn create_element(&mut self, data: ElementData) -> NodeId {
        self.alloc(NodeKind::Element(data))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Text(SharedText::from(text.into())))
    }

    /// Create an element and append it to `parent`.
    pub fn append_element(&mut self, parent: NodeId, data: ElementData) -> Result<NodeId> {
        let id = self.create_element(data);
        self.append_child(parent, id)?;
        Ok(id)
    }

    /// Create a text node and append it to `parent`.
    pub fn append_text(&mut self, parent: NodeId, text: impl Into<String>) -> Result<NodeId> {
        let id = self.create_text(text);
        self.append_child(parent, id)?;
        Ok(id)
    }

    /// Text of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(Node::as_text)
    }

    /// Element data of an element node.
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(Node::as_element)
    }

    /// Mutable element data.
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match self.nodes.get_mut(id.index()).map(|n| &mut n.kind) {
            Some(NodeKind::Element(data)) => Some(data),
            _ => None,
        }
    }

    /// Replace the text of a text node.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<()> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Text(current) => {
                *current = SharedText::from(text.into());
                Ok(())
            },
            _ => Err(Error::NotText(id)),
        }
    }

    /// Parent of a node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// First child of a node.
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.first_child)
    }

    /// Next sibling of a node.
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.next_sibling)
    }

    /// Previous sibling of a node.
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.prev_sibling)
    }

    /// Iterate over the direct children of a node.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.first_child(id),
        }
    }

    /// Iterate over the ancestors of a node, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// Pre-order iteration over the descendants of `scope` (excluding `scope`).
    pub fn descendants(&self, scope: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            scope,
            next: self.first_child(scope),
        }
    }

    /// Next node in pre-order within `scope`.
    ///
    /// With `descend == false` the children of `node` are skipped.
    pub fn following(&self, node: NodeId, scope: NodeId, descend: bool) -> Option<NodeId> {
        if descend {
            if let Some(child) = self.first_child(node) {
                return Some(child);
            }
        }
        let mut current = node;
        loop {
            if current == scope {
                return None;
            }
            if let Some(sibling) = self.next_sibling(current) {
                return Some(sibling);
            }
            current = self.parent(current)?;
        }
    }

    /// Whether `node` is connected to the document root.
    pub fn is_attached(&self, node: NodeId) -> bool {
        node == self.root() || self.ancestors(node).any(|a| a == self.root())
    }

    /// Concatenated text of all text descendants, in document order.
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        let mut out = String::new();
        for node in self.descendants(id) {
            if let Some(text) = self.text(node) {
                out.push_str(text);
            }
        }
        out
    }

    /// Remove a node (and its subtree) from its parent. The node stays in the arena.
    pub fn detach(&mut self, id: NodeId) -> Result<()> {
        let (parent, prev, next) = {
            let node = self.node(id)?;
            (node.parent, node.prev_sibling, node.next_sibling)
        };
        let Some(parent) = parent else {
            return Ok(());
        };
        match prev {
            Some(prev) => self.node_mut(prev)?.next_sibling = next,
            None => self.node_mut(parent)?.first_child = next,
        }
        match next {
            Some(next) => self.node_mut(next)?.prev_sibling = prev,
            None => self.node_mut(parent)?.last_child = prev,
        }
        let node = self.node_mut(id)?;
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
        Ok(())
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` into `parent` before `reference` (or last when `None`).
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        if self.node(parent)?.is_text() {
            return Err(Error::NotElement(parent));
        }
        self.detach(child)?;
        let prev = match reference {
            Some(reference) => {
                let node = self.node(reference)?;
                if node.parent != Some(parent) {
                    return Err(Error::NodeNotFound(reference));
                }
                node.prev_sibling
            },
            None => self.node(parent)?.last_child,
        };
        {
            let node = self.node_mut(child)?;
            node.parent = Some(parent);
            node.prev_sibling = prev;
            node.next_sibling = reference;
        }
        match prev {
            Some(prev) => self.node_mut(prev)?.next_sibling = Some(child),
            None => self.node_mut(parent)?.first_child = Some(child),
        }
        match reference {
            Some(reference) => self.node_mut(reference)?.prev_sibling = Some(child),
            None => self.node_mut(parent)?.last_child = Some(child),
        }
        Ok(())
    }

    /// Split a text node at a byte offset.
    ///
    /// The original node keeps `[0, offset)` and the returned node, inserted
    /// as its next sibling, holds the rest.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> Result<NodeId> {
        let tail = match &mut self.node_mut(id)?.kind {
            NodeKind::Text(text) => {
                if offset > text.len() || !text.is_char_boundary(offset) {
                    return Err(Error::OffsetOutOfBounds { node: id, offset });
                }
                text.split_off(offset)
            },
            _ => return Err(Error::NotText(id)),
        };
        let new_node = self.alloc(NodeKind::Text(tail));
        if let Some(parent) = self.parent(id) {
            let next = self.next_sibling(id);
            self.insert_before(parent, new_node, next)?;
        }
        Ok(new_node)
    }

    /// Put `element` where `node` is and move `node` inside it.
    pub fn wrap(&mut self, node: NodeId, element: NodeId) -> Result<()> {
        if self.element(element).is_none() {
            return Err(Error::NotElement(element));
        }
        if let Some(parent) = self.parent(node) {
            self.insert_before(parent, element, Some(node))?;
        }
        self.append_child(element, node)
    }

    /// Replace an element by its children, keeping their identity.
    ///
    /// Returns the parent that received the children.
    pub fn unwrap(&mut self, element: NodeId) -> Result<NodeId> {
        if self.element(element).is_none() {
            return Err(Error::NotElement(element));
        }
        let parent = self.parent(element).ok_or(Error::NodeNotFound(element))?;
        while let Some(child) = self.first_child(element) {
            self.insert_before(parent, child, Some(element))?;
        }
        self.detach(element)?;
        Ok(parent)
    }

    /// Merge runs of adjacent text children of `parent` into their first node.
    ///
    /// Returns the number of text nodes absorbed.
    pub fn merge_text_siblings(&mut self, parent: NodeId) -> Result<usize> {
        let mut merged = 0;
        let mut current = self.first_child(parent);
        while let Some(node) = current {
            if self.text(node).is_none() {
                current = self.next_sibling(node);
                continue;
            }
            // one rebuild per run keeps long runs linear
            let mut joined: Option<String> = None;
            let mut next = self.next_sibling(node);
            while let Some(sibling) = next {
                let Some(text) = self.text(sibling) else { break };
                if joined.is_none() {
                    joined = Some(self.text(node).unwrap_or_default().to_string());
                }
                if let Some(buf) = joined.as_mut() {
                    buf.push_str(text);
                }
                next = self.next_sibling(sibling);
                self.detach(sibling)?;
                merged += 1;
            }
            if let Some(text) = joined {
                self.set_text(node, text)?;
            }
            current = next;
        }
        Ok(merged)
    }
}

/// Iterator over direct children.
pub struct Children<'a> {
    tree: &'a ContentTree,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.next_sibling(current);
        Some(current)
    }
}

/// Iterator over ancestors, nearest first.
pub struct Ancestors<'a> {
    tree: &'a ContentTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

/// Pre-order iterator over a subtree.
pub struct Descendants<'a> {
    tree: &'a ContentTree,
    scope: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.following(current, self.scope, true);
        Some(current)
    }
}
