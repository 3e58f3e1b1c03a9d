//! Content tree node representation.
//!
//! Nodes live in an arena and refer to each other through [`NodeId`] indices,
//! so parent and sibling links are lookups rather than ownership edges.

use indexmap::IndexMap;
use std::fmt;
use std::ops::{Deref, Range};
use std::sync::Arc;

/// Compact node identifier (index into the tree arena).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Build an id from an arena index.
    pub fn from_index(index: usize) -> Self {
        NodeId(index as u32)
    }

    /// Arena index of this node.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Element payload: tag name, ordered attributes and the sealed flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    /// Lower-cased tag name
    pub tag: String,
    /// Attributes in source order
    pub attributes: IndexMap<String, String>,
    /// Structurally inaccessible region (its content is never collected)
    pub sealed: bool,
}

impl ElementData {
    /// Create element data for a tag with no attributes.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attributes: IndexMap::new(),
            sealed: false,
        }
    }

    /// Set an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Add one or more whitespace-separated classes.
    pub fn with_class(mut self, class_name: &str) -> Self {
        for class in class_name.split_whitespace() {
            self.add_class(class);
        }
        self
    }

    /// Mark the element as sealed.
    pub fn sealed(mut self) -> Self {
        self.sealed = true;
        self
    }

    /// Attribute value by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Iterate over the element's classes.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attribute("class").unwrap_or("").split_whitespace()
    }

    /// Check whether the element carries a class.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Add a class unless already present.
    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let entry = self.attributes.entry("class".to_string()).or_default();
        if !entry.is_empty() {
            entry.push(' ');
        }
        entry.push_str(class);
    }
}

/// Text of a leaf: a window into a buffer shared with the nodes it was split from.
///
/// Splitting only narrows windows, so cutting one long text into many pieces
/// never copies the remainder.
#[derive(Clone)]
pub struct SharedText {
    buf: Arc<str>,
    range: Range<usize>,
}

impl SharedText {
    /// Text as a string slice.
    pub fn as_str(&self) -> &str {
        &self.buf[self.range.clone()]
    }

    /// Cut at a byte offset; `self` keeps `[0, at)` and the rest is returned.
    ///
    /// `at` must be a char boundary within the text.
    pub(crate) fn split_off(&mut self, at: usize) -> SharedText {
        let cut = self.range.start + at;
        let tail = SharedText {
            buf: Arc::clone(&self.buf),
            range: cut..self.range.end,
        };
        self.range.end = cut;
        tail
    }
}

impl From<String> for SharedText {
    fn from(text: String) -> Self {
        let len = text.len();
        SharedText {
            buf: Arc::from(text),
            range: 0..len,
        }
    }
}

impl From<&str> for SharedText {
    fn from(text: &str) -> Self {
        SharedText::from(text.to_string())
    }
}

impl Deref for SharedText {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq for SharedText {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for SharedText {}

impl fmt::Debug for SharedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

/// Type of content node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Tree root
    Document,
    /// Structural element
    Element(ElementData),
    /// Text-bearing leaf
    Text(SharedText),
}

/// A node in the arena.
#[derive(Debug, Clone)]
pub struct Node {
    /// Node payload
    pub kind: NodeKind,
    /// Parent node (None for the root and for detached nodes)
    pub parent: Option<NodeId>,
    /// First child node
    pub first_child: Option<NodeId>,
    /// Last child node
    pub last_child: Option<NodeId>,
    /// Previous sibling
    pub prev_sibling: Option<NodeId>,
    /// Next sibling
    pub next_sibling: Option<NodeId>,
}

impl Node {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Node {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
        }
    }

    /// Text content if this is a text node.
    pub fn as_text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Element data if this is an element.
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    /// Is this a text node?
    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_text_split() {
        let mut text = SharedText::from("lorem ipsum");
        let tail = text.split_off(5);
        assert_eq!(text.as_str(), "lorem");
        assert_eq!(&*tail, " ipsum");
        assert!(Arc::ptr_eq(&text.buf, &tail.buf));

        let mut tail = tail;
        let end = tail.split_off(tail.len());
        assert_eq!(tail.as_str(), " ipsum");
        assert!(end.is_empty());
        assert_eq!(SharedText::from("ipsum"), tail.split_off(1));
    }

    #[test]
    fn test_classes() {
        let mut el = ElementData::new("MARK").with_class("hl  primary");
        assert_eq!(el.tag, "mark");
        assert!(el.has_class("hl"));
        assert!(el.has_class("primary"));
        el.add_class("hl");
        assert_eq!(el.attribute("class"), Some("hl primary"));
    }

    #[test]
    fn test_node_id_display() {
        assert_eq!(NodeId::from_index(12).to_string(), "#12");
        assert_eq!(NodeId::from_index(12).index(), 12);
    }
}
