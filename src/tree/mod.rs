//! Content tree the marker operates on.
//!
//! The tree is an arena of document, element and text nodes with
//! index-based links. It exposes the narrow primitives the engine needs:
//! ordered text leaves, splitting a text node, wrapping a node in an element
//! and replacing an element by its children.

mod document;
mod markup;
mod node;
pub mod selector;

pub use document::{Ancestors, Children, ContentTree, Descendants};
pub use markup::SEALED_ATTRIBUTE;
pub use node::{ElementData, Node, NodeId, NodeKind, SharedText};
pub use selector::{Selector, SelectorList};
