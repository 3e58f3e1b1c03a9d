//! Error types for the marker library.
//!
//! Only caller-input problems surface as errors. Degenerate patterns, invalid
//! ranges and unreadable regions of the tree are absorbed where they occur.

use crate::tree::NodeId;

/// Result type alias for marker operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while marking or unmarking a tree.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A search pattern (caller supplied or compiled from a term) failed to build
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The pattern source that failed to compile
        pattern: String,
        /// Reason reported by the regex engine
        reason: String,
    },

    /// Markup could not be read into a content tree
    #[error("Markup error: {0}")]
    Markup(String),

    /// Malformed selector in an exclude or unmark selector list
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// Node id does not belong to the tree
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Operation requires a text node
    #[error("Node {0} is not a text node")]
    NotText(NodeId),

    /// Operation requires an element node
    #[error("Node {0} is not an element")]
    NotElement(NodeId),

    /// Split offset outside the node's text or not on a character boundary
    #[error("Offset {offset} is out of bounds for node {node}")]
    OffsetOutOfBounds {
        /// Node being split
        node: NodeId,
        /// Requested byte offset
        offset: usize,
    },

    /// Options could not be deserialized
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}
