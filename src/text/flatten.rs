//! Flattening text leaves into one logical string.
//!
//! The logical string is the document-ordered concatenation of the collected
//! text nodes. The offset table maps every byte of it back to a node:
//! segments are contiguous, non-overlapping, and their lengths sum to the
//! length of the string, so a pattern can match text straddling node
//! boundaries as if it were one string.

use crate::tree::{ContentTree, NodeId};

/// One text node's share of the logical string, as byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Text node owning this slice
    pub node: NodeId,
    /// Start offset in the logical string
    pub start: usize,
    /// End offset (exclusive) in the logical string
    pub end: usize,
}

impl Segment {
    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// True for a zero-length segment.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Does this segment intersect `[start, end)`?
    pub fn intersects(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }
}

/// Flattened text plus its offset table.
#[derive(Debug, Clone, Default)]
pub struct LogicalString {
    text: String,
    segments: Vec<Segment>,
}

impl LogicalString {
    /// Concatenate the text of `nodes` in the given order.
    ///
    /// Non-text nodes are ignored.
    pub fn build(tree: &ContentTree, nodes: &[NodeId]) -> Self {
        let mut text = String::new();
        let mut segments = Vec::with_capacity(nodes.len());
        for &node in nodes {
            let Some(node_text) = tree.text(node) else {
                continue;
            };
            let start = text.len();
            text.push_str(node_text);
            segments.push(Segment {
                node,
                start,
                end: text.len(),
            });
        }
        log::trace!("Flattened {} text nodes into {} bytes", segments.len(), text.len());
        Self { text, segments }
    }

    /// Rebuild from a known text and segment table (used for cached snapshots).
    pub(crate) fn from_parts(text: String, segments: Vec<Segment>) -> Self {
        let logical = Self { text, segments };
        debug_assert!(logical.is_consistent());
        logical
    }

    pub(crate) fn into_parts(self) -> (String, Vec<Segment>) {
        (self.text, self.segments)
    }

    /// The flattened text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// True when no text was collected.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The offset table.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Text nodes in document order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.segments.iter().map(|s| s.node)
    }

    /// Text covered by one segment.
    pub fn segment_text(&self, index: usize) -> &str {
        let seg = &self.segments[index];
        &self.text[seg.start..seg.end]
    }

    /// Index of the segment containing byte `offset`.
    pub fn locate(&self, offset: usize) -> Option<usize> {
        let index = self.segments.partition_point(|s| s.end <= offset);
        self.segments
            .get(index)
            .filter(|s| s.start <= offset && offset < s.end)
            .map(|_| index)
    }

    /// Byte offset of every character start, plus the text length at the end.
    pub fn char_boundaries(&self) -> Vec<usize> {
        let mut bounds: Vec<usize> = self.text.char_indices().map(|(i, _)| i).collect();
        bounds.push(self.text.len());
        bounds
    }

    /// Number of characters.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Check the offset table invariant.
    pub fn is_consistent(&self) -> bool {
        let mut expected = 0;
        for seg in &self.segments {
            if seg.start != expected || seg.end < seg.start {
                return false;
            }
            expected = seg.end;
        }
        expected == self.text.len()
    }
}
