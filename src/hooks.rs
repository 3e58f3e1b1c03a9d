//! Caller callbacks and run summaries.
//!
//! Every hook has a default, so implementors override only what they need.
//! Hooks are plain synchronous calls made from inside a job chunk.

use crate::tree::{ContentTree, NodeId};
use indexmap::IndexMap;

/// Where an accepted match came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    /// A searched term or one of its synonyms
    Term {
        /// Index of the matcher in the compiled set
        matcher: usize,
    },
    /// A caller regular expression
    Pattern {
        /// Capture group, when groups are wrapped separately
        group: Option<usize>,
    },
    /// An explicit range
    Range {
        /// Position in the caller's range list
        index: usize,
        /// First character
        start: usize,
        /// Number of characters
        length: usize,
    },
}

/// A candidate match, shown to [`MarkHooks::accept`] before wrapping.
#[derive(Debug, Clone)]
pub struct MatchInfo<'a> {
    /// Matched text
    pub text: &'a str,
    /// Searched term the match counts under (the pattern for pattern search)
    pub term: Option<&'a str>,
    /// Synonym or term that actually matched
    pub matched_term: Option<&'a str>,
    /// Origin of the match
    pub source: MatchSource,
    /// Matches accepted so far in this run
    pub count: usize,
    /// Matches accepted so far for `term` (the run total for ranges)
    pub term_count: usize,
}

/// One created highlight element, shown to [`MarkHooks::each`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementInfo {
    /// Index of the accepted match this element belongs to
    pub match_index: usize,
    /// Position of the element within its match
    pub part: usize,
    /// Number of elements the match produced
    pub parts: usize,
    /// True for the first element of a match
    pub is_match_start: bool,
}

/// Aggregate counts of a mark run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkSummary {
    /// Highlight elements inserted
    pub total_wraps: usize,
    /// Matches accepted
    pub total_matches: usize,
    /// Accepted matches per searched term, in input order
    pub term_stats: IndexMap<String, usize>,
}

/// Result of an unmark run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnmarkSummary {
    /// Highlight elements removed
    pub removed: usize,
    /// Text nodes merged back into a neighbour
    pub merged: usize,
}

/// State of a chunked job after one `resume`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress<T> {
    /// More chunks remain
    Pending,
    /// Finished with this summary
    Done(T),
}

impl<T> Progress<T> {
    /// True when the job has finished.
    pub fn is_done(&self) -> bool {
        matches!(self, Progress::Done(_))
    }

    /// The summary, if finished.
    pub fn done(self) -> Option<T> {
        match self {
            Progress::Done(summary) => Some(summary),
            Progress::Pending => None,
        }
    }
}

/// Callbacks fired during a mark run.
pub trait MarkHooks {
    /// Decide whether a candidate match is wrapped.
    fn accept(&mut self, _info: &MatchInfo<'_>) -> bool {
        true
    }

    /// Called once per created highlight element.
    ///
    /// A match that crosses nodes creates one element per covered node, so
    /// the call count equals `MarkSummary::total_wraps`, not `total_matches`.
    /// `ElementInfo::part` and `is_match_start` tell the pieces of one match apart.
    fn each(&mut self, _tree: &ContentTree, _element: NodeId, _info: &ElementInfo) {}

    /// Called for a term without matches, or a range that was dropped.
    fn no_match(&mut self, _item: &str) {}

    /// Called exactly once, after every other hook and mutation of the run.
    fn done(&mut self, _summary: &MarkSummary) {}

    /// Recoverable problem worth reporting (degenerate patterns).
    fn warning(&mut self, _message: &str) {}

    /// Skip the subtree rooted at element `node`.
    fn excludes(&self, _tree: &ContentTree, _node: NodeId) -> bool {
        false
    }
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl MarkHooks for NoHooks {}
