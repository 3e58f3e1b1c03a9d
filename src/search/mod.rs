//! Match discovery: term compilation, the match engine and range resolution.
//!
//! Terms and caller patterns are compiled into a [`MatcherSet`], which the
//! [`MatchEngine`] runs over a [`LogicalString`](crate::text::LogicalString)
//! to produce ordered [`MatchSpan`]s. Explicit ranges bypass both and go
//! through the [`RangeResolver`] instead.
//!
//! ## Example
//!
//! ```ignore
//! use tree_marker::config::MarkOptions;
//! use tree_marker::search::{MatchEngine, TermPreprocessor};
//!
//! let options = MarkOptions::default();
//! let set = TermPreprocessor::new(&options).compile(&"lorem ipsum".into())?;
//! let outcome = MatchEngine::new(&set).run(&logical, options.across_elements);
//! for span in &outcome.spans {
//!     println!("{}..{} {}", span.start, span.end, set.matchers[span.matcher].term);
//! }
//! ```

pub mod matcher;
pub mod ranges;
mod text_search;

pub use matcher::{compile_user_pattern, Matcher, MatcherSet, PatternBatch, SearchInput, TermPreprocessor};
pub use ranges::{RangeRejection, RangeResolution, RangeResolver, RangeSpec, RangeValue, ResolvedRange};
pub use text_search::{MatchEngine, MatchOutcome, MatchSpan};
