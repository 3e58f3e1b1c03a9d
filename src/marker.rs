//! The public marking operations.
//!
//! A [`Marker`] is bound to one root node. Each operation first builds a job:
//! it collects and flattens the text under the root, finds the spans to wrap
//! and stores them as a plan. The job then applies the plan in chunks of at
//! most `chunk_size` created (or removed) elements per [`MarkJob::resume`],
//! so a host can interleave other work between chunks. The convenience
//! methods run a job to completion.
//!
//! ```ignore
//! use tree_marker::{ContentTree, MarkOptions, Marker, NoHooks};
//!
//! let mut tree = ContentTree::parse_fragment("<p>Lorem ipsum dolor</p>")?;
//! let mut marker = Marker::new(tree.root());
//! let summary = marker.mark(&mut tree, "lorem dolor", &MarkOptions::default(), &mut NoHooks)?;
//! assert_eq!(summary.total_matches, 2);
//! ```

use crate::collect::NodeCollector;
use crate::config::{MarkOptions, PatternOptions, RangeOptions, UnmarkOptions, WrapSettings};
use crate::error::Result;
use crate::hooks::{ElementInfo, MarkHooks, MarkSummary, MatchInfo, MatchSource, Progress, UnmarkSummary};
use crate::search::{
    compile_user_pattern, MatchEngine, MatchOutcome, MatcherSet, RangeResolver, RangeSpec, SearchInput, TermPreprocessor,
};
use crate::text::LogicalString;
use crate::tree::{ContentTree, NodeId, SelectorList};
use crate::wrap::{Unwrapper, Wrapper};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Marks and unmarks text under one root node.
///
/// The marker also holds the text-node snapshot of the last run that enabled
/// `cache_text_nodes`. The caller must not change the tree between two
/// cached runs.
#[derive(Debug)]
pub struct Marker {
    root: NodeId,
    cache: Option<LogicalString>,
}

impl Marker {
    /// Create a marker for the subtree under `root`.
    pub fn new(root: NodeId) -> Self {
        Self { root, cache: None }
    }

    /// Root node this marker works on.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// True when a text-node snapshot is stored.
    pub fn has_cached_snapshot(&self) -> bool {
        self.cache.is_some()
    }

    fn snapshot(&mut self, tree: &ContentTree, settings: &WrapSettings, hooks: &dyn MarkHooks) -> Result<LogicalString> {
        if !settings.cache_text_nodes {
            self.cache = None;
        } else if let Some(cached) = self.cache.take() {
            log::debug!("Reusing cached snapshot of {} text nodes", cached.segments().len());
            return Ok(cached);
        }
        let exclude = SelectorList::parse(settings.exclude.as_slice())?;
        let predicate = |t: &ContentTree, node: NodeId| hooks.excludes(t, node);
        let nodes = NodeCollector::new(&exclude)
            .with_predicate(&predicate)
            .collect(tree, self.root);
        Ok(LogicalString::build(tree, &nodes))
    }

    /// Prepare a term search.
    pub fn mark_job(
        &mut self,
        tree: &ContentTree,
        input: impl Into<SearchInput>,
        options: &MarkOptions,
        hooks: &dyn MarkHooks,
    ) -> Result<MarkJob> {
        let set = TermPreprocessor::new(options).compile(&input.into())?;
        let logical = self.snapshot(tree, &options.wrap, hooks)?;
        let outcome = MatchEngine::new(&set).run(&logical, options.across_elements);
        Ok(MarkJob::from_matches(logical, &options.wrap, &set, outcome, false))
    }

    /// Prepare a regular-expression search.
    pub fn mark_pattern_job(
        &mut self,
        tree: &ContentTree,
        pattern: &str,
        options: &PatternOptions,
        hooks: &dyn MarkHooks,
    ) -> Result<MarkJob> {
        let set = compile_user_pattern(pattern, options)?;
        let logical = self.snapshot(tree, &options.wrap, hooks)?;
        let outcome = MatchEngine::new(&set).run(&logical, options.across_elements);
        Ok(MarkJob::from_matches(logical, &options.wrap, &set, outcome, true))
    }

    /// Prepare marking of explicit character ranges.
    pub fn mark_ranges_job(
        &mut self,
        tree: &ContentTree,
        ranges: &[RangeSpec],
        options: &RangeOptions,
        hooks: &dyn MarkHooks,
    ) -> Result<MarkJob> {
        let logical = self.snapshot(tree, &options.wrap, hooks)?;
        let resolution = RangeResolver::new(&logical).resolve(ranges, options.wrap_all_ranges);
        let planned = resolution
            .accepted
            .iter()
            .map(|range| PlannedMatch {
                start: range.start,
                end: range.end,
                term: None,
                name: None,
                source: MatchSource::Range {
                    index: range.index,
                    start: range.char_start,
                    length: range.char_end - range.char_start,
                },
            })
            .collect();
        let unmatched = resolution.rejected.iter().map(|&(index, _)| ranges[index].to_string()).collect();
        Ok(MarkJob::new(
            logical,
            &options.wrap,
            planned,
            Vec::new(),
            Vec::new(),
            Vec::new(),
            unmatched,
        ))
    }

    /// Prepare removal of highlight elements.
    pub fn unmark_job(&mut self, tree: &ContentTree, options: &UnmarkOptions) -> Result<UnmarkJob> {
        self.cache = None;
        let unwrapper = Unwrapper::new(&options.wrap)?;
        let targets = unwrapper.find(tree, self.root);
        Ok(UnmarkJob {
            unwrapper,
            targets,
            next: 0,
            chunk_size: options.wrap.chunk_size.max(1),
            summary: UnmarkSummary::default(),
        })
    }

    /// Run a mark job to completion and keep its snapshot if it asked for caching.
    pub fn complete(&mut self, tree: &mut ContentTree, job: &mut MarkJob, hooks: &mut dyn MarkHooks) -> Result<MarkSummary> {
        loop {
            if let Progress::Done(summary) = job.resume(tree, hooks)? {
                if let Some(snapshot) = job.snapshot.take() {
                    self.cache = Some(snapshot);
                }
                return Ok(summary);
            }
        }
    }

    /// Find `input` and wrap every occurrence.
    pub fn mark(
        &mut self,
        tree: &mut ContentTree,
        input: impl Into<SearchInput>,
        options: &MarkOptions,
        hooks: &mut dyn MarkHooks,
    ) -> Result<MarkSummary> {
        let mut job = self.mark_job(tree, input, options, &*hooks)?;
        self.complete(tree, &mut job, hooks)
    }

    /// Wrap every match of a regular expression.
    ///
    /// Patterns use the `regex` crate syntax, which has no look-ahead or
    /// look-behind; those fail with [`crate::Error::InvalidPattern`]. Match the
    /// context in a capture group instead and leave it unwrapped with
    /// `ignore_groups` or `separate_groups`: `(?<=one )(lorem)` becomes
    /// `(one )(lorem)` with `ignore_groups = 1`.
    pub fn mark_pattern(
        &mut self,
        tree: &mut ContentTree,
        pattern: &str,
        options: &PatternOptions,
        hooks: &mut dyn MarkHooks,
    ) -> Result<MarkSummary> {
        let mut job = self.mark_pattern_job(tree, pattern, options, &*hooks)?;
        self.complete(tree, &mut job, hooks)
    }

    /// Wrap explicit character ranges.
    pub fn mark_ranges(
        &mut self,
        tree: &mut ContentTree,
        ranges: &[RangeSpec],
        options: &RangeOptions,
        hooks: &mut dyn MarkHooks,
    ) -> Result<MarkSummary> {
        let mut job = self.mark_ranges_job(tree, ranges, options, &*hooks)?;
        self.complete(tree, &mut job, hooks)
    }

    /// Remove highlight elements and merge the text they leave behind.
    pub fn unmark(&mut self, tree: &mut ContentTree, options: &UnmarkOptions) -> Result<UnmarkSummary> {
        let mut job = self.unmark_job(tree, options)?;
        loop {
            if let Progress::Done(summary) = job.resume(tree)? {
                return Ok(summary);
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PlannedMatch {
    start: usize,
    end: usize,
    /// Index into the statistics keys
    term: Option<usize>,
    /// Index into the matcher names
    name: Option<usize>,
    source: MatchSource,
}

/// A resumable mark run.
#[derive(Debug)]
pub struct MarkJob {
    wrapper: Option<Wrapper>,
    planned: Vec<PlannedMatch>,
    next: usize,
    chunk_size: usize,
    names: Vec<String>,
    summary: MarkSummary,
    warnings: Vec<String>,
    unmatched: Vec<String>,
    started: bool,
    finished: Option<MarkSummary>,
    keep_snapshot: bool,
    snapshot: Option<LogicalString>,
}

impl MarkJob {
    fn new(
        logical: LogicalString,
        settings: &WrapSettings,
        planned: Vec<PlannedMatch>,
        keys: Vec<String>,
        names: Vec<String>,
        warnings: Vec<String>,
        unmatched: Vec<String>,
    ) -> Self {
        let term_stats: IndexMap<String, usize> = keys.into_iter().map(|key| (key, 0)).collect();
        log::debug!("Planned {} matches over {} bytes of text", planned.len(), logical.len());
        Self {
            wrapper: Some(Wrapper::new(logical, settings)),
            planned,
            next: 0,
            chunk_size: settings.chunk_size.max(1),
            names,
            summary: MarkSummary {
                term_stats,
                ..MarkSummary::default()
            },
            warnings,
            unmatched,
            started: false,
            finished: None,
            keep_snapshot: settings.cache_text_nodes,
            snapshot: None,
        }
    }

    fn from_matches(
        logical: LogicalString,
        settings: &WrapSettings,
        set: &MatcherSet,
        outcome: MatchOutcome,
        pattern: bool,
    ) -> Self {
        let key_index: HashMap<&str, usize> = set.terms.iter().enumerate().map(|(i, t)| (t.as_str(), i)).collect();
        let mut found = vec![0usize; set.terms.len()];
        let planned: Vec<PlannedMatch> = outcome
            .spans
            .iter()
            .map(|span| {
                let matcher = &set.matchers[span.matcher];
                let term = key_index.get(matcher.origin.as_str()).copied();
                if let Some(t) = term {
                    found[t] += 1;
                }
                let source = if pattern {
                    MatchSource::Pattern { group: span.group }
                } else {
                    MatchSource::Term { matcher: span.matcher }
                };
                PlannedMatch {
                    start: span.start,
                    end: span.end,
                    term,
                    name: Some(span.matcher),
                    source,
                }
            })
            .collect();

        let unmatched = set
            .terms
            .iter()
            .zip(&found)
            .filter(|(_, count)| **count == 0)
            .map(|(term, _)| term.clone())
            .collect();
        let warnings = outcome
            .degenerate
            .iter()
            .map(|&m| format!("Pattern for '{}' matches zero-width text; those matches were skipped", set.matchers[m].term))
            .collect();
        let names = set.matchers.iter().map(|m| m.term.clone()).collect();
        Self::new(logical, settings, planned, set.terms.clone(), names, warnings, unmatched)
    }

    /// Matches found before the `accept` hook ran.
    pub fn planned_matches(&self) -> usize {
        self.planned.len()
    }

    /// True once `done` has fired.
    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    /// Process the next chunk.
    ///
    /// A chunk wraps whole matches until the next one would exceed
    /// `chunk_size` elements; it always wraps at least one. Resuming a
    /// finished job returns its summary again without firing hooks.
    pub fn resume(&mut self, tree: &mut ContentTree, hooks: &mut dyn MarkHooks) -> Result<Progress<MarkSummary>> {
        if let Some(summary) = &self.finished {
            return Ok(Progress::Done(summary.clone()));
        }
        let Some(wrapper) = self.wrapper.as_mut() else {
            return Ok(Progress::Done(self.summary.clone()));
        };
        if !self.started {
            self.started = true;
            for warning in self.warnings.drain(..) {
                hooks.warning(&warning);
            }
        }

        let mut used = 0;
        while let Some(&planned) = self.planned.get(self.next) {
            let parts = wrapper.parts(planned.start, planned.end);
            if used > 0 && used + parts > self.chunk_size {
                log::trace!("Chunk done after {} elements, {} matches left", used, self.planned.len() - self.next);
                return Ok(Progress::Pending);
            }
            self.next += 1;

            let term_count = match planned.term {
                Some(t) => self.summary.term_stats.get_index(t).map_or(0, |(_, &count)| count),
                None => self.summary.total_matches,
            };
            let info = MatchInfo {
                text: wrapper.text(planned.start, planned.end),
                term: planned
                    .term
                    .and_then(|t| self.summary.term_stats.get_index(t))
                    .map(|(key, _)| key.as_str()),
                matched_term: planned.name.and_then(|n| self.names.get(n)).map(String::as_str),
                source: planned.source,
                count: self.summary.total_matches,
                term_count,
            };
            if !hooks.accept(&info) {
                continue;
            }

            let match_index = self.summary.total_matches;
            self.summary.total_matches += 1;
            if let Some((_, count)) = planned.term.and_then(|t| self.summary.term_stats.get_index_mut(t)) {
                *count += 1;
            }
            let created = wrapper.wrap_span(tree, planned.start, planned.end, |t, element, part, parts| {
                let info = ElementInfo {
                    match_index,
                    part,
                    parts,
                    is_match_start: part == 0,
                };
                hooks.each(t, element, &info);
            })?;
            self.summary.total_wraps += created;
            used += created;
        }

        for item in self.unmatched.drain(..) {
            hooks.no_match(&item);
        }
        if let Some(wrapper) = self.wrapper.take() {
            let snapshot = wrapper.finish();
            if self.keep_snapshot {
                self.snapshot = Some(snapshot);
            }
        }
        log::info!(
            "Marked {} matches with {} elements",
            self.summary.total_matches,
            self.summary.total_wraps
        );
        hooks.done(&self.summary);
        self.finished = Some(self.summary.clone());
        Ok(Progress::Done(self.summary.clone()))
    }
}

/// A resumable unmark run.
#[derive(Debug)]
pub struct UnmarkJob {
    unwrapper: Unwrapper,
    targets: Vec<NodeId>,
    next: usize,
    chunk_size: usize,
    summary: UnmarkSummary,
}

impl UnmarkJob {
    /// Highlight elements found when the job was created.
    pub fn targets(&self) -> usize {
        self.targets.len()
    }

    /// Remove up to `chunk_size` elements.
    pub fn resume(&mut self, tree: &mut ContentTree) -> Result<Progress<UnmarkSummary>> {
        if self.next < self.targets.len() {
            let end = (self.next + self.chunk_size).min(self.targets.len());
            let attached: Vec<NodeId> = self.targets[self.next..end]
                .iter()
                .copied()
                .filter(|&element| tree.is_attached(element))
                .collect();
            self.next = end;
            let touched = self.unwrapper.unwrap_all(tree, &attached)?;
            self.summary.removed += attached.len();
            self.summary.merged += self.unwrapper.normalize(tree, &touched)?;
            if self.next < self.targets.len() {
                return Ok(Progress::Pending);
            }
            log::info!(
                "Removed {} highlight elements, merged {} text nodes",
                self.summary.removed,
                self.summary.merged
            );
        }
        Ok(Progress::Done(self.summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AccuracyMode;
    use crate::hooks::NoHooks;

    #[derive(Default)]
    struct Recorder {
        accepted: Vec<String>,
        elements: usize,
        starts: usize,
        no_match: Vec<String>,
        warnings: Vec<String>,
        done: Vec<MarkSummary>,
        reject: Option<String>,
    }

    impl MarkHooks for Recorder {
        fn accept(&mut self, info: &MatchInfo<'_>) -> bool {
            if self.reject.as_deref() == Some(info.text) {
                return false;
            }
            self.accepted.push(info.text.to_string());
            true
        }

        fn each(&mut self, _tree: &ContentTree, _element: NodeId, info: &ElementInfo) {
            self.elements += 1;
            if info.is_match_start {
                self.starts += 1;
            }
        }

        fn no_match(&mut self, item: &str) {
            self.no_match.push(item.to_string());
        }

        fn done(&mut self, summary: &MarkSummary) {
            self.done.push(summary.clone());
        }

        fn warning(&mut self, message: &str) {
            self.warnings.push(message.to_string());
        }
    }

    #[test]
    fn test_mark_counts_and_hooks() {
        let mut tree = ContentTree::parse_fragment("<p>Lorem ipsum <b>lor</b>em dolor</p>").unwrap();
        let mut marker = Marker::new(tree.root());
        let mut hooks = Recorder::default();
        let options = MarkOptions::default().with_across_elements(true);
        let summary = marker.mark(&mut tree, "lorem sit", &options, &mut hooks).unwrap();

        assert_eq!(summary.total_matches, 2);
        assert_eq!(summary.total_wraps, 3);
        assert_eq!(summary.term_stats.get("lorem"), Some(&2));
        assert_eq!(summary.term_stats.get("sit"), Some(&0));
        assert_eq!(hooks.accepted, vec!["Lorem", "lorem"]);
        assert_eq!(hooks.elements, 3);
        assert_eq!(hooks.starts, 2);
        assert_eq!(hooks.no_match, vec!["sit"]);
        assert_eq!(hooks.done, vec![summary]);
    }

    #[test]
    fn test_rejected_match_keeps_counters() {
        let mut tree = ContentTree::parse_fragment("<p>a b a</p>").unwrap();
        let mut marker = Marker::new(tree.root());
        let mut hooks = Recorder {
            reject: Some("b".into()),
            ..Recorder::default()
        };
        let summary = marker.mark(&mut tree, "a b", &MarkOptions::default(), &mut hooks).unwrap();
        assert_eq!(summary.total_matches, 2);
        assert_eq!(summary.term_stats.get("b"), Some(&0));
        assert!(hooks.no_match.is_empty());
        assert_eq!(
            tree.inner_markup(tree.root()),
            r#"<p><mark data-mark="true">a</mark> b <mark data-mark="true">a</mark></p>"#
        );
    }

    #[test]
    fn test_chunked_job_fires_done_once() {
        let text = "ab ".repeat(10);
        let mut tree = ContentTree::parse_fragment(&format!("<p>{}</p>", text)).unwrap();
        let mut marker = Marker::new(tree.root());
        let mut hooks = Recorder::default();
        let options = MarkOptions::default().with_chunk_size(3);
        let mut job = marker.mark_job(&tree, "ab", &options, &hooks).unwrap();
        assert_eq!(job.planned_matches(), 10);

        let mut rounds = 0;
        let summary = loop {
            rounds += 1;
            match job.resume(&mut tree, &mut hooks).unwrap() {
                Progress::Pending => assert!(hooks.done.is_empty()),
                Progress::Done(summary) => break summary,
            }
        };
        assert_eq!(rounds, 4);
        assert_eq!(summary.total_wraps, 10);
        assert_eq!(job.resume(&mut tree, &mut hooks).unwrap(), Progress::Done(summary));
        assert_eq!(hooks.done.len(), 1);
    }

    #[test]
    fn test_degenerate_pattern_warns() {
        let mut tree = ContentTree::parse_fragment("<p>lorem</p>").unwrap();
        let mut marker = Marker::new(tree.root());
        let mut hooks = Recorder::default();
        let summary = marker
            .mark_pattern(&mut tree, "x*", &PatternOptions::default(), &mut hooks)
            .unwrap();
        assert_eq!(summary.total_wraps, 0);
        assert_eq!(hooks.warnings.len(), 1);
        assert_eq!(hooks.no_match, vec!["x*"]);
        assert_eq!(hooks.done.len(), 1);
    }

    #[test]
    fn test_ranges_report_dropped_entries() {
        let mut tree = ContentTree::parse_fragment("<p>lorem ipsum dolor</p>").unwrap();
        let mut marker = Marker::new(tree.root());
        let mut hooks = Recorder::default();
        let ranges = vec![RangeSpec::new(0, 5), RangeSpec::new(2, 2), RangeSpec::new("x", 1)];
        let summary = marker
            .mark_ranges(&mut tree, &ranges, &RangeOptions::default(), &mut hooks)
            .unwrap();
        assert_eq!(summary.total_wraps, 1);
        assert!(summary.term_stats.is_empty());
        assert_eq!(hooks.no_match.len(), 2);
    }

    #[test]
    fn test_cache_is_reused_and_dropped() {
        let mut tree = ContentTree::parse_fragment("<p>lorem ipsum</p>").unwrap();
        let mut marker = Marker::new(tree.root());
        let cached = MarkOptions::default().with_cache_text_nodes(true);
        marker.mark(&mut tree, "lorem", &cached, &mut NoHooks).unwrap();
        assert!(marker.has_cached_snapshot());

        let ranges = RangeOptions::default().with_cache_text_nodes(true);
        let summary = marker
            .mark_ranges(&mut tree, &[RangeSpec::new(6, 5)], &ranges, &mut NoHooks)
            .unwrap();
        assert_eq!(summary.total_wraps, 1);
        assert!(marker.has_cached_snapshot());
        assert_eq!(
            tree.inner_markup(tree.root()),
            r#"<p><mark data-mark="true">lorem</mark> <mark data-mark="true">ipsum</mark></p>"#
        );

        marker.unmark(&mut tree, &UnmarkOptions::default()).unwrap();
        assert!(!marker.has_cached_snapshot());
    }

    #[test]
    fn test_unmark_in_chunks() {
        let mut tree = ContentTree::parse_fragment("<p>a a a a a</p>").unwrap();
        let mut marker = Marker::new(tree.root());
        let options = MarkOptions::default().with_accuracy(AccuracyMode::Exactly);
        marker.mark(&mut tree, "a", &options, &mut NoHooks).unwrap();

        let mut job = marker
            .unmark_job(&tree, &UnmarkOptions::default().with_chunk_size(2))
            .unwrap();
        assert_eq!(job.targets(), 5);
        let mut rounds = 1;
        while !job.resume(&mut tree).unwrap().is_done() {
            rounds += 1;
        }
        assert_eq!(rounds, 3);
        assert_eq!(tree.inner_markup(tree.root()), "<p>a a a a a</p>");
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let mut tree = ContentTree::parse_fragment("<p>lorem</p>").unwrap();
        let mut marker = Marker::new(tree.root());
        let result = marker.mark_pattern(&mut tree, "(", &PatternOptions::default(), &mut NoHooks);
        assert!(result.is_err());
    }
}
