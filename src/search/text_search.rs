//! Match discovery over the logical string.
//!
//! The engine runs every pattern batch of a [`MatcherSet`] over the text and
//! merges their results leftmost-first: each batch keeps its next candidate
//! at or after a shared cursor, the candidate starting first wins and ties go
//! to the earlier batch. Inside a combined batch the regex alternation applies
//! the same rule, so combining patterns never changes which matches are found.
//! Matchers that can match empty text are never combined for that reason.
//!
//! Zero-width matches never become spans. The search position moves one
//! character forward and the matcher is reported as degenerate.

use super::matcher::{MatcherSet, PatternBatch};
use crate::config::AccuracyMode;
use crate::text::LogicalString;
use regex::CaptureLocations;
use std::collections::BTreeSet;

/// One accepted occurrence, in logical-string byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSpan {
    /// Start offset (inclusive)
    pub start: usize,
    /// End offset (exclusive)
    pub end: usize,
    /// Index of the owning matcher in the set
    pub matcher: usize,
    /// Capture group the span came from when groups are separated
    pub group: Option<usize>,
}

impl MatchSpan {
    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// True for a zero-width span.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Result of one engine run.
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    /// Spans in ascending order
    pub spans: Vec<MatchSpan>,
    /// Matchers that produced zero-width matches
    pub degenerate: BTreeSet<usize>,
}

#[derive(Debug, Clone)]
struct Candidate {
    whole_start: usize,
    /// Where the search continues once this candidate is accepted
    resume: usize,
    matcher: usize,
    spans: Vec<(usize, usize, Option<usize>)>,
}

struct BatchState<'a> {
    batch: &'a PatternBatch,
    locs: CaptureLocations,
    cached: Option<Candidate>,
    exhausted: bool,
}

/// Runs compiled matchers over text.
pub struct MatchEngine<'a> {
    set: &'a MatcherSet,
}

impl<'a> MatchEngine<'a> {
    /// Create an engine for a matcher set.
    pub fn new(set: &'a MatcherSet) -> Self {
        Self { set }
    }

    /// Search the logical string, either as a whole or node by node.
    pub fn run(&self, logical: &LogicalString, across_elements: bool) -> MatchOutcome {
        let mut outcome = MatchOutcome::default();
        if self.set.is_empty() {
            return outcome;
        }
        if across_elements {
            self.find_in(logical.text(), 0, &mut outcome);
        } else {
            for (idx, segment) in logical.segments().iter().enumerate() {
                self.find_in(logical.segment_text(idx), segment.start, &mut outcome);
            }
        }
        for &matcher in &outcome.degenerate {
            log::warn!(
                "Pattern for '{}' matches zero-width text; those matches were skipped",
                self.set.matchers[matcher].term
            );
        }
        log::debug!("Match engine found {} spans", outcome.spans.len());
        outcome
    }

    /// Search one haystack; spans are shifted by `offset`.
    pub fn find_in(&self, haystack: &str, offset: usize, outcome: &mut MatchOutcome) {
        let mut states: Vec<BatchState<'_>> = self
            .set
            .batches
            .iter()
            .map(|batch| BatchState {
                batch,
                locs: batch.regex.capture_locations(),
                cached: None,
                exhausted: false,
            })
            .collect();

        let mut cursor = 0;
        loop {
            let mut best: Option<usize> = None;
            for idx in 0..states.len() {
                let state = &mut states[idx];
                if state.exhausted {
                    continue;
                }
                let stale = state.cached.as_ref().map_or(true, |c| c.whole_start < cursor);
                if stale {
                    state.cached = self.next_candidate(state, haystack, cursor, &mut outcome.degenerate);
                    if state.cached.is_none() {
                        state.exhausted = true;
                        continue;
                    }
                }
                let start = state.cached.as_ref().map_or(usize::MAX, |c| c.whole_start);
                let better = match best {
                    None => true,
                    Some(b) => start < states_start(&states[b]),
                };
                if better {
                    best = Some(idx);
                }
            }

            let Some(winner) = best else { break };
            let Some(candidate) = states[winner].cached.take() else { break };
            for &(start, end, group) in &candidate.spans {
                outcome.spans.push(MatchSpan {
                    start: start + offset,
                    end: end + offset,
                    matcher: candidate.matcher,
                    group,
                });
            }
            cursor = candidate.resume.max(cursor);
        }
    }

    /// Next candidate of a batch at or after `from`, skipping zero-width matches.
    fn next_candidate(
        &self,
        state: &mut BatchState<'_>,
        haystack: &str,
        from: usize,
        degenerate: &mut BTreeSet<usize>,
    ) -> Option<Candidate> {
        let mut pos = from;
        loop {
            if pos > haystack.len() {
                return None;
            }
            let found = state.batch.regex.captures_read_at(&mut state.locs, haystack, pos)?;
            let (whole_start, whole_end) = (found.start(), found.end());

            let member = if state.batch.members.len() == 1 {
                state.batch.members[0]
            } else {
                *state
                    .batch
                    .members
                    .iter()
                    .find(|m| state.locs.get(m.base).is_some())?
            };
            let matcher = &self.set.matchers[member.matcher];

            let mut spans = Vec::new();
            if matcher.separate_groups {
                let mut last_end = whole_start;
                for group in 1..=matcher.group_count() {
                    if let Some((s, e)) = state.locs.get(member.base + group) {
                        if s < e && s >= last_end {
                            spans.push((s, e, Some(group)));
                            last_end = e;
                        }
                    }
                }
            } else if let Some((s, e)) = state.locs.get(member.base + matcher.term_group) {
                if s < e {
                    spans.push((s, e, None));
                }
            }

            if let Some(&(_, last_end, _)) = spans.last() {
                // Exact terms hand their trailing separator back to the next match.
                let resume = if matcher.accuracy == AccuracyMode::Exactly {
                    last_end
                } else {
                    whole_end
                };
                return Some(Candidate {
                    whole_start,
                    resume,
                    matcher: member.matcher,
                    spans,
                });
            }

            if whole_start == whole_end {
                degenerate.insert(member.matcher);
                let step = haystack[whole_start..].chars().next().map_or(1, char::len_utf8);
                pos = whole_start + step;
            } else {
                pos = whole_end;
            }
        }
    }
}

fn states_start(state: &BatchState<'_>) -> usize {
    state.cached.as_ref().map_or(usize::MAX, |c| c.whole_start)
}
