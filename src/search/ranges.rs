//! Explicit character ranges.
//!
//! Callers may hand over ranges read from loosely typed sources (JSON from a
//! browser, query strings), so each bound is a [`RangeValue`] that is coerced
//! to an integer the way `parseInt` would. Offsets count characters, not
//! bytes; resolution converts them to logical-string byte offsets.
//!
//! Default policy: ranges are stably sorted by start and accepted greedily,
//! rejecting any that intersects one already accepted. With equal starts the
//! range listed first wins. `wrap_all` accepts every valid range instead.

use crate::text::LogicalString;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

lazy_static! {
    static ref LEADING_INTEGER: Regex = Regex::new(r"^\s*([+-]?\d+)").expect("valid regex");
}

/// A loosely typed range bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RangeValue {
    /// Integer bound
    Int(i64),
    /// Fractional bound (truncated)
    Float(f64),
    /// Textual bound (leading integer is used)
    Text(String),
}

impl RangeValue {
    /// Coerce to an integer, or `None` when the value is not numeric.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            RangeValue::Int(value) => Some(*value),
            RangeValue::Float(value) if value.is_finite() => Some(value.trunc() as i64),
            RangeValue::Float(_) => None,
            RangeValue::Text(text) => LEADING_INTEGER
                .captures(text)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse().ok()),
        }
    }
}

impl From<i64> for RangeValue {
    fn from(value: i64) -> Self {
        RangeValue::Int(value)
    }
}

impl From<i32> for RangeValue {
    fn from(value: i32) -> Self {
        RangeValue::Int(value.into())
    }
}

impl From<usize> for RangeValue {
    fn from(value: usize) -> Self {
        RangeValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for RangeValue {
    fn from(value: f64) -> Self {
        RangeValue::Float(value)
    }
}

impl From<&str> for RangeValue {
    fn from(value: &str) -> Self {
        RangeValue::Text(value.to_string())
    }
}

/// A caller-supplied range: `start` plus either `length` or `end`.
///
/// When both are present `length` is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeSpec {
    /// First character
    pub start: RangeValue,
    /// Number of characters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<RangeValue>,
    /// Character after the last one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<RangeValue>,
}

impl RangeSpec {
    /// Range from a start and a length.
    pub fn new(start: impl Into<RangeValue>, length: impl Into<RangeValue>) -> Self {
        Self {
            start: start.into(),
            length: Some(length.into()),
            end: None,
        }
    }

    /// Range from a start and an exclusive end.
    pub fn with_end(start: impl Into<RangeValue>, end: impl Into<RangeValue>) -> Self {
        Self {
            start: start.into(),
            length: None,
            end: Some(end.into()),
        }
    }

    /// Coerced `[start, end)` before clamping.
    fn bounds(&self) -> Option<(i64, i64)> {
        let start = self.start.as_integer()?;
        let end = match (&self.length, &self.end) {
            (Some(length), _) => start.checked_add(length.as_integer()?)?,
            (None, Some(end)) => end.as_integer()?,
            (None, None) => return None,
        };
        Some((start, end))
    }
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{:?}", self),
        }
    }
}

/// Why a range was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeRejection {
    /// A bound is missing or not numeric
    NonNumeric,
    /// End before start, or nothing left after clamping
    Empty,
    /// Starts at or past the end of the text
    OutOfBounds,
    /// Covers whitespace only
    Whitespace,
    /// Intersects an accepted range
    Overlap,
}

impl fmt::Display for RangeRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            RangeRejection::NonNumeric => "non-numeric bound",
            RangeRejection::Empty => "empty or reversed",
            RangeRejection::OutOfBounds => "out of bounds",
            RangeRejection::Whitespace => "whitespace only",
            RangeRejection::Overlap => "overlaps an accepted range",
        };
        f.write_str(reason)
    }
}

/// An accepted range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    /// Position in the caller's list
    pub index: usize,
    /// Character offsets `[char_start, char_end)`
    pub char_start: usize,
    /// Exclusive end in characters
    pub char_end: usize,
    /// Byte offset in the logical string
    pub start: usize,
    /// Exclusive byte end in the logical string
    pub end: usize,
}

/// Outcome of range resolution.
#[derive(Debug, Clone, Default)]
pub struct RangeResolution {
    /// Accepted ranges, sorted by start (stable)
    pub accepted: Vec<ResolvedRange>,
    /// `(input index, reason)` for every dropped range
    pub rejected: Vec<(usize, RangeRejection)>,
}

/// Normalizes ranges against one logical string.
pub struct RangeResolver<'a> {
    logical: &'a LogicalString,
    boundaries: Vec<usize>,
}

impl<'a> RangeResolver<'a> {
    /// Create a resolver for a logical string.
    pub fn new(logical: &'a LogicalString) -> Self {
        Self {
            logical,
            boundaries: logical.char_boundaries(),
        }
    }

    /// Number of characters ranges are clamped to.
    pub fn char_len(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Clamp and validate one range.
    pub fn normalize(&self, index: usize, spec: &RangeSpec) -> Result<ResolvedRange, RangeRejection> {
        let (start, end) = spec.bounds().ok_or(RangeRejection::NonNumeric)?;
        let len = self.char_len() as i64;
        if end <= start {
            return Err(RangeRejection::Empty);
        }
        if start >= len || end <= 0 {
            return Err(RangeRejection::OutOfBounds);
        }
        let char_start = start.max(0) as usize;
        let char_end = end.min(len) as usize;
        let range = ResolvedRange {
            index,
            char_start,
            char_end,
            start: self.boundaries[char_start],
            end: self.boundaries[char_end],
        };
        if self.logical.text()[range.start..range.end].trim().is_empty() {
            return Err(RangeRejection::Whitespace);
        }
        Ok(range)
    }

    /// Normalize every range and apply the overlap policy.
    pub fn resolve(&self, specs: &[RangeSpec], wrap_all: bool) -> RangeResolution {
        let mut resolution = RangeResolution::default();
        let mut valid = Vec::with_capacity(specs.len());
        for (index, spec) in specs.iter().enumerate() {
            match self.normalize(index, spec) {
                Ok(range) => valid.push(range),
                Err(reason) => {
                    log::debug!("Ignoring range {} ({}): {}", index, spec, reason);
                    resolution.rejected.push((index, reason));
                },
            }
        }
        valid.sort_by_key(|r| r.start);

        if wrap_all {
            resolution.accepted = valid;
            return resolution;
        }

        let mut reach = 0;
        for range in valid {
            if range.start < reach {
                log::debug!("Ignoring range {}: {}", range.index, RangeRejection::Overlap);
                resolution.rejected.push((range.index, RangeRejection::Overlap));
                continue;
            }
            reach = range.end;
            resolution.accepted.push(range);
        }
        resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ContentTree;

    fn logical(text: &str) -> LogicalString {
        let mut tree = ContentTree::new();
        let root = tree.root();
        let node = tree.append_text(root, text).unwrap();
        LogicalString::build(&tree, &[node])
    }

    fn bounds(resolution: &RangeResolution) -> Vec<(usize, usize)> {
        resolution.accepted.iter().map(|r| (r.char_start, r.char_end)).collect()
    }

    #[test]
    fn test_value_coercion() {
        assert_eq!(RangeValue::Int(5).as_integer(), Some(5));
        assert_eq!(RangeValue::Float(5.9).as_integer(), Some(5));
        assert_eq!(RangeValue::Float(f64::NAN).as_integer(), None);
        assert_eq!(RangeValue::from(" 12px").as_integer(), Some(12));
        assert_eq!(RangeValue::from("-3").as_integer(), Some(-3));
        assert_eq!(RangeValue::from("abc").as_integer(), None);
    }

    #[test]
    fn test_deserialize_mixed_values() {
        let specs: Vec<RangeSpec> =
            serde_json::from_str(r#"[{"start": 1, "length": "2"}, {"start": 1.5, "end": 4}, {"start": "x"}]"#).unwrap();
        assert_eq!(specs[0].length, Some(RangeValue::Text("2".into())));
        assert_eq!(specs[1].start, RangeValue::Float(1.5));
        assert_eq!(specs[2].end, None);
    }

    #[test]
    fn test_overlap_rejection() {
        let text = logical(&"x".repeat(60));
        let specs = vec![
            RangeSpec::with_end(20, 30),
            RangeSpec::with_end(25, 26),
            RangeSpec::with_end(40, 50),
            RangeSpec::with_end(45, 46),
        ];
        let resolution = RangeResolver::new(&text).resolve(&specs, false);
        assert_eq!(bounds(&resolution), vec![(20, 30), (40, 50)]);
        assert_eq!(resolution.rejected, vec![(1, RangeRejection::Overlap), (3, RangeRejection::Overlap)]);
    }

    #[test]
    fn test_equal_start_first_listed_wins() {
        let text = logical(&"x".repeat(40));
        let specs = vec![RangeSpec::new(5, 3), RangeSpec::new(5, 10)];
        let resolution = RangeResolver::new(&text).resolve(&specs, false);
        assert_eq!(bounds(&resolution), vec![(5, 8)]);
    }

    #[test]
    fn test_wrap_all_keeps_everything_in_order() {
        let text = logical(&"x".repeat(700));
        let specs = vec![
            RangeSpec::new(90, 300),
            RangeSpec::new(20, 300),
            RangeSpec::new(20, 100),
            RangeSpec::new(90, 500),
        ];
        let resolution = RangeResolver::new(&text).resolve(&specs, true);
        let order: Vec<usize> = resolution.accepted.iter().map(|r| r.index).collect();
        assert_eq!(order, vec![1, 2, 0, 3]);
    }

    #[test]
    fn test_invalid_ranges_are_dropped() {
        let text = logical("lorem   ipsum");
        let specs = vec![
            RangeSpec::new("a", 2),
            RangeSpec::with_end(5, 2),
            RangeSpec::new(50, 2),
            RangeSpec::new(5, 3),
            RangeSpec::new(0, 0),
            RangeSpec {
                start: 1.into(),
                length: None,
                end: None,
            },
        ];
        let resolution = RangeResolver::new(&text).resolve(&specs, false);
        assert!(resolution.accepted.is_empty());
        let reasons: Vec<RangeRejection> = resolution.rejected.iter().map(|r| r.1).collect();
        assert_eq!(
            reasons,
            vec![
                RangeRejection::NonNumeric,
                RangeRejection::Empty,
                RangeRejection::OutOfBounds,
                RangeRejection::Whitespace,
                RangeRejection::Empty,
                RangeRejection::NonNumeric,
            ]
        );
    }

    #[test]
    fn test_clamping() {
        let text = logical("lorem ipsum");
        let specs = vec![RangeSpec::with_end(-4, 2), RangeSpec::new(6, 100)];
        let resolution = RangeResolver::new(&text).resolve(&specs, false);
        assert_eq!(bounds(&resolution), vec![(0, 2), (6, 11)]);
    }

    #[test]
    fn test_character_offsets_convert_to_bytes() {
        let text = logical("héllo wörld");
        let resolution = RangeResolver::new(&text).resolve(&[RangeSpec::new(6, 5)], false);
        let range = resolution.accepted[0];
        assert_eq!(&text.text()[range.start..range.end], "wörld");
        assert_eq!((range.char_start, range.char_end), (6, 11));
    }
}
