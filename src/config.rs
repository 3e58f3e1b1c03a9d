//! Options for marking and unmarking.
//!
//! Every recognized option is an explicit field with a documented default.
//! Records can be built with the `with_*` methods or deserialized from JSON
//! (camelCase keys, missing keys take their defaults).

use crate::error::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// Default batch size when pattern combining is enabled with `true`.
pub const DEFAULT_COMBINE_BATCH: usize = 10;

/// Default number of wrap/unwrap operations processed per job chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Boundary strictness of a term match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccuracyMode {
    /// Term may be a substring of a larger word
    #[default]
    Partially,
    /// Term must be flanked by whitespace, limiters or text edges
    Exactly,
    /// Match extends over adjoining non-limiter characters
    Complementary,
}

/// Accuracy mode, optionally with a custom limiter set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Accuracy {
    /// Mode with the default limiters
    Mode(AccuracyMode),
    /// Mode with limiters replacing the default punctuation set
    Custom {
        /// Boundary mode
        value: AccuracyMode,
        /// Limiter characters
        limiters: Vec<String>,
    },
}

impl Default for Accuracy {
    fn default() -> Self {
        Accuracy::Mode(AccuracyMode::Partially)
    }
}

impl From<AccuracyMode> for Accuracy {
    fn from(mode: AccuracyMode) -> Self {
        Accuracy::Mode(mode)
    }
}

impl Accuracy {
    /// The boundary mode.
    pub fn mode(&self) -> AccuracyMode {
        match self {
            Accuracy::Mode(mode) => *mode,
            Accuracy::Custom { value, .. } => *value,
        }
    }

    /// Custom limiters, if any.
    pub fn limiters(&self) -> Option<&[String]> {
        match self {
            Accuracy::Mode(_) => None,
            Accuracy::Custom { limiters, .. } => Some(limiters),
        }
    }
}

/// Wildcard handling for `?` and `*` in terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Wildcards {
    /// `?` and `*` are literal characters
    #[default]
    Disabled,
    /// Wildcards never match whitespace
    Enabled,
    /// Wildcards may match whitespace
    #[serde(alias = "withSpaces")]
    EnabledWithSpaces,
}

/// How a multi-word search string is split into terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "SeparateWordSearchRepr")]
pub enum SeparateWordSearch {
    /// The whole string is one term
    Disabled,
    /// Every whitespace separated word is its own term
    #[default]
    Enabled,
    /// Split on whitespace but keep double-quoted phrases together
    PreserveTerms,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SeparateWordSearchRepr {
    Flag(bool),
    Named(String),
}

impl TryFrom<SeparateWordSearchRepr> for SeparateWordSearch {
    type Error = String;

    fn try_from(repr: SeparateWordSearchRepr) -> std::result::Result<Self, String> {
        match repr {
            SeparateWordSearchRepr::Flag(true) => Ok(SeparateWordSearch::Enabled),
            SeparateWordSearchRepr::Flag(false) => Ok(SeparateWordSearch::Disabled),
            SeparateWordSearchRepr::Named(name) => match name.as_str() {
                "preserveTerms" => Ok(SeparateWordSearch::PreserveTerms),
                "enabled" => Ok(SeparateWordSearch::Enabled),
                "disabled" => Ok(SeparateWordSearch::Disabled),
                other => Err(format!("unknown separateWordSearch value '{}'", other)),
            },
        }
    }
}

/// Synonym value: one equivalent string or several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SynonymValue {
    /// Single synonym
    One(String),
    /// Several synonyms
    Many(Vec<String>),
}

impl SynonymValue {
    /// Iterate over the synonym strings.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let items: &[String] = match self {
            SynonymValue::One(one) => std::slice::from_ref(one),
            SynonymValue::Many(many) => many,
        };
        items.iter().map(String::as_str)
    }
}

impl From<&str> for SynonymValue {
    fn from(value: &str) -> Self {
        SynonymValue::One(value.to_string())
    }
}

impl From<Vec<&str>> for SynonymValue {
    fn from(values: Vec<&str>) -> Self {
        SynonymValue::Many(values.into_iter().map(str::to_string).collect())
    }
}

fn deserialize_combine<'de, D>(deserializer: D) -> std::result::Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Flag(bool),
        Size(usize),
        Null(()),
    }
    Ok(match Repr::deserialize(deserializer)? {
        Repr::Flag(true) => Some(DEFAULT_COMBINE_BATCH),
        Repr::Flag(false) | Repr::Null(()) | Repr::Size(0) => None,
        Repr::Size(n) => Some(n),
    })
}

/// Settings shared by every operation that creates or removes highlight elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WrapSettings {
    /// Highlight element tag (default `mark`)
    pub element: String,
    /// Class added to highlight elements (default none)
    pub class_name: String,
    /// Selectors whose subtrees are never searched (default none)
    pub exclude: Vec<String>,
    /// Reuse the marker's text-node snapshot (default false)
    pub cache_text_nodes: bool,
    /// Wrap/unwrap operations per job chunk (default 500)
    pub chunk_size: usize,
}

impl Default for WrapSettings {
    fn default() -> Self {
        Self {
            element: "mark".to_string(),
            class_name: String::new(),
            exclude: Vec::new(),
            cache_text_nodes: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Options for term search (`mark`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarkOptions {
    /// Element, class, exclusion and chunking
    #[serde(flatten)]
    pub wrap: WrapSettings,
    /// Boundary strictness (default `partially`)
    pub accuracy: Accuracy,
    /// Case sensitive matching (default false)
    pub case_sensitive: bool,
    /// Accent-insensitive matching (default true)
    pub diacritics: bool,
    /// Term equivalences (default none)
    pub synonyms: IndexMap<String, SynonymValue>,
    /// Treat soft hyphen and zero-width joiners as absent (default false)
    pub ignore_joiners: bool,
    /// Punctuation treated as absent (default none)
    pub ignore_punctuation: Vec<char>,
    /// Wildcard translation (default disabled)
    pub wildcards: Wildcards,
    /// Split search strings into words (default enabled)
    pub separate_word_search: SeparateWordSearch,
    /// Batch size for combining term patterns; None disables (default 10)
    #[serde(deserialize_with = "deserialize_combine")]
    pub combine_patterns: Option<usize>,
    /// Match across element boundaries (default false)
    pub across_elements: bool,
}

impl Default for MarkOptions {
    fn default() -> Self {
        Self {
            wrap: WrapSettings::default(),
            accuracy: Accuracy::default(),
            case_sensitive: false,
            diacritics: true,
            synonyms: IndexMap::new(),
            ignore_joiners: false,
            ignore_punctuation: Vec::new(),
            wildcards: Wildcards::Disabled,
            separate_word_search: SeparateWordSearch::Enabled,
            combine_patterns: Some(DEFAULT_COMBINE_BATCH),
            across_elements: false,
        }
    }
}

impl MarkOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read options from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the highlight element tag.
    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.wrap.element = element.into();
        self
    }

    /// Set the highlight class.
    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.wrap.class_name = class_name.into();
        self
    }

    /// Add an exclusion selector.
    pub fn with_exclude(mut self, selector: impl Into<String>) -> Self {
        self.wrap.exclude.push(selector.into());
        self
    }

    /// Reuse the cached text-node snapshot.
    pub fn with_cache_text_nodes(mut self, value: bool) -> Self {
        self.wrap.cache_text_nodes = value;
        self
    }

    /// Set the chunk size.
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.wrap.chunk_size = size;
        self
    }

    /// Set the accuracy.
    pub fn with_accuracy(mut self, accuracy: impl Into<Accuracy>) -> Self {
        self.accuracy = accuracy.into();
        self
    }

    /// Set case sensitivity.
    pub fn with_case_sensitive(mut self, value: bool) -> Self {
        self.case_sensitive = value;
        self
    }

    /// Toggle diacritic-insensitive matching.
    pub fn with_diacritics(mut self, value: bool) -> Self {
        self.diacritics = value;
        self
    }

    /// Add a synonym entry.
    pub fn with_synonym(mut self, term: impl Into<String>, value: impl Into<SynonymValue>) -> Self {
        self.synonyms.insert(term.into(), value.into());
        self
    }

    /// Ignore joiner characters.
    pub fn with_ignore_joiners(mut self, value: bool) -> Self {
        self.ignore_joiners = value;
        self
    }

    /// Ignore the given punctuation characters.
    pub fn with_ignore_punctuation(mut self, chars: &str) -> Self {
        self.ignore_punctuation = chars.chars().collect();
        self
    }

    /// Set wildcard handling.
    pub fn with_wildcards(mut self, wildcards: Wildcards) -> Self {
        self.wildcards = wildcards;
        self
    }

    /// Set word separation.
    pub fn with_separate_word_search(mut self, mode: SeparateWordSearch) -> Self {
        self.separate_word_search = mode;
        self
    }

    /// Set the pattern batch size; None runs every term separately.
    pub fn with_combine_patterns(mut self, batch: Option<usize>) -> Self {
        self.combine_patterns = batch.filter(|&n| n > 0);
        self
    }

    /// Match across element boundaries.
    pub fn with_across_elements(mut self, value: bool) -> Self {
        self.across_elements = value;
        self
    }
}

/// Options for regular-expression search (`mark_pattern`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PatternOptions {
    /// Element, class, exclusion and chunking
    #[serde(flatten)]
    pub wrap: WrapSettings,
    /// Match across element boundaries (default false)
    pub across_elements: bool,
    /// Wrap every non-empty capture group separately (default false)
    pub separate_groups: bool,
    /// Number of leading capture groups to skip; group `n + 1` is wrapped (default 0)
    pub ignore_groups: usize,
    /// Compile the pattern case-insensitively (default false)
    pub case_insensitive: bool,
}

impl PatternOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read options from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the highlight element tag.
    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.wrap.element = element.into();
        self
    }

    /// Set the highlight class.
    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.wrap.class_name = class_name.into();
        self
    }

    /// Add an exclusion selector.
    pub fn with_exclude(mut self, selector: impl Into<String>) -> Self {
        self.wrap.exclude.push(selector.into());
        self
    }

    /// Reuse the cached text-node snapshot.
    pub fn with_cache_text_nodes(mut self, value: bool) -> Self {
        self.wrap.cache_text_nodes = value;
        self
    }

    /// Set the chunk size.
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.wrap.chunk_size = size;
        self
    }

    /// Match across element boundaries.
    pub fn with_across_elements(mut self, value: bool) -> Self {
        self.across_elements = value;
        self
    }

    /// Wrap capture groups separately.
    pub fn with_separate_groups(mut self, value: bool) -> Self {
        self.separate_groups = value;
        self
    }

    /// Skip leading capture groups.
    pub fn with_ignore_groups(mut self, count: usize) -> Self {
        self.ignore_groups = count;
        self
    }

    /// Compile case-insensitively.
    pub fn with_case_insensitive(mut self, value: bool) -> Self {
        self.case_insensitive = value;
        self
    }
}

/// Options for explicit range marking (`mark_ranges`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RangeOptions {
    /// Element, class, exclusion and chunking
    #[serde(flatten)]
    pub wrap: WrapSettings,
    /// Accept overlapping ranges and nest them (default false)
    pub wrap_all_ranges: bool,
}

impl RangeOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read options from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the highlight element tag.
    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.wrap.element = element.into();
        self
    }

    /// Set the highlight class.
    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.wrap.class_name = class_name.into();
        self
    }

    /// Add an exclusion selector.
    pub fn with_exclude(mut self, selector: impl Into<String>) -> Self {
        self.wrap.exclude.push(selector.into());
        self
    }

    /// Reuse the cached text-node snapshot.
    pub fn with_cache_text_nodes(mut self, value: bool) -> Self {
        self.wrap.cache_text_nodes = value;
        self
    }

    /// Set the chunk size.
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.wrap.chunk_size = size;
        self
    }

    /// Accept and nest overlapping ranges.
    pub fn with_wrap_all_ranges(mut self, value: bool) -> Self {
        self.wrap_all_ranges = value;
        self
    }
}

/// Options for removing highlight elements (`unmark`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UnmarkOptions {
    /// Element, class, exclusion and chunking
    #[serde(flatten)]
    pub wrap: WrapSettings,
}

impl UnmarkOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only remove highlight elements with this tag.
    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.wrap.element = element.into();
        self
    }

    /// Only remove highlight elements carrying this class.
    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.wrap.class_name = class_name.into();
        self
    }

    /// Leave highlight elements inside matching subtrees alone.
    pub fn with_exclude(mut self, selector: impl Into<String>) -> Self {
        self.wrap.exclude.push(selector.into());
        self
    }

    /// Set the chunk size.
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.wrap.chunk_size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_options_default() {
        let opts = MarkOptions::default();
        assert_eq!(opts.accuracy.mode(), AccuracyMode::Partially);
        assert!(!opts.case_sensitive);
        assert!(opts.diacritics);
        assert_eq!(opts.wildcards, Wildcards::Disabled);
        assert_eq!(opts.separate_word_search, SeparateWordSearch::Enabled);
        assert_eq!(opts.combine_patterns, Some(DEFAULT_COMBINE_BATCH));
        assert_eq!(opts.wrap.element, "mark");
        assert_eq!(opts.wrap.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn test_mark_options_builder() {
        let opts = MarkOptions::new()
            .with_accuracy(AccuracyMode::Exactly)
            .with_case_sensitive(true)
            .with_diacritics(false)
            .with_synonym("one", "1")
            .with_ignore_punctuation(":;")
            .with_combine_patterns(Some(0))
            .with_class_name("hl");

        assert_eq!(opts.accuracy.mode(), AccuracyMode::Exactly);
        assert!(opts.case_sensitive);
        assert!(!opts.diacritics);
        assert_eq!(opts.ignore_punctuation, vec![':', ';']);
        assert_eq!(opts.combine_patterns, None);
        assert_eq!(opts.wrap.class_name, "hl");
        assert_eq!(opts.synonyms.len(), 1);
    }

    #[test]
    fn test_mark_options_from_json() {
        let opts = MarkOptions::from_json(
            r#"{
                "accuracy": { "value": "exactly", "limiters": [",", "."] },
                "className": "hit",
                "exclude": ["code"],
                "synonyms": { "one": "1", "big": ["large", "huge"] },
                "wildcards": "withSpaces",
                "separateWordSearch": "preserveTerms",
                "combinePatterns": true,
                "acrossElements": true
            }"#,
        )
        .unwrap();

        assert_eq!(opts.accuracy.mode(), AccuracyMode::Exactly);
        assert_eq!(opts.accuracy.limiters().unwrap().len(), 2);
        assert_eq!(opts.wrap.class_name, "hit");
        assert_eq!(opts.wrap.element, "mark");
        assert_eq!(opts.wrap.exclude, vec!["code".to_string()]);
        assert_eq!(opts.wildcards, Wildcards::EnabledWithSpaces);
        assert_eq!(opts.separate_word_search, SeparateWordSearch::PreserveTerms);
        assert_eq!(opts.combine_patterns, Some(DEFAULT_COMBINE_BATCH));
        assert!(opts.across_elements);
        assert!(opts.diacritics);
        let big: Vec<&str> = opts.synonyms["big"].iter().collect();
        assert_eq!(big, vec!["large", "huge"]);
    }

    #[test]
    fn test_combine_patterns_json_variants() {
        let off = MarkOptions::from_json(r#"{ "combinePatterns": false }"#).unwrap();
        assert_eq!(off.combine_patterns, None);
        let sized = MarkOptions::from_json(r#"{ "combinePatterns": 3 }"#).unwrap();
        assert_eq!(sized.combine_patterns, Some(3));
    }

    #[test]
    fn test_bad_json_is_config_error() {
        let err = MarkOptions::from_json(r#"{ "separateWordSearch": "sometimes" }"#).unwrap_err();
        assert!(matches!(err, crate::error::Error::Config(_)));
    }

    #[test]
    fn test_range_options() {
        let opts = RangeOptions::from_json(r#"{ "wrapAllRanges": true, "element": "span" }"#).unwrap();
        assert!(opts.wrap_all_ranges);
        assert_eq!(opts.wrap.element, "span");
    }
}
