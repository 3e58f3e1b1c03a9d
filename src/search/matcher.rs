//! Term preprocessing: raw search input to compiled matchers.
//!
//! A term goes through these steps:
//! 1. splitting and de-duplication (`separate_word_search`)
//! 2. synonym expansion, one extra matcher per equivalent string
//! 3. longest-first ordering so longer terms win ties
//! 4. unit translation: literals (escaped or diacritic classes), merged
//!    blanks, wildcards, joiner/punctuation gaps between units
//! 5. accuracy boundaries baked into the pattern
//! 6. batching into alternations (`combine_patterns`)

use crate::config::{AccuracyMode, MarkOptions, PatternOptions, SeparateWordSearch, Wildcards};
use crate::error::{Error, Result};
use crate::text::diacritics::diacritic_class;
use regex::{Regex, RegexBuilder};

/// Characters treated as zero-width when `ignore_joiners` is set
/// (soft hyphen, zero-width space, zero-width non-joiner, zero-width joiner).
pub const JOINERS: &str = "\u{00ad}\u{200b}\u{200c}\u{200d}";

/// Default limiter characters for `exactly` and `complementary` accuracy.
pub const DEFAULT_LIMITERS: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~¡¿";

/// Raw search input: one string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchInput {
    /// A single search string
    One(String),
    /// Several search strings
    Many(Vec<String>),
}

impl SearchInput {
    fn items(&self) -> &[String] {
        match self {
            SearchInput::One(one) => std::slice::from_ref(one),
            SearchInput::Many(many) => many,
        }
    }
}

impl From<&str> for SearchInput {
    fn from(value: &str) -> Self {
        SearchInput::One(value.to_string())
    }
}

impl From<String> for SearchInput {
    fn from(value: String) -> Self {
        SearchInput::One(value)
    }
}

impl From<Vec<String>> for SearchInput {
    fn from(values: Vec<String>) -> Self {
        SearchInput::Many(values)
    }
}

impl From<Vec<&str>> for SearchInput {
    fn from(values: Vec<&str>) -> Self {
        SearchInput::Many(values.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for SearchInput {
    fn from(values: &[&str]) -> Self {
        SearchInput::Many(values.iter().map(|s| s.to_string()).collect())
    }
}

/// A compiled search unit.
#[derive(Debug, Clone)]
pub struct Matcher {
    /// Text this matcher searches for (the synonym for expansions)
    pub term: String,
    /// Searched term the matches are counted under
    pub origin: String,
    /// Searched term this matcher is a synonym of
    pub is_synonym_of: Option<String>,
    /// Pattern source with boundaries baked in
    pub pattern: String,
    /// Compiled pattern
    pub regex: Regex,
    /// Boundary mode the pattern was built with
    pub accuracy: AccuracyMode,
    /// Case sensitivity the pattern was built with
    pub case_sensitive: bool,
    /// Capture group holding the highlightable text (0 = whole match)
    pub term_group: usize,
    /// Emit every non-empty capture group as its own span
    pub separate_groups: bool,
    /// Highlight group can match empty text; such matchers get a batch of their own
    pub may_match_empty: bool,
}

impl Matcher {
    /// Number of explicit capture groups in the pattern.
    pub fn group_count(&self) -> usize {
        self.regex.captures_len() - 1
    }
}

/// Member of a batch: which matcher, and the group its alternative starts at.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BatchMember {
    pub matcher: usize,
    pub base: usize,
}

/// One regex covering one or more matchers.
#[derive(Debug, Clone)]
pub struct PatternBatch {
    pub(crate) regex: Regex,
    pub(crate) members: Vec<BatchMember>,
}

impl PatternBatch {
    /// The (possibly combined) pattern.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Number of matchers in this batch.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// A batch always has at least one member.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// All matchers of one invocation plus their batches.
#[derive(Debug, Clone)]
pub struct MatcherSet {
    /// Matchers, longest term first
    pub matchers: Vec<Matcher>,
    /// Batches in matcher order
    pub batches: Vec<PatternBatch>,
    /// Searched terms in input order (statistics keys)
    pub terms: Vec<String>,
}

impl MatcherSet {
    /// True when there is nothing to search for.
    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

/// Compiles search terms according to [`MarkOptions`].
pub struct TermPreprocessor<'a> {
    options: &'a MarkOptions,
}

impl<'a> TermPreprocessor<'a> {
    /// Create a preprocessor for a set of options.
    pub fn new(options: &'a MarkOptions) -> Self {
        Self { options }
    }

    fn fold(&self, term: &str) -> String {
        if self.options.case_sensitive {
            term.to_string()
        } else {
            term.to_lowercase()
        }
    }

    /// Split, trim and de-duplicate the raw input, keeping input order.
    pub fn terms(&self, input: &SearchInput) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut terms = Vec::new();
        for item in input.items() {
            let pieces: Vec<String> = match self.options.separate_word_search {
                SeparateWordSearch::Disabled => vec![item.trim().to_string()],
                SeparateWordSearch::Enabled => item.split_whitespace().map(str::to_string).collect(),
                SeparateWordSearch::PreserveTerms => split_preserving_quotes(item),
            };
            for piece in pieces {
                if piece.is_empty() {
                    continue;
                }
                if seen.insert(self.fold(&piece)) {
                    terms.push(piece);
                }
            }
        }
        terms
    }

    /// Effective `(term, origin)` pairs: searched terms plus synonyms, longest first.
    pub fn expand(&self, terms: &[String]) -> Vec<(String, String)> {
        let mut seen: std::collections::HashSet<String> = terms.iter().map(|t| self.fold(t)).collect();
        let mut expanded: Vec<(String, String)> = terms.iter().map(|t| (t.clone(), t.clone())).collect();

        for term in terms {
            let folded = self.fold(term);
            for (key, value) in &self.options.synonyms {
                let class: Vec<&str> = std::iter::once(key.as_str())
                    .chain(value.iter())
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect();
                if !class.iter().any(|member| self.fold(member) == folded) {
                    continue;
                }
                for member in class {
                    if seen.insert(self.fold(member)) {
                        expanded.push((member.to_string(), term.clone()));
                    }
                }
            }
        }

        expanded.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));
        expanded
    }

    fn gap_class(&self) -> Option<String> {
        let mut class = String::new();
        for c in &self.options.ignore_punctuation {
            class.push_str(&regex::escape(&c.to_string()));
        }
        if self.options.ignore_joiners {
            class.push_str(JOINERS);
        }
        if class.is_empty() {
            None
        } else {
            Some(class)
        }
    }

    /// Translate a term into pattern units and join them.
    pub fn term_pattern(&self, term: &str) -> String {
        let opts = self.options;
        let gap = self.gap_class();
        let with_spaces = opts.wildcards == Wildcards::EnabledWithSpaces;
        let wildcards = opts.wildcards != Wildcards::Disabled;

        let mut units: Vec<String> = Vec::new();
        let mut chars = term.chars().peekable();
        while let Some(c) = chars.next() {
            if c.is_whitespace() {
                while chars.peek().is_some_and(|n| n.is_whitespace()) {
                    chars.next();
                }
                units.push(match &gap {
                    Some(gap) => format!("[\\s{}]+", gap),
                    None => "\\s+".to_string(),
                });
                continue;
            }
            let unit = match c {
                '?' if wildcards => (if with_spaces { "[\\s\\S]" } else { "\\S" }).to_string(),
                '*' if wildcards => (if with_spaces { "[\\s\\S]*?" } else { "\\S*" }).to_string(),
                _ => {
                    let class = if opts.diacritics {
                        diacritic_class(c, opts.case_sensitive)
                    } else {
                        None
                    };
                    class.unwrap_or_else(|| regex::escape(&c.to_string()))
                },
            };
            units.push(unit);
        }

        match gap {
            Some(gap) => units.join(&format!("[{}]*", gap)),
            None => units.concat(),
        }
    }

    /// True when the translated term can match empty text (wildcard stars only).
    fn is_nullable(&self, term: &str) -> bool {
        self.options.wildcards != Wildcards::Disabled && term.chars().all(|c| c == '*')
    }

    /// Wrap a term pattern with accuracy boundaries.
    ///
    /// Returns the pattern and the group holding the term.
    pub fn accuracy_pattern(&self, term_pattern: &str) -> (String, usize) {
        let accuracy = &self.options.accuracy;
        let limiters: String = match accuracy.limiters() {
            Some(list) => list.iter().flat_map(|s| s.chars()).map(|c| regex::escape(&c.to_string())).collect(),
            None => DEFAULT_LIMITERS.chars().map(|c| regex::escape(&c.to_string())).collect(),
        };
        let separators = format!("\\s{}", limiters);
        match accuracy.mode() {
            AccuracyMode::Partially => (term_pattern.to_string(), 0),
            AccuracyMode::Exactly => (
                format!("(?:^|[{sep}])({term})(?:$|[{sep}])", sep = separators, term = term_pattern),
                1,
            ),
            AccuracyMode::Complementary => (
                format!("[^{sep}]*{term}[^{sep}]*", sep = separators, term = term_pattern),
                0,
            ),
        }
    }

    /// Compile the input into matchers and batches.
    pub fn compile(&self, input: &SearchInput) -> Result<MatcherSet> {
        let opts = self.options;
        let terms = self.terms(input);
        let mut matchers = Vec::new();
        for (term, origin) in self.expand(&terms) {
            let (pattern, term_group) = self.accuracy_pattern(&self.term_pattern(&term));
            log::debug!("Compiled term '{}' into pattern {}", term, pattern);
            let regex = build_regex(&pattern, opts.case_sensitive)?;
            let is_synonym_of = (term != origin).then(|| origin.clone());
            let may_match_empty = self.is_nullable(&term);
            matchers.push(Matcher {
                term,
                origin,
                is_synonym_of,
                pattern,
                regex,
                accuracy: opts.accuracy.mode(),
                case_sensitive: opts.case_sensitive,
                term_group,
                separate_groups: false,
                may_match_empty,
            });
        }
        let batches = build_batches(&matchers, opts.combine_patterns, opts.case_sensitive)?;
        Ok(MatcherSet {
            matchers,
            batches,
            terms,
        })
    }
}

/// Compile a caller-supplied regular expression into a single-matcher set.
pub fn compile_user_pattern(pattern: &str, options: &PatternOptions) -> Result<MatcherSet> {
    let case_sensitive = !options.case_insensitive;
    let regex = build_regex(pattern, case_sensitive).map_err(|err| match err {
        Error::InvalidPattern { pattern, reason } if has_look_around(&pattern) => Error::InvalidPattern {
            reason: format!(
                "{}; capture the context in a group and skip it with ignore_groups or separate_groups",
                reason
            ),
            pattern,
        },
        other => other,
    })?;
    let groups = regex.captures_len() - 1;
    let term_group = if options.ignore_groups > 0 {
        options.ignore_groups + 1
    } else {
        0
    };
    if term_group > groups {
        return Err(Error::InvalidPattern {
            pattern: pattern.to_string(),
            reason: format!(
                "ignore_groups = {} needs at least {} capture groups, pattern has {}",
                options.ignore_groups, term_group, groups
            ),
        });
    }
    let matcher = Matcher {
        term: pattern.to_string(),
        origin: pattern.to_string(),
        is_synonym_of: None,
        pattern: pattern.to_string(),
        regex,
        accuracy: AccuracyMode::Partially,
        case_sensitive,
        term_group,
        separate_groups: options.separate_groups && groups > 0,
        may_match_empty: true,
    };
    let batches = build_batches(std::slice::from_ref(&matcher), None, case_sensitive)?;
    Ok(MatcherSet {
        matchers: vec![matcher],
        batches,
        terms: vec![pattern.to_string()],
    })
}

/// Look-ahead and look-behind openers; the linear-time engine rejects both.
fn has_look_around(pattern: &str) -> bool {
    ["(?=", "(?!", "(?<=", "(?<!"].iter().any(|opener| pattern.contains(opener))
}

fn build_regex(pattern: &str, case_sensitive: bool) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .build()
        .map_err(|e| Error::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

fn build_batches(
    matchers: &[Matcher],
    combine: Option<usize>,
    case_sensitive: bool,
) -> Result<Vec<PatternBatch>> {
    let size = combine.unwrap_or(1).max(1);
    if size == 1 {
        return Ok(matchers
            .iter()
            .enumerate()
            .map(|(idx, m)| PatternBatch {
                regex: m.regex.clone(),
                members: vec![BatchMember { matcher: idx, base: 0 }],
            })
            .collect());
    }

    let mut batches = Vec::new();
    let mut pending: Vec<usize> = Vec::with_capacity(size);
    for (idx, matcher) in matchers.iter().enumerate() {
        if matcher.may_match_empty {
            // An empty alternative would shadow later members at the same start.
            push_batch(&mut batches, matchers, &pending, case_sensitive)?;
            pending.clear();
            push_batch(&mut batches, matchers, &[idx], case_sensitive)?;
            continue;
        }
        pending.push(idx);
        if pending.len() == size {
            push_batch(&mut batches, matchers, &pending, case_sensitive)?;
            pending.clear();
        }
    }
    push_batch(&mut batches, matchers, &pending, case_sensitive)?;
    Ok(batches)
}

fn push_batch(
    batches: &mut Vec<PatternBatch>,
    matchers: &[Matcher],
    indices: &[usize],
    case_sensitive: bool,
) -> Result<()> {
    match indices {
        [] => {},
        [only] => batches.push(PatternBatch {
            regex: matchers[*only].regex.clone(),
            members: vec![BatchMember {
                matcher: *only,
                base: 0,
            }],
        }),
        _ => {
            let mut source = String::new();
            let mut members = Vec::with_capacity(indices.len());
            let mut next_group = 1;
            for (offset, &idx) in indices.iter().enumerate() {
                if offset > 0 {
                    source.push('|');
                }
                source.push('(');
                source.push_str(&matchers[idx].pattern);
                source.push(')');
                members.push(BatchMember {
                    matcher: idx,
                    base: next_group,
                });
                next_group += matchers[idx].regex.captures_len();
            }
            log::trace!("Combined {} patterns into one batch", indices.len());
            batches.push(PatternBatch {
                regex: build_regex(&source, case_sensitive)?,
                members,
            });
        },
    }
    Ok(())
}

fn split_preserving_quotes(item: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    for (idx, part) in item.split('"').enumerate() {
        if idx % 2 == 1 {
            let phrase = part.trim();
            if !phrase.is_empty() {
                pieces.push(phrase.to_string());
            }
        } else {
            pieces.extend(part.split_whitespace().map(str::to_string));
        }
    }
    pieces
}
