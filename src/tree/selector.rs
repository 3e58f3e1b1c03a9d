//! Compound selectors for excluding regions and matching highlight elements.
//!
//! Supported syntax, comma separated:
//! - `tag`, `*`
//! - `.class`, `#id`
//! - `[attr]`, `[attr=value]`, `[attr="value"]`
//!
//! Parts combine into compound selectors (`mark.hl[data-mark]`). Combinators
//! are not supported.

use super::document::ContentTree;
use super::node::{ElementData, NodeId};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Condition {
    Class(String),
    Id(String),
    HasAttribute(String),
    AttributeEquals(String, String),
}

/// One compound selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    conditions: Vec<Condition>,
}

impl Selector {
    /// Selector matching elements with the given tag.
    pub fn tag(tag: &str) -> Self {
        Self {
            tag: Some(tag.to_ascii_lowercase()),
            conditions: Vec::new(),
        }
    }

    /// Require a class.
    pub fn with_class(mut self, class: &str) -> Self {
        self.conditions.push(Condition::Class(class.to_string()));
        self
    }

    /// Require an attribute to be present.
    pub fn with_attribute(mut self, name: &str) -> Self {
        self.conditions.push(Condition::HasAttribute(name.to_string()));
        self
    }

    /// Parse a single compound selector.
    pub fn parse(source: &str) -> Result<Self> {
        let source = source.trim();
        if source.is_empty() {
            return Err(Error::InvalidSelector("empty selector".into()));
        }
        let chars: Vec<char> = source.chars().collect();
        let mut pos = 0;
        let mut selector = Selector {
            tag: None,
            conditions: Vec::new(),
        };

        let tag = read_ident(&chars, &mut pos);
        if !tag.is_empty() {
            selector.tag = Some(tag.to_ascii_lowercase());
        } else if chars.first() == Some(&'*') {
            pos += 1;
        }

        while pos < chars.len() {
            let marker = chars[pos];
            pos += 1;
            match marker {
                '.' | '#' => {
                    let name = read_ident(&chars, &mut pos);
                    if name.is_empty() {
                        return Err(Error::InvalidSelector(format!("missing name in '{}'", source)));
                    }
                    selector.conditions.push(if marker == '.' {
                        Condition::Class(name)
                    } else {
                        Condition::Id(name)
                    });
                },
                '[' => {
                    let end = chars[pos..]
                        .iter()
                        .position(|&c| c == ']')
                        .map(|offset| pos + offset)
                        .ok_or_else(|| Error::InvalidSelector(format!("unclosed '[' in '{}'", source)))?;
                    let body: String = chars[pos..end].iter().collect();
                    pos = end + 1;
                    selector.conditions.push(parse_attribute(&body, source)?);
                },
                other => {
                    return Err(Error::InvalidSelector(format!(
                        "unexpected '{}' in '{}'",
                        other, source
                    )))
                },
            }
        }
        Ok(selector)
    }

    /// Does the element data satisfy this selector?
    pub fn matches_element(&self, data: &ElementData) -> bool {
        if let Some(tag) = &self.tag {
            if &data.tag != tag {
                return false;
            }
        }
        self.conditions.iter().all(|cond| match cond {
            Condition::Class(class) => data.has_class(class),
            Condition::Id(id) => data.attribute("id") == Some(id.as_str()),
            Condition::HasAttribute(name) => data.attribute(name).is_some(),
            Condition::AttributeEquals(name, value) => data.attribute(name) == Some(value.as_str()),
        })
    }
}

fn read_ident(chars: &[char], pos: &mut usize) -> String {
    let start = *pos;
    while *pos < chars.len() && (chars[*pos].is_alphanumeric() || chars[*pos] == '-' || chars[*pos] == '_') {
        *pos += 1;
    }
    chars[start..*pos].iter().collect()
}

fn parse_attribute(body: &str, source: &str) -> Result<Condition> {
    match body.split_once('=') {
        None => {
            let name = body.trim();
            if name.is_empty() {
                return Err(Error::InvalidSelector(format!("empty attribute in '{}'", source)));
            }
            Ok(Condition::HasAttribute(name.to_string()))
        },
        Some((name, value)) => {
            let name = name.trim();
            if name.is_empty() {
                return Err(Error::InvalidSelector(format!("empty attribute in '{}'", source)));
            }
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
            Ok(Condition::AttributeEquals(name.to_string(), value.to_string()))
        },
    }
}

/// A comma-separated list of selectors; matches when any member matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<Selector>,
}

impl SelectorList {
    /// Parse every entry of `sources`; each entry may itself be comma separated.
    pub fn parse<S: AsRef<str>>(sources: &[S]) -> Result<Self> {
        let mut selectors = Vec::new();
        for source in sources {
            for part in source.as_ref().split(',') {
                if part.trim().is_empty() {
                    continue;
                }
                selectors.push(Selector::parse(part)?);
            }
        }
        Ok(Self { selectors })
    }

    /// Build a list from already parsed selectors.
    pub fn from_selectors(selectors: Vec<Selector>) -> Self {
        Self { selectors }
    }

    /// True when the list holds no selectors.
    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// Does `node` (an element) match any selector?
    pub fn matches(&self, tree: &ContentTree, node: NodeId) -> bool {
        match tree.element(node) {
            Some(data) => self.selectors.iter().any(|s| s.matches_element(data)),
            None => false,
        }
    }
}
