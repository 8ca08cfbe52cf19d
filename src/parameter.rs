//! # Parameter Descriptor Parsing
//!
//! This module turns a workspace's `parameter.yml` into an ordered,
//! immutable [`ParameterRuleSet`]. Each [`SubstitutionRule`] maps one source
//! literal to a replacement per environment and may be scoped by path globs
//! and by item type.
//!
//! ## Accepted formats
//!
//! The descriptor is either a bare list of rules or a mapping with a
//! `find_replace` list. Field names follow the engine's vocabulary, and the
//! `fabric-cicd` spellings are accepted as aliases:
//!
//! ```yaml
//! find_replace:
//!   - find_value: "b892bcb4-b1d3-a9e0-4a9e-fac33bb0b654"
//!     replace_value:
//!       test: "4c1a7f2e-0f7b-4f5e-9a53-3a1de2b6c001"
//!       prod: "a0b1c2d3-0000-4000-8000-000000000042"
//!     item_type: Notebook
//!     file_path: "**/notebook-content.py"
//! ```
//!
//! ## Matching contract
//!
//! Occurrences are whole tokens: a match is rejected when an identifier
//! character (`[A-Za-z0-9_-]`) sits directly against one of its identifier
//! edges. When several rules match overlapping text, rules claim spans in
//! declaration order, so the earliest-declared rule wins for any occurrence.

use std::collections::{BTreeMap, HashSet};

use glob::Pattern;
use log::warn;
use regex::bytes::Regex;
use serde::Deserialize;
use serde_yaml::Value;

use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::path::item_type_of;

/// A single value or a list of values
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

/// Rule record as written in the descriptor
#[derive(Debug, Deserialize)]
struct RawRule {
    #[serde(default, alias = "find_value")]
    find: Option<String>,
    #[serde(default, alias = "replace_value")]
    replace: Option<BTreeMap<String, String>>,
    #[serde(default, alias = "file_path")]
    path_filter: Option<OneOrMany>,
    #[serde(default, alias = "item_type")]
    item_type_filter: Option<OneOrMany>,
    #[serde(default)]
    is_regex: bool,
}

/// A declarative mapping from a source literal to per-environment replacements
#[derive(Debug, Clone)]
pub struct SubstitutionRule {
    find: String,
    is_regex: bool,
    replace: BTreeMap<Environment, String>,
    path_filter: Vec<String>,
    item_type_filter: Vec<String>,
    matcher: Regex,
    path_patterns: Vec<Pattern>,
}

impl SubstitutionRule {
    /// The literal (or regex source, for regex rules) this rule looks for
    pub fn find(&self) -> &str {
        &self.find
    }

    pub fn is_regex(&self) -> bool {
        self.is_regex
    }

    /// Replacement value for `environment`, if the rule declares one
    pub fn replacement(&self, environment: Environment) -> Option<&str> {
        self.replace.get(&environment).map(String::as_str)
    }

    /// Environments this rule provides a replacement for
    pub fn environments(&self) -> impl Iterator<Item = Environment> + '_ {
        self.replace.keys().copied()
    }

    /// Declared environments this rule has no replacement for
    pub fn missing_environments(&self, environments: &[Environment]) -> Vec<Environment> {
        environments
            .iter()
            .copied()
            .filter(|env| !self.replace.contains_key(env))
            .collect()
    }

    pub fn path_filter(&self) -> &[String] {
        &self.path_filter
    }

    pub fn item_type_filter(&self) -> &[String] {
        &self.item_type_filter
    }

    /// Whether the rule's scope includes the file at `path`.
    ///
    /// An empty filter accepts everything. A non-empty item-type filter
    /// rejects files that are not inside any item folder.
    pub fn applies_to(&self, path: &str) -> bool {
        let path_ok =
            self.path_patterns.is_empty() || self.path_patterns.iter().any(|p| p.matches(path));
        if !path_ok {
            return false;
        }

        if self.item_type_filter.is_empty() {
            return true;
        }
        match item_type_of(path) {
            Some(item_type) => self
                .item_type_filter
                .iter()
                .any(|t| t.eq_ignore_ascii_case(item_type)),
            None => false,
        }
    }

    /// Byte spans of every token-bounded occurrence in `content`
    pub fn occurrences(&self, content: &[u8]) -> Vec<(usize, usize)> {
        let mut spans = Vec::new();
        let mut at = 0;

        while at <= content.len() {
            let m = match self.matcher.find_at(content, at) {
                Some(m) => m,
                None => break,
            };
            if m.start() == m.end() {
                at = m.end() + 1;
                continue;
            }
            if is_token(content, m.start(), m.end()) {
                spans.push((m.start(), m.end()));
                at = m.end();
            } else {
                at = m.start() + 1;
            }
        }

        spans
    }

    fn same_scope(&self, other: &SubstitutionRule) -> bool {
        self.find == other.find
            && self.is_regex == other.is_regex
            && self.path_filter == other.path_filter
            && self.item_type_filter == other.item_type_filter
    }
}

/// One occurrence claimed by a rule inside a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMatch {
    pub start: usize,
    pub end: usize,
    /// Zero-based declaration index of the winning rule
    pub rule: usize,
}

/// Ordered collection of substitution rules for one workspace
#[derive(Debug, Clone, Default)]
pub struct ParameterRuleSet {
    rules: Vec<SubstitutionRule>,
    warnings: Vec<String>,
}

impl ParameterRuleSet {
    /// Parse a parameter descriptor.
    ///
    /// An empty descriptor yields an empty rule set. Every rule must declare
    /// a non-empty `find` and at least one replacement; environment keys must
    /// name a known environment.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes).map_err(|e| Error::RuleSchema {
            rule: None,
            message: format!("descriptor is not valid UTF-8: {}", e),
        })?;
        Self::parse_str(text)
    }

    /// Parse a parameter descriptor from text
    pub fn parse_str(text: &str) -> Result<Self> {
        let document: Value = serde_yaml::from_str(text).map_err(|e| Error::RuleSchema {
            rule: None,
            message: format!("invalid YAML: {}", e),
        })?;

        let entries = match document {
            Value::Null => Vec::new(),
            Value::Sequence(seq) => seq,
            Value::Mapping(mut map) => match map.remove("find_replace") {
                Some(Value::Sequence(seq)) => seq,
                Some(Value::Null) | None => Vec::new(),
                Some(_) => {
                    return Err(Error::RuleSchema {
                        rule: None,
                        message: "'find_replace' must be a list of rules".to_string(),
                    })
                }
            },
            _ => {
                return Err(Error::RuleSchema {
                    rule: None,
                    message: "expected a list of rules or a 'find_replace' mapping".to_string(),
                })
            }
        };

        let mut rules: Vec<SubstitutionRule> = Vec::with_capacity(entries.len());
        let mut warnings = Vec::new();

        for (index, entry) in entries.into_iter().enumerate() {
            let raw: RawRule = serde_yaml::from_value(entry).map_err(|e| Error::RuleSchema {
                rule: Some(index),
                message: e.to_string(),
            })?;
            let rule = build_rule(index, raw)?;

            if let Some(first) = rules.iter().position(|r| r.same_scope(&rule)) {
                let warning = format!(
                    "rule #{} duplicates rule #{} (find '{}'); rule #{} takes precedence",
                    index + 1,
                    first + 1,
                    rule.find,
                    first + 1
                );
                warn!("{}", warning);
                warnings.push(warning);
            }
            rules.push(rule);
        }

        Ok(Self { rules, warnings })
    }

    pub fn rules(&self) -> &[SubstitutionRule] {
        &self.rules
    }

    /// Non-fatal findings such as duplicate rules
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SubstitutionRule> {
        self.rules.get(index)
    }

    /// Resolve which rule claims each occurrence in a file.
    ///
    /// Rules are visited in declaration order and each claims its
    /// occurrences that do not overlap a span already claimed by an earlier
    /// rule. The result is sorted by start offset and contains no overlaps.
    pub fn matches_in(&self, path: &str, content: &[u8]) -> Vec<RuleMatch> {
        // start -> (end, rule)
        let mut claimed: BTreeMap<usize, (usize, usize)> = BTreeMap::new();

        for (index, rule) in self.rules.iter().enumerate() {
            if !rule.applies_to(path) {
                continue;
            }
            for (start, end) in rule.occurrences(content) {
                let overlaps_before = claimed
                    .range(..end)
                    .next_back()
                    .is_some_and(|(_, &(claimed_end, _))| claimed_end > start);
                if !overlaps_before {
                    claimed.insert(start, (end, index));
                }
            }
        }

        claimed
            .into_iter()
            .map(|(start, (end, rule))| RuleMatch { start, end, rule })
            .collect()
    }
}

fn build_rule(index: usize, raw: RawRule) -> Result<SubstitutionRule> {
    let schema_error = |message: String| Error::RuleSchema {
        rule: Some(index),
        message,
    };

    let find = match raw.find {
        Some(find) if !find.is_empty() => find,
        _ => return Err(schema_error("rule must declare a non-empty 'find'".to_string())),
    };

    let raw_replace = raw.replace.unwrap_or_default();
    if raw_replace.is_empty() {
        return Err(schema_error(format!(
            "rule for '{}' declares no 'replace' value for any environment",
            find
        )));
    }

    let mut replace = BTreeMap::new();
    for (key, value) in raw_replace {
        let environment: Environment = key.parse().map_err(schema_error)?;
        if replace.insert(environment, value).is_some() {
            return Err(schema_error(format!(
                "environment '{}' is listed more than once",
                environment
            )));
        }
    }

    let matcher = if raw.is_regex {
        Regex::new(&find)
    } else {
        Regex::new(&regex::escape(&find))
    }
    .map_err(|e| schema_error(format!("invalid find pattern '{}': {}", find, e)))?;

    let path_filter = raw.path_filter.map(OneOrMany::into_vec).unwrap_or_default();
    let path_patterns = path_filter
        .iter()
        .map(|p| Pattern::new(p).map_err(|e| schema_error(format!("invalid path_filter '{}': {}", p, e))))
        .collect::<Result<Vec<_>>>()?;

    let mut seen = HashSet::new();
    let item_type_filter: Vec<String> = raw
        .item_type_filter
        .map(OneOrMany::into_vec)
        .unwrap_or_default()
        .into_iter()
        .filter(|t| seen.insert(t.to_ascii_lowercase()))
        .collect();

    Ok(SubstitutionRule {
        find,
        is_regex: raw.is_regex,
        replace,
        path_filter,
        item_type_filter,
        matcher,
        path_patterns,
    })
}

fn is_identifier_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

/// Whether `content[start..end]` stands alone as a token.
///
/// Only edges that are themselves identifier characters are checked, so a
/// find value like `"https://host/"` may sit directly against other text.
pub(crate) fn is_token(content: &[u8], start: usize, end: usize) -> bool {
    if start >= end || end > content.len() {
        return false;
    }
    let left_ok = !is_identifier_byte(content[start])
        || start == 0
        || !is_identifier_byte(content[start - 1]);
    let right_ok = !is_identifier_byte(content[end - 1])
        || end == content.len()
        || !is_identifier_byte(content[end]);
    left_ok && right_ok
}
