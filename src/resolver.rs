//! # Parameter Resolution
//!
//! Resolution rewrites a workspace's content for one target environment.
//! It is a pure, total function of `(content, rules, environment)`:
//!
//! - For every file, the applicable rules are those whose path and item-type
//!   filters accept the file.
//! - Every token-bounded occurrence claimed by a rule (first-declared rule
//!   wins, see [`ParameterRuleSet::matches_in`]) is replaced by that rule's
//!   value for the environment.
//! - When the claiming rule has no value for the environment, the occurrence
//!   is left untouched and recorded as unmapped. Resolution never fails on
//!   missing mappings; blocking them is the job of
//!   [`crate::coverage::CoverageScanner`].
//! - Every byte outside a replaced occurrence is preserved, so re-running
//!   resolution on the same inputs yields identical output.

use serde::Serialize;

use crate::catalog::WorkspaceDefinition;
use crate::environment::Environment;
use crate::filesystem::{ContentTree, File};
use crate::parameter::ParameterRuleSet;

/// A literal that was rewritten
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubstitutionEvent {
    pub file: String,
    /// Byte offset of the occurrence in the original file
    pub offset: usize,
    pub original: String,
    pub replacement: String,
    /// Declaration index of the rule that matched
    pub rule: usize,
}

/// A claimed literal left in place because its rule has no value for the
/// target environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmappedOccurrence {
    pub file: String,
    pub offset: usize,
    pub literal: String,
    pub rule: usize,
}

/// Output of resolving one workspace for one environment
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionResult {
    pub workspace: String,
    pub environment: Environment,
    /// Transformed content tree
    #[serde(skip)]
    pub content: ContentTree,
    pub substitutions: Vec<SubstitutionEvent>,
    pub unmapped: Vec<UnmappedOccurrence>,
}

impl ResolutionResult {
    /// Number of files with at least one substitution
    pub fn files_changed(&self) -> usize {
        let mut files: Vec<&str> = self.substitutions.iter().map(|s| s.file.as_str()).collect();
        files.dedup();
        files.len()
    }
}

/// Resolve a discovered workspace for `environment`
pub fn resolve(
    workspace: &WorkspaceDefinition,
    rules: &ParameterRuleSet,
    environment: Environment,
) -> ResolutionResult {
    resolve_tree(workspace.name(), workspace.content(), rules, environment)
}

/// Resolve an arbitrary content tree for `environment`
pub fn resolve_tree(
    workspace: &str,
    content: &ContentTree,
    rules: &ParameterRuleSet,
    environment: Environment,
) -> ResolutionResult {
    let mut output = ContentTree::new();
    let mut substitutions = Vec::new();
    let mut unmapped = Vec::new();

    for (path, file) in content.files() {
        let bytes = file.content.as_slice();
        let matches = rules.matches_in(path, bytes);
        if matches.is_empty() {
            output.add_file(path, file.clone());
            continue;
        }

        let mut rewritten = Vec::with_capacity(bytes.len());
        let mut cursor = 0;

        for m in matches {
            rewritten.extend_from_slice(&bytes[cursor..m.start]);
            let original = &bytes[m.start..m.end];
            let replacement = rules
                .get(m.rule)
                .and_then(|rule| rule.replacement(environment));

            match replacement {
                Some(value) => {
                    rewritten.extend_from_slice(value.as_bytes());
                    substitutions.push(SubstitutionEvent {
                        file: path.to_string(),
                        offset: m.start,
                        original: String::from_utf8_lossy(original).into_owned(),
                        replacement: value.to_string(),
                        rule: m.rule,
                    });
                }
                None => {
                    rewritten.extend_from_slice(original);
                    unmapped.push(UnmappedOccurrence {
                        file: path.to_string(),
                        offset: m.start,
                        literal: String::from_utf8_lossy(original).into_owned(),
                        rule: m.rule,
                    });
                }
            }
            cursor = m.end;
        }
        rewritten.extend_from_slice(&bytes[cursor..]);

        output.add_file(path, File::new(rewritten));
    }

    ResolutionResult {
        workspace: workspace.to_string(),
        environment,
        content: output,
        substitutions,
        unmapped,
    }
}
