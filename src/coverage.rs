//! # Coverage Scanning
//!
//! The scanner is the policy gate in front of every deployment. It reads the
//! original (unresolved) content of a workspace and reports every place where
//! resolution for some declared environment would leave an identifier behind:
//!
//! 1. **Unclaimed identifiers**: GUID-shaped tokens that no applicable rule
//!    claims. These are uncovered for every declared environment.
//! 2. **Rule gaps**: occurrences claimed by a rule that has no replacement for
//!    one or more declared environments, whatever their shape.
//!
//! Detection is purely lexical: any 8-4-4-4-12 hex run counts, wherever it
//! sits, unless a neighbouring hex digit makes it part of a longer hex run.
//! Identifier text glued to a GUID (`lh_<guid>`, `conn-<guid>`) does not hide
//! it. The scanner uses the same claiming logic as the resolver
//! ([`ParameterRuleSet::matches_in`]), so an empty report guarantees that
//! [`crate::resolver::resolve`] produces no unmapped occurrence for any of the
//! scanned environments.
//!
//! Scanning is read-only and needs neither network access nor the publish
//! collaborator, which makes it usable as a standalone pre-merge check.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use log::debug;
use regex::bytes::Regex;
use serde::Serialize;

use crate::catalog::WorkspaceDefinition;
use crate::environment::Environment;
use crate::filesystem::ContentTree;
use crate::parameter::ParameterRuleSet;

const GUID_PATTERN: &str =
    r"(?i-u)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}";

/// Scanner configuration
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Identifier literals never reported when no rule claims them
    /// (compared case-insensitively)
    pub ignore_literals: Vec<String>,
}

/// A literal that some declared environment has no replacement for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageGap {
    /// Workspace-relative file path
    pub file: String,
    pub literal: String,
    /// Environments lacking coverage, in promotion order
    pub missing: Vec<Environment>,
    /// Declaration index of the claiming rule; `None` for unclaimed identifiers
    pub rule: Option<usize>,
    /// Number of occurrences of this literal in the file
    pub occurrences: usize,
}

/// Per-workspace result of a coverage scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageReport {
    pub workspace: String,
    pub environments: Vec<Environment>,
    pub gaps: Vec<CoverageGap>,
}

impl CoverageReport {
    /// `true` when nothing blocks deployment
    pub fn is_empty(&self) -> bool {
        self.gaps.is_empty()
    }

    /// Gaps that block deployment to `environment`
    pub fn gaps_for(&self, environment: Environment) -> impl Iterator<Item = &CoverageGap> {
        self.gaps
            .iter()
            .filter(move |gap| gap.missing.contains(&environment))
    }

    /// Whether deployment of this workspace to `environment` must be blocked
    pub fn blocks(&self, environment: Environment) -> bool {
        self.gaps_for(environment).next().is_some()
    }
}

impl fmt::Display for CoverageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.gaps.is_empty() {
            return write!(f, "{}: all identifiers covered", self.workspace);
        }
        writeln!(f, "{}: {} uncovered literal(s)", self.workspace, self.gaps.len())?;
        for gap in &self.gaps {
            let missing: Vec<&str> = gap.missing.iter().map(Environment::as_str).collect();
            write!(
                f,
                "  {}: {} (missing: {})",
                gap.file,
                gap.literal,
                missing.join(", ")
            )?;
            if let Some(rule) = gap.rule {
                write!(f, " [rule #{}]", rule + 1)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Lexical identifier-coverage checker
#[derive(Debug, Clone)]
pub struct CoverageScanner {
    guid: Regex,
    ignored: BTreeSet<String>,
}

impl CoverageScanner {
    pub fn new(options: ScanOptions) -> Self {
        Self {
            guid: Regex::new(GUID_PATTERN).expect("GUID pattern is a valid regex"),
            ignored: options
                .ignore_literals
                .iter()
                .map(|l| l.to_ascii_lowercase())
                .collect(),
        }
    }

    /// Scan a discovered workspace
    pub fn scan(
        &self,
        workspace: &WorkspaceDefinition,
        rules: &ParameterRuleSet,
        environments: &[Environment],
    ) -> CoverageReport {
        self.scan_tree(workspace.name(), workspace.content(), rules, environments)
    }

    /// Scan an arbitrary content tree
    pub fn scan_tree(
        &self,
        workspace: &str,
        content: &ContentTree,
        rules: &ParameterRuleSet,
        environments: &[Environment],
    ) -> CoverageReport {
        let mut environments = environments.to_vec();
        environments.sort();
        environments.dedup();

        // (file, literal, rule) -> (missing, occurrences)
        let mut gaps: BTreeMap<(String, String, Option<usize>), (Vec<Environment>, usize)> =
            BTreeMap::new();

        for (path, file) in content.files() {
            let bytes = file.content.as_slice();
            let matches = rules.matches_in(path, bytes);

            for m in &matches {
                let Some(rule) = rules.get(m.rule) else { continue };
                let missing = rule.missing_environments(&environments);
                if missing.is_empty() {
                    continue;
                }
                let literal = String::from_utf8_lossy(&bytes[m.start..m.end]).into_owned();
                gaps.entry((path.to_string(), literal, Some(m.rule)))
                    .or_insert((missing, 0))
                    .1 += 1;
            }

            for (start, end) in self.identifiers(bytes) {
                let claimed = matches.iter().any(|m| m.start <= start && end <= m.end);
                if claimed {
                    continue;
                }
                let literal = String::from_utf8_lossy(&bytes[start..end]).into_owned();
                if self.ignored.contains(&literal.to_ascii_lowercase()) {
                    debug!("Ignoring {} in {}/{}", literal, workspace, path);
                    continue;
                }
                if environments.is_empty() {
                    continue;
                }
                gaps.entry((path.to_string(), literal, None))
                    .or_insert((environments.clone(), 0))
                    .1 += 1;
            }
        }

        let gaps = gaps
            .into_iter()
            .map(|((file, literal, rule), (missing, occurrences))| CoverageGap {
                file,
                literal,
                missing,
                rule,
                occurrences,
            })
            .collect();

        CoverageReport {
            workspace: workspace.to_string(),
            environments,
            gaps,
        }
    }

    /// Byte spans of GUID-shaped literals not embedded in a longer hex run
    fn identifiers(&self, content: &[u8]) -> Vec<(usize, usize)> {
        self.guid
            .find_iter(content)
            .map(|m| (m.start(), m.end()))
            .filter(|&(start, end)| {
                let left = start == 0 || !content[start - 1].is_ascii_hexdigit();
                let right = end == content.len() || !content[end].is_ascii_hexdigit();
                left && right
            })
            .collect()
    }
}

impl Default for CoverageScanner {
    fn default() -> Self {
        Self::new(ScanOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: &str = "11111111-1111-1111-1111-111111111111";

    fn blueprint_rules() -> ParameterRuleSet {
        ParameterRuleSet::parse_str(&format!(
            r#"
find_replace:
  - find_value: "{SRC}"
    replace_value:
      dev: "22222222-2222-2222-2222-222222222222"
      test: "33333333-3333-3333-3333-333333333333"
"#
        ))
        .unwrap()
    }

    fn tree(path: &str, content: &str) -> ContentTree {
        let mut tree = ContentTree::new();
        tree.add_file_string(path, content);
        tree
    }

    #[test]
    fn test_blueprint_reports_prod_only() {
        let content = tree("nb.Notebook/notebook-content.py", &format!("lh = '{}'", SRC));
        let report = CoverageScanner::default().scan_tree(
            "Blueprint",
            &content,
            &blueprint_rules(),
            &Environment::ALL,
        );

        assert_eq!(report.gaps.len(), 1);
        let gap = &report.gaps[0];
        assert_eq!(gap.literal, SRC);
        assert_eq!(gap.missing, vec![Environment::Prod]);
        assert_eq!(gap.rule, Some(0));
        assert!(report.blocks(Environment::Prod));
        assert!(!report.blocks(Environment::Dev));
        assert!(!report.blocks(Environment::Test));
    }

    #[test]
    fn test_unclaimed_guid_is_missing_everywhere() {
        let content = tree(
            "lh.Lakehouse/shortcuts.metadata.json",
            "{\"target\": \"ABCDEF01-2345-6789-abcd-ef0123456789\"}",
        );
        let report = CoverageScanner::default().scan_tree(
            "W",
            &content,
            &ParameterRuleSet::default(),
            &[Environment::Test, Environment::Dev],
        );

        assert_eq!(report.gaps.len(), 1);
        assert_eq!(report.gaps[0].rule, None);
        assert_eq!(
            report.gaps[0].missing,
            vec![Environment::Dev, Environment::Test]
        );
        assert_eq!(report.environments, vec![Environment::Dev, Environment::Test]);
    }

    #[test]
    fn test_occurrences_are_aggregated_per_file() {
        let content = tree("a.json", &format!("[\"{SRC}\", \"{SRC}\"]"));
        let report = CoverageScanner::default().scan_tree(
            "W",
            &content,
            &ParameterRuleSet::default(),
            &[Environment::Dev],
        );
        assert_eq!(report.gaps.len(), 1);
        assert_eq!(report.gaps[0].occurrences, 2);
    }

    #[test]
    fn test_guid_inside_longer_hex_run_is_not_an_identifier() {
        let content = tree("a.txt", &format!("{SRC}0 a{SRC} {SRC}ff"));
        let report = CoverageScanner::default().scan_tree(
            "W",
            &content,
            &ParameterRuleSet::default(),
            &Environment::ALL,
        );
        assert!(report.is_empty(), "{}", report);
    }

    #[test]
    fn test_guid_glued_to_identifier_text_is_reported() {
        let content = tree("a.txt", &format!("x{SRC} lh_{SRC}"));
        let report = CoverageScanner::default().scan_tree(
            "W",
            &content,
            &ParameterRuleSet::default(),
            &[Environment::Dev],
        );
        assert_eq!(report.gaps.len(), 1);
        assert_eq!(report.gaps[0].literal, SRC);
        assert_eq!(report.gaps[0].occurrences, 2);
        assert_eq!(report.gaps[0].rule, None);
    }

    #[test]
    fn test_bare_rule_does_not_cover_glued_guid() {
        // The rule only rewrites the standalone literal, so the glued copies
        // would reach every environment unchanged.
        let rules = ParameterRuleSet::parse_str(&format!(
            "- find: '{SRC}'\n  replace: {{ dev: a, test: b, prod: c }}\n"
        ))
        .unwrap();
        let content = tree(
            "lh.Lakehouse/shortcuts.metadata.json",
            &format!("{{\"id\": \"{SRC}\", \"name\": \"lh_{SRC}\", \"conn\": \"conn-{SRC}\"}}"),
        );

        let report =
            CoverageScanner::default().scan_tree("W", &content, &rules, &Environment::ALL);
        assert_eq!(report.gaps.len(), 1);
        assert_eq!(report.gaps[0].rule, None);
        assert_eq!(report.gaps[0].occurrences, 2);
        assert!(report.blocks(Environment::Prod));
    }

    #[test]
    fn test_out_of_scope_rule_does_not_cover() {
        let rules = ParameterRuleSet::parse_str(&format!(
            "- find: '{SRC}'\n  replace: {{ dev: a, test: b, prod: c }}\n  item_type: Lakehouse\n"
        ))
        .unwrap();
        let content = tree("nb.Notebook/notebook-content.py", SRC);

        let report =
            CoverageScanner::default().scan_tree("W", &content, &rules, &Environment::ALL);
        assert_eq!(report.gaps.len(), 1);
        assert_eq!(report.gaps[0].rule, None);
    }

    #[test]
    fn test_first_rule_decides_coverage() {
        // The earlier rule claims the literal even though the later one would
        // cover prod.
        let rules = ParameterRuleSet::parse_str(&format!(
            "- find: '{SRC}'\n  replace: {{ dev: a }}\n- find: '{SRC}'\n  replace: {{ dev: a, prod: c }}\n"
        ))
        .unwrap();
        let content = tree("a.json", SRC);

        let report = CoverageScanner::default().scan_tree(
            "W",
            &content,
            &rules,
            &[Environment::Dev, Environment::Prod],
        );
        assert_eq!(report.gaps.len(), 1);
        assert_eq!(report.gaps[0].missing, vec![Environment::Prod]);
        assert_eq!(report.gaps[0].rule, Some(0));
    }

    #[test]
    fn test_non_guid_rule_gap_is_reported() {
        let rules =
            ParameterRuleSet::parse_str("- find: dev-sql.example.net\n  replace: { test: test-sql.example.net }\n")
                .unwrap();
        let content = tree("pipe.DataPipeline/pipeline-content.json", "host: dev-sql.example.net");

        let report = CoverageScanner::default().scan_tree(
            "W",
            &content,
            &rules,
            &[Environment::Test, Environment::Prod],
        );
        assert_eq!(report.gaps.len(), 1);
        assert_eq!(report.gaps[0].literal, "dev-sql.example.net");
        assert_eq!(report.gaps[0].missing, vec![Environment::Prod]);
    }

    #[test]
    fn test_ignore_literals() {
        let content = tree(
            "nb.Notebook/notebook-content.py",
            "\"default_lakehouse_workspace_id\": \"00000000-0000-0000-0000-000000000000\"",
        );
        let scanner = CoverageScanner::new(ScanOptions {
            ignore_literals: vec!["00000000-0000-0000-0000-000000000000".to_string()],
        });
        let report =
            scanner.scan_tree("W", &content, &ParameterRuleSet::default(), &Environment::ALL);
        assert!(report.is_empty());
    }

    #[test]
    fn test_no_environments_means_no_gaps() {
        let content = tree("a.json", SRC);
        let report =
            CoverageScanner::default().scan_tree("W", &content, &blueprint_rules(), &[]);
        assert!(report.is_empty());
    }

    #[test]
    fn test_display() {
        let content = tree("a.json", SRC);
        let report = CoverageScanner::default().scan_tree(
            "Blueprint",
            &content,
            &blueprint_rules(),
            &Environment::ALL,
        );
        let text = report.to_string();
        assert!(text.contains("Blueprint: 1 uncovered literal(s)"));
        assert!(text.contains("a.json"));
        assert!(text.contains("missing: prod"));
        assert!(text.contains("[rule #1]"));
    }
}
