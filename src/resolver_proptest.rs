//! Property-based tests for resolution and coverage.
//!
//! Content is generated from a small pool of GUID literals mixed with
//! filler text, and rule sets map a random subset of the pool to values for
//! a random subset of environments.

#[cfg(test)]
mod proptest_tests {
    use crate::coverage::CoverageScanner;
    use crate::environment::Environment;
    use crate::filesystem::ContentTree;
    use crate::parameter::ParameterRuleSet;
    use crate::resolver::resolve_tree;
    use proptest::prelude::*;

    const POOL: [&str; 4] = [
        "11111111-1111-1111-1111-111111111111",
        "aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee",
        "0f0f0f0f-0000-4000-8000-123456789abc",
        "deadbeef-dead-beef-dead-beefdeadbeef",
    ];

    const PATH: &str = "nb.Notebook/notebook-content.py";

    fn environment() -> impl Strategy<Value = Environment> {
        prop_oneof![
            Just(Environment::Dev),
            Just(Environment::Test),
            Just(Environment::Prod)
        ]
    }

    /// Either a pool literal or filler ending in a separator
    fn segment() -> impl Strategy<Value = String> {
        prop_oneof![
            (0..POOL.len()).prop_map(|i| POOL[i].to_string()),
            "[a-z =\"'\\n]{0,12}",
            Just(" ".to_string()),
        ]
    }

    fn content() -> impl Strategy<Value = String> {
        prop::collection::vec(segment(), 0..24).prop_map(|parts| parts.join(" "))
    }

    /// Rule set covering a subset of the pool; the bit mask picks environments
    fn rules() -> impl Strategy<Value = ParameterRuleSet> {
        prop::collection::vec((0..POOL.len(), 1u8..8), 0..6).prop_map(|specs| {
            let mut yaml = String::from("find_replace:\n");
            for (n, (literal, mask)) in specs.into_iter().enumerate() {
                yaml.push_str(&format!("  - find: \"{}\"\n    replace:\n", POOL[literal]));
                for (bit, env) in Environment::ALL.iter().enumerate() {
                    if mask & (1 << bit) != 0 {
                        yaml.push_str(&format!("      {}: \"value_{}_{}\"\n", env, n, env));
                    }
                }
            }
            ParameterRuleSet::parse_str(&yaml).unwrap()
        })
    }

    fn tree(text: &str) -> ContentTree {
        let mut tree = ContentTree::new();
        tree.add_file_string(PATH, text);
        tree
    }

    proptest! {
        /// Property: resolution is deterministic
        #[test]
        fn resolution_is_deterministic(text in content(), rules in rules(), env in environment()) {
            let content = tree(&text);
            let first = resolve_tree("W", &content, &rules, env);
            let second = resolve_tree("W", &content, &rules, env);
            prop_assert_eq!(first.content, second.content);
            prop_assert_eq!(first.substitutions, second.substitutions);
            prop_assert_eq!(first.unmapped, second.unmapped);
        }

        /// Property: an empty coverage report means nothing is left unmapped
        #[test]
        fn clean_scan_implies_complete_resolution(text in content(), rules in rules(), env in environment()) {
            let content = tree(&text);
            let report = CoverageScanner::default().scan_tree("W", &content, &rules, &[env]);
            let result = resolve_tree("W", &content, &rules, env);
            if report.is_empty() {
                prop_assert!(result.unmapped.is_empty());
                for literal in POOL {
                    let resolved = result.content.get_text(PATH).unwrap_or_default();
                    prop_assert!(!resolved.contains(literal));
                }
            }
            if !result.unmapped.is_empty() {
                prop_assert!(report.blocks(env));
            }
        }

        /// Property: resolving already-resolved content changes nothing when
        /// every occurrence was substituted
        #[test]
        fn resolution_is_idempotent(text in content(), rules in rules(), env in environment()) {
            let once = resolve_tree("W", &tree(&text), &rules, env);
            prop_assume!(once.unmapped.is_empty());
            let twice = resolve_tree("W", &once.content, &rules, env);
            prop_assert!(twice.substitutions.is_empty());
            prop_assert_eq!(once.content, twice.content);
        }

        /// Property: content without any rule literal passes through unchanged
        #[test]
        fn unrelated_content_is_preserved(text in "[a-z0-9 =\"'\\n]{0,64}", rules in rules(), env in environment()) {
            let content = tree(&text);
            let result = resolve_tree("W", &content, &rules, env);
            prop_assert!(result.substitutions.is_empty());
            prop_assert_eq!(result.content, content);
        }

        /// Property: the first-declared rule for a literal decides its value
        #[test]
        fn first_declared_rule_wins(text in content(), rules in rules(), env in environment()) {
            let result = resolve_tree("W", &tree(&text), &rules, env);
            for event in &result.substitutions {
                let first = rules
                    .rules()
                    .iter()
                    .position(|r| r.find() == event.original)
                    .unwrap();
                prop_assert_eq!(event.rule, first);
            }
        }
    }
}
