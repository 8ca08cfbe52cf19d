//! # Fabric Workspace Promotion
//!
//! This library promotes Microsoft Fabric workspace definitions from source
//! control into the dev, test and prod target workspaces. Every definition is
//! authored once; environment-specific identifiers inside item payloads are
//! rewritten by find/replace rules before publishing, and a coverage check
//! refuses to publish any workspace that would carry a source identifier
//! into an environment it does not belong to.
//!
//! It is used by the `fabric-promote` command-line tool but has no
//! dependency on it.
//!
//! ## Quick Example
//!
//! ```
//! use fabric_promote::coverage::CoverageScanner;
//! use fabric_promote::environment::Environment;
//! use fabric_promote::filesystem::ContentTree;
//! use fabric_promote::parameter::ParameterRuleSet;
//! use fabric_promote::resolver::resolve_tree;
//!
//! let rules = ParameterRuleSet::parse_str(r#"
//! find_replace:
//!   - find: "11111111-1111-1111-1111-111111111111"
//!     replace:
//!       dev: "22222222-2222-2222-2222-222222222222"
//! "#).unwrap();
//!
//! let mut content = ContentTree::new();
//! content.add_file_string(
//!     "Load.Notebook/notebook-content.py",
//!     "lakehouse = '11111111-1111-1111-1111-111111111111'",
//! );
//!
//! let scanner = CoverageScanner::default();
//! assert!(scanner.scan_tree("Blueprint", &content, &rules, &[Environment::Dev]).is_empty());
//! assert!(!scanner.scan_tree("Blueprint", &content, &rules, &[Environment::Prod]).is_empty());
//!
//! let resolved = resolve_tree("Blueprint", &content, &rules, Environment::Dev);
//! assert_eq!(
//!     resolved.content.get_text("Load.Notebook/notebook-content.py"),
//!     Some("lakehouse = '22222222-2222-2222-2222-222222222222'"),
//! );
//! ```
//!
//! ## Core Concepts
//!
//! - **Catalog (`catalog`)**: discovers workspace folders and loads their
//!   config descriptor, parameter descriptor and content.
//! - **Parameter rules (`parameter`)**: the ordered find/replace rules of a
//!   workspace and the token-bounded matching they share.
//! - **Resolver (`resolver`)**: rewrites a workspace's content for one
//!   environment.
//! - **Coverage (`coverage`)**: reports identifiers that would survive
//!   resolution untranslated.
//! - **Orchestrator (`orchestrator`)**: runs a deployment across all
//!   workspaces behind the infrastructure precondition (`precondition`) and
//!   hands resolved content to a publisher (`publish`).
//!
//! ## Execution Flow
//!
//! 1.  **Precondition**: confirm infrastructure is provisioned.
//! 2.  **Discovery**: list workspace folders in name order.
//! 3.  **Gate**: parse rules and scan for uncovered identifiers.
//! 4.  **Resolve**: substitute identifiers for the target environment.
//! 5.  **Publish**: hand the content to the publisher and record its answer.

pub mod catalog;
pub mod coverage;
pub mod defaults;
pub mod environment;
pub mod error;
pub mod filesystem;
pub mod orchestrator;
pub mod output;
pub mod parameter;
pub mod path;
pub mod precondition;
pub mod publish;
pub mod resolver;
pub mod settings;

#[cfg(test)]
mod resolver_proptest;
