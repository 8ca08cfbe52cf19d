//! # Error Handling
//!
//! This module defines the centralized error type for `fabric-promote`. It
//! uses `thiserror` to describe every anticipated failure mode with a clear,
//! contextual message.
//!
//! ## Scopes
//!
//! The variants fall into two groups, and callers must treat them differently:
//!
//! - **Run-scoped**: [`Error::Discovery`] and [`Error::Precondition`]. These
//!   abort an orchestrator run before any workspace is touched.
//! - **Workspace-scoped**: [`Error::Config`], [`Error::RuleSchema`],
//!   [`Error::UnmappedIdentifier`] and [`Error::Publish`]. These are recorded
//!   against a single workspace and never stop its siblings.
//!
//! The remaining variants wrap lower-level I/O and YAML failures and are
//! usually converted into one of the scoped variants by the caller.

use std::path::PathBuf;

use thiserror::Error;

use crate::environment::Environment;

/// Main error type for fabric-promote operations
#[derive(Error, Debug)]
pub enum Error {
    /// The workspace root is missing or contains no qualifying workspace.
    #[error("Discovery error in {}: {message}", root.display())]
    Discovery { root: PathBuf, message: String },

    /// A single workspace folder is malformed (missing or invalid descriptor,
    /// missing target name).
    #[error("Configuration error in workspace '{workspace}': {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Config {
        workspace: String,
        message: String,
        /// Optional hint for how to fix the workspace folder
        hint: Option<String>,
    },

    /// The parameter descriptor does not satisfy the rule schema.
    #[error("Parameter rule error{}: {message}", rule.map(|i| format!(" in rule #{}", i + 1)).unwrap_or_default())]
    RuleSchema {
        /// Zero-based index of the offending rule, when known
        rule: Option<usize>,
        message: String,
    },

    /// The coverage scan found identifiers without a replacement.
    #[error("Unmapped identifiers in workspace '{workspace}' for {environment}: {count} gap(s)")]
    UnmappedIdentifier {
        workspace: String,
        environment: Environment,
        count: usize,
    },

    /// Infrastructure provisioning has not completed for the environment.
    #[error("Infrastructure precondition not met for {environment}: {message}")]
    Precondition {
        environment: Environment,
        message: String,
    },

    /// The publish collaborator reported a failure.
    #[error("Publish to '{target}' failed: {message}")]
    Publish { target: String, message: String },

    /// An error occurred while reading or writing content on disk.
    #[error("Filesystem operation error: {message}")]
    Filesystem { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Whether this error aborts an entire orchestrator run.
    pub fn is_run_scoped(&self) -> bool {
        matches!(self, Error::Discovery { .. } | Error::Precondition { .. })
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
