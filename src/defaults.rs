//! Default values for fabric-promote configuration.
//!
//! This module provides centralized default values used by the settings
//! file, the catalog and the CLI, ensuring consistency and avoiding
//! duplication.

/// Accepted file names for the per-workspace config descriptor
pub const CONFIG_DESCRIPTORS: &[&str] = &["config.yml", "config.yaml"];

/// Accepted file names for the per-workspace parameter descriptor
pub const PARAMETER_DESCRIPTORS: &[&str] = &["parameter.yml", "parameter.yaml"];

/// Settings file looked up in the current directory when `--settings` is not given
pub const SETTINGS_FILE: &str = ".fabric-promote.yaml";

/// Default directory holding the workspace folders
pub const WORKSPACES_DIR: &str = "workspaces";

/// Upper bound for the default worker count
const MAX_DEFAULT_WORKERS: usize = 8;

/// Returns the default number of workspaces processed concurrently.
///
/// Uses the available parallelism of the host, capped so that a large CI
/// runner does not open an excessive number of publish sessions at once.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(MAX_DEFAULT_WORKERS)
}
