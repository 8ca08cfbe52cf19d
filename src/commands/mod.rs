//! # CLI Command Implementations
//!
//! One module per subcommand of the `fabric-promote` tool. Each module
//! holds an `Args` struct derived with `clap` and an `execute` function that
//! calls into the `fabric_promote` library.
//!
//! The helpers here are shared by the commands that work on a workspace
//! root: settings loading, the root argument and the output format switch.

pub mod completions;
pub mod deploy;
pub mod list;
pub mod resolve;
pub mod scan;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::{Args, ValueEnum};
use log::debug;

use fabric_promote::defaults;
use fabric_promote::output::OutputConfig;
use fabric_promote::settings::Settings;

/// Global options resolved once per invocation
#[derive(Debug)]
pub struct Context {
    pub out: OutputConfig,
    pub settings_path: Option<PathBuf>,
}

impl Context {
    /// Load the settings file named by `--settings`, or the default file in
    /// the current directory when present.
    pub fn settings(&self) -> Result<Settings> {
        let path = match &self.settings_path {
            Some(path) => path.clone(),
            None => {
                let default = PathBuf::from(defaults::SETTINGS_FILE);
                if !default.is_file() {
                    debug!("No settings file, using defaults");
                    return Ok(Settings::default());
                }
                default
            }
        };

        Settings::from_file(&path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))
    }
}

/// Directory holding the workspace folders
#[derive(Args, Debug)]
pub struct RootArg {
    /// Directory containing one folder per workspace.
    ///
    /// Can also be set with the `FABRIC_PROMOTE_ROOT` environment variable.
    #[arg(
        value_name = "ROOT",
        env = "FABRIC_PROMOTE_ROOT",
        default_value = defaults::WORKSPACES_DIR
    )]
    pub root: PathBuf,
}

impl RootArg {
    pub fn path(&self) -> &Path {
        &self.root
    }
}

/// Report format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human-readable text
    #[default]
    Text,
    /// Machine-readable JSON on stdout
    Json,
}

/// Print a serializable value as pretty JSON
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
