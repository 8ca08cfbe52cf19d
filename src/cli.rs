//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{self, Context};
use fabric_promote::output::OutputConfig;

/// fabric-promote - Promote Fabric workspace definitions across environments
#[derive(Parser, Debug)]
#[command(name = "fabric-promote")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,

    /// Repository settings file.
    ///
    /// Defaults to `.fabric-promote.yaml` in the current directory when it
    /// exists.
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = "FABRIC_PROMOTE_SETTINGS"
    )]
    settings: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List discovered workspaces and their target names
    List(commands::list::ListArgs),

    /// Validate config and parameter descriptors without resolving anything
    Validate(commands::validate::ValidateArgs),

    /// Report identifiers that lack a replacement for an environment
    Scan(commands::scan::ScanArgs),

    /// Resolve workspace content for one environment
    Resolve(commands::resolve::ResolveArgs),

    /// Deploy every workspace to one environment
    Deploy(commands::deploy::DeployArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        // RUST_LOG still wins over --log-level
        env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(self.log_level.as_str()),
        )
        .format_timestamp(None)
        .init();

        let ctx = Context {
            out: OutputConfig::from_env_and_flag(&self.color),
            settings_path: self.settings,
        };

        match self.command {
            Commands::List(args) => commands::list::execute(args, &ctx),
            Commands::Validate(args) => commands::validate::execute(args, &ctx),
            Commands::Scan(args) => commands::scan::execute(args, &ctx),
            Commands::Resolve(args) => commands::resolve::execute(args, &ctx),
            Commands::Deploy(args) => commands::deploy::execute(args, &ctx),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}
