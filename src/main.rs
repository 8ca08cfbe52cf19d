//! # fabric-promote CLI
//!
//! Binary entry point for the `fabric-promote` command-line tool.
//!
//! Its responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Initialising logging and dispatching to the selected command.
//! - Turning command failures into a non-zero exit status.
//!
//! All promotion logic lives in the `fabric_promote` library crate; the
//! binary is a thin wrapper around it.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
