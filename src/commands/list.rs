//! # List Command Implementation
//!
//! Lists the workspace folders found under the root in discovery order,
//! with the target workspace name declared for each environment. Folders
//! that fail to load are listed with their error.

use std::collections::BTreeMap;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use fabric_promote::catalog::WorkspaceCatalog;
use fabric_promote::environment::Environment;
use fabric_promote::output::{marker, Marker};

use super::{print_json, Context, Format, RootArg};

/// List discovered workspaces
#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub root: RootArg,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
}

#[derive(Debug, Serialize)]
struct ListEntry {
    name: String,
    path: String,
    targets: BTreeMap<Environment, String>,
    files: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Execute the `list` command.
pub fn execute(args: ListArgs, ctx: &Context) -> Result<()> {
    let settings = ctx.settings()?;
    let catalog = WorkspaceCatalog::new(settings.catalog_options());
    let discovery = catalog.discover(args.root.path())?;

    let entries: Vec<ListEntry> = discovery
        .iter()
        .map(|ws| match ws.result {
            Ok(def) => ListEntry {
                name: ws.name,
                path: ws.path.display().to_string(),
                targets: def.config().targets.clone(),
                files: def.content().len(),
                error: None,
            },
            Err(e) => ListEntry {
                name: ws.name,
                path: ws.path.display().to_string(),
                targets: BTreeMap::new(),
                files: 0,
                error: Some(e.to_string()),
            },
        })
        .collect();

    if args.format == Format::Json {
        return print_json(&entries);
    }

    for entry in &entries {
        match &entry.error {
            None => {
                println!(
                    "{} {} ({} file(s))",
                    marker(&ctx.out, Marker::Ok),
                    entry.name,
                    entry.files
                );
                for (env, target) in &entry.targets {
                    println!("   {:<5} -> {}", env, target);
                }
            }
            Some(error) => println!("{} {}: {}", marker(&ctx.out, Marker::Error), entry.name, error),
        }
    }
    println!("\n{} workspace folder(s) in {}", entries.len(), discovery.root().display());

    Ok(())
}
