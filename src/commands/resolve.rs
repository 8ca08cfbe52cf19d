//! # Resolve Command Implementation
//!
//! Resolves workspaces for one environment without publishing. With
//! `--output` the resolved content of each workspace is written to
//! `<output>/<workspace>/`; otherwise only a substitution summary is printed.
//!
//! Unmapped occurrences are reported but do not fail the command; use
//! `scan` to gate on them.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;

use fabric_promote::catalog::WorkspaceCatalog;
use fabric_promote::environment::Environment;
use fabric_promote::output::{marker, Marker};
use fabric_promote::resolver::{resolve, ResolutionResult};

use super::{print_json, Context, Format, RootArg};

/// Resolve workspace content for one environment
#[derive(Args, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub root: RootArg,

    /// Target environment
    #[arg(short, long = "env", value_name = "ENV")]
    pub environment: Environment,

    /// Only resolve the named workspace(s)
    #[arg(short, long, value_name = "NAME")]
    pub workspace: Vec<String>,

    /// Write resolved content below this directory
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
}

/// Execute the `resolve` command.
pub fn execute(args: ResolveArgs, ctx: &Context) -> Result<()> {
    let out = &ctx.out;
    let settings = ctx.settings()?;
    let catalog = WorkspaceCatalog::new(settings.catalog_options());
    let discovery = catalog.discover(args.root.path())?;

    for name in &args.workspace {
        if !discovery.names().contains(&name.as_str()) {
            anyhow::bail!("Workspace '{}' not found in {}", name, discovery.root().display());
        }
    }

    let mut results: Vec<ResolutionResult> = Vec::new();
    let mut errors = 0;

    for ws in discovery.iter() {
        if !args.workspace.is_empty() && !args.workspace.contains(&ws.name) {
            continue;
        }
        let loaded = ws
            .result
            .and_then(|def| def.rules().map(|rules| (def, rules)));
        let (def, rules) = match loaded {
            Ok(loaded) => loaded,
            Err(e) => {
                eprintln!("{} {}", marker(out, Marker::Error), e);
                errors += 1;
                continue;
            }
        };

        let result = resolve(&def, &rules, args.environment);

        if let Some(output) = &args.output {
            let dir = output.join(def.name());
            result
                .content
                .write_to(&dir)
                .with_context(|| format!("Failed to write resolved content to {}", dir.display()))?;
        }

        if args.format == Format::Text {
            let kind = if result.unmapped.is_empty() {
                Marker::Ok
            } else {
                Marker::Warning
            };
            println!(
                "{} {}: {} substitution(s) in {} file(s), {} unmapped",
                marker(out, kind),
                result.workspace,
                result.substitutions.len(),
                result.files_changed(),
                result.unmapped.len()
            );
            for event in &result.unmapped {
                println!(
                    "   {} @{}: {} has no {} value (rule #{})",
                    event.file,
                    event.offset,
                    event.literal,
                    args.environment,
                    event.rule + 1
                );
            }
        }
        results.push(result);
    }

    if args.format == Format::Json {
        print_json(&results)?;
    } else if let Some(output) = &args.output {
        println!("\nResolved content written to {}", output.display());
    }

    if errors > 0 {
        anyhow::bail!("{} workspace(s) could not be resolved", errors);
    }
    Ok(())
}
