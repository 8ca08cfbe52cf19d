//! # Validate Command Implementation
//!
//! Checks every workspace folder under the root without resolving or
//! publishing anything:
//!
//! - **Descriptors**: exactly one config and one parameter descriptor, both
//!   parseable.
//! - **Targets**: at least one `core.workspace.<env>` target name.
//! - **Rules**: the parameter descriptor satisfies the rule schema (non-empty
//!   `find`, at least one replacement, known environments, valid globs and
//!   regexes).
//!
//! Duplicate rules and workspaces without targets are warnings; `--strict`
//! turns them into failures.

use anyhow::Result;
use clap::Args;

use fabric_promote::catalog::WorkspaceCatalog;
use fabric_promote::output::{marker, Marker};

use super::{Context, RootArg};

/// Validate workspace descriptors
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub root: RootArg,

    /// Use strict validation (fail on warnings).
    #[arg(long)]
    pub strict: bool,
}

/// Execute the `validate` command.
pub fn execute(args: ValidateArgs, ctx: &Context) -> Result<()> {
    let out = &ctx.out;
    let settings = ctx.settings()?;
    let catalog = WorkspaceCatalog::new(settings.catalog_options());
    let discovery = catalog.discover(args.root.path())?;

    println!(
        "{} Validating {} workspace folder(s) in {}",
        marker(out, Marker::Info),
        discovery.len(),
        discovery.root().display()
    );

    let mut errors = 0;
    let mut warnings = 0;

    for ws in discovery.iter() {
        let def = match ws.result {
            Ok(def) => def,
            Err(e) => {
                println!("{} {}", marker(out, Marker::Error), e);
                errors += 1;
                continue;
            }
        };

        let rules = match def.rules() {
            Ok(rules) => rules,
            Err(e) => {
                println!("{} {}: {}", marker(out, Marker::Error), def.name(), e);
                errors += 1;
                continue;
            }
        };

        let mut clean = true;
        if def.environments().is_empty() {
            println!(
                "{} {}: no target workspace declared under 'core.workspace'",
                marker(out, Marker::Warning),
                def.name()
            );
            warnings += 1;
            clean = false;
        }
        for warning in rules.warnings() {
            println!("{} {}: {}", marker(out, Marker::Warning), def.name(), warning);
            warnings += 1;
            clean = false;
        }

        if clean {
            let envs: Vec<&str> = def.environments().iter().map(|e| e.as_str()).collect();
            println!(
                "{} {}: {} rule(s), {} file(s), targets: {}",
                marker(out, Marker::Ok),
                def.name(),
                rules.len(),
                def.content().len(),
                envs.join(", ")
            );
        }
    }

    println!("\n{} error(s), {} warning(s)", errors, warnings);

    if errors > 0 {
        anyhow::bail!("Validation failed with {} error(s)", errors);
    }
    if args.strict && warnings > 0 {
        anyhow::bail!("Validation failed in strict mode with {} warning(s)", warnings);
    }
    Ok(())
}
