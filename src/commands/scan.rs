//! # Scan Command Implementation
//!
//! Runs the coverage scanner over every workspace under the root. It is
//! read-only and offline, so it can gate a merge before any deployment is
//! attempted.
//!
//! Each workspace is scanned for the environments given with `--env`, or
//! for every environment it declares a target for. The command exits
//! non-zero when any gap is found or any workspace fails to load.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use fabric_promote::catalog::WorkspaceCatalog;
use fabric_promote::coverage::{CoverageReport, CoverageScanner};
use fabric_promote::environment::Environment;
use fabric_promote::output::{marker, Marker};

use super::{print_json, Context, Format, RootArg};

/// Report identifiers without a replacement
#[derive(Args, Debug)]
pub struct ScanArgs {
    #[command(flatten)]
    pub root: RootArg,

    /// Environment to check (repeatable). Defaults to each workspace's
    /// declared environments.
    #[arg(short, long = "env", value_name = "ENV")]
    pub environments: Vec<Environment>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
}

#[derive(Debug, Serialize)]
struct ScanSummary {
    reports: Vec<CoverageReport>,
    errors: Vec<WorkspaceError>,
}

#[derive(Debug, Serialize)]
struct WorkspaceError {
    workspace: String,
    message: String,
}

/// Execute the `scan` command.
pub fn execute(args: ScanArgs, ctx: &Context) -> Result<()> {
    let settings = ctx.settings()?;
    let catalog = WorkspaceCatalog::new(settings.catalog_options());
    let scanner = CoverageScanner::new(settings.scan_options());
    let discovery = catalog.discover(args.root.path())?;

    let mut summary = ScanSummary {
        reports: Vec::new(),
        errors: Vec::new(),
    };

    for ws in discovery.iter() {
        let loaded = ws
            .result
            .and_then(|def| def.rules().map(|rules| (def, rules)));
        match loaded {
            Ok((def, rules)) => {
                let environments = if args.environments.is_empty() {
                    def.environments()
                } else {
                    args.environments.clone()
                };
                summary.reports.push(scanner.scan(&def, &rules, &environments));
            }
            Err(e) => summary.errors.push(WorkspaceError {
                workspace: ws.name,
                message: e.to_string(),
            }),
        }
    }

    let gaps: usize = summary.reports.iter().map(|r| r.gaps.len()).sum();

    if args.format == Format::Json {
        print_json(&summary)?;
    } else {
        for report in &summary.reports {
            let kind = if report.is_empty() { Marker::Ok } else { Marker::Error };
            print!("{} {}", marker(&ctx.out, kind), report);
            if report.is_empty() {
                println!();
            }
        }
        for error in &summary.errors {
            println!("{} {}", marker(&ctx.out, Marker::Error), error.message);
        }
    }

    if gaps > 0 || !summary.errors.is_empty() {
        anyhow::bail!(
            "Coverage check failed: {} uncovered literal(s), {} workspace error(s)",
            gaps,
            summary.errors.len()
        );
    }
    Ok(())
}
