//! # Deploy Command Implementation
//!
//! Runs the orchestrator for one environment. The infrastructure
//! precondition must be given explicitly: either the status file written by
//! the provisioning pipeline (`--infra-status`) or `--assume-infra-ready`.
//!
//! Publishing is either staged on disk (`--stage-dir`, one folder per
//! target workspace) or simulated (`--dry-run`).
//!
//! The command fails when the run aborts (precondition or discovery) or when
//! any workspace failed. Skipped workspaces do not fail the run.
//!
//! Ctrl-C or SIGTERM cancels the run cooperatively: publishes already in
//! flight finish, and workspaces not yet started are skipped as cancelled.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{ArgGroup, Args};
use log::warn;

use fabric_promote::catalog::WorkspaceCatalog;
use fabric_promote::environment::Environment;
use fabric_promote::orchestrator::{CancellationToken, Orchestrator, RunReport};
use fabric_promote::output::{marker, status_label, Marker, OutputConfig};
use fabric_promote::precondition::{AssumeReady, Precondition, StatusFile};
use fabric_promote::publish::{DryRunPublisher, Publisher, StagingPublisher};

use super::{print_json, Context, Format, RootArg};

/// Deploy every workspace to one environment
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("publisher").required(true).args(["stage_dir", "dry_run"])))]
#[command(group(ArgGroup::new("infra").required(true).args(["infra_status", "assume_infra_ready"])))]
pub struct DeployArgs {
    #[command(flatten)]
    pub root: RootArg,

    /// Target environment
    #[arg(short, long = "env", value_name = "ENV")]
    pub environment: Environment,

    /// Stage resolved content below this directory, one folder per target
    #[arg(long, value_name = "DIR")]
    pub stage_dir: Option<PathBuf>,

    /// Report what would be published without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Provisioning status file written by the infrastructure pipeline.
    ///
    /// Can also be set with the `FABRIC_PROMOTE_INFRA_STATUS` environment
    /// variable.
    #[arg(long, value_name = "FILE", env = "FABRIC_PROMOTE_INFRA_STATUS")]
    pub infra_status: Option<PathBuf>,

    /// Skip the infrastructure check
    #[arg(long)]
    pub assume_infra_ready: bool,

    /// Number of workspaces processed concurrently (overrides settings)
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
}

/// Execute the `deploy` command.
pub fn execute(args: DeployArgs, ctx: &Context) -> Result<()> {
    let out = &ctx.out;
    let settings = ctx.settings()?;

    let mut options = settings.orchestrator_options();
    if let Some(workers) = args.workers {
        if workers == 0 {
            anyhow::bail!("--workers must be at least 1");
        }
        options.workers = workers;
    }

    let precondition: Arc<dyn Precondition> = match &args.infra_status {
        Some(path) if !args.assume_infra_ready => Arc::new(StatusFile::new(path)),
        _ => Arc::new(AssumeReady),
    };
    let publisher: Arc<dyn Publisher> = match &args.stage_dir {
        Some(dir) if !args.dry_run => Arc::new(StagingPublisher::new(dir)),
        _ => Arc::new(DryRunPublisher),
    };

    let orchestrator = Orchestrator::new(
        WorkspaceCatalog::new(settings.catalog_options()),
        precondition,
        publisher,
        options,
    );
    if let Err(e) = ctrlc::set_handler(interrupt_handler(orchestrator.cancellation().clone())) {
        warn!("Could not install interrupt handler: {}", e);
    }
    let report = orchestrator.run(args.root.path(), args.environment)?;

    if args.format == Format::Json {
        print_json(&report)?;
    } else {
        print!("{}", render_text(out, &report));
    }

    if report.is_failure() {
        anyhow::bail!(
            "Deployment to {} failed for {} workspace(s)",
            report.environment,
            report.failed()
        );
    }
    Ok(())
}

/// Handler that stops the run from picking up new workspaces
fn interrupt_handler(token: CancellationToken) -> impl FnMut() + Send + 'static {
    move || {
        if !token.is_cancelled() {
            eprintln!("Interrupted: finishing in-flight publishes, skipping the rest");
        }
        token.cancel();
    }
}

fn render_text(out: &OutputConfig, report: &RunReport) -> String {
    let mut text = format!(
        "{} Deploying to {} ({} workspace(s))\n",
        marker(out, Marker::Info),
        report.environment,
        report.outcomes.len()
    );
    for outcome in &report.outcomes {
        let target = outcome.target.as_deref().unwrap_or("-");
        text.push_str(&format!(
            "{} {} -> {}: {}\n   {}\n",
            marker(out, Marker::from(&outcome.status)),
            outcome.workspace,
            target,
            status_label(&outcome.status),
            outcome.message
        ));
    }
    text.push_str(&format!(
        "\n{} published, {} skipped, {} failed{}\n",
        report.succeeded(),
        report.skipped(),
        report.failed(),
        if report.cancelled { " (cancelled)" } else { "" }
    ));
    text
}
