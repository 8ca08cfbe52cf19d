//! # Deployment Orchestration
//!
//! The orchestrator runs one environment's deployment across every
//! discovered workspace. The steps are strictly ordered:
//!
//! 1. **Precondition**: the infrastructure signal for the environment is
//!    checked once. A failure aborts the run before any workspace is touched.
//! 2. **Discovery**: workspaces are listed and loaded sequentially, in name
//!    order.
//! 3. **Gate**: per workspace, the parameter descriptor is parsed and the
//!    coverage scan runs for the target environment. Any gap turns the
//!    workspace into `Skipped("unmapped identifiers")`.
//! 4. **Resolve and publish**: the resolved content is handed to the
//!    publisher under the workspace's environment-specific target name.
//! 5. **Record**: the publisher's answer is stored verbatim.
//!
//! Steps 3-5 run on a bounded `rayon` pool. Workspaces share nothing, and a
//! run targets a single environment, so each (workspace, environment) pair is
//! published at most once. Errors scoped to one workspace become that
//! workspace's outcome and never affect its siblings.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{error, info, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::catalog::{DiscoveredWorkspace, WorkspaceCatalog, WorkspaceDefinition};
use crate::coverage::{CoverageScanner, ScanOptions};
use crate::defaults;
use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::precondition::Precondition;
use crate::publish::Publisher;
use crate::resolver::resolve;

/// Reason recorded when the coverage gate blocks a workspace
pub const SKIP_UNMAPPED: &str = "unmapped identifiers";

/// Reason recorded for workspaces not started before cancellation
pub const SKIP_CANCELLED: &str = "cancelled";

/// Orchestrator tuning
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Maximum number of workspaces processed concurrently
    pub workers: usize,
    pub scan: ScanOptions,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            workers: defaults::default_workers(),
            scan: ScanOptions::default(),
        }
    }
}

/// Cooperative cancellation flag shared with the host process
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop picking up new workspaces. Publishes already in flight finish.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Final state of one workspace in a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum OutcomeStatus {
    Succeeded,
    Failed,
    Skipped(String),
}

/// Outcome for one (workspace, environment) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentOutcome {
    pub workspace: String,
    pub environment: Environment,
    /// Target workspace name, when it could be determined
    pub target: Option<String>,
    #[serde(flatten)]
    pub status: OutcomeStatus,
    /// Publisher message, or the error that stopped the workspace
    pub message: String,
    /// Number of substitutions applied before publishing
    pub substitutions: usize,
}

impl DeploymentOutcome {
    fn new(workspace: &str, environment: Environment, status: OutcomeStatus, message: String) -> Self {
        Self {
            workspace: workspace.to_string(),
            environment,
            target: None,
            status,
            message,
            substitutions: 0,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == OutcomeStatus::Failed
    }
}

/// Ordered outcomes of a run that got past the run-scoped checks
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub environment: Environment,
    /// One entry per discovered workspace, in discovery order
    pub outcomes: Vec<DeploymentOutcome>,
    /// Whether cancellation was requested during the run
    pub cancelled: bool,
}

impl RunReport {
    /// A run fails when at least one workspace failed. Skips do not count.
    pub fn is_failure(&self) -> bool {
        self.outcomes.iter().any(DeploymentOutcome::is_failed)
    }

    pub fn succeeded(&self) -> usize {
        self.count(|s| matches!(s, OutcomeStatus::Succeeded))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, OutcomeStatus::Failed))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, OutcomeStatus::Skipped(_)))
    }

    fn count(&self, pred: impl Fn(&OutcomeStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

/// Sequences precondition, discovery, gating, resolution and publishing
pub struct Orchestrator {
    catalog: WorkspaceCatalog,
    scanner: CoverageScanner,
    precondition: Arc<dyn Precondition>,
    publisher: Arc<dyn Publisher>,
    workers: usize,
    cancellation: CancellationToken,
}

impl Orchestrator {
    pub fn new(
        catalog: WorkspaceCatalog,
        precondition: Arc<dyn Precondition>,
        publisher: Arc<dyn Publisher>,
        options: OrchestratorOptions,
    ) -> Self {
        Self {
            catalog,
            scanner: CoverageScanner::new(options.scan),
            precondition,
            publisher,
            workers: options.workers.max(1),
            cancellation: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Deploy every workspace under `root` to `environment`.
    ///
    /// Returns `Err` only for run-scoped failures ([`Error::Precondition`],
    /// [`Error::Discovery`]), in which case nothing was attempted. Otherwise
    /// the report holds one outcome per discovered workspace.
    pub fn run(&self, root: &Path, environment: Environment) -> Result<RunReport> {
        self.precondition
            .check(environment)
            .map_err(|e| match e {
                Error::Precondition { .. } => e,
                other => Error::Precondition {
                    environment,
                    message: other.to_string(),
                },
            })?;

        let discovery = self.catalog.discover(root)?;
        let workspaces: Vec<DiscoveredWorkspace> = discovery.iter().collect();
        info!(
            "Deploying {} workspace(s) from {} to {}",
            workspaces.len(),
            root.display(),
            environment
        );

        let outcomes: Vec<DeploymentOutcome> = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
        {
            Ok(pool) => pool.install(|| {
                workspaces
                    .into_par_iter()
                    .map(|ws| self.process(ws, environment))
                    .collect()
            }),
            Err(e) => {
                warn!("Worker pool unavailable ({}), processing sequentially", e);
                workspaces
                    .into_iter()
                    .map(|ws| self.process(ws, environment))
                    .collect()
            }
        };

        Ok(RunReport {
            environment,
            outcomes,
            cancelled: self.cancellation.is_cancelled(),
        })
    }

    fn process(&self, discovered: DiscoveredWorkspace, environment: Environment) -> DeploymentOutcome {
        let name = discovered.name;

        if self.cancellation.is_cancelled() {
            return DeploymentOutcome::new(
                &name,
                environment,
                OutcomeStatus::Skipped(SKIP_CANCELLED.to_string()),
                "run cancelled before this workspace started".to_string(),
            );
        }

        match discovered.result {
            Ok(workspace) => self.deploy(&workspace, environment),
            Err(e) => {
                error!("{}", e);
                DeploymentOutcome::new(&name, environment, OutcomeStatus::Failed, e.to_string())
            }
        }
    }

    fn deploy(&self, workspace: &WorkspaceDefinition, environment: Environment) -> DeploymentOutcome {
        let name = workspace.name();
        let failed = |e: Error| {
            error!("{}", e);
            DeploymentOutcome::new(name, environment, OutcomeStatus::Failed, e.to_string())
        };

        let target = match workspace.target_name(environment) {
            Ok(target) => target,
            Err(e) => return failed(e),
        };
        let rules = match workspace.rules() {
            Ok(rules) => rules,
            Err(e) => return failed(e),
        };

        let report = self.scanner.scan(workspace, &rules, &[environment]);
        if !report.is_empty() {
            for gap in &report.gaps {
                warn!("{}: unmapped '{}' in {}", name, gap.literal, gap.file);
            }
            let blocked = Error::UnmappedIdentifier {
                workspace: name.to_string(),
                environment,
                count: report.gaps.len(),
            };
            warn!("{}", blocked);
            let mut outcome = DeploymentOutcome::new(
                name,
                environment,
                OutcomeStatus::Skipped(SKIP_UNMAPPED.to_string()),
                blocked.to_string(),
            );
            outcome.target = Some(target.to_string());
            return outcome;
        }

        let resolution = resolve(workspace, &rules, environment);
        info!(
            "{}: {} substitution(s) for {}, publishing to '{}'",
            name,
            resolution.substitutions.len(),
            environment,
            target
        );

        let published = self.publisher.publish(target, &resolution.content);
        let status = if published.succeeded {
            OutcomeStatus::Succeeded
        } else {
            error!(
                "{}",
                Error::Publish {
                    target: target.to_string(),
                    message: published.message.clone(),
                }
            );
            OutcomeStatus::Failed
        };

        DeploymentOutcome {
            workspace: name.to_string(),
            environment,
            target: Some(target.to_string()),
            status,
            message: published.message,
            substitutions: resolution.substitutions.len(),
        }
    }
}
