//! Infrastructure provisioning precondition
//!
//! Content may only be published once the provisioning pipeline (workspaces,
//! capacities, role assignments) has completed for the target environment.
//! The engine does not provision anything itself; it asks a [`Precondition`]
//! once per run, before any workspace is processed.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

use crate::environment::Environment;
use crate::error::{Error, Result};

/// Status signal published by the provisioning stage
pub trait Precondition: Send + Sync {
    /// Return `Ok(())` when `environment` is ready for content deployment,
    /// otherwise an [`Error::Precondition`].
    fn check(&self, environment: Environment) -> Result<()>;
}

/// Treats every environment as provisioned.
///
/// Only meant for setups where provisioning is verified elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeReady;

impl Precondition for AssumeReady {
    fn check(&self, environment: Environment) -> Result<()> {
        info!("Assuming infrastructure for {} is provisioned", environment);
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StatusEntry {
    Plain(String),
    Detailed {
        status: String,
        #[serde(default)]
        message: Option<String>,
    },
}

impl StatusEntry {
    fn status(&self) -> &str {
        match self {
            StatusEntry::Plain(status) => status,
            StatusEntry::Detailed { status, .. } => status,
        }
    }

    fn message(&self) -> Option<&str> {
        match self {
            StatusEntry::Plain(_) => None,
            StatusEntry::Detailed { message, .. } => message.as_deref(),
        }
    }
}

const READY_STATES: &[&str] = &["succeeded", "success", "ready"];

/// Status file written by the provisioning pipeline.
///
/// YAML or JSON mapping each environment to a status string, or to a
/// `{ status, message }` record:
///
/// ```yaml
/// dev: succeeded
/// test: { status: failed, message: "capacity paused" }
/// ```
///
/// The file is read on every check, so a status written after the engine
/// started is still observed.
#[derive(Debug, Clone)]
pub struct StatusFile {
    path: PathBuf,
}

impl StatusFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self, environment: Environment) -> Result<BTreeMap<Environment, StatusEntry>> {
        let not_met = |message: String| Error::Precondition {
            environment,
            message,
        };
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            not_met(format!(
                "cannot read status file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        serde_yaml::from_str(&text).map_err(|e| {
            not_met(format!(
                "invalid status file {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

impl Precondition for StatusFile {
    fn check(&self, environment: Environment) -> Result<()> {
        let statuses = self.read(environment)?;
        let entry = statuses.get(&environment).ok_or_else(|| Error::Precondition {
            environment,
            message: format!(
                "no provisioning status recorded in {}",
                self.path.display()
            ),
        })?;

        let status = entry.status();
        if READY_STATES.iter().any(|s| s.eq_ignore_ascii_case(status)) {
            info!("Infrastructure for {} is {}", environment, status);
            return Ok(());
        }

        let mut message = format!("provisioning status is '{}'", status);
        if let Some(detail) = entry.message() {
            message.push_str(": ");
            message.push_str(detail);
        }
        Err(Error::Precondition {
            environment,
            message,
        })
    }
}
