//! # Repository Settings
//!
//! Optional `.fabric-promote.yaml` file that tunes the engine for a
//! repository. Every field has a default, so an absent or empty file is
//! valid:
//!
//! ```yaml
//! config_files: [config.yml]
//! parameter_files: [parameter.yml]
//! workers: 4
//! ignore_literals:
//!   - "00000000-0000-0000-0000-000000000000"
//! ```
//!
//! Settings are turned into the explicit option structs consumed by the
//! catalog, the scanner and the orchestrator; library code never reads
//! process-wide state on its own.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogOptions;
use crate::coverage::ScanOptions;
use crate::defaults;
use crate::error::{Error, Result};
use crate::orchestrator::OrchestratorOptions;

/// Engine settings loaded from a repository settings file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Accepted config descriptor file names
    pub config_files: Vec<String>,
    /// Accepted parameter descriptor file names
    pub parameter_files: Vec<String>,
    /// Number of workspaces processed concurrently during a deploy
    pub workers: usize,
    /// Identifier literals the coverage scan never reports
    pub ignore_literals: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        let catalog = CatalogOptions::default();
        Self {
            config_files: catalog.config_files,
            parameter_files: catalog.parameter_files,
            workers: defaults::default_workers(),
            ignore_literals: Vec::new(),
        }
    }
}

impl Settings {
    /// Parse settings from YAML text
    pub fn parse(yaml_content: &str) -> Result<Self> {
        if yaml_content.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Settings = serde_yaml::from_str(yaml_content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    fn validate(&self) -> Result<()> {
        if self.config_files.is_empty() || self.parameter_files.is_empty() {
            return Err(Error::Config {
                workspace: "*".to_string(),
                message: "settings must list at least one config and one parameter file name"
                    .to_string(),
                hint: None,
            });
        }
        if let Some(name) = self
            .config_files
            .iter()
            .find(|name| self.parameter_files.contains(name))
        {
            return Err(Error::Config {
                workspace: "*".to_string(),
                message: format!("'{}' cannot be both a config and a parameter descriptor", name),
                hint: None,
            });
        }
        if self.workers == 0 {
            return Err(Error::Config {
                workspace: "*".to_string(),
                message: "workers must be at least 1".to_string(),
                hint: None,
            });
        }
        Ok(())
    }

    pub fn catalog_options(&self) -> CatalogOptions {
        CatalogOptions {
            config_files: self.config_files.clone(),
            parameter_files: self.parameter_files.clone(),
        }
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            ignore_literals: self.ignore_literals.clone(),
        }
    }

    pub fn orchestrator_options(&self) -> OrchestratorOptions {
        OrchestratorOptions {
            workers: self.workers,
            scan: self.scan_options(),
        }
    }
}
