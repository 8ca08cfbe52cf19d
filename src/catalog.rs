//! # Workspace Discovery
//!
//! The catalog finds workspace definitions below a root directory. Each
//! immediate sub-folder that holds both a config descriptor (`config.yml`)
//! and a parameter descriptor (`parameter.yml`) is a workspace; its folder
//! name is the workspace's identity.
//!
//! ## Process
//!
//! 1.  **Listing (`discover`)**: the root is listed once and the candidate
//!     folders are sorted by name. A folder with exactly one of the two
//!     descriptors is kept as a candidate so that it can be reported, but it
//!     does not count towards the qualifying workspaces. Hidden folders and
//!     folders with neither descriptor are ignored.
//!
//! 2.  **Loading (`Discovery::iter`)**: each candidate is loaded lazily when
//!     the iterator reaches it. Loading parses the config descriptor, reads
//!     the parameter descriptor as raw bytes and captures the content tree.
//!     Failures are reported per workspace as [`Error::Config`], never as a
//!     failure of the whole scan.
//!
//! Nothing is cached between invocations; every run re-reads the disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Deserialize;

use crate::defaults;
use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::filesystem::ContentTree;
use crate::parameter::ParameterRuleSet;
use crate::path::item_type_of;

/// Descriptor file names recognised by the catalog
#[derive(Debug, Clone)]
pub struct CatalogOptions {
    pub config_files: Vec<String>,
    pub parameter_files: Vec<String>,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            config_files: defaults::CONFIG_DESCRIPTORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            parameter_files: defaults::PARAMETER_DESCRIPTORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    core: RawCore,
}

#[derive(Debug, Deserialize)]
struct RawCore {
    #[serde(default)]
    workspace: BTreeMap<Environment, String>,
    #[serde(default)]
    item_types_in_scope: Option<Vec<String>>,
}

/// Parsed config descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspaceConfig {
    /// `core.workspace.<env>` target workspace names
    pub targets: BTreeMap<Environment, String>,
    /// Optional `core.item_types_in_scope` restriction
    pub item_types_in_scope: Option<Vec<String>>,
}

impl WorkspaceConfig {
    /// Parse a config descriptor
    pub fn parse(text: &str) -> Result<Self> {
        let raw: RawConfig = serde_yaml::from_str(text)?;
        Ok(Self {
            targets: raw.core.workspace,
            item_types_in_scope: raw.core.item_types_in_scope,
        })
    }

    /// Whether a workspace-relative file is part of the publishable tree
    fn in_scope(&self, path: &str) -> bool {
        match &self.item_types_in_scope {
            None => true,
            Some(types) => item_type_of(path)
                .is_some_and(|t| types.iter().any(|s| s.eq_ignore_ascii_case(t))),
        }
    }
}

/// A discovered workspace, immutable for the duration of a run
#[derive(Debug, Clone)]
pub struct WorkspaceDefinition {
    name: String,
    root: PathBuf,
    config: WorkspaceConfig,
    parameter_source: Vec<u8>,
    content: ContentTree,
}

impl WorkspaceDefinition {
    /// Build a workspace from already-loaded parts
    pub fn new(
        name: impl Into<String>,
        root: impl Into<PathBuf>,
        config: WorkspaceConfig,
        parameter_source: Vec<u8>,
        content: ContentTree,
    ) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            config,
            parameter_source,
            content,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    pub fn content(&self) -> &ContentTree {
        &self.content
    }

    /// Raw bytes of the parameter descriptor
    pub fn parameter_source(&self) -> &[u8] {
        &self.parameter_source
    }

    /// Environments with a declared target name, in promotion order
    pub fn environments(&self) -> Vec<Environment> {
        self.config.targets.keys().copied().collect()
    }

    /// Target workspace name for `environment`
    pub fn target_name(&self, environment: Environment) -> Result<&str> {
        self.config
            .targets
            .get(&environment)
            .map(String::as_str)
            .ok_or_else(|| Error::Config {
                workspace: self.name.clone(),
                message: format!("no target workspace declared for {}", environment),
                hint: Some(format!(
                    "add 'core.workspace.{}' to the config descriptor",
                    environment
                )),
            })
    }

    /// Parse this workspace's parameter descriptor
    pub fn rules(&self) -> Result<ParameterRuleSet> {
        ParameterRuleSet::parse(&self.parameter_source)
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    name: String,
    path: PathBuf,
    config: Vec<PathBuf>,
    parameter: Vec<PathBuf>,
}

impl Candidate {
    fn qualifies(&self) -> bool {
        !self.config.is_empty() && !self.parameter.is_empty()
    }
}

/// A workspace folder together with the outcome of loading it
#[derive(Debug)]
pub struct DiscoveredWorkspace {
    pub name: String,
    pub path: PathBuf,
    pub result: Result<WorkspaceDefinition>,
}

/// Result of listing a root directory.
///
/// The sequence is finite and restartable: [`Discovery::iter`] reloads the
/// workspaces from disk each time it is called.
#[derive(Debug, Clone)]
pub struct Discovery {
    root: PathBuf,
    options: CatalogOptions,
    candidates: Vec<Candidate>,
}

impl Discovery {
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of candidate folders (qualifying or not)
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Candidate folder names in discovery order
    pub fn names(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.name.as_str()).collect()
    }

    /// Lazily load each candidate in discovery order
    pub fn iter(&self) -> impl Iterator<Item = DiscoveredWorkspace> + '_ {
        self.candidates.iter().map(move |candidate| DiscoveredWorkspace {
            name: candidate.name.clone(),
            path: candidate.path.clone(),
            result: load(candidate, &self.options),
        })
    }
}

/// Discovers workspace definitions under a root directory
#[derive(Debug, Clone, Default)]
pub struct WorkspaceCatalog {
    options: CatalogOptions,
}

impl WorkspaceCatalog {
    pub fn new(options: CatalogOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CatalogOptions {
        &self.options
    }

    /// List the workspace folders below `root`.
    ///
    /// Fails with [`Error::Discovery`] when `root` is not a directory or
    /// holds no folder with both descriptors.
    pub fn discover(&self, root: &Path) -> Result<Discovery> {
        if !root.is_dir() {
            return Err(Error::Discovery {
                root: root.to_path_buf(),
                message: "directory does not exist".to_string(),
            });
        }

        let entries = fs::read_dir(root).map_err(|e| Error::Discovery {
            root: root.to_path_buf(),
            message: format!("cannot list directory: {}", e),
        })?;

        let mut candidates = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }

            let config = present(&path, &self.options.config_files);
            let parameter = present(&path, &self.options.parameter_files);
            if config.is_empty() && parameter.is_empty() {
                debug!("Skipping '{}': no descriptors", name);
                continue;
            }

            candidates.push(Candidate {
                name,
                path,
                config,
                parameter,
            });
        }

        candidates.sort_by(|a, b| a.name.cmp(&b.name));

        let qualifying = candidates.iter().filter(|c| c.qualifies()).count();
        if qualifying == 0 {
            return Err(Error::Discovery {
                root: root.to_path_buf(),
                message: format!(
                    "no workspace folder contains both a config descriptor ({}) and a parameter descriptor ({})",
                    self.options.config_files.join(" or "),
                    self.options.parameter_files.join(" or ")
                ),
            });
        }

        debug!(
            "Discovered {} workspace folder(s) in {} ({} qualifying)",
            candidates.len(),
            root.display(),
            qualifying
        );

        Ok(Discovery {
            root: root.to_path_buf(),
            options: self.options.clone(),
            candidates,
        })
    }
}

fn present(dir: &Path, names: &[String]) -> Vec<PathBuf> {
    names
        .iter()
        .map(|n| dir.join(n))
        .filter(|p| p.is_file())
        .collect()
}

fn load(candidate: &Candidate, options: &CatalogOptions) -> Result<WorkspaceDefinition> {
    let config_error = |message: String, hint: Option<String>| Error::Config {
        workspace: candidate.name.clone(),
        message,
        hint,
    };

    let config_path = exactly_one(&candidate.config, "config", &options.config_files)
        .map_err(|(m, h)| config_error(m, h))?;
    let parameter_path = exactly_one(&candidate.parameter, "parameter", &options.parameter_files)
        .map_err(|(m, h)| config_error(m, h))?;

    let config_text = fs::read_to_string(config_path).map_err(|e| {
        config_error(format!("cannot read {}: {}", config_path.display(), e), None)
    })?;
    let config = WorkspaceConfig::parse(&config_text).map_err(|e| {
        config_error(
            format!("invalid config descriptor: {}", e),
            Some("expected a 'core.workspace' mapping of environment to workspace name".to_string()),
        )
    })?;
    if config.targets.is_empty() {
        warn!("Workspace '{}' declares no target workspaces", candidate.name);
    }

    let parameter_source = fs::read(parameter_path).map_err(|e| {
        config_error(format!("cannot read {}: {}", parameter_path.display(), e), None)
    })?;

    let descriptors: Vec<&String> = options
        .config_files
        .iter()
        .chain(options.parameter_files.iter())
        .collect();
    let content = ContentTree::load_dir(&candidate.path, |path| {
        !descriptors.iter().any(|d| d.as_str() == path) && config.in_scope(path)
    })
    .map_err(|e| config_error(e.to_string(), None))?;

    Ok(WorkspaceDefinition::new(
        candidate.name.clone(),
        candidate.path.clone(),
        config,
        parameter_source,
        content,
    ))
}

fn exactly_one<'a>(
    found: &'a [PathBuf],
    kind: &str,
    names: &[String],
) -> std::result::Result<&'a Path, (String, Option<String>)> {
    match found {
        [single] => Ok(single.as_path()),
        [] => Err((
            format!("missing {} descriptor", kind),
            Some(format!("add one of: {}", names.join(", "))),
        )),
        many => Err((
            format!(
                "found {} {} descriptors ({}); exactly one is allowed",
                many.len(),
                kind,
                many.iter()
                    .filter_map(|p| p.file_name())
                    .map(|n| n.to_string_lossy())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            None,
        )),
    }
}
