//! Publish collaborators
//!
//! The engine hands resolved content to a [`Publisher`] exactly once per
//! workspace per run. What publishing means is up to the implementation: the
//! real Fabric client lives outside this crate, while the implementations
//! here stage content on disk or only report it. Retries and timeouts are
//! the publisher's concern; the engine records whatever it returns.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;

use crate::filesystem::ContentTree;
use crate::path::encode_target_name;

/// Outcome reported by a publisher
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishResult {
    pub succeeded: bool,
    pub message: String,
}

impl PublishResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            message: message.into(),
        }
    }
}

/// Materialises resolved content into a target workspace
pub trait Publisher: Send + Sync {
    fn publish(&self, target: &str, content: &ContentTree) -> PublishResult;
}

/// Writes each target's content below `<stage_dir>/<encoded target name>/`.
///
/// The target directory is emptied first, so after a successful publish it
/// holds exactly the resolved content.
#[derive(Debug, Clone)]
pub struct StagingPublisher {
    stage_dir: PathBuf,
}

impl StagingPublisher {
    pub fn new(stage_dir: impl Into<PathBuf>) -> Self {
        Self {
            stage_dir: stage_dir.into(),
        }
    }

    /// Directory the content for `target` is written to
    pub fn target_dir(&self, target: &str) -> PathBuf {
        self.stage_dir.join(encode_target_name(target))
    }

    pub fn stage_dir(&self) -> &Path {
        &self.stage_dir
    }
}

impl Publisher for StagingPublisher {
    fn publish(&self, target: &str, content: &ContentTree) -> PublishResult {
        let dir = self.target_dir(target);
        if dir.exists() {
            if let Err(e) = fs::remove_dir_all(&dir) {
                return PublishResult::failure(format!(
                    "Failed to clear '{}': {}",
                    dir.display(),
                    e
                ));
            }
        }
        match content.write_to(&dir) {
            Ok(()) => {
                info!("Staged {} file(s) for '{}' in {}", content.len(), target, dir.display());
                PublishResult::success(format!(
                    "staged {} file(s) in {}",
                    content.len(),
                    dir.display()
                ))
            }
            Err(e) => PublishResult::failure(e.to_string()),
        }
    }
}

/// Reports what would be published without writing anything
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunPublisher;

impl Publisher for DryRunPublisher {
    fn publish(&self, target: &str, content: &ContentTree) -> PublishResult {
        PublishResult::success(format!(
            "dry run: would publish {} file(s) ({} bytes) to '{}'",
            content.len(),
            content.total_bytes(),
            target
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn content() -> ContentTree {
        let mut tree = ContentTree::new();
        tree.add_file_string("nb.Notebook/notebook-content.py", "x = 1");
        tree
    }

    #[test]
    fn test_staging_publisher_writes_under_encoded_target() {
        let temp = TempDir::new().unwrap();
        let publisher = StagingPublisher::new(temp.path());

        let result = publisher.publish("[T] Blueprint", &content());

        assert!(result.succeeded, "{}", result.message);
        let written = temp
            .path()
            .join("_T__Blueprint/nb.Notebook/notebook-content.py");
        assert_eq!(fs::read_to_string(written).unwrap(), "x = 1");
    }

    #[test]
    fn test_staging_publisher_stays_inside_stage_dir() {
        let temp = TempDir::new().unwrap();
        let stage = temp.path().join("stage");
        let publisher = StagingPublisher::new(&stage);

        for target in ["..", ".", ""] {
            let result = publisher.publish(target, &content());
            assert!(result.succeeded, "{}", result.message);
            assert!(publisher.target_dir(target).starts_with(&stage));
            assert_ne!(publisher.target_dir(target), stage);
        }
        assert!(!temp.path().join("nb.Notebook").exists());
        assert!(!stage.join("nb.Notebook").exists());
        assert!(stage.join("_../nb.Notebook/notebook-content.py").exists());
    }

    #[test]
    fn test_staging_publisher_replaces_previous_content() {
        let temp = TempDir::new().unwrap();
        let publisher = StagingPublisher::new(temp.path());

        let mut first = content();
        first.add_file_string("old.Notebook/notebook-content.py", "stale");
        assert!(publisher.publish("W", &first).succeeded);

        let result = publisher.publish("W", &content());
        assert!(result.succeeded, "{}", result.message);
        assert!(!temp.path().join("W/old.Notebook").exists());
        assert_eq!(
            fs::read_to_string(temp.path().join("W/nb.Notebook/notebook-content.py")).unwrap(),
            "x = 1"
        );
    }

    #[test]
    fn test_staging_publisher_reports_failure() {
        let temp = TempDir::new().unwrap();
        // A file where the stage directory should be makes every write fail.
        let blocker = temp.path().join("blocked");
        fs::write(&blocker, "").unwrap();
        let publisher = StagingPublisher::new(&blocker);

        let result = publisher.publish("W", &content());
        assert!(!result.succeeded);
        assert!(result.message.contains("Failed to create directory"));
    }

    #[test]
    fn test_dry_run_publisher() {
        let result = DryRunPublisher.publish("[P] Blueprint", &content());
        assert!(result.succeeded);
        assert!(result.message.contains("1 file(s)"));
        assert!(result.message.contains("[P] Blueprint"));
    }
}
