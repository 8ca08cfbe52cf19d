//! Shared test utilities for integration and E2E tests.
//!
//! Add `mod common;` to a test file, then build a workspace root with
//! [`TestFixture`]:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! let fixture = TestFixture::new().with_workspace("Blueprint", fixtures::BLUEPRINT_PARAMETER);
//! fixture.command().arg("scan").arg(fixture.root()).assert().failure();
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::fixtures;
    pub use super::TestFixture;
}

/// Descriptor and content snippets shared by the tests.
#[allow(dead_code)]
pub mod fixtures {
    /// Source lakehouse id used in the Blueprint workspace
    pub const SOURCE_ID: &str = "b892bcb4-b1d3-a9e0-4a9e-fac33bb0b654";
    pub const DEV_ID: &str = "22222222-2222-2222-2222-222222222222";
    pub const TEST_ID: &str = "33333333-3333-3333-3333-333333333333";
    pub const PROD_ID: &str = "44444444-4444-4444-4444-444444444444";

    pub const NOTEBOOK_PATH: &str = "Load.Notebook/notebook-content.py";

    /// Config descriptor declaring all three targets for `name`
    pub fn config(name: &str) -> String {
        format!(
            "core:\n  workspace:\n    dev: \"[D] {name}\"\n    test: \"[T] {name}\"\n    prod: \"[P] {name}\"\n"
        )
    }

    /// Notebook body referencing the source lakehouse
    pub fn notebook() -> String {
        format!("# Fabric notebook source\nlakehouse_id = \"{SOURCE_ID}\"\n")
    }

    /// Rule covering dev and test only
    pub fn parameter_dev_test() -> String {
        format!(
            "find_replace:\n  - find_value: \"{SOURCE_ID}\"\n    replace_value:\n      dev: \"{DEV_ID}\"\n      test: \"{TEST_ID}\"\n"
        )
    }

    /// Rule covering every environment
    pub fn parameter_all() -> String {
        format!(
            "find_replace:\n  - find_value: \"{SOURCE_ID}\"\n    replace_value:\n      dev: \"{DEV_ID}\"\n      test: \"{TEST_ID}\"\n      prod: \"{PROD_ID}\"\n"
        )
    }

    /// Parameter descriptor violating the rule schema
    pub const INVALID_PARAMETER: &str = "find_replace:\n  - replace_value:\n      dev: x\n";
}

/// A temporary repository with a `workspaces/` root.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a workspace with the standard config, the given parameter
    /// descriptor and one notebook referencing the source id.
    pub fn with_workspace(self, name: &str, parameter: &str) -> Self {
        self.with_file(&format!("workspaces/{name}/config.yml"), &fixtures::config(name))
            .with_file(&format!("workspaces/{name}/parameter.yml"), parameter)
            .with_file(
                &format!("workspaces/{name}/{}", fixtures::NOTEBOOK_PATH),
                &fixtures::notebook(),
            )
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path to the workspace root.
    pub fn root(&self) -> PathBuf {
        self.temp_dir.path().join("workspaces")
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Command running in the fixture directory with colour and ambient
    /// configuration turned off.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("fabric-promote");
        cmd.current_dir(self.path())
            .env("NO_COLOR", "1")
            .env_remove("FABRIC_PROMOTE_ROOT")
            .env_remove("FABRIC_PROMOTE_SETTINGS")
            .env_remove("FABRIC_PROMOTE_INFRA_STATUS")
            .env_remove("RUST_LOG");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_with_workspace() {
        let fixture = TestFixture::new().with_workspace("Blueprint", &fixtures::parameter_all());
        assert!(fixture.root().join("Blueprint/config.yml").exists());
        assert!(fixture
            .root()
            .join("Blueprint")
            .join(fixtures::NOTEBOOK_PATH)
            .exists());
    }

    #[test]
    fn test_fixture_descriptors_are_valid_yaml() {
        for text in [
            fixtures::config("W"),
            fixtures::parameter_dev_test(),
            fixtures::parameter_all(),
        ] {
            serde_yaml::from_str::<serde_yaml::Value>(&text).expect("fixture should be valid YAML");
        }
    }
}
