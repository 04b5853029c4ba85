//! Shared test utilities for integration and E2E tests.
//!
//! This module provides common fixtures and helper functions to reduce
//! duplication across test files.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_overlay();
//!     // ... test code
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::kustomizations;
    #[allow(unused_imports)]
    pub use super::{git_available, GitRepo};
    pub use super::TestFixture;
}

/// Kustomization snippets for building fixture trees.
#[allow(dead_code)]
pub mod kustomizations {
    /// An overlay with one local base and one file.
    pub const OVERLAY: &str = "resources:\n  - ../../base\n  - patch.yaml\n";

    /// A base with a single file.
    pub const BASE: &str = "resources:\n  - deployment.yaml\n";

    /// No references at all.
    pub const EMPTY: &str = "resources: []\n";

    /// Reads a file outside its own directory.
    pub const ESCAPING: &str = "resources:\n  - ../secrets/key\n";
}

/// Returns true if a `git` executable can be run.
#[allow(dead_code)]
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// A temporary directory with files laid out for a test.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Lay out `overlays/prod` on top of `base`, plus a secret next to them.
    pub fn with_overlay(self) -> Self {
        self.with_file("overlays/prod/kustomization.yaml", kustomizations::OVERLAY)
            .with_file("overlays/prod/patch.yaml", "kind: Patch\n")
            .with_file("base/kustomization.yaml", kustomizations::BASE)
            .with_file("base/deployment.yaml", "kind: Deployment\n")
            .with_file("secrets/key", "s3cr3t\n")
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of `path` inside the fixture, as a string target.
    pub fn target(&self, path: &str) -> String {
        self.temp_dir.path().join(path).display().to_string()
    }

    /// Create a child path in the temp directory.
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Create a command configured to run in this fixture's directory.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("target-loader");
        cmd.current_dir(self.path())
            .env_remove("TARGET_LOADER_LOAD_RESTRICTOR")
            .env_remove("TARGET_LOADER_TMPDIR")
            .env_remove("RUST_LOG");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A git repository committed from a `TestFixture`, reachable by `file://`.
#[allow(dead_code)]
pub struct GitRepo {
    fixture: TestFixture,
}

#[allow(dead_code)]
impl GitRepo {
    /// Commit every file of `fixture` on branch `main` and tag it `v1`.
    pub fn commit(fixture: TestFixture) -> Self {
        let dir = fixture.path();
        for args in [
            &["init", "--quiet", "--initial-branch=main"][..],
            &["add", "--all"],
            &[
                "-c",
                "user.name=Test",
                "-c",
                "user.email=test@example.com",
                "commit",
                "--quiet",
                "-m",
                "fixture",
            ],
            &["tag", "v1"],
        ] {
            let status = Command::new("git")
                .args(args)
                .current_dir(dir)
                .status()
                .expect("Failed to run git");
            assert!(status.success(), "git {:?} failed", args);
        }
        Self { fixture }
    }

    pub fn path(&self) -> &Path {
        self.fixture.path()
    }

    /// `file://` URL of the repository.
    pub fn url(&self) -> String {
        format!("file://{}", self.path().display())
    }

    /// Target for `subpath` inside the repository at `reference`.
    pub fn target(&self, subpath: &str, reference: &str) -> String {
        format!("{}//{}?ref={}", self.url(), subpath, reference)
    }

    pub fn fixture(&self) -> &TestFixture {
        &self.fixture
    }
}

/// Entries of `dir` whose names start with `prefix`.
#[allow(dead_code)]
pub fn entries_with_prefix(dir: &Path, prefix: &str) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .map(|rd| {
            rd.filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    p.file_name()
                        .is_some_and(|n| n.to_string_lossy().starts_with(prefix))
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.path().exists());
    }

    #[test]
    fn test_fixture_with_overlay() {
        let fixture = TestFixture::new().with_overlay();
        assert!(fixture.path().join("overlays/prod/kustomization.yaml").exists());
        assert!(fixture.path().join("secrets/key").exists());
    }

    #[test]
    fn test_kustomizations_are_valid_yaml() {
        for snippet in [
            kustomizations::OVERLAY,
            kustomizations::BASE,
            kustomizations::EMPTY,
            kustomizations::ESCAPING,
        ] {
            let parsed: Result<serde_yaml::Value, _> = serde_yaml::from_str(snippet);
            assert!(parsed.is_ok(), "invalid snippet: {}", snippet);
        }
    }
}
