//! Default values for target-loader.
//!
//! This module provides centralized default values used across the library
//! and the CLI, ensuring consistency and avoiding duplication.

use std::path::PathBuf;
use std::time::Duration;

/// Clone deadline used when a target does not set `?timeout=`.
pub const DEFAULT_CLONE_TIMEOUT: Duration = Duration::from_secs(27);

/// URL schemes accepted for remote targets.
pub const SUPPORTED_SCHEMES: [&str; 5] = ["https", "http", "ssh", "git", "file"];

/// Prefix of every temporary clone directory.
pub const CLONE_DIR_PREFIX: &str = "target-loader";

/// File names recognized as a kustomization, in lookup order.
pub const KUSTOMIZATION_FILE_NAMES: [&str; 3] =
    ["kustomization.yaml", "kustomization.yml", "Kustomization"];

/// Returns the directory temporary clones are created in.
///
/// This can be overridden by the `--temp-dir` CLI flag or the
/// `TARGET_LOADER_TMPDIR` environment variable.
pub fn default_temp_root() -> PathBuf {
    std::env::temp_dir()
}
