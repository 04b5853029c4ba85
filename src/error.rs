//! # Error Handling
//!
//! This module defines the centralized error type for `target-loader`. It
//! uses the `thiserror` library to create an `Error` enum that covers every
//! anticipated failure mode of target resolution and restricted loading.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum. Each variant carries enough context (the
//!   original target string, the root, the attempted path) to diagnose a
//!   failure without re-running.
//!
//! - **`CloneFailure`**: The distinct, user-diagnosable reasons a clone can
//!   fail (network, authentication, revision, subpath, ...).
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! Failures fall into two groups. Resolution failures (`RemoteParseAmbiguous`,
//! `CloneFailed`, `TargetNotDirNorFile`, ...) abort the resolution of a
//! target and never yield a partial loader. Load failures
//! (`RestrictionViolation`, `NotAFile`, `FileRead`) are fatal only to the
//! single `load` call that produced them.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Why a clone failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneFailure {
    /// The remote host could not be reached.
    Network,
    /// The remote asked for credentials or rejected them.
    Auth,
    /// The requested revision does not exist on the remote.
    Revision,
    /// The checkout succeeded but the requested subpath is missing or unusable.
    Subpath,
    /// The clone did not finish before its deadline.
    Timeout,
    /// The caller cancelled the clone.
    Cancelled,
    /// The git client failed for another reason, or could not be started.
    Command,
}

impl fmt::Display for CloneFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CloneFailure::Network => "network",
            CloneFailure::Auth => "authentication",
            CloneFailure::Revision => "revision",
            CloneFailure::Subpath => "subpath",
            CloneFailure::Timeout => "timeout",
            CloneFailure::Cancelled => "cancelled",
            CloneFailure::Command => "command",
        };
        f.write_str(s)
    }
}

/// Main error type for target-loader operations
#[derive(Error, Debug)]
pub enum Error {
    /// The target looked like a remote repository but could not be parsed.
    ///
    /// This is a hard error: a target that partially matches the remote
    /// grammar is never retried as a local path.
    #[error("Malformed remote target '{target}': {message}")]
    RemoteParseAmbiguous { target: String, message: String },

    /// A remote repository could not be materialized locally.
    #[error("Git clone error ({kind}) for {url}@{r#ref}: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    CloneFailed {
        url: String,
        r#ref: String,
        kind: CloneFailure,
        message: String,
        /// Optional hint for how to resolve the clone issue
        hint: Option<String>,
    },

    /// None of the resolution strategies accepted the target.
    #[error("Target '{target}' must be a directory, a file, or a git repository URL: {source}")]
    TargetNotDirNorFile {
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// A load tried to read outside the loader's root under a root-only policy.
    #[error("Security: file '{}' is not in or below '{}'", attempted.display(), root.display())]
    RestrictionViolation { root: PathBuf, attempted: PathBuf },

    /// A path could not be made absolute.
    #[error("Cannot resolve absolute path for '{}': {source}", path.display())]
    AbsolutePathResolution {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A path that must be an existing directory is not one.
    #[error("'{}' is not a directory", path.display())]
    NotADirectory { path: PathBuf },

    /// A path that must be a file resolved to something else.
    #[error("'{}' must resolve to a file", path.display())]
    NotAFile { path: PathBuf },

    /// An empty string was given as a target.
    #[error("Target cannot be empty")]
    EmptyTarget,

    /// A base referenced an absolute local path.
    #[error("Base '{target}' cannot be an absolute path")]
    AbsoluteBase { target: String },

    /// A base refers back to one of its own ancestors.
    #[error("Cycle detected: {cycle}")]
    CycleDetected { cycle: String },

    /// A base found inside a cloned repository points outside that clone.
    #[error("Security: base '{}' found in a cloned repository must be within '{}'", base.display(), repo.display())]
    RepoContainment { base: PathBuf, repo: PathBuf },

    /// A permitted file could not be read.
    #[error("Cannot read '{}': {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A kustomization file was missing or malformed.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// An error indicating that a mutex or other lock has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
