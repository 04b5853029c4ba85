//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `target-loader` command-line tool. Each subcommand is defined in its own
//! file.
//!
//! Each command module contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and the shared
//!   [`Context`](crate::cli::Context) and performs the command's logic.

pub mod cat;
pub mod resolve;
pub mod tree;

use target_loader::error::Error;
use target_loader::suggestions;

/// Convert a library error into a reportable one, adding a hint where the
/// fix is a CLI flag.
pub(crate) fn report(error: Error) -> anyhow::Error {
    match error {
        Error::RestrictionViolation { .. } => suggestions::restriction_violation(&error),
        other => anyhow::Error::new(other),
    }
}
