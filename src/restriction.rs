//! # Load Restrictions
//!
//! A `Restriction` decides whether a loader may read a path relative to its
//! root. There are two policies:
//!
//! - **`Unrestricted`**: any path the filesystem can read.
//! - **`RootOnly`**: the path must resolve, lexically and after symlinks are
//!   followed, to a file in or below the root.
//!
//! Restrictions are ordered (`Unrestricted < RootOnly`) and only ever
//! combined with `tighten`, so once a loader tree crosses into remote content
//! no descendant can loosen its policy again.

use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use log::debug;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::filesystem::{cleaned_abs, ConfirmedDir, FileSystem};
use crate::path::clean;

/// Policy controlling whether loads may leave the loader's root.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Restriction {
    /// Loads may read any file.
    #[serde(rename = "none")]
    #[value(name = "none", alias = "LoadRestrictionsNone")]
    Unrestricted,
    /// Loads must stay in or below the root.
    #[default]
    #[value(name = "root-only", alias = "LoadRestrictionsRootOnly")]
    RootOnly,
}

impl Restriction {
    /// Combine two policies, keeping the stricter one.
    pub fn tighten(self, other: Restriction) -> Restriction {
        self.max(other)
    }

    /// Resolve `path` against `root` and decide whether it may be read.
    ///
    /// Relative paths are joined to `root`; absolute paths are taken as-is.
    /// On success returns the path the caller should read. Under `RootOnly`
    /// an existing path is returned with symlinks resolved.
    pub fn check(self, fs: &dyn FileSystem, root: &ConfirmedDir, path: &Path) -> Result<PathBuf> {
        let candidate = if path.is_absolute() {
            clean(path)
        } else {
            root.join(path)
        };

        match self {
            Restriction::Unrestricted => Ok(candidate),
            Restriction::RootOnly => {
                if !candidate.starts_with(root.as_path()) {
                    debug!("denied '{}': outside root '{}'", candidate.display(), root);
                    return Err(Error::RestrictionViolation {
                        root: root.as_path().to_path_buf(),
                        attempted: candidate,
                    });
                }
                if !fs.exists(&candidate) {
                    // Reading reports the missing file with its own context.
                    return Ok(candidate);
                }
                let (dir, file) = cleaned_abs(fs, &candidate)?;
                if !dir.has_prefix(root) {
                    debug!(
                        "denied '{}': resolves to '{}' outside root '{}'",
                        candidate.display(),
                        dir,
                        root
                    );
                    return Err(Error::RestrictionViolation {
                        root: root.as_path().to_path_buf(),
                        attempted: candidate,
                    });
                }
                match file {
                    Some(file) => Ok(dir.join(file)),
                    None => Err(Error::NotAFile { path: candidate }),
                }
            }
        }
    }
}

impl fmt::Display for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Restriction::Unrestricted => f.write_str("none"),
            Restriction::RootOnly => f.write_str("root-only"),
        }
    }
}
