//! # Base Walker
//!
//! Follows the `resources`, `bases` and `components` entries of a
//! kustomization file through [`Loader::new_child`], building a tree of every
//! root reached. Directory and remote entries are walked recursively; file
//! entries are read through their referrer, so its restriction applies.
//!
//! Each child loader is closed as soon as its subtree is done, which releases
//! clones early instead of holding every repository until the walk finishes.

use std::io;
use std::path::PathBuf;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::defaults::KUSTOMIZATION_FILE_NAMES;
use crate::error::{Error, Result};
use crate::loader::{Loader, RootKind};
use crate::restriction::Restriction;
use crate::suggestions;

/// The parts of a kustomization file that reference other content.
#[derive(Debug, Default, Deserialize)]
struct Kustomization {
    #[serde(default)]
    resources: Vec<String>,
    #[serde(default)]
    bases: Vec<String>,
    #[serde(default)]
    components: Vec<String>,
}

impl Kustomization {
    fn entries(&self) -> impl Iterator<Item = &str> {
        self.resources
            .iter()
            .chain(&self.bases)
            .chain(&self.components)
            .map(String::as_str)
    }

    fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }
}

/// One root reached during a walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaseNode {
    /// The target string that led here.
    pub label: String,
    pub kind: RootKind,
    pub root: PathBuf,
    pub restriction: Restriction,
    /// The kustomization file read at this root.
    pub kustomization: String,
    /// File entries, as written in the kustomization.
    pub files: Vec<String>,
    pub children: Vec<BaseNode>,
    /// True if entries were left unvisited because of the depth limit.
    pub truncated: bool,
}

/// Locate and read the kustomization file of `loader`.
fn read_kustomization(loader: &Loader) -> Result<(String, String)> {
    let candidates: Vec<&str> = match loader.file_name() {
        Some(name) => vec![name],
        None => KUSTOMIZATION_FILE_NAMES.to_vec(),
    };

    for name in candidates {
        match loader.load_string(name) {
            Ok(content) => return Ok((name.to_string(), content)),
            Err(Error::FileRead { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                debug!("no {} in {}", name, loader.root().display());
            }
            Err(e) => return Err(e),
        }
    }

    Err(Error::ConfigParse {
        message: format!(
            "no kustomization file found in {}",
            loader.root().display()
        ),
        hint: Some(suggestions::missing_kustomization(loader.root())),
    })
}

/// Walk the bases reachable from `loader`.
///
/// `max_depth` limits how many levels of bases are resolved below `loader`;
/// `Some(0)` reads only `loader`'s own kustomization. Remote bases below the
/// limit are never cloned.
pub fn walk(loader: &Loader, label: &str, max_depth: Option<usize>) -> Result<BaseNode> {
    let (file_name, content) = read_kustomization(loader)?;
    let kustomization: Kustomization =
        serde_yaml::from_str(&content).map_err(|e| Error::ConfigParse {
            message: format!(
                "invalid {} in {}: {}",
                file_name,
                loader.root().display(),
                e
            ),
            hint: None,
        })?;

    let mut node = BaseNode {
        label: label.to_string(),
        kind: loader.kind(),
        root: loader.root().to_path_buf(),
        restriction: loader.restriction(),
        kustomization: file_name,
        files: Vec::new(),
        children: Vec::new(),
        truncated: false,
    };

    if max_depth == Some(0) {
        node.truncated = !kustomization.is_empty();
        return Ok(node);
    }
    let next_depth = max_depth.map(|d| d - 1);

    for entry in kustomization.entries() {
        let child = loader.new_child(entry)?;
        match child.kind() {
            RootKind::LocalFile => {
                loader.load(entry)?;
                node.files.push(entry.to_string());
            }
            RootKind::LocalDir | RootKind::GitClone => {
                node.children.push(walk(&child, entry, next_depth)?);
            }
        }
        child.close()?;
    }

    Ok(node)
}
