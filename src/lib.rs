//! # Target Loader Library
//!
//! This library turns configuration targets into root-restricted loaders.
//! A target is a string that names a local directory, a local file, or a
//! directory inside a remote git repository. It is used by the
//! `target-loader` command-line tool but can also be embedded in any program
//! that reads layered configuration from untrusted references.
//!
//! ## Quick Example
//!
//! ```
//! use std::sync::Arc;
//! use target_loader::filesystem::MemoryFS;
//! use target_loader::loader::{Resolver, RootKind};
//! use target_loader::restriction::Restriction;
//!
//! let mut fs = MemoryFS::new();
//! fs.add_file_string("/cfg/app/kustomization.yaml", "resources: []").unwrap();
//! fs.add_file_string("/cfg/secrets/key", "s3cr3t").unwrap();
//!
//! let resolver = Resolver::new(Arc::new(fs));
//! let loader = resolver.resolve(Restriction::RootOnly, "/cfg/app").unwrap();
//! assert_eq!(loader.kind(), RootKind::LocalDir);
//!
//! // Files below the root are readable, files outside it are not.
//! assert!(loader.load("kustomization.yaml").is_ok());
//! assert!(loader.load("../secrets/key").is_err());
//! ```
//!
//! ## Core Concepts
//!
//! - **Targets (`repospec`, `loader`)**: A target is classified as a remote
//!   repository, a local directory or a local file, in that order. A string
//!   matching the remote grammar is never treated as a local path.
//! - **Restrictions (`restriction`)**: `RootOnly` confines reads to the
//!   loader's root, including after symlink resolution. `Unrestricted`
//!   allows any path. Restrictions only ever tighten from parent to child,
//!   and anything loaded from a clone is `RootOnly`.
//! - **Clones (`git`)**: Remote targets are shallow-cloned into a temporary
//!   directory that is removed when the last loader using it is released.
//! - **Filesystem (`filesystem`)**: Resolution runs against a `FileSystem`
//!   trait, with `DiskFS` for the host and `MemoryFS` for tests.
//! - **Bases (`resources`)**: Walks the bases referenced by kustomization
//!   files through child loaders.

pub mod defaults;
pub mod error;
pub mod filesystem;
pub mod git;
pub mod loader;
pub mod output;
pub mod path;
pub mod repospec;
pub mod resources;
pub mod restriction;
pub mod suggestions;

#[cfg(test)]
mod path_proptest;
