//! # Target Resolution and Root-Restricted Loading
//!
//! This module turns a target string into a [`Loader`]: an object that reads
//! files relative to a root directory, subject to a [`Restriction`], and that
//! can resolve further targets (bases) found in the files it reads.
//!
//! ## Classification
//!
//! A target is classified by trying three strategies in a fixed order. The
//! first one that matches wins:
//!
//! 1. **Remote**: the target parses as a git repository reference. The
//!    repository is cloned and the loader is rooted at the requested subpath
//!    of the clone. A malformed remote reference or a failed clone is final;
//!    it is never retried as a local path.
//! 2. **Local directory**: the target is an existing directory.
//! 3. **Local file**: the target is an existing file. The loader is rooted at
//!    the file's directory and remembers the file name.
//!
//! ## Restrictions
//!
//! A loader rooted in a clone is always `RootOnly`, whatever the caller asked
//! for. Children inherit their parent's restriction, tightened to `RootOnly`
//! when the parent lives in a clone. Once a tree crosses into remote content
//! it therefore stays restricted for good.
//!
//! ## Clone lifetime
//!
//! All loaders rooted in the same clone share one `Arc<ClonedRepo>`. The
//! clone is removed when the last of them is closed or dropped.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};
use serde::Serialize;

use crate::error::{CloneFailure, Error, Result};
use crate::filesystem::{confirm_dir, ConfirmedDir, DiskFS, FileKind, FileSystem};
use crate::git::{ClonedRepo, Cloner, GitExecCloner};
use crate::repospec::RepoSpec;
use crate::restriction::Restriction;
use crate::suggestions;

/// Where a loader's root came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RootKind {
    GitClone,
    LocalDir,
    LocalFile,
}

impl fmt::Display for RootKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RootKind::GitClone => "git-clone",
            RootKind::LocalDir => "local-dir",
            RootKind::LocalFile => "local-file",
        };
        f.write_str(s)
    }
}

/// The outcome of classifying a target.
///
/// `path` is absolute and existed when the target was resolved. `file_name`
/// is set only for `LocalFile` roots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRoot {
    pub kind: RootKind,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Remote,
    LocalDir,
    LocalFile,
}

impl Strategy {
    const ORDER: [Strategy; 3] = [Strategy::Remote, Strategy::LocalDir, Strategy::LocalFile];

    fn name(self) -> &'static str {
        match self {
            Strategy::Remote => "remote repository",
            Strategy::LocalDir => "local directory",
            Strategy::LocalFile => "local file",
        }
    }
}

enum Classified {
    Remote(RepoSpec),
    Local(ResolvedRoot),
}

enum Attempt {
    Matched(Classified),
    Declined(Option<io::Error>),
}

/// The path local strategies look at. Bases are relative to their referrer.
fn local_path(target: &str, base: Option<&ConfirmedDir>) -> Result<PathBuf> {
    match base {
        None => Ok(PathBuf::from(target)),
        Some(_) if Path::new(target).is_absolute() => Err(Error::AbsoluteBase {
            target: target.to_string(),
        }),
        Some(root) => Ok(root.join(target)),
    }
}

fn attempt_remote(target: &str) -> Result<Attempt> {
    Ok(match RepoSpec::parse(target)? {
        Some(spec) => Attempt::Matched(Classified::Remote(spec)),
        None => Attempt::Declined(None),
    })
}

fn attempt_dir(fs: &dyn FileSystem, path: &Path) -> Attempt {
    match confirm_dir(fs, path) {
        Ok(root) => Attempt::Matched(Classified::Local(ResolvedRoot {
            kind: RootKind::LocalDir,
            path: root.into_path_buf(),
            file_name: None,
        })),
        Err(_) => Attempt::Declined(None),
    }
}

fn attempt_file(fs: &dyn FileSystem, path: &Path) -> Result<Attempt> {
    match fs.metadata(path) {
        Err(e) => return Ok(Attempt::Declined(Some(e))),
        // A directory the dir strategy could not confirm is never a file.
        Ok(FileKind::Dir) => {
            return Ok(Attempt::Declined(Some(io::Error::new(
                io::ErrorKind::Other,
                format!("{} is a directory that cannot be used as a root", path.display()),
            ))))
        }
        Ok(FileKind::File) => {}
    }
    let abs = fs
        .abs(path)
        .map_err(|source| Error::AbsolutePathResolution {
            path: path.to_path_buf(),
            source,
        })?;
    let file_name = abs
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| Error::NotAFile { path: abs.clone() })?;
    let parent = abs
        .parent()
        .ok_or_else(|| Error::NotADirectory { path: abs.clone() })?;
    let root = confirm_dir(fs, parent)?;
    Ok(Attempt::Matched(Classified::Local(ResolvedRoot {
        kind: RootKind::LocalFile,
        path: root.into_path_buf(),
        file_name: Some(file_name),
    })))
}

/// Run the strategies in order; the first match wins.
fn classify(fs: &dyn FileSystem, target: &str, base: Option<&ConfirmedDir>) -> Result<Classified> {
    let mut last_error = None;

    for strategy in Strategy::ORDER {
        let attempt = match strategy {
            Strategy::Remote => attempt_remote(target)?,
            Strategy::LocalDir => attempt_dir(fs, &local_path(target, base)?),
            Strategy::LocalFile => attempt_file(fs, &local_path(target, base)?)?,
        };
        match attempt {
            Attempt::Matched(classified) => {
                debug!("'{}' resolved as {}", target, strategy.name());
                return Ok(classified);
            }
            Attempt::Declined(error) => {
                debug!("'{}' is not a {}", target, strategy.name());
                if error.is_some() {
                    last_error = error;
                }
            }
        }
    }

    Err(Error::TargetNotDirNorFile {
        target: target.to_string(),
        source: last_error.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "no such file or directory")
        }),
    })
}

/// Resolves top-level targets into loaders.
///
/// Holds the filesystem and cloner every loader (and every base it resolves)
/// will use.
#[derive(Clone)]
pub struct Resolver {
    fs: Arc<dyn FileSystem>,
    cloner: Arc<dyn Cloner>,
}

impl Resolver {
    /// Creates a resolver that clones with the system `git`.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self::with_cloner(fs, Arc::new(GitExecCloner::new()))
    }

    /// Creates a resolver with a custom cloner.
    pub fn with_cloner(fs: Arc<dyn FileSystem>, cloner: Arc<dyn Cloner>) -> Self {
        Self { fs, cloner }
    }

    /// Classify `target` and build a loader for it.
    ///
    /// `restriction` applies to local targets only; remote targets are
    /// always `RootOnly`.
    pub fn resolve(&self, restriction: Restriction, target: &str) -> Result<Loader> {
        if target.is_empty() {
            return Err(Error::EmptyTarget);
        }
        match classify(self.fs.as_ref(), target, None)? {
            Classified::Remote(spec) => Loader::at_git_clone(
                target,
                spec,
                Arc::clone(&self.fs),
                Arc::clone(&self.cloner),
                None,
            ),
            Classified::Local(resolved) => {
                info!(
                    "resolved '{}' as {} at {} ({})",
                    target,
                    resolved.kind,
                    resolved.path.display(),
                    restriction
                );
                Ok(Loader::from_node(Node {
                    target: target.to_string(),
                    root: ConfirmedDir::new_unchecked(resolved.path.clone()),
                    resolved,
                    restriction,
                    repo_spec: None,
                    repo: None,
                    clone_root: None,
                    referrer: None,
                    fs: Arc::clone(&self.fs),
                    cloner: Arc::clone(&self.cloner),
                }))
            }
        }
    }
}

/// Resolve `target` on the host filesystem, cloning remote targets with git.
pub fn new_loader(restriction: Restriction, target: &str) -> Result<Loader> {
    Resolver::new(Arc::new(DiskFS)).resolve(restriction, target)
}

struct Node {
    target: String,
    resolved: ResolvedRoot,
    root: ConfirmedDir,
    restriction: Restriction,
    repo_spec: Option<RepoSpec>,
    repo: Option<Arc<ClonedRepo>>,
    clone_root: Option<ConfirmedDir>,
    referrer: Option<Arc<Node>>,
    fs: Arc<dyn FileSystem>,
    cloner: Arc<dyn Cloner>,
}

impl Node {
    /// This node followed by its referrers, nearest first.
    fn chain(&self) -> impl Iterator<Item = &Node> {
        std::iter::successors(Some(self), |n| n.referrer.as_deref())
    }
}

/// Reads files under a root directory and resolves the bases they reference.
///
/// Cloning a `Loader` is cheap and shares the underlying clone, if any.
#[derive(Clone)]
pub struct Loader {
    node: Arc<Node>,
}

impl Loader {
    fn from_node(node: Node) -> Self {
        Self {
            node: Arc::new(node),
        }
    }

    fn at_git_clone(
        target: &str,
        spec: RepoSpec,
        fs: Arc<dyn FileSystem>,
        cloner: Arc<dyn Cloner>,
        referrer: Option<Arc<Node>>,
    ) -> Result<Loader> {
        let repo = Arc::new(cloner.clone_repo(&spec)?);

        let subpath_failure = |message: String| Error::CloneFailed {
            url: spec.location().to_string(),
            r#ref: spec.revision_or_head().to_string(),
            kind: CloneFailure::Subpath,
            message,
            hint: suggestions::clone_hint(CloneFailure::Subpath),
        };

        let clone_root = confirm_dir(fs.as_ref(), repo.dir())?;
        let candidate = clone_root.join(spec.subpath());
        match fs.metadata(&candidate) {
            Ok(FileKind::Dir) => {}
            Ok(FileKind::File) => {
                return Err(subpath_failure(format!(
                    "'{}' refers to a file; expecting a directory",
                    spec.subpath().display()
                )));
            }
            Err(_) => {
                return Err(subpath_failure(format!(
                    "'{}' not found in repository",
                    spec.subpath().display()
                )));
            }
        }

        let root = confirm_dir(fs.as_ref(), &candidate)?;
        if !root.has_prefix(&clone_root) {
            return Err(Error::RepoContainment {
                base: root.into_path_buf(),
                repo: clone_root.into_path_buf(),
            });
        }

        info!("resolved '{}' as git clone at {}", target, root);
        Ok(Loader::from_node(Node {
            target: target.to_string(),
            resolved: ResolvedRoot {
                kind: RootKind::GitClone,
                path: root.as_path().to_path_buf(),
                file_name: None,
            },
            root,
            restriction: Restriction::RootOnly,
            repo_spec: Some(spec),
            repo: Some(repo),
            clone_root: Some(clone_root),
            referrer,
            fs,
            cloner,
        }))
    }

    /// The target string this loader was resolved from.
    pub fn target(&self) -> &str {
        &self.node.target
    }

    /// The root directory loads are resolved against.
    pub fn root(&self) -> &Path {
        self.node.root.as_path()
    }

    pub fn kind(&self) -> RootKind {
        self.node.resolved.kind
    }

    /// For `LocalFile` roots, the file the target named.
    pub fn file_name(&self) -> Option<&str> {
        self.node.resolved.file_name.as_deref()
    }

    pub fn restriction(&self) -> Restriction {
        self.node.restriction
    }

    pub fn resolved(&self) -> &ResolvedRoot {
        &self.node.resolved
    }

    /// The remote reference of the clone this loader lives in.
    pub fn repo_spec(&self) -> Option<&RepoSpec> {
        self.node.repo_spec.as_ref()
    }

    /// Returns true if this loader's root is inside a clone.
    pub fn is_remote(&self) -> bool {
        self.node.repo.is_some()
    }

    /// The top directory of the clone this loader lives in.
    pub fn clone_dir(&self) -> Option<&Path> {
        self.node.clone_root.as_ref().map(ConfirmedDir::as_path)
    }

    /// Targets from the top-level resolution down to this loader.
    pub fn lineage(&self) -> Vec<String> {
        let mut targets: Vec<String> = self.node.chain().map(|n| n.target.clone()).collect();
        targets.reverse();
        targets
    }

    /// Read the file at `path`, relative to the root unless absolute.
    ///
    /// The restriction is checked first; a denied path is never read.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Vec<u8>> {
        let node = &self.node;
        let resolved = node
            .restriction
            .check(node.fs.as_ref(), &node.root, path.as_ref())?;
        debug!("loading {}", resolved.display());
        node.fs
            .read_file(&resolved)
            .map_err(|source| Error::FileRead {
                path: resolved,
                source,
            })
    }

    /// Read the file at `path` as UTF-8 text.
    pub fn load_string<P: AsRef<Path>>(&self, path: P) -> Result<String> {
        let path = path.as_ref();
        let bytes = self.load(path)?;
        String::from_utf8(bytes).map_err(|e| Error::FileRead {
            path: self.node.root.join(path),
            source: io::Error::new(io::ErrorKind::InvalidData, e),
        })
    }

    /// Resolve a base referenced from this loader's content.
    ///
    /// Remote bases are cloned and always `RootOnly`. Local bases are
    /// relative to this loader's root, must not be absolute, must stay inside
    /// the clone when this loader lives in one, and inherit this loader's
    /// restriction (tightened to `RootOnly` inside a clone).
    pub fn new_child(&self, target: &str) -> Result<Loader> {
        if target.is_empty() {
            return Err(Error::EmptyTarget);
        }
        let node = &self.node;

        match classify(node.fs.as_ref(), target, Some(&node.root))? {
            Classified::Remote(spec) => {
                self.check_repo_cycle(&spec)?;
                Loader::at_git_clone(
                    target,
                    spec,
                    Arc::clone(&node.fs),
                    Arc::clone(&node.cloner),
                    Some(Arc::clone(node)),
                )
            }
            Classified::Local(resolved) => {
                let root = ConfirmedDir::new_unchecked(resolved.path.clone());
                if let Some(clone_root) = &node.clone_root {
                    if !root.has_prefix(clone_root) {
                        return Err(Error::RepoContainment {
                            base: root.into_path_buf(),
                            repo: clone_root.as_path().to_path_buf(),
                        });
                    }
                }
                self.check_local_cycle(target, &resolved, &root)?;

                let floor = if node.repo.is_some() {
                    Restriction::RootOnly
                } else {
                    Restriction::Unrestricted
                };
                let restriction = node.restriction.tighten(floor);
                debug!(
                    "base '{}' of '{}' resolved as {} at {} ({})",
                    target, node.target, resolved.kind, root, restriction
                );

                Ok(Loader::from_node(Node {
                    target: target.to_string(),
                    resolved,
                    root,
                    restriction,
                    repo_spec: node.repo_spec.clone(),
                    repo: node.repo.clone(),
                    clone_root: node.clone_root.clone(),
                    referrer: Some(Arc::clone(node)),
                    fs: Arc::clone(&node.fs),
                    cloner: Arc::clone(&node.cloner),
                }))
            }
        }
    }

    fn check_repo_cycle(&self, spec: &RepoSpec) -> Result<()> {
        let previous = self.node.chain().find(|n| {
            n.resolved.kind == RootKind::GitClone
                && n.repo_spec.as_ref().is_some_and(|s| s.same_source(spec))
        });
        match previous {
            Some(n) => Err(Error::CycleDetected {
                cycle: format!(
                    "remote base '{}' is already being loaded as '{}'",
                    spec, n.target
                ),
            }),
            None => Ok(()),
        }
    }

    fn check_local_cycle(
        &self,
        target: &str,
        resolved: &ResolvedRoot,
        root: &ConfirmedDir,
    ) -> Result<()> {
        for n in self.node.chain() {
            let cycle = match resolved.kind {
                RootKind::LocalFile => {
                    n.resolved.kind == RootKind::LocalFile
                        && n.root == *root
                        && n.resolved.file_name == resolved.file_name
                }
                _ => n.root.has_prefix(root),
            };
            if cycle {
                return Err(Error::CycleDetected {
                    cycle: format!(
                        "base '{}' at {} revisits {} ('{}')",
                        target, root, n.root, n.target
                    ),
                });
            }
        }
        Ok(())
    }

    /// Release this loader.
    ///
    /// If it held the last reference to its clone, the clone is removed now
    /// and any failure is returned. Otherwise removal happens when the last
    /// loader sharing the clone is closed or dropped.
    pub fn close(self) -> Result<()> {
        let Some(node) = Arc::into_inner(self.node) else {
            debug!("loader still shared; deferring release");
            return Ok(());
        };
        let Node { repo, referrer, .. } = node;
        drop(referrer);
        match repo.and_then(Arc::into_inner) {
            Some(repo) => repo.cleanup(),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("target", &self.node.target)
            .field("root", &self.node.resolved)
            .field("restriction", &self.node.restriction)
            .field("clone", &self.node.repo)
            .finish()
    }
}
