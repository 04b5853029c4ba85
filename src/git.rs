//! # Cloning Remote Targets
//!
//! The `Cloner` trait turns a [`RepoSpec`] into a local checkout wrapped in a
//! [`ClonedRepo`] handle. The default implementation, `GitExecCloner`, runs
//! the system `git` command, which automatically picks up:
//! - SSH keys from ~/.ssh/
//! - Git credential helpers
//! - Any authentication configured in ~/.gitconfig
//!
//! Every clone lands in its own freshly created temporary directory, so
//! concurrent clones never collide. If a clone fails, times out or is
//! cancelled, that directory is removed before the error is returned.
//!
//! A `ClonedRepo` is shared (through `Arc`) by every loader rooted in the
//! clone. Its cleanup is idempotent and also runs when the last handle is
//! dropped.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::defaults::{default_temp_root, CLONE_DIR_PREFIX};
use crate::error::{CloneFailure, Error, Result};
use crate::path::encode_url_path;
use crate::repospec::RepoSpec;
use crate::suggestions;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Materializes remote repositories as local directories.
///
/// Implementations may shell out to git, use an in-process library, or (in
/// tests) hand back a prepared directory. The returned directory must contain
/// the repository at the requested revision so that the requested subpath
/// resolves beneath it.
pub trait Cloner: Send + Sync {
    /// Clones the repository described by `spec`.
    fn clone_repo(&self, spec: &RepoSpec) -> Result<ClonedRepo>;
}

type Cleaner = Box<dyn Fn() -> Result<()> + Send + Sync>;

/// A local checkout of a remote repository, with its cleanup.
pub struct ClonedRepo {
    dir: PathBuf,
    cleaner: Cleaner,
    cleaned: Mutex<bool>,
}

impl ClonedRepo {
    /// Wraps `dir` together with the function that removes it.
    pub fn new<F>(dir: PathBuf, cleaner: F) -> Self
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        Self {
            dir,
            cleaner: Box::new(cleaner),
            cleaned: Mutex::new(false),
        }
    }

    /// The directory holding the checkout.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Removes the checkout.
    ///
    /// Safe to call any number of times; only the first successful call does
    /// any work. A failed cleanup may be retried.
    pub fn cleanup(&self) -> Result<()> {
        let mut cleaned = self.cleaned.lock().map_err(|_| Error::LockPoisoned {
            context: format!("clone cleanup for {}", self.dir.display()),
        })?;
        if *cleaned {
            return Ok(());
        }
        debug!("removing clone at {}", self.dir.display());
        (self.cleaner)()?;
        *cleaned = true;
        Ok(())
    }

    /// Returns true once cleanup has succeeded.
    pub fn is_cleaned(&self) -> bool {
        self.cleaned.lock().map(|c| *c).unwrap_or(false)
    }
}

impl fmt::Debug for ClonedRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClonedRepo")
            .field("dir", &self.dir)
            .field("cleaned", &self.is_cleaned())
            .finish()
    }
}

impl Drop for ClonedRepo {
    fn drop(&mut self) {
        if let Err(e) = self.cleanup() {
            warn!("failed to remove clone at {}: {}", self.dir.display(), e);
        }
    }
}

/// Remove a clone directory. A directory that is already gone is not an error.
pub fn remove_clone_dir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Io(e)),
    }
}

/// Shared flag used to abort clones in progress.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation of every clone observing this token.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Clones with the system `git` command.
///
/// The checkout is a shallow fetch of the requested revision (any branch,
/// tag or commit), followed by a submodule update unless the target disabled
/// it.
#[derive(Debug, Clone)]
pub struct GitExecCloner {
    git: PathBuf,
    temp_root: PathBuf,
    cancel: CancelToken,
}

impl Default for GitExecCloner {
    fn default() -> Self {
        Self::new()
    }
}

impl GitExecCloner {
    pub fn new() -> Self {
        Self {
            git: PathBuf::from("git"),
            temp_root: default_temp_root(),
            cancel: CancelToken::new(),
        }
    }

    /// Create clone directories under `temp_root` instead of the system
    /// temporary directory.
    pub fn with_temp_root(mut self, temp_root: PathBuf) -> Self {
        self.temp_root = temp_root;
        self
    }

    /// Abort clones when `cancel` is triggered.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Use a specific git executable.
    pub fn with_git_binary(mut self, git: PathBuf) -> Self {
        self.git = git;
        self
    }

    fn failure(&self, spec: &RepoSpec, kind: CloneFailure, message: String) -> Error {
        Error::CloneFailed {
            url: spec.location().to_string(),
            r#ref: spec.revision_or_head().to_string(),
            kind,
            message,
            hint: suggestions::clone_hint(kind),
        }
    }

    fn abort(&self, child: &mut Child) {
        if let Err(e) = child.kill() {
            debug!("failed to kill git: {}", e);
        }
        if let Err(e) = child.wait() {
            debug!("failed to reap git: {}", e);
        }
    }

    fn run(
        &self,
        spec: &RepoSpec,
        dir: &Path,
        args: &[&str],
        deadline: Option<Instant>,
    ) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(self.failure(spec, CloneFailure::Cancelled, "clone cancelled".to_string()));
        }

        debug!("running git {} in {}", args.join(" "), dir.display());
        let mut child = Command::new(&self.git)
            .args(args)
            .current_dir(dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                self.failure(
                    spec,
                    CloneFailure::Command,
                    format!("cannot run {}: {}", self.git.display(), e),
                )
            })?;

        loop {
            let status = child.try_wait().map_err(|e| {
                self.failure(spec, CloneFailure::Command, format!("waiting for git: {}", e))
            })?;
            if status.is_some() {
                break;
            }
            if self.cancel.is_cancelled() {
                self.abort(&mut child);
                return Err(self.failure(spec, CloneFailure::Cancelled, "clone cancelled".to_string()));
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                self.abort(&mut child);
                return Err(self.failure(
                    spec,
                    CloneFailure::Timeout,
                    format!("clone did not finish within {:?}", spec.options().timeout),
                ));
            }
            thread::sleep(POLL_INTERVAL);
        }

        let output = child.wait_with_output().map_err(|e| {
            self.failure(spec, CloneFailure::Command, format!("waiting for git: {}", e))
        })?;
        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let kind = classify_git_stderr(&stderr);
        Err(self.failure(spec, kind, format!("git {} failed: {}", args[0], stderr)))
    }
}

impl Cloner for GitExecCloner {
    fn clone_repo(&self, spec: &RepoSpec) -> Result<ClonedRepo> {
        // A timeout past the end of the clock means no deadline at all.
        let deadline = Instant::now().checked_add(spec.options().timeout);
        let prefix = format!("{}-{}-", CLONE_DIR_PREFIX, encode_url_path(spec.repo_path()));
        let tmp = tempfile::Builder::new()
            .prefix(&prefix)
            .tempdir_in(&self.temp_root)
            .map_err(|e| {
                self.failure(
                    spec,
                    CloneFailure::Command,
                    format!(
                        "cannot create temporary directory in {}: {}",
                        self.temp_root.display(),
                        e
                    ),
                )
            })?;

        info!("cloning {} into {}", spec, tmp.path().display());
        let dir = tmp.path();
        self.run(spec, dir, &["init", "--quiet"], deadline)?;
        self.run(spec, dir, &["remote", "add", "origin", spec.location()], deadline)?;
        self.run(
            spec,
            dir,
            &[
                "fetch",
                "--quiet",
                "--depth=1",
                "origin",
                spec.revision_or_head(),
            ],
            deadline,
        )?;
        self.run(spec, dir, &["checkout", "--quiet", "FETCH_HEAD"], deadline)?;
        if spec.options().submodules {
            self.run(
                spec,
                dir,
                &["submodule", "update", "--quiet", "--init", "--recursive"],
                deadline,
            )?;
        }

        // From here on the ClonedRepo owns removal of the directory.
        let dir = tmp.keep();
        Ok(ClonedRepo::new(dir.clone(), move || remove_clone_dir(&dir)))
    }
}

/// Map git's stderr to the reason a clone failed.
pub fn classify_git_stderr(stderr: &str) -> CloneFailure {
    let stderr = stderr.to_lowercase();
    let any = |needles: &[&str]| needles.iter().any(|n| stderr.contains(n));

    if any(&[
        "authentication failed",
        "permission denied",
        "could not read username",
        "could not read password",
        "terminal prompts disabled",
        "could not read from remote repository",
        "access denied",
        "error: 403",
    ]) {
        CloneFailure::Auth
    } else if any(&[
        "could not resolve host",
        "failed to connect",
        "connection refused",
        "connection timed out",
        "network is unreachable",
        "operation timed out",
        "unable to access",
    ]) {
        CloneFailure::Network
    } else if any(&[
        "couldn't find remote ref",
        "not our ref",
        "invalid refspec",
        "unknown revision",
        "did not match any",
    ]) {
        CloneFailure::Revision
    } else {
        CloneFailure::Command
    }
}
