//! # Filesystem Capability
//!
//! Resolution and loading only need a narrow slice of a filesystem: directory
//! confirmation, stat, absolute-path resolution, symlink resolution and byte
//! reads. The `FileSystem` trait captures exactly that, so the classifier and
//! loader run unchanged against the real disk (`DiskFS`) or an in-memory tree
//! (`MemoryFS`) in tests.
//!
//! `ConfirmedDir` is a directory path that was absolute, cleaned and known to
//! exist when it was built. Every loader root is a `ConfirmedDir`.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::path::clean;

/// What a path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Dir,
}

/// The filesystem operations target resolution depends on.
pub trait FileSystem: Send + Sync {
    /// Returns true if `path` is an existing directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Stats `path`, following symlinks.
    fn metadata(&self, path: &Path) -> io::Result<FileKind>;

    /// Makes `path` absolute and lexically clean, without resolving symlinks.
    fn abs(&self, path: &Path) -> io::Result<PathBuf>;

    /// Makes `path` absolute and resolves symlinks. The path must exist.
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    /// Reads the whole file at `path`.
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Returns true if anything exists at `path`.
    fn exists(&self, path: &Path) -> bool {
        self.metadata(path).is_ok()
    }
}

/// The host filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskFS;

impl FileSystem for DiskFS {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn metadata(&self, path: &Path) -> io::Result<FileKind> {
        let metadata = std::fs::metadata(path)?;
        Ok(if metadata.is_dir() {
            FileKind::Dir
        } else {
            FileKind::File
        })
    }

    fn abs(&self, path: &Path) -> io::Result<PathBuf> {
        Ok(clean(&std::path::absolute(path)?))
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::canonicalize(path)
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

/// Represents a file held by `MemoryFS`
#[derive(Debug, Clone)]
pub struct File {
    /// File content as bytes
    pub content: Vec<u8>,
}

impl File {
    /// Create a new file with content
    pub fn new(content: Vec<u8>) -> Self {
        Self { content }
    }

    /// Create a new file from string content
    pub fn from_string(content: &str) -> Self {
        Self::new(content.as_bytes().to_vec())
    }
}

/// In-memory filesystem
///
/// Paths are stored absolute and cleaned. Relative paths are resolved
/// against the filesystem's working directory (`/` unless set with
/// `with_cwd`). Adding a file implicitly creates its parent directories.
#[derive(Debug, Clone)]
pub struct MemoryFS {
    files: HashMap<PathBuf, File>,
    dirs: BTreeSet<PathBuf>,
    cwd: PathBuf,
}

impl Default for MemoryFS {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFS {
    /// Create a new empty filesystem rooted at `/`
    pub fn new() -> Self {
        let mut dirs = BTreeSet::new();
        dirs.insert(PathBuf::from("/"));
        Self {
            files: HashMap::new(),
            dirs,
            cwd: PathBuf::from("/"),
        }
    }

    /// Set the working directory used to resolve relative paths.
    ///
    /// The directory is created if it does not exist.
    pub fn with_cwd<P: AsRef<Path>>(mut self, cwd: P) -> Self {
        self.cwd = clean(&Path::new("/").join(cwd.as_ref()));
        let cwd = self.cwd.clone();
        self.insert_dir(&cwd);
        self
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        clean(&self.cwd.join(path))
    }

    fn insert_dir(&mut self, dir: &Path) {
        for ancestor in dir.ancestors() {
            if !self.dirs.insert(ancestor.to_path_buf()) {
                break;
            }
        }
    }

    /// Add or update a file
    pub fn add_file<P: AsRef<Path>>(&mut self, path: P, file: File) -> Result<()> {
        let path = self.resolve(path.as_ref());
        if self.dirs.contains(&path) {
            return Err(Error::NotAFile { path });
        }
        if let Some(parent) = path.parent() {
            if self.files.contains_key(parent) {
                return Err(Error::NotADirectory {
                    path: parent.to_path_buf(),
                });
            }
            self.insert_dir(parent);
        }
        self.files.insert(path, file);
        Ok(())
    }

    /// Add a file with string content
    pub fn add_file_string<P: AsRef<Path>>(&mut self, path: P, content: &str) -> Result<()> {
        self.add_file(path, File::from_string(content))
    }

    /// Create a directory and all of its parents
    pub fn add_dir<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = self.resolve(path.as_ref());
        if self.files.contains_key(&path) {
            return Err(Error::NotADirectory { path });
        }
        self.insert_dir(&path);
        Ok(())
    }

    /// Get the number of files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if filesystem has no files
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no such file or directory: {}", path.display()),
    )
}

impl FileSystem for MemoryFS {
    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.contains(&self.resolve(path))
    }

    fn metadata(&self, path: &Path) -> io::Result<FileKind> {
        let path = self.resolve(path);
        if self.dirs.contains(&path) {
            Ok(FileKind::Dir)
        } else if self.files.contains_key(&path) {
            Ok(FileKind::File)
        } else {
            Err(not_found(&path))
        }
    }

    fn abs(&self, path: &Path) -> io::Result<PathBuf> {
        Ok(self.resolve(path))
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        self.metadata(path)?;
        Ok(self.resolve(path))
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        let path = self.resolve(path);
        match self.files.get(&path) {
            Some(file) => Ok(file.content.clone()),
            None if self.dirs.contains(&path) => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("is a directory: {}", path.display()),
            )),
            None => Err(not_found(&path)),
        }
    }
}

/// An absolute, cleaned directory path that existed when it was confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfirmedDir(PathBuf);

impl ConfirmedDir {
    /// Wraps a path without checking it; callers guarantee the invariant.
    pub(crate) fn new_unchecked(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn join<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        clean(&self.0.join(path))
    }

    /// Returns true if this directory is `other` or lies below it.
    pub fn has_prefix(&self, other: &ConfirmedDir) -> bool {
        self.0.starts_with(&other.0)
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl AsRef<Path> for ConfirmedDir {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ConfirmedDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Confirm that `path` names an existing directory.
///
/// The result is absolute with symlinks resolved.
pub fn confirm_dir(fs: &dyn FileSystem, path: &Path) -> Result<ConfirmedDir> {
    if path.as_os_str().is_empty() {
        return Err(Error::EmptyTarget);
    }
    let abs = fs
        .abs(path)
        .map_err(|source| Error::AbsolutePathResolution {
            path: path.to_path_buf(),
            source,
        })?;
    let real = fs
        .canonicalize(&abs)
        .map_err(|_| Error::NotADirectory { path: abs.clone() })?;
    if !fs.is_dir(&real) {
        return Err(Error::NotADirectory { path: abs });
    }
    Ok(ConfirmedDir(real))
}

/// Resolve `path` to its real location and split it into a directory and,
/// when `path` names a file, the file name.
///
/// The path must exist.
pub fn cleaned_abs(fs: &dyn FileSystem, path: &Path) -> Result<(ConfirmedDir, Option<String>)> {
    let real = fs.canonicalize(path).map_err(|source| Error::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    if fs.is_dir(&real) {
        return Ok((ConfirmedDir(real), None));
    }
    let name = real
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| Error::NotAFile { path: real.clone() })?;
    let dir = real
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| Error::NotADirectory { path: real.clone() })?;
    Ok((ConfirmedDir(dir), Some(name)))
}
