//! # Remote Repository Targets
//!
//! Parses target strings of the form
//!
//! ```text
//! [git::]<scheme>://<host>/<path>[//<subpath>][?ref=<revision>]
//! ```
//!
//! into a [`RepoSpec`]. Parsing has three outcomes, and the difference
//! between the last two matters to the classifier:
//!
//! - `Ok(Some(spec))`: the target is a remote repository.
//! - `Ok(None)`: the target is not remote at all; try it as a local path.
//! - `Err(Error::RemoteParseAmbiguous)`: the target has the remote shape but
//!   is malformed. This is final; it is never retried as a local path.
//!
//! Besides `ref`, the query may carry `version` (an alias of `ref`),
//! `timeout` (seconds, or a duration such as `90s` or `2m`) and `submodules`
//! (`true`/`false`).

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use log::debug;
use regex::Regex;
use url::{form_urlencoded, Url};

use crate::defaults::{DEFAULT_CLONE_TIMEOUT, SUPPORTED_SCHEMES};
use crate::error::{Error, Result};
use crate::path::{clean, escapes};

static REMOTE_TARGET: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^(?:git::)?([A-Za-z][A-Za-z0-9+.\-]*)://(.*)$"));

/// Options controlling how a repository is cloned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneOptions {
    /// Upper bound for the whole clone.
    pub timeout: Duration,
    /// Whether submodules are checked out as well.
    pub submodules: bool,
}

impl Default for CloneOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_CLONE_TIMEOUT,
            submodules: true,
        }
    }
}

/// A parsed reference to a directory inside a remote git repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSpec {
    scheme: String,
    host: String,
    repo_path: String,
    location: String,
    revision: Option<String>,
    subpath: PathBuf,
    options: CloneOptions,
}

impl RepoSpec {
    /// Parse `target` as a remote repository reference.
    pub fn parse(target: &str) -> Result<Option<RepoSpec>> {
        let re = REMOTE_TARGET.as_ref().map_err(|e| Error::Regex(e.clone()))?;
        let Some(caps) = re.captures(target) else {
            return Ok(None);
        };

        let ambiguous = |message: String| Error::RemoteParseAmbiguous {
            target: target.to_string(),
            message,
        };

        let scheme = caps[1].to_ascii_lowercase();
        if !SUPPORTED_SCHEMES.contains(&scheme.as_str()) {
            return Err(ambiguous(format!("unsupported scheme '{}'", scheme)));
        }

        let rest = caps.get(2).map_or("", |m| m.as_str());
        let (rest, query) = match rest.split_once('?') {
            Some((rest, query)) => (rest, Some(query)),
            None => (rest, None),
        };

        let Some((host, path)) = rest.split_once('/') else {
            return Err(ambiguous("missing repository path".to_string()));
        };
        if host.is_empty() && scheme != "file" {
            return Err(ambiguous("missing host".to_string()));
        }

        let (repo_path, subpath) = split_subpath(path);
        let repo_path = repo_path.trim_end_matches('/');
        if repo_path.is_empty() {
            return Err(ambiguous("missing repository path".to_string()));
        }

        let subpath = subpath.trim_matches('/');
        if escapes(Path::new(subpath)) {
            return Err(ambiguous(format!(
                "subpath '{}' leaves the repository",
                subpath
            )));
        }
        let subpath = match clean(Path::new(subpath)) {
            p if p == Path::new(".") => PathBuf::new(),
            p => p,
        };

        let location = format!("{}://{}/{}", scheme, host, repo_path);
        Url::parse(&location).map_err(|e| {
            ambiguous(format!("invalid repository location '{}': {}", location, e))
        })?;

        let mut revision: Option<String> = None;
        let mut version: Option<String> = None;
        let mut options = CloneOptions::default();

        for (key, value) in form_urlencoded::parse(query.unwrap_or("").as_bytes()) {
            match key.as_ref() {
                "ref" => revision = Some(value.into_owned()),
                "version" => version = Some(value.into_owned()),
                "timeout" => {
                    options.timeout = parse_timeout(&value)
                        .ok_or_else(|| ambiguous(format!("invalid timeout '{}'", value)))?;
                }
                "submodules" => {
                    options.submodules = match value.as_ref() {
                        "true" => true,
                        "false" => false,
                        other => {
                            return Err(ambiguous(format!(
                                "invalid submodules value '{}'",
                                other
                            )))
                        }
                    };
                }
                other => debug!("ignoring query parameter '{}' in '{}'", other, target),
            }
        }

        let revision = match (revision, version) {
            (Some(r), Some(v)) if r != v => {
                return Err(ambiguous(format!(
                    "conflicting ref '{}' and version '{}'",
                    r, v
                )));
            }
            (Some(r), _) => Some(r),
            (None, v) => v,
        };
        if revision.as_deref() == Some("") {
            return Err(ambiguous("empty ref".to_string()));
        }

        Ok(Some(RepoSpec {
            scheme,
            host: host.to_string(),
            repo_path: repo_path.to_string(),
            location,
            revision,
            subpath,
            options,
        }))
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// The repository path on the host, e.g. `org/repo.git`.
    pub fn repo_path(&self) -> &str {
        &self.repo_path
    }

    /// The URL handed to the git client.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// The requested revision, if any.
    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }

    /// The revision to fetch: the requested one, or `HEAD`.
    pub fn revision_or_head(&self) -> &str {
        self.revision.as_deref().unwrap_or("HEAD")
    }

    /// Directory inside the repository the target points at. Empty for the
    /// repository root.
    pub fn subpath(&self) -> &Path {
        &self.subpath
    }

    pub fn options(&self) -> &CloneOptions {
        &self.options
    }

    /// Returns true if both specs name the same directory at the same revision.
    pub fn same_source(&self, other: &RepoSpec) -> bool {
        self.location == other.location
            && self.revision_or_head() == other.revision_or_head()
            && self.subpath == other.subpath
    }
}

impl fmt::Display for RepoSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.location)?;
        if !self.subpath.as_os_str().is_empty() {
            write!(f, "//{}", self.subpath.display())?;
        }
        if let Some(revision) = &self.revision {
            write!(f, "?ref={}", revision)?;
        }
        Ok(())
    }
}

/// Split a repository path into the repository and the subpath inside it.
///
/// `//` is the explicit separator; without it, a `.git/` segment ends the
/// repository part.
fn split_subpath(path: &str) -> (&str, &str) {
    if let Some(idx) = path.find("//") {
        return (&path[..idx], &path[idx + 2..]);
    }
    if let Some(idx) = path.find(".git/") {
        return (&path[..idx + 4], &path[idx + 5..]);
    }
    (path, "")
}

fn parse_timeout(value: &str) -> Option<Duration> {
    let (digits, scale) = if let Some(d) = value.strip_suffix('s') {
        (d, 1)
    } else if let Some(d) = value.strip_suffix('m') {
        (d, 60)
    } else {
        (value, 1)
    };
    let n: u64 = digits.parse().ok()?;
    if n == 0 {
        return None;
    }
    n.checked_mul(scale).map(Duration::from_secs)
}
