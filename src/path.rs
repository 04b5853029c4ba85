//! Path manipulation utilities for target-loader

use std::path::{Component, Path, PathBuf};

/// Lexically normalize a path.
///
/// Removes `.` components and resolves `..` against the preceding component
/// without touching the filesystem, so symlinks are not followed. A `..` at
/// the root of an absolute path stays at the root. Leading `..` components of
/// a relative path are kept. An empty result becomes `.`.
pub fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    let mut normals = 0usize;

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if normals > 0 {
                    out.pop();
                    normals -= 1;
                } else if !path.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(name) => {
                out.push(name);
                normals += 1;
            }
        }
    }

    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Returns true if a cleaned relative path climbs above its starting point.
pub fn escapes(relative: &Path) -> bool {
    matches!(clean(relative).components().next(), Some(Component::ParentDir))
}

/// Encode a repository path to be filesystem-safe
///
/// Used to build readable prefixes for temporary clone directories. URL
/// characters that are problematic for filesystems are replaced.
pub fn encode_url_path(url: &str) -> String {
    url.chars()
        .map(|c| match c {
            '/' => '-',
            '\\' => '-',
            ':' => '_',
            // Keep alphanumeric, dots, dashes, underscores as-is
            c if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' => c,
            // Replace other characters with underscores
            _ => '_',
        })
        .collect()
}
