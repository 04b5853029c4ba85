//! # Error Suggestions
//!
//! This module provides helper functions for generating helpful error
//! messages with hints and suggestions. Errors should tell users what went
//! wrong AND how to fix it.

use std::path::Path;

use crate::error::CloneFailure;

/// Hint attached to a failed clone, if there is anything useful to say.
pub fn clone_hint(kind: CloneFailure) -> Option<String> {
    let hint = match kind {
        CloneFailure::Auth => {
            "Make sure you have access to the repository. For private repos, ensure an SSH key \
             is loaded in ssh-agent or git credentials are configured"
        }
        CloneFailure::Network => "Check the host name and your network connection",
        CloneFailure::Revision => "Check that the ?ref= value names an existing branch, tag or commit",
        CloneFailure::Subpath => "Check the path after '//' in the target",
        CloneFailure::Timeout => "Raise the limit with ?timeout=<seconds> on the target",
        CloneFailure::Command => "Make sure git is installed and on your PATH",
        CloneFailure::Cancelled => return None,
    };
    Some(hint.to_string())
}

/// Hint for a kustomization file that could not be found under `root`.
pub fn missing_kustomization(root: &Path) -> String {
    format!(
        "Add a kustomization.yaml to {} or point the target at a directory that has one",
        root.display()
    )
}

/// Generate an error for a load denied by a root-only restriction.
///
/// Used by the CLI to explain how to relax the policy for trusted local
/// targets.
pub fn restriction_violation(error: &crate::error::Error) -> anyhow::Error {
    anyhow::anyhow!(
        "{error}\n\n\
         hint: Files outside the target root are only readable with --load-restrictor none\n\
         hint: Remote targets are always restricted to their clone"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_clone_hint() {
        assert!(clone_hint(CloneFailure::Auth).unwrap().contains("SSH key"));
        assert!(clone_hint(CloneFailure::Timeout)
            .unwrap()
            .contains("?timeout="));
        assert!(clone_hint(CloneFailure::Cancelled).is_none());
    }

    #[test]
    fn test_missing_kustomization() {
        let hint = missing_kustomization(Path::new("/cfg/app"));
        assert!(hint.contains("kustomization.yaml"));
        assert!(hint.contains("/cfg/app"));
    }

    #[test]
    fn test_restriction_violation() {
        let error = crate::error::Error::RestrictionViolation {
            root: PathBuf::from("/cfg/app"),
            attempted: PathBuf::from("/cfg/secrets/key"),
        };
        let message = restriction_violation(&error).to_string();
        assert!(message.contains("/cfg/secrets/key"));
        assert!(message.contains("--load-restrictor none"));
    }
}
