//! Property-based tests for path handling and restriction checks.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::filesystem::{ConfirmedDir, MemoryFS};
    use crate::path::{clean, encode_url_path};
    use crate::repospec::RepoSpec;
    use crate::restriction::Restriction;
    use proptest::prelude::*;
    use std::path::{Component, Path, PathBuf};

    /// Relative paths built from a small alphabet that includes `.` and `..`.
    fn relative_path() -> impl Strategy<Value = String> {
        prop::collection::vec(
            prop_oneof![
                Just("..".to_string()),
                Just(".".to_string()),
                "[a-z]{1,6}",
            ],
            1..8,
        )
        .prop_map(|parts| parts.join("/"))
    }

    // ============================================================================
    // clean property tests
    // ============================================================================

    proptest! {
        /// Property: cleaning is idempotent
        #[test]
        fn clean_is_idempotent(input in relative_path()) {
            let once = clean(Path::new(&input));
            let twice = clean(&once);
            prop_assert_eq!(once, twice);
        }

        /// Property: a cleaned absolute path has no `.` or `..` components
        #[test]
        fn clean_absolute_has_no_dot_components(input in relative_path()) {
            let cleaned = clean(&Path::new("/").join(&input));
            prop_assert!(cleaned.is_absolute());
            for component in cleaned.components() {
                prop_assert!(
                    !matches!(component, Component::CurDir | Component::ParentDir),
                    "unexpected component in {:?}",
                    cleaned
                );
            }
        }
    }

    // ============================================================================
    // encode_url_path property tests
    // ============================================================================

    proptest! {
        /// Property: encode_url_path never produces path separators
        #[test]
        fn encode_url_path_never_produces_separators(input in ".*") {
            let result = encode_url_path(&input);
            prop_assert!(!result.contains('/'));
            prop_assert!(!result.contains('\\'));
            prop_assert!(!result.contains(':'));
        }

        /// Property: encode_url_path preserves character count
        #[test]
        fn encode_url_path_preserves_char_count(input in ".+") {
            let result = encode_url_path(&input);
            prop_assert_eq!(result.chars().count(), input.chars().count());
        }
    }

    // ============================================================================
    // Restriction property tests
    // ============================================================================

    proptest! {
        /// Property: a root-only check never accepts a path outside the root
        #[test]
        fn root_only_never_escapes_root(input in relative_path()) {
            let fs = MemoryFS::new();
            let root = ConfirmedDir::new_unchecked(PathBuf::from("/cfg/app"));
            match Restriction::RootOnly.check(&fs, &root, Path::new(&input)) {
                Ok(path) => prop_assert!(path.starts_with(root.as_path())),
                Err(e) => prop_assert!(
                    matches!(e, crate::error::Error::RestrictionViolation { .. }),
                    "unexpected error {}",
                    e
                ),
            }
        }

        /// Property: tighten is monotone, never loosening either input
        #[test]
        fn tighten_never_loosens(a in any::<bool>(), b in any::<bool>()) {
            let pick = |x| if x { Restriction::RootOnly } else { Restriction::Unrestricted };
            let (a, b) = (pick(a), pick(b));
            let tightened = a.tighten(b);
            prop_assert!(tightened >= a);
            prop_assert!(tightened >= b);
        }
    }

    // ============================================================================
    // RepoSpec property tests
    // ============================================================================

    proptest! {
        /// Property: strings without a scheme separator are never remote
        #[test]
        fn targets_without_scheme_are_local(input in "[^:]*") {
            prop_assert!(RepoSpec::parse(&input).unwrap().is_none());
        }

        /// Property: well-formed https targets always parse with their ref
        #[test]
        fn https_targets_keep_ref(
            org in "[a-z]{1,8}",
            repo in "[a-z]{1,8}",
            sub in "[a-z]{1,8}",
            rev in "v[0-9]{1,3}",
        ) {
            let target = format!("https://example.com/{org}/{repo}//{sub}?ref={rev}");
            let spec = RepoSpec::parse(&target).unwrap().unwrap();
            prop_assert_eq!(spec.location(), format!("https://example.com/{org}/{repo}"));
            prop_assert_eq!(spec.revision(), Some(rev.as_str()));
            prop_assert_eq!(spec.subpath(), Path::new(&sub));
        }
    }
}
