//! End-to-end tests for the `resolve` command.
//!
//! These tests invoke the actual CLI binary and validate the behavior of the
//! `resolve` subcommand from a user's perspective.

mod common;

use common::prelude::*;

/// Test that resolve --help flag shows help information
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_resolve_help() {
    TestFixture::new()
        .command()
        .arg("resolve")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Classify a target and print its resolved root",
        ));
}

/// Test that a local directory resolves as root-only by default
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_resolve_local_dir() {
    let fixture = TestFixture::new().with_overlay();

    fixture
        .command()
        .arg("--color=never")
        .arg("resolve")
        .arg("base")
        .assert()
        .success()
        .stdout(predicate::str::contains("[dir] local-dir"))
        .stdout(predicate::str::contains("restriction: root-only"));
}

/// Test that the load restrictor can come from the environment
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_resolve_restrictor_from_env() {
    let fixture = TestFixture::new().with_overlay();

    fixture
        .command()
        .env("TARGET_LOADER_LOAD_RESTRICTOR", "LoadRestrictionsNone")
        .arg("--color=never")
        .arg("resolve")
        .arg("base")
        .assert()
        .success()
        .stdout(predicate::str::contains("restriction: none"));
}

/// Test JSON output for a file target
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_resolve_json_file() {
    let fixture = TestFixture::new().with_overlay();

    let output = fixture
        .command()
        .arg("resolve")
        .arg("base/kustomization.yaml")
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["kind"], "local-file");
    assert_eq!(value["file_name"], "kustomization.yaml");
    assert_eq!(value["restriction"], "root-only");
}

/// Test that an unknown target fails with a clear message
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_resolve_missing_target() {
    TestFixture::new()
        .command()
        .arg("resolve")
        .arg("does-not-exist")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "must be a directory, a file, or a git repository URL",
        ));
}

/// Test that a malformed remote target is not treated as a local path
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_resolve_malformed_remote() {
    let fixture = TestFixture::new();
    fixture.child("ftp:/example.com/repo").create_dir_all().unwrap();

    fixture
        .command()
        .arg("resolve")
        .arg("ftp://example.com/repo")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed remote target"));
}

/// Test resolving a local git repository over file://
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_resolve_remote_json() {
    if !git_available() {
        return;
    }
    let repo = GitRepo::commit(TestFixture::new().with_overlay());
    let scratch = TempDir::new().unwrap();

    let output = TestFixture::new()
        .command()
        .arg("--load-restrictor=none")
        .arg("--temp-dir")
        .arg(scratch.path())
        .arg("resolve")
        .arg(repo.target("overlays/prod", "v1"))
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["kind"], "git-clone");
    assert_eq!(value["restriction"], "root-only");
    assert_eq!(value["remote"]["ref"], "v1");
    assert_eq!(value["remote"]["subpath"], "overlays/prod");
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
}
