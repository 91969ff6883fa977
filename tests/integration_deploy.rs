//! Integration tests that deploy between real git repositories on disk.
//!
//! Source and destination are local paths, so git never needs the SSH
//! wrapper to connect, but every remote operation still runs inside an
//! ephemeral credential scope.
//!
//! Run with:
//!
//! ```bash
//! cargo test --features integration-tests --test integration_deploy
//! ```

#[allow(dead_code)]
mod common;
use common::prelude::*;

use std::fs;
use std::path::Path;

fn config(source: &Path, destination: &Path) -> String {
    format!(
        "source_repo_url: {}\ndestination_repo_url: {}\nrepo_name: some_repo\nrepo_dir: repos\nretries: 0\n",
        source.display(),
        destination.display()
    )
}

fn head(repo: &Path, branch: &str) -> String {
    git(repo, &["rev-parse", branch])
}

fn mirror_path(fixture: &TestFixture) -> std::path::PathBuf {
    fixture.path().join("repos").join("82feb3f6095a2be0")
}

fn deploy(fixture: &TestFixture) -> assert_cmd::assert::Assert {
    fixture
        .command()
        .env("MIRROR_DEPLOY_PRIVATE_KEY", "not-a-real-key")
        .env("TMPDIR", fixture.path().join("tmp"))
        .arg("deploy")
        .assert()
}

fn setup() -> (TestFixture, std::path::PathBuf, std::path::PathBuf) {
    let fixture = TestFixture::new();
    fs::create_dir_all(fixture.path().join("tmp")).unwrap();
    let source = fixture.source_repo("source", "first\n");
    let destination = fixture.bare_repo("destination.git");
    let fixture = fixture.with_config(&config(&source, &destination));
    (fixture, source, destination)
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_deploy_pushes_source_head() {
    let (fixture, source, destination) = setup();

    deploy(&fixture)
        .success()
        .stdout(predicate::str::contains("[OK] Pushed master to bitbucket"));

    assert_eq!(head(&destination, "master"), head(&source, "master"));
    assert!(mirror_path(&fixture).join(".git").join("config").is_file());
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_redeploy_pulls_new_commits() {
    let (fixture, source, destination) = setup();
    deploy(&fixture).success();

    fixture.commit(&source, "CHANGELOG.md", "second\n");
    deploy(&fixture).success();

    assert_eq!(head(&destination, "master"), head(&source, "master"));
    assert_eq!(head(&mirror_path(&fixture), "master"), head(&source, "master"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_deploy_replaces_existing_remote() {
    let (fixture, source, first_destination) = setup();
    deploy(&fixture).success();

    let second_destination = fixture.bare_repo("second.git");
    let fixture = fixture.with_config(&config(&source, &second_destination));
    deploy(&fixture)
        .success()
        .stdout(predicate::str::contains("replaced remote URL"));

    assert_eq!(head(&second_destination, "master"), head(&source, "master"));
    assert_eq!(
        git(&mirror_path(&fixture), &["config", "--get", "remote.bitbucket.url"]),
        second_destination.display().to_string()
    );
    // The first destination keeps what it had.
    assert_eq!(head(&first_destination, "master"), head(&source, "master"));
    // Only the named remote is touched.
    assert_eq!(
        git(&mirror_path(&fixture), &["config", "--get", "remote.origin.url"]),
        source.display().to_string()
    );
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_deploy_overwrites_diverged_destination() {
    let (fixture, source, destination) = setup();

    let other = fixture.source_repo("unrelated", "other history\n");
    git(
        &other,
        &["push", &destination.display().to_string(), "master"],
    );
    assert_ne!(head(&destination, "master"), head(&source, "master"));

    deploy(&fixture).success();

    assert_eq!(head(&destination, "master"), head(&source, "master"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_deploy_custom_remote_and_branch() {
    let (fixture, source, destination) = setup();
    // The mirror has a local branch for the source's checked-out branch.
    git(&source, &["checkout", "-b", "production"]);

    fixture
        .command()
        .env("MIRROR_DEPLOY_PRIVATE_KEY", "not-a-real-key")
        .args(["deploy", "--remote", "heroku", "--branch", "production"])
        .assert()
        .success();

    assert_eq!(head(&destination, "production"), head(&source, "production"));
    assert_eq!(
        git(&mirror_path(&fixture), &["config", "--get", "remote.heroku.url"]),
        destination.display().to_string()
    );
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_deploy_removes_credentials() {
    let (fixture, _source, _destination) = setup();
    deploy(&fixture).success();

    let leftovers: Vec<_> = fs::read_dir(fixture.path().join("tmp"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert!(leftovers.is_empty(), "left behind: {:?}", leftovers);
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_failed_push_reports_attempts() {
    let fixture = TestFixture::new();
    fs::create_dir_all(fixture.path().join("tmp")).unwrap();
    let source = fixture.source_repo("source", "first\n");
    let missing = fixture.path().join("missing.git");
    let fixture = fixture.with_config(&config(&source, &missing));

    fixture
        .command()
        .env("MIRROR_DEPLOY_PRIVATE_KEY", "not-a-real-key")
        .env("TMPDIR", fixture.path().join("tmp"))
        .args(["deploy", "--retries", "1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("after 2 attempt(s)"))
        .stderr(predicate::str::contains("git push -f bitbucket master"));

    // Credentials are removed on failure too.
    assert_eq!(fs::read_dir(fixture.path().join("tmp")).unwrap().count(), 0);
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_sync_clones_without_pushing() {
    let (fixture, source, destination) = setup();

    fixture
        .command()
        .env("MIRROR_DEPLOY_PRIVATE_KEY", "not-a-real-key")
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cloned mirror"));

    assert_eq!(head(&mirror_path(&fixture), "master"), head(&source, "master"));
    // Nothing was pushed.
    assert!(git(&destination, &["branch", "--list"]).is_empty());

    fixture
        .command()
        .env("MIRROR_DEPLOY_PRIVATE_KEY", "not-a-real-key")
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated mirror"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_info_after_deploy() {
    let (fixture, _source, destination) = setup();
    deploy(&fixture).success();

    fixture
        .command()
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("(cloned)"))
        .stdout(predicate::str::contains(format!(
            "remote bitbucket: {}",
            destination.display()
        )));
}
