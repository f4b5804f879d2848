//! End-to-end tests of the `parley` binary.

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn parley() -> Command {
    let mut cmd = Command::cargo_bin("parley").expect("binary built");
    cmd.env_remove("PARLEY_STORE");
    cmd
}

#[test]
fn help_lists_subcommands() {
    parley()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("history"))
        .stdout(predicate::str::contains("simulate"));
}

#[test]
fn simulate_then_inspect_history() {
    let store = tempfile::tempdir().expect("tempdir");

    parley()
        .args(["simulate", "--rounds", "60", "--store"])
        .arg(store.path())
        .arg("--profile-a")
        .arg(fixture("seller.json"))
        .arg("--profile-b")
        .arg(fixture("buyer.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Agreement:"))
        .stdout(predicate::str::contains("seller_1"));

    parley()
        .args(["history", "--store"])
        .arg(store.path())
        .args(["buyer", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"counterpart\": \"buyer\""))
        .stdout(predicate::str::contains("\"p1\""));
}

#[test]
fn history_of_unknown_counterpart_is_empty() {
    let store = tempfile::tempdir().expect("tempdir");

    parley()
        .args(["history", "--store"])
        .arg(store.path())
        .arg("stranger")
        .assert()
        .success()
        .stdout(predicate::str::contains("No history for stranger"));
}

#[test]
fn simulate_with_missing_profile_fails() {
    parley()
        .args(["simulate", "--profile-a"])
        .arg(fixture("seller.json"))
        .args(["--profile-b", "does-not-exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}
