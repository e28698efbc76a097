//! Integration tests for basic CLI behavior.
//!
//! Tests that the binary exists, accepts standard flags, and each subcommand
//! responds to `--help` with appropriate text.

#![allow(deprecated)] // cargo_bin deprecation — replacement not yet stable

use assert_cmd::Command;
use predicates::prelude::*;

/// Helper: get a Command for the `tweetframe` binary.
fn tweetframe() -> Command {
    Command::cargo_bin("tweetframe").expect("binary 'tweetframe' should be built")
}

// ─── Top-level flags ─────────────────────────────────────────────────────────

#[test]
fn help_flag_shows_usage() {
    tweetframe()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: tweetframe"))
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("fetch"))
        .stdout(predicate::str::contains("render"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn short_help_flag_shows_usage() {
    tweetframe()
        .arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: tweetframe"));
}

#[test]
fn version_flag_shows_semver() {
    tweetframe()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^tweetframe \d+\.\d+\.\d+\n$").unwrap());
}

#[test]
fn no_args_shows_help_and_fails() {
    tweetframe()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage: tweetframe"));
}

// ─── Subcommand help ─────────────────────────────────────────────────────────

#[test]
fn serve_help_mentions_bind_and_upstream() {
    tweetframe()
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--bind"))
        .stdout(predicate::str::contains("--upstream"));
}

#[test]
fn fetch_help_mentions_url() {
    tweetframe()
        .args(["fetch", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<URL>"));
}

#[test]
fn render_help_mentions_url() {
    tweetframe()
        .args(["render", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<URL>"));
}

#[test]
fn unknown_subcommand_fails() {
    tweetframe()
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}
