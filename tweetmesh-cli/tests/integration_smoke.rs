//! Smoke tests to verify command wiring

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_lists_commands() {
    let mut cmd = Command::cargo_bin("tweetmesh").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_serve_help() {
    let mut cmd = Command::cargo_bin("tweetmesh").unwrap();
    cmd.arg("serve").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Per-request deadline"))
        .stdout(predicate::str::contains("content"))
        .stdout(predicate::str::contains("social"));
}

#[test]
fn test_serve_rejects_unknown_service() {
    let mut cmd = Command::cargo_bin("tweetmesh").unwrap();
    cmd.arg("serve").arg("gateway");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_config_shows_defaults() {
    let mut cmd = Command::cargo_bin("tweetmesh").unwrap();
    cmd.arg("config")
        .arg("content")
        .env_remove("DATABASE_URL")
        .env_remove("SERVICE_PORT")
        .env_remove("BIND_ADDR")
        .env_remove("DB_HOST")
        .env_remove("DB_PASSWORD")
        .env_remove("REQUEST_TIMEOUT_SECS");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("service_type       = tweet"))
        .stdout(predicate::str::contains("bind_addr          = 0.0.0.0:8001"))
        .stdout(predicate::str::contains("request_timeout    = 5s"));
}

#[test]
fn test_config_rejects_bad_environment() {
    let mut cmd = Command::cargo_bin("tweetmesh").unwrap();
    cmd.arg("config")
        .arg("social")
        .env("REQUEST_TIMEOUT_SECS", "soon");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("REQUEST_TIMEOUT_SECS"));
}
