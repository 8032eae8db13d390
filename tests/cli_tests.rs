//! CLI integration tests.

use std::io::Write;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn chatlink() -> Command {
    let mut cmd = cargo_bin_cmd!("chatlink");
    cmd.env_remove("CHATLINK_URL");
    cmd
}

#[test]
fn help_lists_subcommands() {
    chatlink()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("check-config"))
        .stdout(predicate::str::contains("client-id"));
}

#[test]
fn client_id_has_expected_shape() {
    chatlink()
        .arg("client-id")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^client_\d+_[0-9a-z]{9}\n$").unwrap());
}

#[test]
fn check_config_without_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    chatlink()
        .args(["check-config", "--config"])
        .arg(dir.path().join("absent.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("built-in defaults"))
        .stdout(predicate::str::contains("ws://127.0.0.1:8000/ws"));
}

#[test]
fn check_config_reports_settings_as_json() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[connection]\nurl = \"wss://chat.example.com/ws\"\nreconnection_attempts = 3"
    )
    .unwrap();

    chatlink()
        .args(["check-config", "--json", "--config"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""type":"success""#))
        .stdout(predicate::str::contains("wss://chat.example.com/ws"));
}

#[test]
fn check_config_fails_on_invalid_scheme() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[connection]\nurl = \"http://chat.example.com/ws\"").unwrap();

    chatlink()
        .args(["check-config", "--config"])
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("scheme must be ws or wss"));
}
