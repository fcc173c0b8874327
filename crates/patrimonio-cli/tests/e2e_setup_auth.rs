//! E2E tests for configuration, accounts and error rendering.

use assert_cmd::Command;
use patrimonio_core::MemoryStore;
use patrimonio_core::config::{CONFIG_FILE, SESSION_FILE};
use patrimonio_remote::fake::FakeBackend;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

fn pt_cmd(config_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("pt"));
    cmd.env("PATRIMONIO_CONFIG_DIR", config_dir);
    cmd.env("PATRIMONIO_LOG", "error");
    for var in [
        "PATRIMONIO_URL",
        "PATRIMONIO_ANON_KEY",
        "PATRIMONIO_ADMIN_CODE",
        "PATRIMONIO_AI_URL",
        "GEMINI_API_KEY",
        "FORMAT",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn stderr_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stderr).expect("stderr should be JSON")
}

fn setup(dir: &Path, backend: &FakeBackend) {
    pt_cmd(dir)
        .args(["setup", "--url", backend.url(), "--key", "anon"])
        .assert()
        .success();
}

#[test]
fn data_commands_refuse_without_configuration() {
    let dir = TempDir::new().unwrap();
    let output = pt_cmd(dir.path())
        .args(["asset", "list", "--json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let err = stderr_json(&output);
    assert_eq!(err["error"]["error_code"], "E1001");
    assert!(
        err["error"]["suggestion"]
            .as_str()
            .unwrap()
            .contains("pt setup")
    );
}

#[test]
fn setup_rejects_invalid_url() {
    let dir = TempDir::new().unwrap();
    pt_cmd(dir.path())
        .args(["setup", "--url", "not a url", "--key", "anon", "--format", "text"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E1003]"));
    assert!(!dir.path().join(CONFIG_FILE).exists());
}

#[test]
fn setup_writes_config_and_masks_key_in_show() {
    let dir = TempDir::new().unwrap();
    let backend = FakeBackend::start(MemoryStore::new()).unwrap();
    pt_cmd(dir.path())
        .args(["setup", "--url", backend.url(), "--key", "anon-public-key"])
        .assert()
        .success()
        .stdout(predicate::str::contains("remote configured"));
    assert!(dir.path().join(CONFIG_FILE).exists());

    let output = pt_cmd(dir.path())
        .args(["config", "show", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["url"], backend.url());
    assert_eq!(report["anon_key"], "anon****");
}

#[test]
fn commands_require_a_session() {
    let dir = TempDir::new().unwrap();
    let backend = FakeBackend::start(MemoryStore::new()).unwrap();
    setup(dir.path(), &backend);

    let output = pt_cmd(dir.path())
        .args(["dashboard", "--json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert_eq!(stderr_json(&output)["error"]["error_code"], "E1101");
    assert!(backend.requests().iter().all(|r| !r.contains("/rest/v1/")));
}

#[test]
fn login_persists_session_and_logout_clears_it() {
    let dir = TempDir::new().unwrap();
    let backend = FakeBackend::start(MemoryStore::new()).unwrap();
    backend.add_user("ana@example.com", "secret1");
    setup(dir.path(), &backend);

    pt_cmd(dir.path())
        .args(["login", "--email", "ana@example.com", "--password", "secret1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("signed in as ana@example.com"));
    assert!(dir.path().join(SESSION_FILE).exists());

    let output = pt_cmd(dir.path()).args(["whoami", "--json"]).output().unwrap();
    assert!(output.status.success());
    let me: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(me["email"], "ana@example.com");

    pt_cmd(dir.path())
        .args(["logout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("signed out"));
    assert!(!dir.path().join(SESSION_FILE).exists());
    assert!(backend.requests().iter().any(|r| r == "POST /auth/v1/logout"));
}

#[test]
fn wrong_password_is_reported_plainly() {
    let dir = TempDir::new().unwrap();
    let backend = FakeBackend::start(MemoryStore::new()).unwrap();
    backend.add_user("ana@example.com", "secret1");
    setup(dir.path(), &backend);

    pt_cmd(dir.path())
        .args(["login", "--email", "ana@example.com", "--password", "nope", "--format", "text"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E1102]: incorrect email or password"));
    assert!(!dir.path().join(SESSION_FILE).exists());
}

#[test]
fn signup_is_gated_by_admin_code() {
    let dir = TempDir::new().unwrap();
    let backend = FakeBackend::start(MemoryStore::new()).unwrap();
    setup(dir.path(), &backend);

    let disabled = pt_cmd(dir.path())
        .args(["signup", "--email", "bia@example.com", "--password", "secret1"])
        .args(["--admin-code", "letmein", "--json"])
        .output()
        .unwrap();
    assert!(!disabled.status.success());
    assert_eq!(stderr_json(&disabled)["error"]["error_code"], "E1103");

    let wrong = pt_cmd(dir.path())
        .env("PATRIMONIO_ADMIN_CODE", "letmein")
        .args(["signup", "--email", "bia@example.com", "--password", "secret1"])
        .args(["--admin-code", "guess", "--json"])
        .output()
        .unwrap();
    assert!(!wrong.status.success());
    assert!(backend.requests().iter().all(|r| r != "POST /auth/v1/signup"));

    let output = pt_cmd(dir.path())
        .env("PATRIMONIO_ADMIN_CODE", "letmein")
        .args(["signup", "--email", "bia@example.com", "--password", "secret1"])
        .args(["--admin-code", "letmein", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["signed_in"], true);
    assert!(dir.path().join(SESSION_FILE).exists());
}

#[test]
fn completions_are_generated() {
    let dir = TempDir::new().unwrap();
    pt_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pt"));
}
