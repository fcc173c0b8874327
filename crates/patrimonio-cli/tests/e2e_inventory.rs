//! E2E tests for collaborator and asset workflows against the fake backend.

use assert_cmd::Command;
use patrimonio_core::config::{CONFIG_FILE, SESSION_FILE};
use patrimonio_core::{MemoryStore, Row, Table};
use patrimonio_remote::auth;
use patrimonio_remote::fake::FakeBackend;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::path::Path;
use tempfile::TempDir;

struct Office {
    dir: TempDir,
    backend: FakeBackend,
}

fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => unreachable!("rows are objects"),
    }
}

/// Ana (1) holds the laptop (10) and dock (11); Bruno (2) holds nothing;
/// the keyboard (12) is unassigned. A signed-in session is on disk.
fn office() -> Office {
    let mut store = MemoryStore::new();
    store.seed(
        Table::Collaborators,
        row(json!({"id": "1", "full_name": "Ana Silva", "username": "asilva"})),
    );
    store.seed(
        Table::Collaborators,
        row(json!({"id": "2", "full_name": "Bruno Lima", "username": "blima"})),
    );
    store.seed(
        Table::Assets,
        row(json!({"id": "10", "asset_tag": "PAT-001", "name": "Laptop", "category": "Notebook",
                   "status": "ativo", "collaborator_id": "1"})),
    );
    store.seed(
        Table::Assets,
        row(json!({"id": "11", "asset_tag": "PAT-002", "name": "Dock", "category": "Peripheral",
                   "status": "ativo", "collaborator_id": "1"})),
    );
    store.seed(
        Table::Assets,
        row(json!({"id": "12", "asset_tag": "PAT-003", "name": "Keyboard", "category": "Peripheral",
                   "status": "desativado", "collaborator_id": null})),
    );

    let backend = FakeBackend::start(store).unwrap();
    backend.add_user("ana@example.com", "secret1");
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(CONFIG_FILE),
        format!("[remote]\nurl = \"{}\"\nanon_key = \"anon\"\n", backend.url()),
    )
    .unwrap();
    let session = backend.session_for("ana@example.com").unwrap();
    auth::save_session(&dir.path().join(SESSION_FILE), &session).unwrap();
    Office { dir, backend }
}

fn pt_cmd(config_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("pt"));
    cmd.env("PATRIMONIO_CONFIG_DIR", config_dir);
    cmd.env("PATRIMONIO_LOG", "error");
    for var in [
        "PATRIMONIO_URL",
        "PATRIMONIO_ANON_KEY",
        "PATRIMONIO_AI_URL",
        "GEMINI_API_KEY",
        "FORMAT",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn json_ok(cmd: &mut Command) -> Value {
    let output = cmd.arg("--json").output().expect("pt should not crash");
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON")
}

fn owner_of(backend: &FakeBackend, asset_id: &str) -> Value {
    backend
        .rows(Table::Assets)
        .into_iter()
        .find(|r| r["id"] == asset_id)
        .map(|r| r["collaborator_id"].clone())
        .expect("asset row")
}

#[test]
fn collaborator_list_counts_assets() {
    let office = office();
    let list = json_ok(pt_cmd(office.dir.path()).args(["collaborator", "list"]));
    let rows = list.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["username"], "asilva");
    assert_eq!(rows[0]["asset_count"], 2);
    assert_eq!(rows[1]["asset_count"], 0);
}

#[test]
fn collaborator_search_matches_asset_tag() {
    let office = office();
    let list = json_ok(pt_cmd(office.dir.path()).args(["collaborator", "list", "--search", "pat-002"]));
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["id"], "1");
}

#[test]
fn collaborator_show_lists_their_assets() {
    let office = office();
    let ana = json_ok(pt_cmd(office.dir.path()).args(["collaborator", "show", "1"]));
    let tags: Vec<&str> = ana["assets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["asset_tag"].as_str().unwrap())
        .collect();
    assert_eq!(tags, vec!["PAT-001", "PAT-002"]);
}

#[test]
fn unknown_collaborator_is_reported_with_code() {
    let office = office();
    pt_cmd(office.dir.path())
        .args(["collaborator", "show", "99", "--format", "text"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E2001]"));
}

#[test]
fn add_collaborator_then_assign_new_asset() {
    let office = office();
    let carla = json_ok(pt_cmd(office.dir.path()).args([
        "collaborator",
        "add",
        "--full-name",
        "Carla Dias",
        "--username",
        "cdias",
    ]));
    let carla_id = carla["id"].as_str().unwrap().to_string();
    assert!(!carla_id.is_empty());

    let asset = json_ok(pt_cmd(office.dir.path()).args([
        "asset", "add", "--name", "Phone", "--tag", "PAT-004", "--category", "Mobile", "--owner",
        &carla_id, "--acquired", "2024-05-10",
    ]));
    let asset_id = asset["id"].as_str().unwrap();
    assert_eq!(owner_of(&office.backend, asset_id), json!(carla_id));

    let stored = office
        .backend
        .rows(Table::Assets)
        .into_iter()
        .find(|r| r["id"] == asset_id)
        .unwrap();
    assert_eq!(stored["status"], "ativo");
    assert_eq!(stored["acquisition_date"], "2024-05-10");
}

#[test]
fn add_asset_without_category_is_rejected_before_writing() {
    let office = office();
    let output = pt_cmd(office.dir.path())
        .args(["asset", "add", "--name", "Phone", "--tag", "PAT-004", "--json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let err: Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(err["error"]["error_code"], "E2003");
    assert!(office.backend.requests().iter().all(|r| r != "POST /rest/v1/assets"));
    assert_eq!(office.backend.rows(Table::Assets).len(), 3);
}

#[test]
fn asset_list_puts_unassigned_last_and_filters_by_owner() {
    let office = office();
    let all = json_ok(pt_cmd(office.dir.path()).args(["asset", "list"]));
    let ids: Vec<&str> = all
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["10", "11", "12"]);
    assert_eq!(all[2]["owner_label"], "Unassigned");
    assert_eq!(all[2]["status"], "deactivated");

    let ana = json_ok(pt_cmd(office.dir.path()).args(["asset", "list", "--search", "asilva"]));
    assert_eq!(ana.as_array().unwrap().len(), 2);
}

#[test]
fn transfer_moves_and_unassigns() {
    let office = office();
    let moved = json_ok(pt_cmd(office.dir.path()).args(["asset", "transfer", "10", "--to", "2"]));
    assert_eq!(moved["from"], "1");
    assert_eq!(moved["to"], "2");
    assert_eq!(owner_of(&office.backend, "10"), json!("2"));

    json_ok(pt_cmd(office.dir.path()).args(["asset", "transfer", "10", "--unassign"]));
    assert_eq!(owner_of(&office.backend, "10"), Value::Null);
}

#[test]
fn transfer_to_unknown_collaborator_writes_nothing() {
    let office = office();
    let output = pt_cmd(office.dir.path())
        .args(["asset", "transfer", "10", "--to", "99", "--json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert_eq!(owner_of(&office.backend, "10"), json!("1"));
    assert!(office.backend.requests().iter().all(|r| !r.starts_with("PATCH")));
}

#[test]
fn edit_changes_fields_but_keeps_owner() {
    let office = office();
    json_ok(pt_cmd(office.dir.path()).args([
        "asset",
        "edit",
        "10",
        "--status",
        "deactivated",
        "--description",
        "battery worn",
    ]));
    let stored = office
        .backend
        .rows(Table::Assets)
        .into_iter()
        .find(|r| r["id"] == "10")
        .unwrap();
    assert_eq!(stored["status"], "desativado");
    assert_eq!(stored["description"], "battery worn");
    assert_eq!(stored["name"], "Laptop");
    assert_eq!(stored["collaborator_id"], "1");
}

#[test]
fn delete_without_yes_is_refused_when_not_interactive() {
    let office = office();
    pt_cmd(office.dir.path())
        .args(["collaborator", "delete", "1", "--format", "text"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));
    assert_eq!(office.backend.rows(Table::Collaborators).len(), 2);
}

#[test]
fn deleting_collaborator_removes_their_assets() {
    let office = office();
    let report = json_ok(pt_cmd(office.dir.path()).args(["collaborator", "delete", "1", "--yes"]));
    assert_eq!(report["assets_removed"], 2);

    let remaining: Vec<Value> = office
        .backend
        .rows(Table::Assets)
        .into_iter()
        .map(|r| r["id"].clone())
        .collect();
    assert_eq!(remaining, vec![json!("12")]);

    let summary = json_ok(pt_cmd(office.dir.path()).arg("dashboard"));
    assert_eq!(summary["collaborators"], 1);
    assert_eq!(summary["total_assets"], 1);
}

#[test]
fn delete_asset_with_yes() {
    let office = office();
    json_ok(pt_cmd(office.dir.path()).args(["asset", "delete", "12", "--yes"]));
    assert_eq!(office.backend.rows(Table::Assets).len(), 2);
}

#[test]
fn dashboard_reports_totals_and_top_usage() {
    let office = office();
    let summary = json_ok(pt_cmd(office.dir.path()).arg("dashboard"));
    assert_eq!(summary["assigned_assets"], 2);
    assert_eq!(summary["unassigned_assets"], 1);
    assert_eq!(summary["total_assets"], 3);
    assert_eq!(summary["top"].as_array().unwrap().len(), 1);
    assert_eq!(summary["top"][0]["username"], "asilva");

    pt_cmd(office.dir.path())
        .args(["dashboard", "--format", "pretty"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("asilva  {} 2", "#".repeat(40))));
}

#[test]
fn export_writes_filtered_csv() {
    let office = office();
    let out = office.dir.path().join("peripherals.csv");
    let report = json_ok(pt_cmd(office.dir.path()).args([
        "export",
        "--search",
        "peripheral",
        "--output",
        out.to_str().unwrap(),
    ]));
    assert_eq!(report["rows"], 2);

    let csv = std::fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "Tag,Name,Category,Description,Acquired,Status,Owner");
    assert_eq!(lines[1], "PAT-002,Dock,Peripheral,,,active,Ana Silva");
    assert_eq!(lines[2], "PAT-003,Keyboard,Peripheral,,,deactivated,Unassigned");
}

#[test]
fn suggest_falls_back_without_key() {
    let office = office();
    let report = json_ok(pt_cmd(office.dir.path()).args(["suggest", "Dell Latitude"]));
    assert_eq!(report["fallback"], true);
    assert_eq!(report["category"], "Other");
}

#[test]
fn suggest_uses_the_assistant_reply() {
    let office = office();
    office.backend.set_ai_reply(Some(
        r#"{"category":"Notebook","suggestedDescription":"Business laptop","estimatedValueTier":"High"}"#,
    ));
    let report = json_ok(
        pt_cmd(office.dir.path())
            .env("GEMINI_API_KEY", "test-key")
            .env("PATRIMONIO_AI_URL", office.backend.url())
            .args(["suggest", "Dell Latitude"]),
    );
    assert_eq!(report["fallback"], false);
    assert_eq!(report["category"], "Notebook");
    assert_eq!(report["suggestedDescription"], "Business laptop");
}

#[test]
fn add_with_suggest_fills_category() {
    let office = office();
    office.backend.set_ai_reply(Some(
        r#"{"category":"Monitor","suggestedDescription":"27 inch 4K","estimatedValueTier":"Medium"}"#,
    ));
    let asset = json_ok(
        pt_cmd(office.dir.path())
            .env("GEMINI_API_KEY", "test-key")
            .env("PATRIMONIO_AI_URL", office.backend.url())
            .args(["asset", "add", "--name", "Dell U2720Q", "--tag", "PAT-009", "--suggest"]),
    );
    assert_eq!(asset["suggested"], true);
    let id = asset["id"].as_str().unwrap();
    let stored = office
        .backend
        .rows(Table::Assets)
        .into_iter()
        .find(|r| r["id"] == id)
        .unwrap();
    assert_eq!(stored["category"], "Monitor");
    assert_eq!(stored["description"], "27 inch 4K");
}

#[test]
fn audit_falls_back_when_service_fails() {
    let office = office();
    let report = json_ok(
        pt_cmd(office.dir.path())
            .env("GEMINI_API_KEY", "test-key")
            .env("PATRIMONIO_AI_URL", office.backend.url())
            .arg("audit"),
    );
    assert_eq!(
        report["report"],
        patrimonio_remote::suggest::AUDIT_ERROR_FALLBACK
    );
}

#[test]
fn unknown_token_is_rejected_by_backend() {
    let office = office();
    std::fs::write(
        office.dir.path().join(SESSION_FILE),
        r#"{"access_token":"forged","refresh_token":null,"expires_at":4102444800,"user":{"id":"x","email":null}}"#,
    )
    .unwrap();
    let output = pt_cmd(office.dir.path())
        .args(["asset", "list", "--json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let err: Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(err["error"]["error_code"], "E3001");
}
