//! RestStore against the in-process fake backend.

use patrimonio_core::config::RemoteConfig;
use patrimonio_core::error::ErrorCode;
use patrimonio_core::store::Operation;
use patrimonio_core::{AssetFields, MemoryStore, RemoteStore, Row, Session, Table};
use patrimonio_remote::RestStore;
use patrimonio_remote::fake::FakeBackend;
use serde_json::{Value, json};

fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => unreachable!("rows are objects"),
    }
}

fn seeded() -> MemoryStore {
    let mut store = MemoryStore::new();
    store.seed(
        Table::Collaborators,
        row(json!({"id": 1, "full_name": "Ana Silva", "username": "asilva"})),
    );
    store.seed(
        Table::Assets,
        row(json!({"id": 10, "asset_tag": "PAT-001", "name": "Laptop",
                   "category": "Notebook", "status": "ativo", "collaborator_id": 1})),
    );
    store
}

fn signed_in(backend: &FakeBackend) -> RestStore {
    backend.add_user("ana@example.com", "secret1");
    let session = backend.session_for("ana@example.com").unwrap();
    let remote = RemoteConfig {
        url: backend.url().to_string(),
        anon_key: "anon".into(),
    };
    RestStore::new(&remote, Some(&session.access_token))
}

#[test]
fn select_all_returns_rows() {
    let backend = FakeBackend::start(seeded()).unwrap();
    let store = signed_in(&backend);

    let assets = store.select_all(Table::Assets).unwrap();
    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0]["name"], json!("Laptop"));
    assert_eq!(store.requests(), 1);
}

#[test]
fn anon_bearer_is_rejected_by_row_security() {
    let backend = FakeBackend::start(seeded()).unwrap();
    let remote = RemoteConfig {
        url: backend.url().to_string(),
        anon_key: "anon".into(),
    };
    let store = RestStore::new(&remote, None);

    let err = store.select_all(Table::Collaborators).unwrap_err();
    assert_eq!(err.status, Some(401));
    assert_eq!(err.message, "JWT expired");
}

#[test]
fn session_over_http_reconciles_after_writes() {
    let backend = FakeBackend::start(seeded()).unwrap();
    let mut session = Session::open(signed_in(&backend)).unwrap();

    let fields = AssetFields {
        asset_tag: "PAT-002".into(),
        name: "Monitor".into(),
        category: "Display".into(),
        ..AssetFields::default()
    };
    let id = session.add_asset(&fields, Some("1")).unwrap();
    assert!(session.state().collaborator("1").unwrap().owns(&id));

    session.transfer_asset(&id, None).unwrap();
    assert_eq!(session.state().unassigned[0].id, id);

    session.delete_collaborator("1").unwrap();
    assert!(session.state().asset("10").is_none());
    assert_eq!(session.state().asset_count(), 1);
    assert_eq!(backend.rows(Table::Assets).len(), 1);

    let log = backend.requests();
    assert!(log.contains(&"PATCH /rest/v1/assets".to_string()));
    assert!(log.contains(&"DELETE /rest/v1/collaborators".to_string()));
}

#[test]
fn server_message_and_status_surface_on_write_failure() {
    let backend = FakeBackend::start(seeded()).unwrap();
    let mut session = Session::open(signed_in(&backend)).unwrap();
    backend.with_store(|store| {
        store.fail_next(Operation::Delete(Table::Assets), "permission denied for table assets");
    });

    let err = session.delete_asset("10").unwrap_err();
    assert_eq!(err.code(), ErrorCode::RemoteWriteFailed);
    assert!(err.to_string().contains("permission denied for table assets"));
    assert!(session.state().asset("10").is_some());
}

#[test]
fn foreign_key_violation_comes_back_as_conflict() {
    let backend = FakeBackend::start(seeded()).unwrap();
    let mut store = signed_in(&backend);

    let err = store
        .insert(Table::Assets, row(json!({"name": "Ghost", "collaborator_id": "404"})))
        .unwrap_err();
    assert_eq!(err.status, Some(409));
    assert!(err.message.contains("foreign key"));
}

#[test]
fn transport_failure_has_no_status() {
    let remote = RemoteConfig {
        url: "http://127.0.0.1:9".into(),
        anon_key: "anon".into(),
    };
    let err = RestStore::new(&remote, Some("t"))
        .select_all(Table::Assets)
        .unwrap_err();
    assert_eq!(err.status, None);
}

#[test]
fn missing_api_key_header_is_refused() {
    let backend = FakeBackend::start(seeded()).unwrap();
    backend.add_user("ana@example.com", "secret1");
    let session = backend.session_for("ana@example.com").unwrap();
    let url = format!("{}/rest/v1/assets?select=*", backend.url());

    let refused = ureq::get(&url)
        .set("Authorization", &format!("Bearer {}", session.access_token))
        .call();
    match refused {
        Err(ureq::Error::Status(status, response)) => {
            assert_eq!(status, 401);
            let body: Value = response.into_json().unwrap();
            assert_eq!(body["message"], "No API key found in request");
        }
        other => panic!("expected 401, got {other:?}"),
    }

    let accepted = ureq::get(&url)
        .set("apikey", "anon")
        .set("Authorization", &format!("Bearer {}", session.access_token))
        .call()
        .unwrap();
    let rows: Vec<Value> = accepted.into_json().unwrap();
    assert_eq!(rows.len(), 1);
}
