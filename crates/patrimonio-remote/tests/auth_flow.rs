//! AuthClient against the in-process fake backend.

use patrimonio_core::config::RemoteConfig;
use patrimonio_core::error::ErrorCode;
use patrimonio_core::{MemoryStore, RemoteStore, Table};
use patrimonio_remote::auth::{self, SignupOutcome};
use patrimonio_remote::fake::FakeBackend;
use patrimonio_remote::{AuthClient, AuthError, RestStore};

fn remote(backend: &FakeBackend) -> RemoteConfig {
    RemoteConfig {
        url: backend.url().to_string(),
        anon_key: "anon".into(),
    }
}

#[test]
fn login_returns_usable_session() {
    let backend = FakeBackend::start(MemoryStore::new()).unwrap();
    backend.add_user("ana@example.com", "secret1");
    let client = AuthClient::new(&remote(&backend), None);

    let session = client.login("ana@example.com", "secret1").unwrap();
    assert_eq!(session.user.email.as_deref(), Some("ana@example.com"));

    let store = RestStore::new(&remote(&backend), Some(&session.access_token));
    assert!(store.select_all(Table::Collaborators).unwrap().is_empty());
}

#[test]
fn wrong_password_reads_as_incorrect_credentials() {
    let backend = FakeBackend::start(MemoryStore::new()).unwrap();
    backend.add_user("ana@example.com", "secret1");
    let client = AuthClient::new(&remote(&backend), None);

    let err = client.login("ana@example.com", "nope").unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
    assert_eq!(err.to_string(), "incorrect email or password");
    assert_eq!(err.code(), ErrorCode::AuthRejected);
}

#[test]
fn signup_with_admin_code_signs_in() {
    let backend = FakeBackend::start(MemoryStore::new()).unwrap();
    let client = AuthClient::new(&remote(&backend), Some("letmein".into()));

    let outcome = client.signup("bia@example.com", "secret1", "letmein").unwrap();
    assert!(matches!(outcome, SignupOutcome::SignedIn(_)));

    let again = client.signup("bia@example.com", "secret1", "letmein").unwrap_err();
    assert!(again.to_string().contains("User already registered"));
}

#[test]
fn wrong_admin_code_never_reaches_server() {
    let backend = FakeBackend::start(MemoryStore::new()).unwrap();
    let client = AuthClient::new(&remote(&backend), Some("letmein".into()));

    let err = client.signup("bia@example.com", "secret1", "guess").unwrap_err();
    assert_eq!(err.code(), ErrorCode::SignupNotAllowed);
    assert!(backend.requests().is_empty());
}

#[test]
fn expired_session_is_refreshed_and_persisted() {
    let backend = FakeBackend::start(MemoryStore::new()).unwrap();
    backend.add_user("ana@example.com", "secret1");
    let client = AuthClient::new(&remote(&backend), None);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let mut session = client.login("ana@example.com", "secret1").unwrap();
    session.expires_at = 0;
    auth::save_session(&path, &session).unwrap();

    let restored = client.restore(&path).unwrap().unwrap();
    assert_ne!(restored.access_token, session.access_token);
    assert_eq!(auth::load_session(&path).unwrap(), Some(restored));
}

#[test]
fn rejected_refresh_drops_session() {
    let backend = FakeBackend::start(MemoryStore::new()).unwrap();
    let client = AuthClient::new(&remote(&backend), None);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    backend.add_user("ana@example.com", "secret1");
    let mut session = backend.session_for("ana@example.com").unwrap();
    session.expires_at = 0;
    session.refresh_token = Some("forged".into());
    auth::save_session(&path, &session).unwrap();

    assert_eq!(client.restore(&path).unwrap(), None);
    assert!(!path.exists());
}

#[test]
fn unreachable_server_keeps_saved_session() {
    let backend = FakeBackend::start(MemoryStore::new()).unwrap();
    backend.add_user("ana@example.com", "secret1");
    let mut session = backend.session_for("ana@example.com").unwrap();
    session.expires_at = 0;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    auth::save_session(&path, &session).unwrap();

    let offline = RemoteConfig {
        url: "http://127.0.0.1:1".into(),
        anon_key: "anon".into(),
    };
    let err = AuthClient::new(&offline, None).restore(&path).unwrap_err();
    assert!(matches!(err, AuthError::Remote { status: None, .. }));
    assert!(!err.is_rejection());
    assert_eq!(auth::load_session(&path).unwrap(), Some(session.clone()));

    let online = AuthClient::new(&remote(&backend), None);
    let restored = online.restore(&path).unwrap().unwrap();
    assert_ne!(restored.access_token, session.access_token);
}

#[test]
fn logout_revokes_token() {
    let backend = FakeBackend::start(MemoryStore::new()).unwrap();
    backend.add_user("ana@example.com", "secret1");
    let client = AuthClient::new(&remote(&backend), None);
    let session = client.login("ana@example.com", "secret1").unwrap();

    client.logout(&session);

    let store = RestStore::new(&remote(&backend), Some(&session.access_token));
    assert_eq!(store.select_all(Table::Assets).unwrap_err().status, Some(401));
}
