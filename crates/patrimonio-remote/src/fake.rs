//! In-process stand-in for the hosted backend.
//!
//! Serves the PostgREST table routes from a [`MemoryStore`], a small GoTrue
//! subset (password and refresh-token grants, sign-up, logout) and the Gemini
//! `generateContent` route. Store failures injected with
//! [`MemoryStore::fail_next`] come back as HTTP errors.

use patrimonio_core::{MemoryStore, RemoteStore, Row, StoreError, Table};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tiny_http::{Header, Method, Request, Response, Server};
use url::Url;

use crate::auth::{AuthSession, AuthUser};

const TOKEN_LIFETIME: i64 = 3600;

#[derive(Debug, Clone)]
struct FakeUser {
    id: String,
    email: String,
    password: String,
}

#[derive(Debug, Default)]
struct FakeState {
    store: MemoryStore,
    users: Vec<FakeUser>,
    /// access token -> user id
    access: HashMap<String, String>,
    /// refresh token -> user id
    refresh: HashMap<String, String>,
    serial: u64,
    ai_reply: Option<String>,
    log: Vec<String>,
}

type Reply = (u16, Value);

fn message(status: u16, text: &str) -> Reply {
    (status, json!({ "message": text }))
}

impl FakeState {
    fn user(&self, id: &str) -> Option<&FakeUser> {
        self.users.iter().find(|u| u.id == id)
    }

    fn issue(&mut self, user_id: &str) -> Option<AuthSession> {
        let user = self.user(user_id)?.clone();
        self.serial += 1;
        let access_token = format!("fake-access-{}", self.serial);
        let refresh_token = format!("fake-refresh-{}", self.serial);
        self.access.insert(access_token.clone(), user.id.clone());
        self.refresh.insert(refresh_token.clone(), user.id.clone());
        Some(AuthSession {
            access_token,
            refresh_token: Some(refresh_token),
            expires_at: chrono::Utc::now().timestamp() + TOKEN_LIFETIME,
            user: AuthUser {
                id: user.id,
                email: Some(user.email),
            },
        })
    }

    fn add_user(&mut self, email: &str, password: &str) -> String {
        self.serial += 1;
        let id = format!("user-{}", self.serial);
        self.users.push(FakeUser {
            id: id.clone(),
            email: email.to_string(),
            password: password.to_string(),
        });
        id
    }

    fn token_reply(&mut self, user_id: &str) -> Reply {
        match self.issue(user_id) {
            Some(session) => (
                200,
                json!({
                    "access_token": session.access_token,
                    "token_type": "bearer",
                    "expires_in": TOKEN_LIFETIME,
                    "expires_at": session.expires_at,
                    "refresh_token": session.refresh_token,
                    "user": session.user,
                }),
            ),
            None => message(500, "user vanished"),
        }
    }

    fn token(&mut self, grant: Option<&str>, body: &Value) -> Reply {
        let field = |key: &str| body.get(key).and_then(Value::as_str).unwrap_or_default();
        match grant {
            Some("password") => {
                let found = self
                    .users
                    .iter()
                    .find(|u| u.email == field("email") && u.password == field("password"))
                    .map(|u| u.id.clone());
                match found {
                    Some(id) => self.token_reply(&id),
                    None => (
                        400,
                        json!({
                            "error": "invalid_grant",
                            "error_description": "Invalid login credentials"
                        }),
                    ),
                }
            }
            Some("refresh_token") => match self.refresh.remove(field("refresh_token")) {
                Some(id) => self.token_reply(&id),
                None => (400, json!({ "error_description": "Invalid Refresh Token" })),
            },
            _ => (400, json!({ "error_description": "unsupported grant type" })),
        }
    }

    fn signup(&mut self, body: &Value) -> Reply {
        let email = body.get("email").and_then(Value::as_str).unwrap_or_default();
        let password = body.get("password").and_then(Value::as_str).unwrap_or_default();
        if self.users.iter().any(|u| u.email == email) {
            return (422, json!({ "msg": "User already registered" }));
        }
        let id = self.add_user(email, password);
        self.token_reply(&id)
    }

    fn rest(
        &mut self,
        method: &Method,
        table: Table,
        query: &HashMap<String, String>,
        body: Value,
    ) -> Reply {
        let id = query
            .get("id")
            .and_then(|filter| filter.strip_prefix("eq."))
            .unwrap_or_default()
            .to_string();
        let outcome: Result<Reply, StoreError> = match method {
            Method::Get => self
                .store
                .select_all(table)
                .map(|rows| (200, Value::Array(rows.into_iter().map(Value::Object).collect()))),
            Method::Post => {
                let row = match body {
                    Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
                    other => other,
                };
                let Value::Object(row) = row else {
                    return message(400, "expected a JSON object");
                };
                self.store
                    .insert(table, row)
                    .map(|stored| (201, json!([stored])))
            }
            Method::Patch => {
                let Value::Object(patch) = body else {
                    return message(400, "expected a JSON object");
                };
                self.store
                    .update_by_id(table, &id, patch)
                    .map(|()| (204, Value::Null))
            }
            Method::Delete => self
                .store
                .delete_by_id(table, &id)
                .map(|()| (204, Value::Null)),
            _ => return message(405, "method not allowed"),
        };
        outcome.unwrap_or_else(|err| message(err.status.unwrap_or(500), &err.message))
    }

    fn generate(&self) -> Reply {
        match &self.ai_reply {
            Some(text) => (
                200,
                json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] }),
            ),
            None => (503, json!({ "error": { "message": "model unavailable" } })),
        }
    }
}

fn header(request: &Request, name: &'static str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|h| h.field.equiv(name))
        .map(|h| h.value.as_str().to_string())
}

fn table(name: &str) -> Option<Table> {
    match name {
        "collaborators" => Some(Table::Collaborators),
        "assets" => Some(Table::Assets),
        _ => None,
    }
}

fn route(state: &mut FakeState, request: &mut Request) -> Reply {
    let Ok(url) = Url::parse(&format!("http://fake{}", request.url())) else {
        return message(400, "bad request line");
    };
    let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
    let mut raw = String::new();
    if request.as_reader().read_to_string(&mut raw).is_err() {
        return message(400, "unreadable body");
    }
    let body: Value = serde_json::from_str(&raw).unwrap_or(Value::Null);
    let method = request.method().clone();
    state.log.push(format!("{method} {}", url.path()));

    if let Some(rest) = url.path().strip_prefix("/rest/v1/") {
        if header(request, "apikey").is_none() {
            return message(401, "No API key found in request");
        }
        let bearer = header(request, "Authorization")
            .and_then(|v| v.strip_prefix("Bearer ").map(str::to_string))
            .unwrap_or_default();
        if !state.access.contains_key(&bearer) {
            return message(401, "JWT expired");
        }
        return match table(rest) {
            Some(table) => state.rest(&method, table, &query, body),
            None => message(404, "relation does not exist"),
        };
    }

    match (&method, url.path()) {
        (Method::Post, "/auth/v1/token") => {
            state.token(query.get("grant_type").map(String::as_str), &body)
        }
        (Method::Post, "/auth/v1/signup") => state.signup(&body),
        (Method::Post, "/auth/v1/logout") => {
            if let Some(token) = header(request, "Authorization")
                .and_then(|v| v.strip_prefix("Bearer ").map(str::to_string))
            {
                state.access.remove(&token);
            }
            (204, Value::Null)
        }
        (Method::Post, path) if path.starts_with("/v1beta/models/") => state.generate(),
        _ => message(404, "not found"),
    }
}

fn lock(state: &Mutex<FakeState>) -> MutexGuard<'_, FakeState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn serve(state: &Mutex<FakeState>, mut request: Request) {
    let (status, body) = route(&mut lock(state), &mut request);
    let text = if body.is_null() {
        String::new()
    } else {
        body.to_string()
    };
    let mut response = Response::from_string(text).with_status_code(status);
    if let Ok(content_type) = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        response.add_header(content_type);
    }
    let _ = request.respond(response);
}

/// A running fake backend. Stops when dropped.
pub struct FakeBackend {
    url: String,
    state: Arc<Mutex<FakeState>>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for FakeBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeBackend").field("url", &self.url).finish_non_exhaustive()
    }
}

impl FakeBackend {
    /// Bind an ephemeral local port and serve `store`.
    ///
    /// # Errors
    ///
    /// Returns the bind failure.
    pub fn start(store: MemoryStore) -> io::Result<Self> {
        let server = Server::http("127.0.0.1:0").map_err(io::Error::other)?;
        let url = format!("http://{}", server.server_addr());
        let state = Arc::new(Mutex::new(FakeState {
            store,
            ..FakeState::default()
        }));
        let stop = Arc::new(AtomicBool::new(false));

        let handle = {
            let state = Arc::clone(&state);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    match server.recv_timeout(Duration::from_millis(50)) {
                        Ok(Some(request)) => serve(&state, request),
                        Ok(None) => {}
                        Err(_) => break,
                    }
                }
            })
        };

        Ok(Self {
            url,
            state,
            stop,
            handle: Some(handle),
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Register an account that can sign in with `email`/`password`.
    pub fn add_user(&self, email: &str, password: &str) -> String {
        lock(&self.state).add_user(email, password)
    }

    /// Issue a session for an existing account without a password exchange.
    #[must_use]
    pub fn session_for(&self, email: &str) -> Option<AuthSession> {
        let mut state = lock(&self.state);
        let id = state.users.iter().find(|u| u.email == email)?.id.clone();
        state.issue(&id)
    }

    /// Text returned by the AI route; `None` makes it fail with 503.
    pub fn set_ai_reply(&self, reply: Option<&str>) {
        lock(&self.state).ai_reply = reply.map(str::to_string);
    }

    /// Run `f` against the backing store, e.g. to inspect rows or inject
    /// failures.
    pub fn with_store<T>(&self, f: impl FnOnce(&MemoryStore) -> T) -> T {
        f(&lock(&self.state).store)
    }

    /// Rows of `table` as currently stored.
    #[must_use]
    pub fn rows(&self, table: Table) -> Vec<Row> {
        self.with_store(|store| store.rows(table).to_vec())
    }

    /// `METHOD /path` of every request served so far.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        lock(&self.state).log.clone()
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
