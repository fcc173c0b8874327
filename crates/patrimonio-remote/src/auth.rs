//! Password authentication against GoTrue, plus the persisted session file.

use chrono::Utc;
use patrimonio_core::config::RemoteConfig;
use patrimonio_core::error::ErrorCode;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::http::{self, Failure};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Lifetime assumed when the token response omits one.
const DEFAULT_EXPIRES_IN: i64 = 3600;
/// A token this close to expiry is treated as expired.
const EXPIRY_MARGIN_SECS: i64 = 30;
const GOTRUE_INVALID_CREDENTIALS: &str = "Invalid login credentials";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("incorrect email or password")]
    InvalidCredentials,

    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("sign-up is disabled: no administrative access code is configured")]
    SignupDisabled,

    #[error("invalid administrative access code")]
    WrongAdminCode,

    #[error("not signed in")]
    NotSignedIn,

    #[error("auth request failed: {message}")]
    Remote { status: Option<u16>, message: String },

    #[error("unexpected auth response: {0}")]
    Decode(String),

    #[error("failed to access session file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl AuthError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidCredentials | Self::Remote { status: Some(_), .. } => {
                ErrorCode::AuthRejected
            }
            Self::Remote { status: None, .. } => ErrorCode::RemoteReadFailed,
            Self::MissingField { .. } | Self::PasswordTooShort { .. } => ErrorCode::InvalidInput,
            Self::SignupDisabled | Self::WrongAdminCode => ErrorCode::SignupNotAllowed,
            Self::NotSignedIn => ErrorCode::NotAuthenticated,
            Self::Decode(_) | Self::Io { .. } => ErrorCode::InternalUnexpected,
        }
    }

    /// True when the server answered and refused, as opposed to the request
    /// never reaching it.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials | Self::Remote { status: Some(_), .. }
        )
    }

    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

impl From<Failure> for AuthError {
    fn from(failure: Failure) -> Self {
        if failure.message == GOTRUE_INVALID_CREDENTIALS {
            Self::InvalidCredentials
        } else {
            Self::Remote {
                status: failure.status,
                message: failure.message,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// A signed-in session as persisted between invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix seconds.
    pub expires_at: i64,
    pub user: AuthUser,
}

impl AuthSession {
    #[must_use]
    pub const fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at - EXPIRY_MARGIN_SECS <= now
    }

    fn from_token_response(body: &Value, now: i64) -> Result<Self, AuthError> {
        let access_token = body
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| AuthError::Decode("missing access_token".into()))?
            .to_string();
        let user: AuthUser = body
            .get("user")
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| AuthError::Decode(e.to_string()))?
            .ok_or_else(|| AuthError::Decode("missing user".into()))?;
        let expires_at = body.get("expires_at").and_then(Value::as_i64).unwrap_or_else(|| {
            now + body
                .get("expires_in")
                .and_then(Value::as_i64)
                .unwrap_or(DEFAULT_EXPIRES_IN)
        });
        Ok(Self {
            access_token,
            refresh_token: body
                .get("refresh_token")
                .and_then(Value::as_str)
                .map(str::to_string),
            expires_at,
            user,
        })
    }
}

/// Result of a sign-up request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignupOutcome {
    /// The project auto-confirms accounts; the user is signed in.
    SignedIn(AuthSession),
    /// A confirmation email was sent to this address.
    ConfirmationRequired { email: String },
}

// ---------------------------------------------------------------------------
// Session file
// ---------------------------------------------------------------------------

/// Read the persisted session. A missing file means no session.
///
/// # Errors
///
/// [`AuthError::Io`] on read failure, [`AuthError::Decode`] for a corrupt file.
pub fn load_session(path: &Path) -> Result<Option<AuthSession>, AuthError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).map_err(|e| AuthError::io(path, e))?;
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| AuthError::Decode(format!("{}: {e}", path.display())))
}

/// # Errors
///
/// [`AuthError::Io`] if the file or its directory cannot be written.
pub fn save_session(path: &Path, session: &AuthSession) -> Result<(), AuthError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| AuthError::io(parent, e))?;
    }
    let content =
        serde_json::to_string_pretty(session).map_err(|e| AuthError::Decode(e.to_string()))?;
    std::fs::write(path, content).map_err(|e| AuthError::io(path, e))
}

/// Remove the persisted session. Returns whether a file was removed.
///
/// # Errors
///
/// [`AuthError::Io`] if the file exists but cannot be removed.
pub fn clear_session(path: &Path) -> Result<bool, AuthError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(AuthError::io(path, e)),
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct AuthClient {
    agent: ureq::Agent,
    base: String,
    anon_key: String,
    admin_code: Option<String>,
}

impl std::fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClient")
            .field("base", &self.base)
            .field("signup_enabled", &self.admin_code.is_some())
            .finish_non_exhaustive()
    }
}

fn require(field: &'static str, value: &str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        Err(AuthError::MissingField { field })
    } else {
        Ok(())
    }
}

impl AuthClient {
    /// `admin_code` is the shared secret sign-up requests must present;
    /// `None` disables sign-up.
    #[must_use]
    pub fn new(remote: &RemoteConfig, admin_code: Option<String>) -> Self {
        Self {
            agent: http::agent(),
            base: remote.url.trim_end_matches('/').to_string(),
            anon_key: remote.anon_key.clone(),
            admin_code: admin_code.filter(|code| !code.is_empty()),
        }
    }

    fn post(&self, path: &str) -> ureq::Request {
        debug!(path, "gotrue request");
        self.agent
            .post(&format!("{}/auth/v1/{path}", self.base))
            .set("apikey", &self.anon_key)
            .set("Content-Type", "application/json")
    }

    fn token(&self, grant_type: &str, body: &Value) -> Result<AuthSession, AuthError> {
        let response = self
            .post("token")
            .query("grant_type", grant_type)
            .send_json(body.clone())
            .map_err(|err| AuthError::from(http::failure(err)))?;
        let body: Value = response
            .into_json()
            .map_err(|e| AuthError::Decode(e.to_string()))?;
        AuthSession::from_token_response(&body, Utc::now().timestamp())
    }

    /// # Errors
    ///
    /// [`AuthError::InvalidCredentials`] for a wrong email/password pair,
    /// [`AuthError::Remote`] for any other rejection or transport failure.
    pub fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        require("email", email)?;
        require("password", password)?;
        let session = self.token(
            "password",
            &json!({ "email": email.trim(), "password": password }),
        )?;
        info!(user = %session.user.id, "signed in");
        Ok(session)
    }

    /// Create an account. The admin code is checked locally before any
    /// network call.
    ///
    /// # Errors
    ///
    /// [`AuthError::SignupDisabled`] when no code is configured,
    /// [`AuthError::WrongAdminCode`], [`AuthError::PasswordTooShort`], or the
    /// server's rejection.
    pub fn signup(
        &self,
        email: &str,
        password: &str,
        admin_code: &str,
    ) -> Result<SignupOutcome, AuthError> {
        let Some(expected) = self.admin_code.as_deref() else {
            return Err(AuthError::SignupDisabled);
        };
        if admin_code != expected {
            warn!("sign-up attempted with a wrong admin code");
            return Err(AuthError::WrongAdminCode);
        }
        require("email", email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::PasswordTooShort {
                min: MIN_PASSWORD_LEN,
            });
        }

        let response = self
            .post("signup")
            .send_json(json!({ "email": email.trim(), "password": password }))
            .map_err(|err| AuthError::from(http::failure(err)))?;
        let body: Value = response
            .into_json()
            .map_err(|e| AuthError::Decode(e.to_string()))?;

        if body.get("access_token").is_some() {
            let session = AuthSession::from_token_response(&body, Utc::now().timestamp())?;
            info!(user = %session.user.id, "account created and signed in");
            Ok(SignupOutcome::SignedIn(session))
        } else {
            info!("account created; confirmation pending");
            Ok(SignupOutcome::ConfirmationRequired {
                email: email.trim().to_string(),
            })
        }
    }

    /// Exchange a refresh token for a new session.
    ///
    /// # Errors
    ///
    /// [`AuthError::Remote`] if the token is rejected.
    pub fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        self.token("refresh_token", &json!({ "refresh_token": refresh_token }))
    }

    /// Revoke the session server-side. Failures are logged, not returned.
    pub fn logout(&self, session: &AuthSession) {
        let revoked = self
            .post("logout")
            .set("Authorization", &format!("Bearer {}", session.access_token))
            .call();
        if let Err(err) = revoked {
            warn!("server-side logout failed: {}", http::failure(err).message);
        }
    }

    /// Load the persisted session, refreshing it if it has expired.
    ///
    /// An expired session whose refresh the server rejects is deleted and
    /// `None` is returned. When the server cannot be reached the file is kept.
    ///
    /// # Errors
    ///
    /// Session file I/O or decode failures, or [`AuthError::Remote`] without
    /// a status when the refresh request never got an answer.
    pub fn restore(&self, path: &Path) -> Result<Option<AuthSession>, AuthError> {
        let Some(session) = load_session(path)? else {
            return Ok(None);
        };
        if !session.is_expired_at(Utc::now().timestamp()) {
            return Ok(Some(session));
        }

        let refreshed = session
            .refresh_token
            .as_deref()
            .map(|token| self.refresh(token));
        match refreshed {
            Some(Ok(fresh)) => {
                save_session(path, &fresh)?;
                debug!(user = %fresh.user.id, "session refreshed");
                Ok(Some(fresh))
            }
            Some(Err(err)) if err.is_rejection() => {
                warn!("session refresh rejected: {err}");
                clear_session(path)?;
                Ok(None)
            }
            Some(Err(err)) => {
                warn!("session refresh failed, keeping the saved session: {err}");
                Err(err)
            }
            None => {
                clear_session(path)?;
                Ok(None)
            }
        }
    }
}
