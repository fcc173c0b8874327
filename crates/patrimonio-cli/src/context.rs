//! Resolution of configuration, auth session and store for data commands.

use patrimonio_core::config::{self, EffectiveConfig, RemoteConfig};
use patrimonio_core::{ReconciledState, Session, SessionError};
use patrimonio_remote::{AuthClient, AuthError, AuthSession, GeminiClient, RestStore};

use crate::output::{CliError, OutputMode, fail, fail_code};

/// Load the effective configuration, rendering failures.
pub fn load_config(output: OutputMode) -> anyhow::Result<EffectiveConfig> {
    config::load().map_err(|err| fail_code(output, err.code(), err.to_string()))
}

/// Validated remote settings; refuses when the backend is not configured.
pub fn remote(config: &EffectiveConfig, output: OutputMode) -> anyhow::Result<RemoteConfig> {
    config
        .remote()
        .map_err(|err| fail_code(output, err.code(), err.to_string()))
}

pub fn auth_client(config: &EffectiveConfig, remote: &RemoteConfig) -> AuthClient {
    AuthClient::new(remote, config.admin_code.clone())
}

pub fn ai_client(config: &EffectiveConfig) -> GeminiClient {
    let client = GeminiClient::new(config.ai_api_key.clone(), config.ai_model.clone());
    match &config.ai_base_url {
        Some(url) => client.with_base_url(url.clone()),
        None => client,
    }
}

pub fn auth_failure(output: OutputMode, err: &AuthError) -> anyhow::Error {
    fail_code(output, err.code(), err.to_string())
}

/// Restore the persisted auth session, refreshing it when expired.
pub fn signed_in(
    config: &EffectiveConfig,
    remote: &RemoteConfig,
    output: OutputMode,
) -> anyhow::Result<AuthSession> {
    let client = auth_client(config, remote);
    match client.restore(&config.session_path()) {
        Ok(Some(session)) => Ok(session),
        Ok(None) => Err(auth_failure(output, &AuthError::NotSignedIn)),
        Err(err) => Err(auth_failure(output, &err)),
    }
}

/// Everything a data command needs: a reconciled session over the signed-in
/// store.
pub struct DataContext {
    pub config: EffectiveConfig,
    pub session: Session<RestStore>,
}

impl DataContext {
    /// Configuration, then auth, then the initial reload.
    pub fn open(output: OutputMode) -> anyhow::Result<Self> {
        let config = load_config(output)?;
        let remote = remote(&config, output)?;
        let auth = signed_in(&config, &remote, output)?;
        let store = RestStore::new(&remote, Some(&auth.access_token));
        let session = Session::open(store).map_err(|err| session_failure(output, &err))?;
        Ok(Self { config, session })
    }

    pub const fn state(&self) -> &ReconciledState {
        self.session.state()
    }
}

pub fn session_failure(output: OutputMode, err: &SessionError) -> anyhow::Error {
    fail_code(output, err.code(), err.to_string())
}

/// Like [`session_failure`], for mutations: a read error here means the
/// write went through but the follow-up reload did not.
pub fn mutation_failure(output: OutputMode, err: &SessionError) -> anyhow::Error {
    let error = CliError::from_code(err.code(), err.to_string());
    if matches!(err, SessionError::Read { .. }) {
        return fail(
            output,
            error.with_suggestion("The change was saved but the view could not be refreshed; run the command again."),
        );
    }
    fail(output, error)
}
