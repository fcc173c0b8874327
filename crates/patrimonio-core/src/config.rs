//! User configuration: `{config_dir}/patrimonio/config.toml` plus environment.
//!
//! Resolution order for every setting is environment variable, then config
//! file, then built-in default.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ErrorCode;

pub const CONFIG_DIR_ENV: &str = "PATRIMONIO_CONFIG_DIR";
pub const URL_ENV: &str = "PATRIMONIO_URL";
pub const ANON_KEY_ENV: &str = "PATRIMONIO_ANON_KEY";
pub const AI_KEY_ENV: &str = "GEMINI_API_KEY";
pub const AI_URL_ENV: &str = "PATRIMONIO_AI_URL";
pub const ADMIN_CODE_ENV: &str = "PATRIMONIO_ADMIN_CODE";

pub const CONFIG_FILE: &str = "config.toml";
pub const SESSION_FILE: &str = "session.json";
pub const DEFAULT_AI_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("remote store is not configured (missing {})", missing.join(", "))]
    NotConfigured { missing: Vec<&'static str> },

    #[error("invalid remote URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not determine a configuration directory; set {CONFIG_DIR_ENV}")]
    NoConfigDir,
}

impl ConfigError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotConfigured { .. } => ErrorCode::NotConfigured,
            Self::InvalidUrl { .. } => ErrorCode::InvalidRemoteUrl,
            Self::Parse { .. } => ErrorCode::ConfigParseError,
            Self::Serialize(_) | Self::Io { .. } | Self::NoConfigDir => {
                ErrorCode::InternalUnexpected
            }
        }
    }

    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// File model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub remote: RemoteSection,
    #[serde(default)]
    pub ai: AiSection,
    #[serde(default)]
    pub auth: AuthSection,
    #[serde(default)]
    pub user: UserSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anon_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Alternate API endpoint, for proxies and tests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSection {
    /// `pretty`, `text` or `json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Environment reader, injectable for tests.
pub trait EnvReader {
    fn get(&self, key: &str) -> Option<String>;
}

/// Process environment. Empty values count as unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealEnv;

impl EnvReader for RealEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.trim().is_empty())
    }
}

/// Directory holding the config file and the persisted auth session.
///
/// # Errors
///
/// [`ConfigError::NoConfigDir`] when neither the override variable nor a
/// platform config directory is available.
pub fn config_dir_with(env: &dyn EnvReader) -> Result<PathBuf, ConfigError> {
    if let Some(dir) = env.get(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    dirs::config_dir()
        .map(|base| base.join("patrimonio"))
        .ok_or(ConfigError::NoConfigDir)
}

/// # Errors
///
/// See [`config_dir_with`].
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    config_dir_with(&RealEnv)
}

/// Read `config.toml` from `dir`. A missing file is an empty config.
///
/// # Errors
///
/// [`ConfigError::Io`] if the file exists but cannot be read,
/// [`ConfigError::Parse`] if it is not valid TOML for [`FileConfig`].
pub fn load_file(dir: &Path) -> Result<FileConfig, ConfigError> {
    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::io(&path, e))?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Write `config` to `dir/config.toml`, creating `dir` if needed.
///
/// # Errors
///
/// [`ConfigError::Io`] or [`ConfigError::Serialize`].
pub fn write_file(dir: &Path, config: &FileConfig) -> Result<PathBuf, ConfigError> {
    std::fs::create_dir_all(dir).map_err(|e| ConfigError::io(dir, e))?;
    let path = dir.join(CONFIG_FILE);
    let content = toml::to_string_pretty(config)?;
    std::fs::write(&path, content).map_err(|e| ConfigError::io(&path, e))?;
    Ok(path)
}

/// Check that `raw` is an absolute `http`/`https` URL with a host and return
/// it without a trailing slash.
///
/// # Errors
///
/// [`ConfigError::InvalidUrl`].
pub fn validate_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    let invalid = |reason: &str| ConfigError::InvalidUrl {
        url: trimmed.to_string(),
        reason: reason.to_string(),
    };
    let parsed = Url::parse(trimmed).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host"));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

/// Heuristic for a privileged service-role JWT pasted where the public anon
/// key belongs.
#[must_use]
pub fn looks_like_service_role_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    key.starts_with("eyJ") && key.len() > 200 && !lower.contains("anon") && !lower.contains("public")
}

/// First four characters followed by a fixed mask.
#[must_use]
pub fn mask_secret(secret: &str) -> String {
    if secret.chars().count() <= 8 {
        return "****".to_string();
    }
    let head: String = secret.chars().take(4).collect();
    format!("{head}****")
}

// ---------------------------------------------------------------------------
// Effective configuration
// ---------------------------------------------------------------------------

/// Connection settings for the hosted store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub url: String,
    pub anon_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub dir: PathBuf,
    pub url: Option<String>,
    pub anon_key: Option<String>,
    pub ai_api_key: Option<String>,
    pub ai_model: String,
    pub ai_base_url: Option<String>,
    pub admin_code: Option<String>,
    pub output: Option<String>,
}

/// Secret-free rendering of [`EffectiveConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigReport {
    pub config_dir: String,
    pub url: Option<String>,
    pub anon_key: Option<String>,
    pub ai_api_key: Option<String>,
    pub ai_model: String,
    pub ai_base_url: Option<String>,
    pub admin_code: Option<String>,
    pub output: Option<String>,
}

impl EffectiveConfig {
    /// Remote settings, validated.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NotConfigured`] listing what is missing, or
    /// [`ConfigError::InvalidUrl`].
    pub fn remote(&self) -> Result<RemoteConfig, ConfigError> {
        let mut missing = Vec::new();
        if self.url.is_none() {
            missing.push("url");
        }
        if self.anon_key.is_none() {
            missing.push("anon_key");
        }
        match (&self.url, &self.anon_key) {
            (Some(url), Some(key)) => Ok(RemoteConfig {
                url: validate_url(url)?,
                anon_key: key.clone(),
            }),
            _ => Err(ConfigError::NotConfigured { missing }),
        }
    }

    #[must_use]
    pub fn session_path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    #[must_use]
    pub fn report(&self) -> ConfigReport {
        ConfigReport {
            config_dir: self.dir.display().to_string(),
            url: self.url.clone(),
            anon_key: self.anon_key.as_deref().map(mask_secret),
            ai_api_key: self.ai_api_key.as_deref().map(mask_secret),
            ai_model: self.ai_model.clone(),
            ai_base_url: self.ai_base_url.clone(),
            admin_code: self.admin_code.as_deref().map(mask_secret),
            output: self.output.clone(),
        }
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).cloned()
}

/// Merge environment over file values.
#[must_use]
pub fn resolve_with(dir: PathBuf, file: &FileConfig, env: &dyn EnvReader) -> EffectiveConfig {
    EffectiveConfig {
        dir,
        url: env.get(URL_ENV).or_else(|| non_empty(file.remote.url.as_ref())),
        anon_key: env
            .get(ANON_KEY_ENV)
            .or_else(|| non_empty(file.remote.anon_key.as_ref())),
        ai_api_key: env
            .get(AI_KEY_ENV)
            .or_else(|| non_empty(file.ai.api_key.as_ref())),
        ai_model: non_empty(file.ai.model.as_ref()).unwrap_or_else(|| DEFAULT_AI_MODEL.to_string()),
        ai_base_url: env
            .get(AI_URL_ENV)
            .or_else(|| non_empty(file.ai.base_url.as_ref())),
        admin_code: env
            .get(ADMIN_CODE_ENV)
            .or_else(|| non_empty(file.auth.admin_code.as_ref())),
        output: non_empty(file.user.output.as_ref()),
    }
}

/// Load the effective configuration from the process environment and the
/// config file.
///
/// # Errors
///
/// See [`config_dir_with`] and [`load_file`].
pub fn load() -> Result<EffectiveConfig, ConfigError> {
    let dir = config_dir()?;
    let file = load_file(&dir)?;
    Ok(resolve_with(dir, &file, &RealEnv))
}
