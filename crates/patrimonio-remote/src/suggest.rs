//! AI assistance through the Gemini `generateContent` API.
//!
//! Nothing here returns an error to the caller: every failure is logged at
//! `warn` and replaced with a fixed fallback.

use patrimonio_core::{AssetSuggestion, ReconciledState};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::http;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub const AUDIT_EMPTY_FALLBACK: &str = "Could not generate the report.";
pub const AUDIT_ERROR_FALLBACK: &str =
    "Could not reach the AI service for the audit. Check the API key.";

const ASSET_SYSTEM: &str = "You are an IT asset management assistant. Return JSON only.";
const AUDIT_SYSTEM: &str =
    "Be formal and direct. Focus on who holds the most equipment.";

#[derive(Debug, thiserror::Error)]
enum SuggestError {
    #[error("no API key configured")]
    MissingKey,

    #[error("request failed: {0}")]
    Request(String),

    #[error("response carried no text")]
    Empty,

    #[error("malformed suggestion: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug)]
pub struct GeminiClient {
    agent: ureq::Agent,
    base: String,
    api_key: Option<String>,
    model: String,
}

fn asset_prompt(name: &str) -> String {
    format!(
        "Analyse the name of this IT/office equipment and suggest details for \
         registering it as an asset: \"{name}\"."
    )
}

fn asset_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "category": {
                "type": "STRING",
                "description": "Short category (e.g. Notebook, Monitor, Peripheral)"
            },
            "suggestedDescription": {
                "type": "STRING",
                "description": "Professional technical description based on the model name (max 20 words)."
            },
            "estimatedValueTier": {
                "type": "STRING",
                "enum": ["Low", "Medium", "High"],
                "description": "Estimated value of the item."
            }
        },
        "required": ["category", "suggestedDescription", "estimatedValueTier"]
    })
}

/// First candidate's concatenated text parts.
fn candidate_text(body: &Value) -> Option<String> {
    let parts = body
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    (!text.trim().is_empty()).then_some(text)
}

#[derive(Serialize)]
struct Holder<'a> {
    full_name: &'a str,
    username: &'a str,
    assets: Vec<&'a str>,
}

#[derive(Serialize)]
struct Distribution<'a> {
    collaborators: Vec<Holder<'a>>,
    unassigned: Vec<&'a str>,
}

/// JSON description of who holds what, fed to [`GeminiClient::audit_report`].
#[must_use]
pub fn distribution_summary(state: &ReconciledState) -> String {
    let distribution = Distribution {
        collaborators: state
            .collaborators
            .iter()
            .map(|c| Holder {
                full_name: &c.full_name,
                username: &c.username,
                assets: c.assets.iter().map(|a| a.name.as_str()).collect(),
            })
            .collect(),
        unassigned: state.unassigned.iter().map(|a| a.name.as_str()).collect(),
    };
    serde_json::to_string(&distribution).unwrap_or_default()
}

impl GeminiClient {
    #[must_use]
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            agent: http::agent(),
            base: GEMINI_BASE_URL.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.into(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base = base.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub const fn has_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn generate(&self, body: Value) -> Result<String, SuggestError> {
        let key = self.api_key.as_deref().ok_or(SuggestError::MissingKey)?;
        let url = format!("{}/v1beta/models/{}:generateContent", self.base, self.model);
        debug!(model = %self.model, "gemini request");
        let response = self
            .agent
            .post(&url)
            .set("x-goog-api-key", key)
            .send_json(body)
            .map_err(|err| SuggestError::Request(http::failure(err).message))?;
        let body: Value = response
            .into_json()
            .map_err(|e| SuggestError::Request(e.to_string()))?;
        candidate_text(&body).ok_or(SuggestError::Empty)
    }

    fn try_analyze(&self, name: &str) -> Result<AssetSuggestion, SuggestError> {
        let text = self.generate(json!({
            "systemInstruction": { "parts": [{ "text": ASSET_SYSTEM }] },
            "contents": [{ "role": "user", "parts": [{ "text": asset_prompt(name) }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": asset_schema()
            }
        }))?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Suggested category, description and value tier for an asset name.
    /// Returns [`AssetSuggestion::fallback`] on any failure.
    #[must_use]
    pub fn analyze_asset(&self, name: &str) -> AssetSuggestion {
        self.try_analyze(name).unwrap_or_else(|err| {
            warn!("asset analysis failed, using fallback: {err}");
            AssetSuggestion::fallback()
        })
    }

    /// Short formal audit of the asset distribution (see
    /// [`distribution_summary`]). Returns a fixed sentence on failure.
    #[must_use]
    pub fn audit_report(&self, distribution: &str) -> String {
        let prompt = format!(
            "Write a brief audit report (at most 2 paragraphs) on the asset \
             distribution described by this raw data: {distribution}"
        );
        let generated = self.generate(json!({
            "systemInstruction": { "parts": [{ "text": AUDIT_SYSTEM }] },
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }]
        }));
        match generated {
            Ok(text) => text,
            Err(SuggestError::Empty) => AUDIT_EMPTY_FALLBACK.to_string(),
            Err(err) => {
                warn!("audit report failed: {err}");
                AUDIT_ERROR_FALLBACK.to_string()
            }
        }
    }
}
