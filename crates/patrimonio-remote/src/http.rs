//! Shared ureq plumbing.

use serde_json::Value;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(30);

pub fn agent() -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout(TIMEOUT)
        .user_agent(concat!("patrimonio/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// A failed request, flattened to what callers report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub status: Option<u16>,
    pub message: String,
}

/// Pull a human-readable message out of an error body.
///
/// PostgREST uses `message`; GoTrue uses `msg` or `error_description`
/// depending on version.
pub fn server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "msg", "error_description", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .filter(|msg| !msg.trim().is_empty())
        .map(str::to_string)
}

pub fn failure(err: ureq::Error) -> Failure {
    match err {
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            let message = server_message(&body).unwrap_or_else(|| {
                let raw = body.trim();
                if raw.is_empty() {
                    format!("HTTP {status}")
                } else {
                    raw.to_string()
                }
            });
            Failure {
                status: Some(status),
                message,
            }
        }
        ureq::Error::Transport(transport) => Failure {
            status: None,
            message: transport.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_known_message_fields() {
        assert_eq!(
            server_message(r#"{"code":"23503","message":"violates foreign key"}"#).as_deref(),
            Some("violates foreign key")
        );
        assert_eq!(
            server_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#)
                .as_deref(),
            Some("Invalid login credentials")
        );
        assert_eq!(server_message(r#"{"msg":"Signups not allowed"}"#).as_deref(), Some("Signups not allowed"));
    }

    #[test]
    fn non_json_body_has_no_message() {
        assert_eq!(server_message("<html>bad gateway</html>"), None);
        assert_eq!(server_message(r#"{"message":""}"#), None);
    }
}
