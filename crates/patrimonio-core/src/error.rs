use std::fmt;

/// Machine-readable error codes for scripted callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotConfigured,
    ConfigParseError,
    InvalidRemoteUrl,
    NotAuthenticated,
    AuthRejected,
    SignupNotAllowed,
    CollaboratorNotFound,
    AssetNotFound,
    InvalidInput,
    RemoteReadFailed,
    RemoteWriteFailed,
    ExportFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotConfigured => "E1001",
            Self::ConfigParseError => "E1002",
            Self::InvalidRemoteUrl => "E1003",
            Self::NotAuthenticated => "E1101",
            Self::AuthRejected => "E1102",
            Self::SignupNotAllowed => "E1103",
            Self::CollaboratorNotFound => "E2001",
            Self::AssetNotFound => "E2002",
            Self::InvalidInput => "E2003",
            Self::RemoteReadFailed => "E3001",
            Self::RemoteWriteFailed => "E3002",
            Self::ExportFailed => "E5001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotConfigured => "Remote backend not configured",
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidRemoteUrl => "Invalid remote URL",
            Self::NotAuthenticated => "Not logged in",
            Self::AuthRejected => "Authentication rejected",
            Self::SignupNotAllowed => "Account creation not allowed",
            Self::CollaboratorNotFound => "Collaborator not found",
            Self::AssetNotFound => "Asset not found",
            Self::InvalidInput => "Invalid input",
            Self::RemoteReadFailed => "Remote read failed",
            Self::RemoteWriteFailed => "Remote write failed",
            Self::ExportFailed => "Export failed",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint for the operator.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotConfigured => Some("Run `pt setup --url <URL> --key <ANON_KEY>`."),
            Self::ConfigParseError => Some("Fix syntax in the patrimonio config.toml and retry."),
            Self::InvalidRemoteUrl => Some("Use an http:// or https:// project URL."),
            Self::NotAuthenticated => Some("Run `pt login --email <EMAIL> --password <PASSWORD>`."),
            Self::AuthRejected => Some("Check the email and password and retry."),
            Self::SignupNotAllowed => Some("Ask an administrator for the admin code."),
            Self::CollaboratorNotFound => Some("Run `pt collaborator list` to see valid ids."),
            Self::AssetNotFound => Some("Run `pt asset list` to see valid ids."),
            Self::InvalidInput => None,
            Self::RemoteReadFailed => {
                Some("Check connectivity and row-level security policies, then retry.")
            }
            Self::RemoteWriteFailed => {
                Some("Nothing was changed locally. Check the message and retry.")
            }
            Self::ExportFailed => Some("Check the output path and write permissions."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
