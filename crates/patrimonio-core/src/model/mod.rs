//! Local entity shapes.

pub mod asset;
pub mod collaborator;
pub mod suggestion;

pub use asset::{Asset, AssetFields, AssetStatus};
pub use collaborator::Collaborator;
pub use suggestion::{AssetSuggestion, ValueTier};

use std::fmt;

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

pub(crate) fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase()
}
