use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::{ParseEnumError, normalize};

/// Rough value estimate returned by the suggestion service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueTier {
    #[default]
    Low,
    Medium,
    High,
}

impl ValueTier {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for ValueTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueTier {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ParseEnumError {
                expected: "value tier",
                got: s.to_string(),
            }),
        }
    }
}

/// Field suggestion for a new asset, derived from its free-text name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSuggestion {
    pub category: String,
    pub suggested_description: String,
    pub estimated_value_tier: ValueTier,
}

impl AssetSuggestion {
    /// What callers get when the suggestion service is unavailable.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            category: "Other".to_string(),
            suggested_description: "Description not generated automatically.".to_string(),
            estimated_value_tier: ValueTier::Low,
        }
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        *self == Self::fallback()
    }
}
