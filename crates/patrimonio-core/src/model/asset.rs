use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::{ParseEnumError, normalize};

/// Whether an asset is in service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    #[default]
    Active,
    Deactivated,
}

impl AssetStatus {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Deactivated => "deactivated",
        }
    }

    /// Value stored in the remote `assets.status` column.
    #[must_use]
    pub const fn wire_str(self) -> &'static str {
        match self {
            Self::Active => "ativo",
            Self::Deactivated => "desativado",
        }
    }
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetStatus {
    type Err = ParseEnumError;

    /// Accepts both the local names and the remote column vocabulary.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "active" | "ativo" => Ok(Self::Active),
            "deactivated" | "inactive" | "desativado" => Ok(Self::Deactivated),
            _ => Err(ParseEnumError {
                expected: "status",
                got: s.to_string(),
            }),
        }
    }
}

/// The user-editable part of an asset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssetFields {
    pub asset_tag: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub acquisition_date: Option<NaiveDate>,
    pub status: AssetStatus,
}

impl AssetFields {
    /// Names of required fields that are blank.
    #[must_use]
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.asset_tag.trim().is_empty() {
            missing.push("asset_tag");
        }
        if self.category.trim().is_empty() {
            missing.push("category");
        }
        missing
    }
}

/// A tracked piece of equipment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub asset_tag: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub acquisition_date: Option<NaiveDate>,
    pub status: AssetStatus,
    pub collaborator_id: Option<String>,
}

impl Asset {
    #[must_use]
    pub fn is_assigned(&self) -> bool {
        self.collaborator_id.is_some()
    }

    /// Editable fields of this asset, for building an edit.
    #[must_use]
    pub fn fields(&self) -> AssetFields {
        AssetFields {
            asset_tag: self.asset_tag.clone(),
            name: self.name.clone(),
            category: self.category.clone(),
            description: self.description.clone(),
            acquisition_date: self.acquisition_date,
            status: self.status,
        }
    }

    /// Replace every editable field, keeping id and owner.
    pub fn apply(&mut self, fields: AssetFields) {
        self.asset_tag = fields.asset_tag;
        self.name = fields.name;
        self.category = fields.category;
        self.description = fields.description;
        self.acquisition_date = fields.acquisition_date;
        self.status = fields.status;
    }
}
