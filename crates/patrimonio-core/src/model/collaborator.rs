use serde::{Deserialize, Serialize};

use super::Asset;

/// A person responsible for zero or more assets.
///
/// `assets` is populated by joining the asset table at reload time; it is
/// never stored on the remote collaborator row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collaborator {
    pub id: String,
    pub full_name: String,
    pub username: String,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

impl Collaborator {
    #[must_use]
    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    #[must_use]
    pub fn owns(&self, asset_id: &str) -> bool {
        self.assets.iter().any(|asset| asset.id == asset_id)
    }
}
