//! Translation between remote rows and local entities.
//!
//! Inbound mapping never fails: a missing or malformed column is replaced by
//! its documented default (empty text, no date, `Active`, unassigned).

use chrono::{DateTime, NaiveDate};
use serde_json::Value;
use std::collections::HashSet;

use crate::model::{Asset, AssetFields, AssetStatus, Collaborator};
use crate::store::{Row, id_string};

/// Date format used by the remote `acquisition_date` column.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Local view rebuilt from one pair of table reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapped {
    pub collaborators: Vec<Collaborator>,
    pub unassigned: Vec<Asset>,
}

fn text(row: &Row, column: &str) -> String {
    match row.get(column) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn optional_id(row: &Row, column: &str) -> Option<String> {
    row.get(column)
        .and_then(id_string)
        .filter(|id| !id.is_empty())
}

fn date(row: &Row, column: &str) -> Option<NaiveDate> {
    let raw = row.get(column)?.as_str()?.trim();
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|ts| ts.date_naive()))
}

fn status(row: &Row) -> AssetStatus {
    row.get("status")
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse().ok())
        .unwrap_or_default()
}

#[must_use]
pub fn asset_from_row(row: &Row) -> Asset {
    Asset {
        id: optional_id(row, "id").unwrap_or_default(),
        asset_tag: text(row, "asset_tag"),
        name: text(row, "name"),
        category: text(row, "category"),
        description: text(row, "description"),
        acquisition_date: date(row, "acquisition_date"),
        status: status(row),
        collaborator_id: optional_id(row, "collaborator_id"),
    }
}

#[must_use]
pub fn collaborator_from_row(row: &Row) -> Collaborator {
    Collaborator {
        id: optional_id(row, "id").unwrap_or_default(),
        full_name: text(row, "full_name"),
        username: text(row, "username"),
        assets: Vec::new(),
    }
}

/// Build the local view from the two row sets.
///
/// Every asset lands in exactly one place: the asset list of the
/// collaborator it references, or the unassigned pool. An asset whose
/// owner is absent from `collaborator_rows` goes to the unassigned pool with
/// its owner cleared.
#[must_use]
pub fn map_rows(collaborator_rows: &[Row], asset_rows: &[Row]) -> Mapped {
    let mut collaborators: Vec<Collaborator> =
        collaborator_rows.iter().map(collaborator_from_row).collect();
    let known: HashSet<String> = collaborators.iter().map(|c| c.id.clone()).collect();

    let mut unassigned = Vec::new();
    let mut assigned = Vec::new();
    for mut asset in asset_rows.iter().map(asset_from_row) {
        match asset.collaborator_id.take() {
            Some(owner) if known.contains(&owner) => {
                asset.collaborator_id = Some(owner);
                assigned.push(asset);
            }
            Some(owner) => {
                tracing::warn!(
                    asset_id = %asset.id,
                    collaborator_id = %owner,
                    "asset references a collaborator that was not fetched; listing as unassigned"
                );
                unassigned.push(asset);
            }
            None => unassigned.push(asset),
        }
    }

    for collaborator in &mut collaborators {
        collaborator.assets = assigned
            .iter()
            .filter(|asset| asset.collaborator_id.as_deref() == Some(collaborator.id.as_str()))
            .cloned()
            .collect();
    }

    Mapped {
        collaborators,
        unassigned,
    }
}

fn owner_value(owner: Option<&str>) -> Value {
    owner.map_or(Value::Null, |id| Value::String(id.to_string()))
}

/// Row for inserting a collaborator.
#[must_use]
pub fn collaborator_row(full_name: &str, username: &str) -> Row {
    let mut row = Row::new();
    row.insert("full_name".into(), Value::String(full_name.to_string()));
    row.insert("username".into(), Value::String(username.to_string()));
    row
}

/// Editable columns of an asset. The owner column is left out.
#[must_use]
pub fn asset_fields_patch(fields: &AssetFields) -> Row {
    let mut row = Row::new();
    row.insert("asset_tag".into(), Value::String(fields.asset_tag.clone()));
    row.insert("name".into(), Value::String(fields.name.clone()));
    row.insert("category".into(), Value::String(fields.category.clone()));
    row.insert("description".into(), Value::String(fields.description.clone()));
    row.insert(
        "acquisition_date".into(),
        fields
            .acquisition_date
            .map_or(Value::Null, |d| Value::String(d.format(DATE_FORMAT).to_string())),
    );
    row.insert(
        "status".into(),
        Value::String(fields.status.wire_str().to_string()),
    );
    row
}

/// Full column set of a new asset.
#[must_use]
pub fn asset_row(fields: &AssetFields, owner: Option<&str>) -> Row {
    let mut row = asset_fields_patch(fields);
    row.insert("collaborator_id".into(), owner_value(owner));
    row
}

/// Patch that only moves an asset to a new owner (or to no owner).
#[must_use]
pub fn ownership_patch(owner: Option<&str>) -> Row {
    let mut row = Row::new();
    row.insert("collaborator_id".into(), owner_value(owner));
    row
}
