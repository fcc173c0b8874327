//! Spreadsheet export of the global asset list.

use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::ErrorCode;
use crate::projection::AssetListing;

/// File name used when the caller gives no output path.
pub const DEFAULT_EXPORT_FILE: &str = "patrimonios.csv";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write spreadsheet: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to create {path}: {source}")]
    Create {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl ExportError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::ExportFailed
    }
}

#[derive(Debug, Serialize)]
struct ExportRecord<'a> {
    #[serde(rename = "Tag")]
    asset_tag: &'a str,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Category")]
    category: &'a str,
    #[serde(rename = "Description")]
    description: &'a str,
    #[serde(rename = "Acquired")]
    acquisition_date: String,
    #[serde(rename = "Status")]
    status: String,
    #[serde(rename = "Owner")]
    owner: &'a str,
}

impl<'a> From<&AssetListing<'a>> for ExportRecord<'a> {
    fn from(listing: &AssetListing<'a>) -> Self {
        let asset = listing.asset;
        Self {
            asset_tag: &asset.asset_tag,
            name: &asset.name,
            category: &asset.category,
            description: &asset.description,
            acquisition_date: asset
                .acquisition_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            status: asset.status.to_string(),
            owner: listing.owner_label,
        }
    }
}

/// Write one header row and one row per listing. Returns the row count.
///
/// # Errors
///
/// Returns [`ExportError::Csv`] if serialization or the writer fails.
pub fn write_csv<W: Write>(listings: &[AssetListing<'_>], writer: W) -> Result<usize, ExportError> {
    let mut out = csv::Writer::from_writer(writer);
    for listing in listings {
        out.serialize(ExportRecord::from(listing))?;
    }
    out.flush().map_err(csv::Error::from)?;
    Ok(listings.len())
}

/// Export to a file at `path`, replacing it if present.
///
/// # Errors
///
/// Returns [`ExportError::Create`] if the file cannot be created, or
/// [`ExportError::Csv`] if writing fails.
pub fn export_to_path(listings: &[AssetListing<'_>], path: &Path) -> Result<usize, ExportError> {
    let file = File::create(path).map_err(|source| ExportError::Create {
        path: path.display().to_string(),
        source,
    })?;
    let rows = write_csv(listings, BufWriter::new(file))?;
    tracing::info!(rows, path = %path.display(), "exported assets");
    Ok(rows)
}
