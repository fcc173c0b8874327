//! The remote-store seam.
//!
//! The backend exposes two tables, `collaborators` and `assets`, and four
//! operations on them. Rows travel as JSON objects keyed by remote column
//! name; turning them into entities is the mapper's job.

mod memory;

pub use memory::{MemoryStore, Operation};

use serde_json::{Map, Value};
use std::fmt;

/// A raw remote row: column name to JSON value.
pub type Row = Map<String, Value>;

/// The two remote tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Collaborators,
    Assets,
}

impl Table {
    /// Remote table name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Collaborators => "collaborators",
            Self::Assets => "assets",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed remote operation, carrying the backend's human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct StoreError {
    pub message: String,
    /// HTTP status when the failure came from a response.
    pub status: Option<u16>,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
        }
    }
}

/// Select-all, insert-one, update-by-id and delete-by-id against a table.
///
/// Implementations own id generation and referential rules (including the
/// collaborator → asset delete cascade); callers never patch local state
/// from these results.
pub trait RemoteStore {
    /// Every row of `table`, in backend order.
    fn select_all(&self, table: Table) -> Result<Vec<Row>, StoreError>;

    /// Insert one row and return it as stored (with its generated id).
    fn insert(&mut self, table: Table, row: Row) -> Result<Row, StoreError>;

    /// Overwrite the given columns of the row with this id.
    fn update_by_id(&mut self, table: Table, id: &str, patch: Row) -> Result<(), StoreError>;

    /// Delete the row with this id.
    fn delete_by_id(&mut self, table: Table, id: &str) -> Result<(), StoreError>;
}

impl<S: RemoteStore + ?Sized> RemoteStore for &mut S {
    fn select_all(&self, table: Table) -> Result<Vec<Row>, StoreError> {
        (**self).select_all(table)
    }

    fn insert(&mut self, table: Table, row: Row) -> Result<Row, StoreError> {
        (**self).insert(table, row)
    }

    fn update_by_id(&mut self, table: Table, id: &str, patch: Row) -> Result<(), StoreError> {
        (**self).update_by_id(table, id, patch)
    }

    fn delete_by_id(&mut self, table: Table, id: &str) -> Result<(), StoreError> {
        (**self).delete_by_id(table, id)
    }
}

impl<S: RemoteStore + ?Sized> RemoteStore for Box<S> {
    fn select_all(&self, table: Table) -> Result<Vec<Row>, StoreError> {
        (**self).select_all(table)
    }

    fn insert(&mut self, table: Table, row: Row) -> Result<Row, StoreError> {
        (**self).insert(table, row)
    }

    fn update_by_id(&mut self, table: Table, id: &str, patch: Row) -> Result<(), StoreError> {
        (**self).update_by_id(table, id, patch)
    }

    fn delete_by_id(&mut self, table: Table, id: &str) -> Result<(), StoreError> {
        (**self).delete_by_id(table, id)
    }
}

/// Render a row id (string or number) as the opaque string form.
#[must_use]
pub fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
