//! In-process store with the same rules as the hosted schema.
//!
//! Rules mirrored from the remote schema:
//! - ids are generated by the store when a row arrives without one;
//! - `assets.collaborator_id` must reference an existing collaborator;
//! - deleting a collaborator deletes every asset that references it;
//! - update/delete of an unknown id is a no-op, not an error.
//!
//! Failures can be injected one-shot per operation for exercising the
//! reconciliation failure paths.

use serde_json::Value;
use std::cell::{Cell, RefCell};

use super::{RemoteStore, Row, StoreError, Table, id_string};

/// A store operation, used for failure injection and call accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Select(Table),
    Insert(Table),
    Update(Table),
    Delete(Table),
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    collaborators: Vec<Row>,
    assets: Vec<Row>,
    next_id: u64,
    failures: RefCell<Vec<(Operation, StoreError)>>,
    selects: Cell<usize>,
    writes: usize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row as-is, bypassing id generation and reference checks.
    pub fn seed(&mut self, table: Table, row: Row) {
        self.rows_mut(table).push(row);
    }

    /// Make the next `operation` fail with `message`.
    pub fn fail_next(&self, operation: Operation, message: impl Into<String>) {
        self.failures
            .borrow_mut()
            .push((operation, StoreError::with_status(500, message)));
    }

    #[must_use]
    pub fn rows(&self, table: Table) -> &[Row] {
        match table {
            Table::Collaborators => &self.collaborators,
            Table::Assets => &self.assets,
        }
    }

    /// Number of select calls served (including failed ones).
    #[must_use]
    pub fn select_calls(&self) -> usize {
        self.selects.get()
    }

    /// Number of write calls that reached the store (including failed ones).
    #[must_use]
    pub const fn write_calls(&self) -> usize {
        self.writes
    }

    fn rows_mut(&mut self, table: Table) -> &mut Vec<Row> {
        match table {
            Table::Collaborators => &mut self.collaborators,
            Table::Assets => &mut self.assets,
        }
    }

    fn take_failure(&self, operation: Operation) -> Result<(), StoreError> {
        let mut failures = self.failures.borrow_mut();
        match failures.iter().position(|(op, _)| *op == operation) {
            Some(index) => Err(failures.remove(index).1),
            None => Ok(()),
        }
    }

    fn position(&self, table: Table, id: &str) -> Option<usize> {
        self.rows(table)
            .iter()
            .position(|row| row.get("id").and_then(id_string).as_deref() == Some(id))
    }

    fn fresh_id(&mut self) -> String {
        loop {
            self.next_id += 1;
            let candidate = self.next_id.to_string();
            let taken = self.position(Table::Collaborators, &candidate).is_some()
                || self.position(Table::Assets, &candidate).is_some();
            if !taken {
                return candidate;
            }
        }
    }

    fn check_owner(&self, row: &Row) -> Result<(), StoreError> {
        let Some(owner) = row.get("collaborator_id").and_then(id_string) else {
            return Ok(());
        };
        if self.position(Table::Collaborators, &owner).is_some() {
            Ok(())
        } else {
            Err(StoreError::with_status(
                409,
                format!(
                    "insert or update on table \"assets\" violates foreign key constraint \
                     (collaborator_id={owner} is not present in table \"collaborators\")"
                ),
            ))
        }
    }
}

impl RemoteStore for MemoryStore {
    fn select_all(&self, table: Table) -> Result<Vec<Row>, StoreError> {
        self.selects.set(self.selects.get() + 1);
        self.take_failure(Operation::Select(table))?;
        Ok(self.rows(table).to_vec())
    }

    fn insert(&mut self, table: Table, mut row: Row) -> Result<Row, StoreError> {
        self.writes += 1;
        self.take_failure(Operation::Insert(table))?;
        if table == Table::Assets {
            self.check_owner(&row)?;
        }

        let id = match row.get("id").and_then(id_string) {
            Some(id) if self.position(table, &id).is_some() => {
                return Err(StoreError::with_status(
                    409,
                    format!("duplicate key value violates unique constraint \"{table}_pkey\""),
                ));
            }
            Some(id) => id,
            None => self.fresh_id(),
        };
        row.insert("id".to_string(), Value::String(id));
        self.rows_mut(table).push(row.clone());
        Ok(row)
    }

    fn update_by_id(&mut self, table: Table, id: &str, patch: Row) -> Result<(), StoreError> {
        self.writes += 1;
        self.take_failure(Operation::Update(table))?;
        if table == Table::Assets {
            self.check_owner(&patch)?;
        }

        let Some(index) = self.position(table, id) else {
            return Ok(());
        };
        let row = &mut self.rows_mut(table)[index];
        for (column, value) in patch {
            if column != "id" {
                row.insert(column, value);
            }
        }
        Ok(())
    }

    fn delete_by_id(&mut self, table: Table, id: &str) -> Result<(), StoreError> {
        self.writes += 1;
        self.take_failure(Operation::Delete(table))?;

        let Some(index) = self.position(table, id) else {
            return Ok(());
        };
        self.rows_mut(table).remove(index);

        if table == Table::Collaborators {
            self.assets.retain(|asset| {
                asset.get("collaborator_id").and_then(id_string).as_deref() != Some(id)
            });
        }
        Ok(())
    }
}
