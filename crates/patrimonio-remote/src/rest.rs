//! [`RemoteStore`] over PostgREST.

use patrimonio_core::config::RemoteConfig;
use patrimonio_core::{RemoteStore, Row, StoreError, Table};
use serde_json::Value;
use std::cell::Cell;
use tracing::debug;

use crate::http::{self, Failure};

pub struct RestStore {
    agent: ureq::Agent,
    base: String,
    anon_key: String,
    bearer: String,
    requests: Cell<usize>,
}

impl std::fmt::Debug for RestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestStore")
            .field("base", &self.base)
            .field("requests", &self.requests.get())
            .finish_non_exhaustive()
    }
}

fn store_error(failure: Failure) -> StoreError {
    StoreError {
        message: failure.message,
        status: failure.status,
    }
}

fn into_rows(value: Value) -> Result<Vec<Row>, StoreError> {
    match value {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(row) => Some(row),
                _ => None,
            })
            .collect()),
        other => Err(StoreError::new(format!(
            "expected a JSON array of rows, got {other}"
        ))),
    }
}

impl RestStore {
    /// Store acting as the signed-in user. Without `access_token` requests
    /// go out with the anon key only.
    #[must_use]
    pub fn new(remote: &RemoteConfig, access_token: Option<&str>) -> Self {
        Self {
            agent: http::agent(),
            base: remote.url.trim_end_matches('/').to_string(),
            anon_key: remote.anon_key.clone(),
            bearer: access_token.unwrap_or(&remote.anon_key).to_string(),
            requests: Cell::new(0),
        }
    }

    /// Requests issued so far.
    #[must_use]
    pub fn requests(&self) -> usize {
        self.requests.get()
    }

    fn endpoint(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base, table.as_str())
    }

    fn request(&self, method: &str, table: Table) -> ureq::Request {
        self.requests.set(self.requests.get() + 1);
        debug!(method, table = %table, "postgrest request");
        self.agent
            .request(method, &self.endpoint(table))
            .set("apikey", &self.anon_key)
            .set("Authorization", &format!("Bearer {}", self.bearer))
            .set("Accept", "application/json")
    }

    fn by_id(&self, method: &str, table: Table, id: &str) -> ureq::Request {
        self.request(method, table).query("id", &format!("eq.{id}"))
    }
}

impl RemoteStore for RestStore {
    fn select_all(&self, table: Table) -> Result<Vec<Row>, StoreError> {
        let response = self
            .request("GET", table)
            .query("select", "*")
            .call()
            .map_err(|err| store_error(http::failure(err)))?;
        let body: Value = response
            .into_json()
            .map_err(|err| StoreError::new(format!("failed to decode {table} rows: {err}")))?;
        into_rows(body)
    }

    fn insert(&mut self, table: Table, row: Row) -> Result<Row, StoreError> {
        let response = self
            .request("POST", table)
            .set("Prefer", "return=representation")
            .send_json(Value::Array(vec![Value::Object(row)]))
            .map_err(|err| store_error(http::failure(err)))?;
        let body: Value = response
            .into_json()
            .map_err(|err| StoreError::new(format!("failed to decode inserted row: {err}")))?;
        into_rows(body)?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::new(format!("insert into {table} returned no row")))
    }

    fn update_by_id(&mut self, table: Table, id: &str, patch: Row) -> Result<(), StoreError> {
        self.by_id("PATCH", table, id)
            .set("Prefer", "return=minimal")
            .send_json(Value::Object(patch))
            .map_err(|err| store_error(http::failure(err)))?;
        Ok(())
    }

    fn delete_by_id(&mut self, table: Table, id: &str) -> Result<(), StoreError> {
        self.by_id("DELETE", table, id)
            .call()
            .map_err(|err| store_error(http::failure(err)))?;
        Ok(())
    }
}
