//! Reconciliation of the local view with the remote store.
//!
//! # Contract
//!
//! - [`Session::reload`] reads `collaborators`, then `assets`, and replaces
//!   the whole local state. A failed read leaves the previous state intact.
//! - Every mutation issues exactly one remote write. On success it reloads;
//!   on failure it returns the error and does not touch local state.
//! - Preconditions (non-empty fields, ids known locally) are checked before
//!   any remote call.
//!
//! Local state is never patched in place: a reload is the only way it
//! changes, so a successful write can never leave the view diverged from
//! the store.

use tracing::{debug, info, warn};

use crate::error::ErrorCode;
use crate::mapper::{self, Mapped};
use crate::model::{Asset, AssetFields, Collaborator};
use crate::store::{RemoteStore, StoreError, Table, id_string};

/// The reconciled local view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciledState {
    pub collaborators: Vec<Collaborator>,
    pub unassigned: Vec<Asset>,
}

impl From<Mapped> for ReconciledState {
    fn from(mapped: Mapped) -> Self {
        Self {
            collaborators: mapped.collaborators,
            unassigned: mapped.unassigned,
        }
    }
}

impl ReconciledState {
    #[must_use]
    pub fn collaborator(&self, id: &str) -> Option<&Collaborator> {
        self.collaborators.iter().find(|c| c.id == id)
    }

    /// Find an asset in either pool.
    #[must_use]
    pub fn asset(&self, id: &str) -> Option<&Asset> {
        self.collaborators
            .iter()
            .flat_map(|c| c.assets.iter())
            .chain(self.unassigned.iter())
            .find(|a| a.id == id)
    }

    #[must_use]
    pub fn assigned_count(&self) -> usize {
        self.collaborators.iter().map(Collaborator::asset_count).sum()
    }

    #[must_use]
    pub fn asset_count(&self) -> usize {
        self.assigned_count() + self.unassigned.len()
    }
}

/// Draft of the add-collaborator form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollaboratorForm {
    pub open: bool,
    pub full_name: String,
    pub username: String,
}

impl CollaboratorForm {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Presentation state that reacts to reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    /// Collaborator whose asset detail is expanded.
    pub expanded: Option<String>,
    pub collaborator_form: CollaboratorForm,
    /// True only while a reload is in flight.
    pub loading: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("missing required field(s): {}", fields.join(", "))]
    MissingFields { fields: Vec<&'static str> },

    #[error("collaborator not found: {id}")]
    CollaboratorNotFound { id: String },

    #[error("asset not found: {id}")]
    AssetNotFound { id: String },

    #[error("failed to load {table}: {source}")]
    Read {
        table: Table,
        #[source]
        source: StoreError,
    },

    #[error("failed to {action}: {source}")]
    Write {
        action: &'static str,
        #[source]
        source: StoreError,
    },
}

impl SessionError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MissingFields { .. } => ErrorCode::InvalidInput,
            Self::CollaboratorNotFound { .. } => ErrorCode::CollaboratorNotFound,
            Self::AssetNotFound { .. } => ErrorCode::AssetNotFound,
            Self::Read { .. } => ErrorCode::RemoteReadFailed,
            Self::Write { .. } => ErrorCode::RemoteWriteFailed,
        }
    }
}

/// Application state for one signed-in user: the store handle, the
/// reconciled view, and the view state around it.
#[derive(Debug)]
pub struct Session<S> {
    store: S,
    state: ReconciledState,
    view: ViewState,
    reloads: u64,
}

impl<S: RemoteStore> Session<S> {
    /// Empty session; call [`Session::reload`] to populate it.
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: ReconciledState::default(),
            view: ViewState::default(),
            reloads: 0,
        }
    }

    /// Create a session and perform the initial reload.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Read`] if either table cannot be read.
    pub fn open(store: S) -> Result<Self, SessionError> {
        let mut session = Self::new(store);
        session.reload()?;
        Ok(session)
    }

    #[must_use]
    pub const fn state(&self) -> &ReconciledState {
        &self.state
    }

    #[must_use]
    pub const fn view(&self) -> &ViewState {
        &self.view
    }

    pub const fn collaborator_form_mut(&mut self) -> &mut CollaboratorForm {
        &mut self.view.collaborator_form
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Number of successful reloads so far.
    #[must_use]
    pub const fn reload_count(&self) -> u64 {
        self.reloads
    }

    /// Re-read both tables and rebuild the local view from scratch.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Read`]; the previous state is kept and the
    /// loading flag is cleared.
    pub fn reload(&mut self) -> Result<(), SessionError> {
        self.view.loading = true;
        let fetched = self.fetch();
        self.view.loading = false;

        let mapped = fetched.inspect_err(|err| warn!("reload failed: {err}"))?;
        self.state = ReconciledState::from(mapped);
        self.reloads += 1;

        if let Some(expanded) = self.view.expanded.as_deref()
            && self.state.collaborator(expanded).is_none()
        {
            self.view.expanded = None;
        }

        debug!(
            collaborators = self.state.collaborators.len(),
            assigned = self.state.assigned_count(),
            unassigned = self.state.unassigned.len(),
            "reloaded"
        );
        Ok(())
    }

    fn fetch(&self) -> Result<Mapped, SessionError> {
        let collaborators = self
            .store
            .select_all(Table::Collaborators)
            .map_err(|source| SessionError::Read {
                table: Table::Collaborators,
                source,
            })?;
        let assets = self
            .store
            .select_all(Table::Assets)
            .map_err(|source| SessionError::Read {
                table: Table::Assets,
                source,
            })?;
        Ok(mapper::map_rows(&collaborators, &assets))
    }

    /// Reload after a successful write; surface a failed one untouched.
    fn settle<T>(
        &mut self,
        action: &'static str,
        written: Result<T, StoreError>,
    ) -> Result<T, SessionError> {
        match written {
            Ok(value) => {
                info!("{action}: ok");
                self.reload()?;
                Ok(value)
            }
            Err(source) => {
                warn!("{action} failed: {source}");
                Err(SessionError::Write { action, source })
            }
        }
    }

    fn require_collaborator(&self, id: &str) -> Result<(), SessionError> {
        if self.state.collaborator(id).is_some() {
            Ok(())
        } else {
            Err(SessionError::CollaboratorNotFound { id: id.to_string() })
        }
    }

    fn require_asset(&self, id: &str) -> Result<(), SessionError> {
        if self.state.asset(id).is_some() {
            Ok(())
        } else {
            Err(SessionError::AssetNotFound { id: id.to_string() })
        }
    }

    fn require_owner(&self, owner: Option<&str>) -> Result<(), SessionError> {
        owner.map_or(Ok(()), |id| self.require_collaborator(id))
    }

    /// Insert a collaborator and return its id.
    ///
    /// # Errors
    ///
    /// [`SessionError::MissingFields`] for blank input, otherwise the write
    /// or follow-up reload failure.
    pub fn add_collaborator(
        &mut self,
        full_name: &str,
        username: &str,
    ) -> Result<String, SessionError> {
        let mut missing = Vec::new();
        if full_name.trim().is_empty() {
            missing.push("full_name");
        }
        if username.trim().is_empty() {
            missing.push("username");
        }
        if !missing.is_empty() {
            return Err(SessionError::MissingFields { fields: missing });
        }

        let written = self
            .store
            .insert(Table::Collaborators, mapper::collaborator_row(full_name, username));
        let row = self.settle("add collaborator", written)?;
        self.view.collaborator_form.clear();
        Ok(row.get("id").and_then(id_string).unwrap_or_default())
    }

    /// Submit the add-collaborator form draft.
    ///
    /// # Errors
    ///
    /// Same as [`Session::add_collaborator`]; the draft is kept on failure.
    pub fn submit_collaborator_form(&mut self) -> Result<String, SessionError> {
        let CollaboratorForm {
            full_name,
            username,
            ..
        } = self.view.collaborator_form.clone();
        self.add_collaborator(&full_name, &username)
    }

    /// Delete a collaborator. The store removes their assets with them.
    ///
    /// # Errors
    ///
    /// [`SessionError::CollaboratorNotFound`] if the id is not in the local
    /// view, otherwise the write or follow-up reload failure.
    pub fn delete_collaborator(&mut self, id: &str) -> Result<(), SessionError> {
        self.require_collaborator(id)?;
        let written = self.store.delete_by_id(Table::Collaborators, id);
        if written.is_ok() && self.view.expanded.as_deref() == Some(id) {
            self.view.expanded = None;
        }
        self.settle("delete collaborator", written)
    }

    /// Insert an asset owned by `owner` (or unassigned) and return its id.
    ///
    /// # Errors
    ///
    /// [`SessionError::MissingFields`] when name, tag or category is blank,
    /// [`SessionError::CollaboratorNotFound`] for an unknown owner, otherwise
    /// the write or follow-up reload failure.
    pub fn add_asset(
        &mut self,
        fields: &AssetFields,
        owner: Option<&str>,
    ) -> Result<String, SessionError> {
        let missing = fields.missing_required();
        if !missing.is_empty() {
            return Err(SessionError::MissingFields { fields: missing });
        }
        self.require_owner(owner)?;

        let written = self
            .store
            .insert(Table::Assets, mapper::asset_row(fields, owner));
        let row = self.settle("add asset", written)?;
        Ok(row.get("id").and_then(id_string).unwrap_or_default())
    }

    /// Overwrite every editable field of an existing asset with `asset`'s
    /// values. The owner is not written; see [`Session::transfer_asset`].
    ///
    /// # Errors
    ///
    /// [`SessionError::AssetNotFound`] if `asset.id` is unknown locally,
    /// [`SessionError::MissingFields`] when a required field is blank,
    /// otherwise the write or follow-up reload failure.
    pub fn edit_asset(&mut self, asset: &Asset) -> Result<(), SessionError> {
        self.require_asset(&asset.id)?;
        let fields = asset.fields();
        let missing = fields.missing_required();
        if !missing.is_empty() {
            return Err(SessionError::MissingFields { fields: missing });
        }

        let written = self.store.update_by_id(
            Table::Assets,
            &asset.id,
            mapper::asset_fields_patch(&fields),
        );
        self.settle("edit asset", written)
    }

    /// # Errors
    ///
    /// [`SessionError::AssetNotFound`] if the id is unknown locally,
    /// otherwise the write or follow-up reload failure.
    pub fn delete_asset(&mut self, id: &str) -> Result<(), SessionError> {
        self.require_asset(id)?;
        let written = self.store.delete_by_id(Table::Assets, id);
        self.settle("delete asset", written)
    }

    /// Move an asset to `new_owner`, or to the unassigned pool with `None`.
    ///
    /// # Errors
    ///
    /// [`SessionError::AssetNotFound`] / [`SessionError::CollaboratorNotFound`]
    /// for unknown ids, otherwise the write or follow-up reload failure.
    pub fn transfer_asset(
        &mut self,
        asset_id: &str,
        new_owner: Option<&str>,
    ) -> Result<(), SessionError> {
        self.require_asset(asset_id)?;
        self.require_owner(new_owner)?;
        let written = self.store.update_by_id(
            Table::Assets,
            asset_id,
            mapper::ownership_patch(new_owner),
        );
        self.settle("transfer asset", written)
    }

    /// Expand a collaborator's detail.
    ///
    /// # Errors
    ///
    /// [`SessionError::CollaboratorNotFound`] if the id is unknown locally.
    pub fn expand(&mut self, id: &str) -> Result<(), SessionError> {
        self.require_collaborator(id)?;
        self.view.expanded = Some(id.to_string());
        Ok(())
    }

    pub fn collapse(&mut self) {
        self.view.expanded = None;
    }

    /// Expand `id`, or collapse it when it is already expanded.
    ///
    /// # Errors
    ///
    /// [`SessionError::CollaboratorNotFound`] if the id is unknown locally.
    pub fn toggle_expanded(&mut self, id: &str) -> Result<(), SessionError> {
        if self.view.expanded.as_deref() == Some(id) {
            self.collapse();
            Ok(())
        } else {
            self.expand(id)
        }
    }
}
