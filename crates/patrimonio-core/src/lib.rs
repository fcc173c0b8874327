//! patrimonio-core library.
//!
//! Collaborators own assets; assets without an owner sit in the unassigned
//! pool. The remote store is the source of truth and the local view is
//! rebuilt wholesale after every successful write.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums, each mapping to an
//!   [`error::ErrorCode`].
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod config;
pub mod error;
pub mod export;
pub mod mapper;
pub mod model;
pub mod projection;
pub mod reconcile;
pub mod store;

pub use config::{ConfigError, EffectiveConfig, RemoteConfig};
pub use export::ExportError;
pub use model::{Asset, AssetFields, AssetStatus, AssetSuggestion, Collaborator, ValueTier};
pub use reconcile::{ReconciledState, Session, SessionError};
pub use store::{MemoryStore, RemoteStore, Row, StoreError, Table};
