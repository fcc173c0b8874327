//! HTTP collaborators for patrimonio.
//!
//! - [`rest::RestStore`]: [`patrimonio_core::RemoteStore`] over PostgREST.
//! - [`auth::AuthClient`]: password login, gated signup, session refresh.
//! - [`suggest::GeminiClient`]: AI asset suggestions and audit reports.
//!
//! With the `fake-backend` feature, [`fake::FakeBackend`] serves the same
//! routes from an in-process server backed by [`patrimonio_core::MemoryStore`].

pub mod auth;
mod http;
pub mod rest;
pub mod suggest;

#[cfg(feature = "fake-backend")]
pub mod fake;

pub use auth::{AuthClient, AuthError, AuthSession, AuthUser};
pub use rest::RestStore;
pub use suggest::GeminiClient;
