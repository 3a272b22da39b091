//! Snippets Server Library
//!
//! HTTP API for sharing code snippets, with an audit trail of every change to
//! users and snippets.
//!
//! # Architecture
//!
//! Write paths run through [`store::EntityStore`], which persists the change
//! and then hands a lifecycle event to [`audit::AuditRecorder`]. The acting
//! user travels explicitly as a [`context::UserRef`] taken from the
//! per-request [`context::RequestContext`] that [`auth::auth_layer`] builds.
//!
//! Features follow a CQRS layout:
//!
//! - **Commands** (create, update, delete) go through the store and are
//!   audited
//! - **Queries** read repositories directly and are never audited
//!
//! User deletion is soft: the account is deactivated and the audit trail
//! records an update. [`store::SoftDeletePolicy`] decides which accounts a
//! requester may see.
//!
//! # Storage backends
//!
//! - **PostgreSQL** via SQLx, with migrations under `migrations/`
//! - **Memory**, for tests and quick local runs
//!
//! # Example
//!
//! ```no_run
//! use snippets_server::{api, audit::AuditRecorder, config::Config, db::Storage, store::EntityStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let storage = Storage::memory();
//!     let recorder = AuditRecorder::new(storage.audit.clone(), config.audit.to_audit_config());
//!     let state = api::AppState::new(EntityStore::new(storage, recorder));
//!     let app = api::create_router(state, &config.cors);
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod audit;
pub mod auth;
pub mod config;
pub mod context;
pub mod cqrs;
pub mod db;
pub mod error;
pub mod features;
pub mod middleware;
pub mod models;
pub mod store;

pub use error::{ApiResult, AppError};
