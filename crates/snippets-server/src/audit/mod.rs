//! Audit logging module
//!
//! Records an immutable trail of create/update/delete actions on tracked
//! entities. The [`EntityStore`](crate::store::EntityStore) publishes each
//! committed mutation to the [`AuditRecorder`], which attaches the acting
//! user passed by the caller and appends one [`AuditLogEntry`] through an
//! [`AuditSink`](crate::db::AuditSink).
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use snippets_server::audit::{AuditConfig, AuditRecorder, MissingActorPolicy};
//! use snippets_server::db::MemoryStore;
//! use snippets_server::models::EntityKind;
//!
//! # async fn example() {
//! let config = AuditConfig::new([EntityKind::User, EntityKind::Snippet])
//!     .with_missing_actor(MissingActorPolicy::Skip);
//! let recorder = AuditRecorder::new(Arc::new(MemoryStore::new()), config);
//!
//! // System operation: no acting user, nothing is written under `Skip`
//! let outcome = recorder.on_entity_persisted(EntityKind::User, 1, true, None).await;
//! # let _ = outcome;
//! # }
//! ```

mod models;
mod recorder;

pub use models::{
    AuditAction, AuditLogEntry, AuditOrdering, AuditQuery, EntityKind, NewAuditEntry,
    DEFAULT_AUDIT_QUERY_LIMIT, MAX_AUDIT_QUERY_LIMIT,
};
pub use recorder::{AuditConfig, AuditOutcome, AuditRecorder, MissingActorPolicy};
