//! Test fixtures for feature handlers

use crate::audit::{AuditConfig, AuditLogEntry, AuditQuery, AuditRecorder};
use crate::context::UserRef;
use crate::db::Storage;
use crate::models::{NewUser, User};
use crate::store::EntityStore;

/// Store over a fresh in-memory backend with default audit settings
pub fn memory_store() -> EntityStore {
    let storage = Storage::memory();
    let recorder = AuditRecorder::new(storage.audit.clone(), AuditConfig::default());
    EntityStore::new(storage, recorder)
}

/// Insert a user as a system operation (no audit entry under the default policy)
pub async fn seed_user(store: &EntityStore, username: &str, is_admin: bool) -> (User, UserRef) {
    let user = store
        .create_user(
            NewUser {
                username: username.to_string(),
                password_hash: "unused".to_string(),
                is_admin,
            },
            None,
        )
        .await
        .unwrap();
    let user_ref = UserRef::from(&user);
    (user, user_ref)
}

/// All audit entries, oldest first
pub async fn audit_entries(store: &EntityStore) -> Vec<AuditLogEntry> {
    let query = AuditQuery {
        ordering: crate::audit::AuditOrdering::OldestFirst,
        limit: crate::audit::MAX_AUDIT_QUERY_LIMIT,
        ..Default::default()
    };
    store.storage().audit.list(&query).await.unwrap().0
}
