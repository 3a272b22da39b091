//! Persistence facade that publishes lifecycle events
//!
//! Every mutation takes the acting user explicitly. Events reach the
//! [`AuditRecorder`] only after the repository call succeeded, and only for
//! kinds the recorder tracks.

mod soft_delete;

pub use soft_delete::SoftDeletePolicy;

use tracing::{info, instrument};

use crate::audit::{AuditOutcome, AuditRecorder};
use crate::context::UserRef;
use crate::db::{DbResult, Storage};
use crate::models::{
    EntityKind, NewSnippet, NewUser, Snippet, SnippetChanges, TrackedEntity, User, UserChanges,
};

#[derive(Clone)]
pub struct EntityStore {
    storage: Storage,
    recorder: AuditRecorder,
}

impl EntityStore {
    pub fn new(storage: Storage, recorder: AuditRecorder) -> Self {
        Self { storage, recorder }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn recorder(&self) -> &AuditRecorder {
        &self.recorder
    }

    pub fn soft_delete_policy(&self) -> SoftDeletePolicy {
        SoftDeletePolicy::new(self.storage.users.clone())
    }

    async fn publish_persisted<E: TrackedEntity>(
        &self,
        entity: &E,
        created: bool,
        actor: Option<&UserRef>,
    ) -> AuditOutcome {
        if !self.recorder.tracks(E::KIND) {
            return AuditOutcome::Untracked;
        }
        self.recorder
            .on_entity_persisted(E::KIND, entity.entity_id(), created, actor)
            .await
    }

    async fn publish_removed(
        &self,
        kind: EntityKind,
        id: i64,
        actor: Option<&UserRef>,
    ) -> AuditOutcome {
        if !self.recorder.tracks(kind) {
            return AuditOutcome::Untracked;
        }
        self.recorder.on_entity_removed(kind, id, actor).await
    }

    #[instrument(skip(self, user, actor), fields(username = %user.username))]
    pub async fn create_user(&self, user: NewUser, actor: Option<&UserRef>) -> DbResult<User> {
        let created = self.storage.users.insert_user(&user).await?;
        self.publish_persisted(&created, true, actor).await;
        info!(user_id = created.id, "User created");
        Ok(created)
    }

    #[instrument(skip(self, changes, actor))]
    pub async fn update_user(
        &self,
        id: i64,
        changes: &UserChanges,
        actor: Option<&UserRef>,
    ) -> DbResult<User> {
        let updated = self.storage.users.update_user(id, changes).await?;
        self.publish_persisted(&updated, false, actor).await;
        Ok(updated)
    }

    /// Deactivate `user`; the row stays and the event is an update.
    ///
    /// The stored row decides: if it is already inactive nothing is written
    /// and no event is published, even when `user` is a stale active copy.
    #[instrument(skip(self, user, actor), fields(user_id = user.id))]
    pub async fn soft_delete_user(&self, user: &User, actor: Option<&UserRef>) -> DbResult<User> {
        match self.storage.users.deactivate_user(user.id).await? {
            Some(deactivated) => {
                self.publish_persisted(&deactivated, false, actor).await;
                info!("User deactivated");
                Ok(deactivated)
            },
            None => Ok(User {
                is_active: false,
                ..user.clone()
            }),
        }
    }

    #[instrument(skip(self, snippet, owner, actor), fields(owner_id = owner.id))]
    pub async fn create_snippet(
        &self,
        mut snippet: NewSnippet,
        owner: &UserRef,
        actor: Option<&UserRef>,
    ) -> DbResult<Snippet> {
        snippet.owner_id = owner.id;
        let created = self.storage.snippets.insert_snippet(&snippet).await?;
        self.publish_persisted(&created, true, actor).await;
        Ok(created)
    }

    #[instrument(skip(self, changes, actor))]
    pub async fn update_snippet(
        &self,
        id: i64,
        changes: &SnippetChanges,
        actor: Option<&UserRef>,
    ) -> DbResult<Snippet> {
        let updated = self.storage.snippets.update_snippet(id, changes).await?;
        self.publish_persisted(&updated, false, actor).await;
        Ok(updated)
    }

    /// Physically remove the snippet
    #[instrument(skip(self, actor))]
    pub async fn hard_delete_snippet(&self, id: i64, actor: Option<&UserRef>) -> DbResult<()> {
        self.storage.snippets.delete_snippet(id).await?;
        self.publish_removed(EntityKind::Snippet, id, actor).await;
        info!("Snippet deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditAction, AuditConfig, AuditLogEntry, AuditQuery, MissingActorPolicy};
    use crate::models::{DEFAULT_LANGUAGE, DEFAULT_STYLE};

    fn store_with(config: AuditConfig) -> EntityStore {
        let storage = Storage::memory();
        let recorder = AuditRecorder::new(storage.audit.clone(), config);
        EntityStore::new(storage, recorder)
    }

    async fn audit_entries(store: &EntityStore) -> Vec<AuditLogEntry> {
        store.storage().audit.list(&AuditQuery::default()).await.unwrap().0
    }

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            password_hash: "hash".to_string(),
            is_admin: false,
        }
    }

    fn new_snippet() -> NewSnippet {
        NewSnippet {
            owner_id: 0,
            title: "hello".to_string(),
            code: "print('hi')".to_string(),
            linenos: false,
            language: DEFAULT_LANGUAGE.to_string(),
            style: DEFAULT_STYLE.to_string(),
        }
    }

    /// Create a user without auditing and return it with its ref
    async fn seed_actor(store: &EntityStore, name: &str) -> (User, UserRef) {
        let user = store.create_user(new_user(name), None).await.unwrap();
        let user_ref = UserRef::from(&user);
        (user, user_ref)
    }

    #[tokio::test]
    async fn test_create_with_actor_logs_one_create() {
        let store = store_with(AuditConfig::default());
        let (_, admin) = seed_actor(&store, "admin").await;

        let alice = store.create_user(new_user("alice"), Some(&admin)).await.unwrap();

        let entries = audit_entries(&store).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::Create);
        assert_eq!(entries[0].model_name, "User");
        assert_eq!(entries[0].object_id, alice.id);
        assert_eq!(entries[0].user, Some(admin.id));
    }

    #[tokio::test]
    async fn test_update_logs_one_update_regardless_of_fields() {
        let store = store_with(AuditConfig::default());
        let (_, owner) = seed_actor(&store, "owner").await;
        let snippet = store.create_snippet(new_snippet(), &owner, Some(&owner)).await.unwrap();

        let changes = SnippetChanges {
            title: Some("renamed".to_string()),
            linenos: Some(true),
            ..Default::default()
        };
        store.update_snippet(snippet.id, &changes, Some(&owner)).await.unwrap();

        let updates: Vec<_> = audit_entries(&store)
            .await
            .into_iter()
            .filter(|e| e.action == AuditAction::Update)
            .collect();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].object_id, snippet.id);
    }

    #[tokio::test]
    async fn test_soft_delete_logs_update_and_keeps_row() {
        let store = store_with(AuditConfig::default());
        let (_, admin) = seed_actor(&store, "admin").await;
        let (bob, _) = seed_actor(&store, "bob").await;

        let deleted = store.soft_delete_user(&bob, Some(&admin)).await.unwrap();
        assert!(!deleted.is_active);

        let row = store.storage().users.find_user(bob.id).await.unwrap().unwrap();
        assert!(!row.is_active);

        let entries = audit_entries(&store).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::Update);
        assert!(entries.iter().all(|e| e.action != AuditAction::Delete));

        // second delete is a no-op
        store.soft_delete_user(&deleted, Some(&admin)).await.unwrap();
        assert_eq!(audit_entries(&store).await.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_soft_deletes_log_one_update() {
        let store = store_with(AuditConfig::default());
        let (_, admin) = seed_actor(&store, "admin").await;
        let (bob, _) = seed_actor(&store, "bob").await;

        // both callers hold the same active snapshot
        let (first, second) = tokio::join!(
            store.soft_delete_user(&bob, Some(&admin)),
            store.soft_delete_user(&bob, Some(&admin)),
        );
        assert!(!first.unwrap().is_active);
        assert!(!second.unwrap().is_active);

        let entries = audit_entries(&store).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::Update);
        assert_eq!(entries[0].object_id, bob.id);
    }

    #[tokio::test]
    async fn test_hard_delete_snippet_logs_delete() {
        let store = store_with(AuditConfig::default());
        let (_, owner) = seed_actor(&store, "owner").await;
        let snippet = store.create_snippet(new_snippet(), &owner, Some(&owner)).await.unwrap();

        store.hard_delete_snippet(snippet.id, Some(&owner)).await.unwrap();
        assert!(store.storage().snippets.find_snippet(snippet.id).await.unwrap().is_none());

        let entries = audit_entries(&store).await;
        assert_eq!(entries[0].action, AuditAction::Delete);
        assert_eq!(entries[0].object_id, snippet.id);
        assert_eq!(entries[0].user, Some(owner.id));
    }

    #[tokio::test]
    async fn test_failed_mutation_emits_nothing() {
        let store = store_with(AuditConfig::default());
        let (_, owner) = seed_actor(&store, "owner").await;

        assert!(store.hard_delete_snippet(999, Some(&owner)).await.is_err());
        assert!(store.create_user(new_user("owner"), Some(&owner)).await.is_err());
        assert!(audit_entries(&store).await.is_empty());
    }

    #[tokio::test]
    async fn test_no_actor_skipped_by_default_recorded_on_request() {
        let store = store_with(AuditConfig::default());
        let user = store.create_user(new_user("system-made"), None).await.unwrap();
        assert!(user.id > 0);
        assert!(audit_entries(&store).await.is_empty());

        let store =
            store_with(AuditConfig::default().with_missing_actor(MissingActorPolicy::Record));
        store.create_user(new_user("system-made"), None).await.unwrap();
        let entries = audit_entries(&store).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].user, None);
    }

    #[tokio::test]
    async fn test_untracked_kind_is_not_published() {
        let store = store_with(AuditConfig::new([EntityKind::User]));
        let (_, owner) = seed_actor(&store, "owner").await;
        store.create_snippet(new_snippet(), &owner, Some(&owner)).await.unwrap();
        assert!(audit_entries(&store).await.is_empty());
    }
}
