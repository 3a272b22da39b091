//! In-process storage backend
//!
//! Each table sits behind its own `tokio::sync::RwLock`. When more than one
//! lock is needed they are taken in the order users, snippets, audit.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{AuditSink, DbError, DbResult, SnippetRepository, UserFilter, UserRepository};
use crate::audit::{AuditLogEntry, AuditOrdering, AuditQuery, NewAuditEntry};
use crate::models::{NewSnippet, NewUser, Snippet, SnippetChanges, User, UserChanges};

#[derive(Debug)]
pub struct MemoryStore {
    users: RwLock<BTreeMap<i64, User>>,
    snippets: RwLock<BTreeMap<i64, Snippet>>,
    audit: RwLock<Vec<AuditLogEntry>>,
    next_user_id: AtomicI64,
    next_snippet_id: AtomicI64,
    next_audit_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(BTreeMap::new()),
            snippets: RwLock::new(BTreeMap::new()),
            audit: RwLock::new(Vec::new()),
            next_user_id: AtomicI64::new(1),
            next_snippet_id: AtomicI64::new(1),
            next_audit_id: AtomicI64::new(1),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn page<T>(items: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

/// Fill in the owner's current username
fn with_owner(mut snippet: Snippet, users: &BTreeMap<i64, User>) -> Snippet {
    if let Some(owner) = users.get(&snippet.owner_id) {
        snippet.owner_username = owner.username.clone();
    }
    snippet
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, user: &NewUser) -> DbResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == user.username) {
            return Err(DbError::duplicate("User", &user.username));
        }

        let id = self.next_user_id.fetch_add(1, Ordering::SeqCst);
        let row = User {
            id,
            username: user.username.clone(),
            password_hash: user.password_hash.clone(),
            is_active: true,
            is_admin: user.is_admin,
            date_joined: Utc::now(),
        };
        users.insert(id, row.clone());
        Ok(row)
    }

    async fn update_user(&self, id: i64, changes: &UserChanges) -> DbResult<User> {
        let mut users = self.users.write().await;

        if let Some(username) = &changes.username {
            if users.values().any(|u| u.id != id && &u.username == username) {
                return Err(DbError::duplicate("User", username));
            }
        }

        let row = users
            .get_mut(&id)
            .ok_or_else(|| DbError::not_found("User", id))?;

        if let Some(username) = &changes.username {
            row.username = username.clone();
        }
        if let Some(password_hash) = &changes.password_hash {
            row.password_hash = password_hash.clone();
        }
        if let Some(is_active) = changes.is_active {
            row.is_active = is_active;
        }
        if let Some(is_admin) = changes.is_admin {
            row.is_admin = is_admin;
        }

        Ok(row.clone())
    }

    async fn deactivate_user(&self, id: i64) -> DbResult<Option<User>> {
        let mut users = self.users.write().await;
        let row = users
            .get_mut(&id)
            .ok_or_else(|| DbError::not_found("User", id))?;

        if !row.is_active {
            return Ok(None);
        }
        row.is_active = false;
        Ok(Some(row.clone()))
    }

    async fn find_user(&self, id: i64) -> DbResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> DbResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list_users(&self, filter: UserFilter) -> DbResult<(Vec<User>, i64)> {
        let users = self.users.read().await;
        let matching: Vec<User> = users
            .values()
            .filter(|u| filter.is_active.map_or(true, |active| u.is_active == active))
            .cloned()
            .collect();
        let total = matching.len() as i64;
        Ok((page(matching, filter.limit, filter.offset), total))
    }

    async fn snippet_ids_for_owner(&self, owner_id: i64) -> DbResult<Vec<i64>> {
        Ok(self
            .snippets
            .read()
            .await
            .values()
            .filter(|s| s.owner_id == owner_id)
            .map(|s| s.id)
            .collect())
    }
}

#[async_trait]
impl SnippetRepository for MemoryStore {
    async fn insert_snippet(&self, snippet: &NewSnippet) -> DbResult<Snippet> {
        let users = self.users.read().await;
        let owner = users
            .get(&snippet.owner_id)
            .ok_or_else(|| DbError::not_found("User", snippet.owner_id))?;

        let id = self.next_snippet_id.fetch_add(1, Ordering::SeqCst);
        let row = Snippet {
            id,
            owner_id: owner.id,
            owner_username: owner.username.clone(),
            title: snippet.title.clone(),
            code: snippet.code.clone(),
            linenos: snippet.linenos,
            language: snippet.language.clone(),
            style: snippet.style.clone(),
            created: Utc::now(),
        };
        self.snippets.write().await.insert(id, row.clone());
        Ok(row)
    }

    async fn update_snippet(&self, id: i64, changes: &SnippetChanges) -> DbResult<Snippet> {
        let users = self.users.read().await;
        let mut snippets = self.snippets.write().await;
        let row = snippets
            .get_mut(&id)
            .ok_or_else(|| DbError::not_found("Snippet", id))?;

        if let Some(title) = &changes.title {
            row.title = title.clone();
        }
        if let Some(code) = &changes.code {
            row.code = code.clone();
        }
        if let Some(linenos) = changes.linenos {
            row.linenos = linenos;
        }
        if let Some(language) = &changes.language {
            row.language = language.clone();
        }
        if let Some(style) = &changes.style {
            row.style = style.clone();
        }

        Ok(with_owner(row.clone(), &users))
    }

    async fn find_snippet(&self, id: i64) -> DbResult<Option<Snippet>> {
        let users = self.users.read().await;
        let snippets = self.snippets.read().await;
        Ok(snippets.get(&id).cloned().map(|s| with_owner(s, &users)))
    }

    async fn list_snippets(&self, limit: i64, offset: i64) -> DbResult<(Vec<Snippet>, i64)> {
        let users = self.users.read().await;
        let snippets = self.snippets.read().await;
        let all: Vec<Snippet> = snippets.values().cloned().collect();
        let total = all.len() as i64;
        let items = page(all, limit, offset)
            .into_iter()
            .map(|s| with_owner(s, &users))
            .collect();
        Ok((items, total))
    }

    async fn delete_snippet(&self, id: i64) -> DbResult<()> {
        self.snippets
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DbError::not_found("Snippet", id))
    }
}

#[async_trait]
impl AuditSink for MemoryStore {
    async fn append(&self, entry: NewAuditEntry) -> DbResult<AuditLogEntry> {
        let mut log = self.audit.write().await;

        let now = Utc::now();
        let timestamp = match log.last() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        };

        let record = AuditLogEntry {
            id: self.next_audit_id.fetch_add(1, Ordering::SeqCst),
            model_name: entry.kind.as_str().to_string(),
            object_id: entry.object_id,
            action: entry.action,
            user: entry.user_id,
            timestamp,
        };
        log.push(record.clone());
        Ok(record)
    }

    async fn list(&self, query: &AuditQuery) -> DbResult<(Vec<AuditLogEntry>, i64)> {
        let log = self.audit.read().await;
        let mut matching: Vec<AuditLogEntry> =
            log.iter().filter(|e| query.matches(e)).cloned().collect();

        if query.ordering == AuditOrdering::NewestFirst {
            matching.reverse();
        }

        let total = matching.len() as i64;
        Ok((
            page(matching, query.effective_limit(), query.effective_offset()),
            total,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntityKind, DEFAULT_LANGUAGE, DEFAULT_STYLE};
    use snippets_common::types::AuditAction;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            password_hash: "hash".to_string(),
            is_admin: false,
        }
    }

    fn new_snippet(owner_id: i64, title: &str) -> NewSnippet {
        NewSnippet {
            owner_id,
            title: title.to_string(),
            code: "print(1)".to_string(),
            linenos: false,
            language: DEFAULT_LANGUAGE.to_string(),
            style: DEFAULT_STYLE.to_string(),
        }
    }

    #[tokio::test]
    async fn test_usernames_are_unique() {
        let store = MemoryStore::new();
        store.insert_user(&new_user("alice")).await.unwrap();
        let err = store.insert_user(&new_user("alice")).await.unwrap_err();
        assert!(matches!(err, DbError::Duplicate(_)));

        let bob = store.insert_user(&new_user("bob")).await.unwrap();
        let rename = UserChanges {
            username: Some("alice".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            store.update_user(bob.id, &rename).await,
            Err(DbError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_deactivate_user_only_changes_active_rows() {
        let store = MemoryStore::new();
        let alice = store.insert_user(&new_user("alice")).await.unwrap();

        let first = store.deactivate_user(alice.id).await.unwrap().unwrap();
        assert!(!first.is_active);
        assert!(store.deactivate_user(alice.id).await.unwrap().is_none());
        assert!(matches!(
            store.deactivate_user(alice.id + 100).await,
            Err(DbError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_users_filters_by_active_flag() {
        let store = MemoryStore::new();
        store.insert_user(&new_user("alice")).await.unwrap();
        let bob = store.insert_user(&new_user("bob")).await.unwrap();
        let deactivate = UserChanges {
            is_active: Some(false),
            ..Default::default()
        };
        store.update_user(bob.id, &deactivate).await.unwrap();

        let filter = |is_active| UserFilter {
            is_active,
            limit: 10,
            offset: 0,
        };
        let (active, total) = store.list_users(filter(Some(true))).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(active[0].username, "alice");

        let (inactive, _) = store.list_users(filter(Some(false))).await.unwrap();
        assert_eq!(inactive[0].username, "bob");

        let (all, total) = store.list_users(filter(None)).await.unwrap();
        assert_eq!((all.len(), total), (2, 2));
    }

    #[tokio::test]
    async fn test_snippets_follow_owner_rename() {
        let store = MemoryStore::new();
        let alice = store.insert_user(&new_user("alice")).await.unwrap();
        let snippet = store.insert_snippet(&new_snippet(alice.id, "hello")).await.unwrap();
        assert_eq!(snippet.owner_username, "alice");

        let rename = UserChanges {
            username: Some("alicia".to_string()),
            ..Default::default()
        };
        store.update_user(alice.id, &rename).await.unwrap();

        let found = store.find_snippet(snippet.id).await.unwrap().unwrap();
        assert_eq!(found.owner_username, "alicia");
        assert_eq!(store.snippet_ids_for_owner(alice.id).await.unwrap(), vec![snippet.id]);
    }

    #[tokio::test]
    async fn test_delete_snippet_missing_is_not_found() {
        let store = MemoryStore::new();
        let alice = store.insert_user(&new_user("alice")).await.unwrap();
        let snippet = store.insert_snippet(&new_snippet(alice.id, "x")).await.unwrap();

        store.delete_snippet(snippet.id).await.unwrap();
        assert!(store.find_snippet(snippet.id).await.unwrap().is_none());
        assert!(store.delete_snippet(snippet.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_audit_timestamps_non_decreasing_and_ordering() {
        let store = MemoryStore::new();
        for object_id in 1..=5 {
            store
                .append(NewAuditEntry {
                    kind: EntityKind::Snippet,
                    object_id,
                    action: AuditAction::Create,
                    user_id: Some(1),
                })
                .await
                .unwrap();
        }

        let oldest_first = AuditQuery {
            ordering: AuditOrdering::OldestFirst,
            ..Default::default()
        };
        let (entries, total) = store.list(&oldest_first).await.unwrap();
        assert_eq!(total, 5);
        assert!(entries.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(entries[0].object_id, 1);

        let (newest, _) = store.list(&AuditQuery::default()).await.unwrap();
        assert_eq!(newest[0].object_id, 5);

        let paged = AuditQuery {
            limit: 2,
            offset: 4,
            ..Default::default()
        };
        let (entries, total) = store.list(&paged).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(entries.len(), 1);
    }
}
