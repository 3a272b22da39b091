//! Persistence layer
//!
//! Repositories are traits so the core can run against Postgres in
//! production and against [`MemoryStore`] in tests or with
//! `STORAGE_BACKEND=memory`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use thiserror::Error;

use crate::audit::{AuditLogEntry, AuditQuery, NewAuditEntry};
use crate::config::DatabaseConfig;
use crate::models::{NewSnippet, NewUser, Snippet, SnippetChanges, User, UserChanges};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Database operation errors with contextual information
#[derive(Error, Debug)]
pub enum DbError {
    /// SQL query or connection error
    #[error("Database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Database configuration is invalid or missing
    #[error("Database configuration error: {0}. Check DATABASE_URL and connection settings.")]
    Config(String),

    /// Requested record does not exist
    #[error("{0}")]
    NotFound(String),

    /// Record already exists (unique constraint violation)
    #[error("{0}")]
    Duplicate(String),
}

impl DbError {
    pub fn not_found(resource_type: &str, identifier: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{} '{}' not found", resource_type, identifier))
    }

    pub fn duplicate(resource_type: &str, identifier: impl std::fmt::Display) -> Self {
        Self::Duplicate(format!("{} '{}' already exists", resource_type, identifier))
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// Filter for user listings
#[derive(Debug, Clone, Copy)]
pub struct UserFilter {
    /// `Some(true)` active only, `Some(false)` inactive only, `None` all
    pub is_active: Option<bool>,
    pub limit: i64,
    pub offset: i64,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert_user(&self, user: &NewUser) -> DbResult<User>;

    /// Apply `changes`; NotFound if the row is missing
    async fn update_user(&self, id: i64, changes: &UserChanges) -> DbResult<User>;

    /// Set `is_active = false` only if the row is still active.
    ///
    /// `Ok(None)` when it was already inactive; NotFound if the row is missing.
    async fn deactivate_user(&self, id: i64) -> DbResult<Option<User>>;

    async fn find_user(&self, id: i64) -> DbResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> DbResult<Option<User>>;

    /// Page of users ordered by id, plus the total matching count
    async fn list_users(&self, filter: UserFilter) -> DbResult<(Vec<User>, i64)>;

    /// Ids of the snippets owned by `owner_id`, ascending
    async fn snippet_ids_for_owner(&self, owner_id: i64) -> DbResult<Vec<i64>>;
}

#[async_trait]
pub trait SnippetRepository: Send + Sync {
    async fn insert_snippet(&self, snippet: &NewSnippet) -> DbResult<Snippet>;

    async fn update_snippet(&self, id: i64, changes: &SnippetChanges) -> DbResult<Snippet>;

    async fn find_snippet(&self, id: i64) -> DbResult<Option<Snippet>>;

    /// Page of snippets ordered by creation, plus the total count
    async fn list_snippets(&self, limit: i64, offset: i64) -> DbResult<(Vec<Snippet>, i64)>;

    /// Physically remove the row; NotFound if it does not exist
    async fn delete_snippet(&self, id: i64) -> DbResult<()>;
}

/// Append-only destination of audit entries
///
/// Entries cannot be changed or removed once appended.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, entry: NewAuditEntry) -> DbResult<AuditLogEntry>;

    async fn list(&self, query: &AuditQuery) -> DbResult<(Vec<AuditLogEntry>, i64)>;
}

/// Bundle of repositories backing one server instance
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserRepository>,
    pub snippets: Arc<dyn SnippetRepository>,
    pub audit: Arc<dyn AuditSink>,
    pool: Option<PgPool>,
}

impl Storage {
    pub fn postgres(pool: PgPool) -> Self {
        let store = Arc::new(PgStore::new(pool.clone()));
        Self {
            users: store.clone(),
            snippets: store.clone(),
            audit: store,
            pool: Some(pool),
        }
    }

    pub fn memory() -> Self {
        Self::from_memory(Arc::new(MemoryStore::new()))
    }

    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            users: store.clone(),
            snippets: store.clone(),
            audit: store,
            pool: None,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        if self.pool.is_some() {
            "postgres"
        } else {
            "memory"
        }
    }

    /// Check the backend is reachable
    pub async fn ping(&self) -> DbResult<()> {
        match &self.pool {
            Some(pool) => health_check(pool).await,
            None => Ok(()),
        }
    }
}

pub async fn create_pool(config: &DatabaseConfig) -> DbResult<PgPool> {
    if config.url.is_empty() {
        return Err(DbError::config("DATABASE_URL is empty"));
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect(&config.url)
        .await?;

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Database connection pool created"
    );

    Ok(pool)
}

pub async fn health_check(pool: &PgPool) -> DbResult<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(DbError::from)
}
