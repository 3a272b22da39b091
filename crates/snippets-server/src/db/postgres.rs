//! Postgres storage backend

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use super::{AuditSink, DbError, DbResult, SnippetRepository, UserFilter, UserRepository};
use crate::audit::{AuditLogEntry, AuditOrdering, AuditQuery, NewAuditEntry};
use crate::models::{NewSnippet, NewUser, Snippet, SnippetChanges, User, UserChanges};

const USER_COLUMNS: &str = "id, username, password_hash, is_active, is_admin, date_joined";

/// Snippet projection over a row source aliased `s`, joined to `users u`
const SNIPPET_SELECT: &str = r#"
    SELECT s.id, s.owner_id, u.username AS owner_username, s.title, s.code,
           s.linenos, s.language, s.style, s.created
"#;

const AUDIT_COLUMNS: &str = "id, model_name, object_id, action, user_id, timestamp";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Map unique violations to [`DbError::Duplicate`]
fn map_unique(err: sqlx::Error, resource_type: &str, identifier: &str) -> DbError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            DbError::duplicate(resource_type, identifier)
        },
        _ => DbError::Sqlx(err),
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AuditLogRow {
    id: i64,
    model_name: String,
    object_id: i64,
    action: String,
    user_id: Option<i64>,
    timestamp: DateTime<Utc>,
}

impl TryFrom<AuditLogRow> for AuditLogEntry {
    type Error = DbError;

    fn try_from(row: AuditLogRow) -> Result<Self, Self::Error> {
        let action = row
            .action
            .parse()
            .map_err(|e| DbError::Sqlx(sqlx::Error::Decode(Box::new(e))))?;
        Ok(Self {
            id: row.id,
            model_name: row.model_name,
            object_id: row.object_id,
            action,
            user: row.user_id,
            timestamp: row.timestamp,
        })
    }
}

fn push_audit_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &AuditQuery) {
    builder.push(" WHERE TRUE");
    if let Some(kind) = query.model_name {
        builder.push(" AND model_name = ").push_bind(kind.as_str());
    }
    if let Some(action) = query.action {
        builder.push(" AND action = ").push_bind(action.as_str());
    }
    if let Some(object_id) = query.object_id {
        builder.push(" AND object_id = ").push_bind(object_id);
    }
    if let Some(user_id) = query.user_id {
        builder.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(since) = query.since {
        builder.push(" AND timestamp >= ").push_bind(since);
    }
    if let Some(until) = query.until {
        builder.push(" AND timestamp <= ").push_bind(until);
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn insert_user(&self, user: &NewUser) -> DbResult<User> {
        let sql = format!(
            "INSERT INTO users (username, password_hash, is_admin) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(user.is_admin)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique(e, "User", &user.username))
    }

    async fn update_user(&self, id: i64, changes: &UserChanges) -> DbResult<User> {
        let sql = format!(
            r#"
            UPDATE users SET
                username = COALESCE($2, username),
                password_hash = COALESCE($3, password_hash),
                is_active = COALESCE($4, is_active),
                is_admin = COALESCE($5, is_admin)
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let identifier = changes.username.clone().unwrap_or_else(|| id.to_string());
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(&changes.username)
            .bind(&changes.password_hash)
            .bind(changes.is_active)
            .bind(changes.is_admin)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_unique(e, "User", &identifier))?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    async fn deactivate_user(&self, id: i64) -> DbResult<Option<User>> {
        let sql = format!(
            "UPDATE users SET is_active = FALSE WHERE id = $1 AND is_active RETURNING {}",
            USER_COLUMNS
        );
        let deactivated = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match deactivated {
            Some(user) => Ok(Some(user)),
            None if self.find_user(id).await?.is_some() => Ok(None),
            None => Err(DbError::not_found("User", id)),
        }
    }

    async fn find_user(&self, id: i64) -> DbResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_users(&self, filter: UserFilter) -> DbResult<(Vec<User>, i64)> {
        let sql = format!(
            r#"
            SELECT {} FROM users
            WHERE ($1::BOOLEAN IS NULL OR is_active = $1)
            ORDER BY id
            LIMIT $2 OFFSET $3
            "#,
            USER_COLUMNS
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(filter.is_active)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE ($1::BOOLEAN IS NULL OR is_active = $1)",
        )
        .bind(filter.is_active)
        .fetch_one(&self.pool)
        .await?;

        Ok((users, total))
    }

    async fn snippet_ids_for_owner(&self, owner_id: i64) -> DbResult<Vec<i64>> {
        Ok(
            sqlx::query_scalar("SELECT id FROM snippets WHERE owner_id = $1 ORDER BY id")
                .bind(owner_id)
                .fetch_all(&self.pool)
                .await?,
        )
    }
}

#[async_trait]
impl SnippetRepository for PgStore {
    async fn insert_snippet(&self, snippet: &NewSnippet) -> DbResult<Snippet> {
        let sql = format!(
            r#"
            WITH s AS (
                INSERT INTO snippets (owner_id, title, code, linenos, language, style)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
            )
            {} FROM s JOIN users u ON u.id = s.owner_id
            "#,
            SNIPPET_SELECT
        );
        let row = sqlx::query_as::<_, Snippet>(&sql)
            .bind(snippet.owner_id)
            .bind(&snippet.title)
            .bind(&snippet.code)
            .bind(snippet.linenos)
            .bind(&snippet.language)
            .bind(&snippet.style)
            .fetch_one(&self.pool)
            .await?;

        debug!(snippet_id = row.id, owner_id = row.owner_id, "Inserted snippet");
        Ok(row)
    }

    async fn update_snippet(&self, id: i64, changes: &SnippetChanges) -> DbResult<Snippet> {
        let sql = format!(
            r#"
            WITH s AS (
                UPDATE snippets SET
                    title = COALESCE($2, title),
                    code = COALESCE($3, code),
                    linenos = COALESCE($4, linenos),
                    language = COALESCE($5, language),
                    style = COALESCE($6, style)
                WHERE id = $1
                RETURNING *
            )
            {} FROM s JOIN users u ON u.id = s.owner_id
            "#,
            SNIPPET_SELECT
        );
        sqlx::query_as::<_, Snippet>(&sql)
            .bind(id)
            .bind(&changes.title)
            .bind(&changes.code)
            .bind(changes.linenos)
            .bind(&changes.language)
            .bind(&changes.style)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Snippet", id))
    }

    async fn find_snippet(&self, id: i64) -> DbResult<Option<Snippet>> {
        let sql = format!(
            "{} FROM snippets s JOIN users u ON u.id = s.owner_id WHERE s.id = $1",
            SNIPPET_SELECT
        );
        Ok(sqlx::query_as::<_, Snippet>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_snippets(&self, limit: i64, offset: i64) -> DbResult<(Vec<Snippet>, i64)> {
        let sql = format!(
            r#"
            {} FROM snippets s JOIN users u ON u.id = s.owner_id
            ORDER BY s.created, s.id
            LIMIT $1 OFFSET $2
            "#,
            SNIPPET_SELECT
        );
        let snippets = sqlx::query_as::<_, Snippet>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM snippets")
            .fetch_one(&self.pool)
            .await?;

        Ok((snippets, total))
    }

    async fn delete_snippet(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM snippets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Snippet", id));
        }
        Ok(())
    }
}

#[async_trait]
impl AuditSink for PgStore {
    async fn append(&self, entry: NewAuditEntry) -> DbResult<AuditLogEntry> {
        let sql = format!(
            r#"
            INSERT INTO audit_log (model_name, object_id, action, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            AUDIT_COLUMNS
        );
        let row = sqlx::query_as::<_, AuditLogRow>(&sql)
            .bind(entry.kind.as_str())
            .bind(entry.object_id)
            .bind(entry.action.as_str())
            .bind(entry.user_id)
            .fetch_one(&self.pool)
            .await?;

        debug!(
            audit_id = row.id,
            model_name = %row.model_name,
            action = %row.action,
            "Created audit log entry"
        );

        row.try_into()
    }

    async fn list(&self, query: &AuditQuery) -> DbResult<(Vec<AuditLogEntry>, i64)> {
        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM audit_log", AUDIT_COLUMNS));
        push_audit_filters(&mut select, query);
        select.push(match query.ordering {
            AuditOrdering::NewestFirst => " ORDER BY timestamp DESC, id DESC",
            AuditOrdering::OldestFirst => " ORDER BY timestamp ASC, id ASC",
        });
        select.push(" LIMIT ").push_bind(query.effective_limit());
        select.push(" OFFSET ").push_bind(query.effective_offset());

        let rows = select
            .build_query_as::<AuditLogRow>()
            .fetch_all(&self.pool)
            .await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM audit_log");
        push_audit_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        debug!(count = rows.len(), total, "Queried audit logs");

        let entries = rows
            .into_iter()
            .map(AuditLogEntry::try_from)
            .collect::<DbResult<Vec<_>>>()?;
        Ok((entries, total))
    }
}
