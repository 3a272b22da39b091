//! List audit log entries
//!
//! Admin-only, read-only view over the audit trail. Filters arrive as query
//! string values and are parsed here so an unknown kind or action is a
//! validation error rather than an empty page.

use chrono::{DateTime, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};

use crate::audit::{AuditAction, AuditLogEntry, AuditOrdering, AuditQuery, EntityKind};
use crate::auth::{require_admin, PermissionError};
use crate::context::UserRef;
use crate::db::DbError;
use crate::error::AppError;
use crate::features::shared::{Paginated, PaginationParams};
use crate::store::EntityStore;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListAuditLogsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<i64>,
    /// RFC 3339 lower bound, inclusive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    /// RFC 3339 upper bound, inclusive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until: Option<String>,
    /// `timestamp` or `-timestamp`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordering: Option<String>,
}

pub type ListAuditLogsResponse = Paginated<AuditLogEntry>;

#[derive(Debug, thiserror::Error)]
pub enum ListAuditLogsError {
    #[error("{0}")]
    InvalidPagination(&'static str),
    #[error("Invalid filter '{field}': {reason}")]
    InvalidFilter { field: &'static str, reason: String },
    #[error(transparent)]
    Permission(#[from] PermissionError),
    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl Request<Result<ListAuditLogsResponse, ListAuditLogsError>> for ListAuditLogsQuery {}

impl crate::cqrs::Query for ListAuditLogsQuery {}

fn parse_timestamp(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<DateTime<Utc>>, ListAuditLogsError> {
    value
        .map(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|e| ListAuditLogsError::InvalidFilter {
                    field,
                    reason: e.to_string(),
                })
        })
        .transpose()
}

impl ListAuditLogsQuery {
    fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.per_page)
    }

    /// Validate and convert into a storage query
    pub fn to_audit_query(&self) -> Result<AuditQuery, ListAuditLogsError> {
        let params = self.pagination();
        params.validate().map_err(ListAuditLogsError::InvalidPagination)?;

        let model_name = self
            .model_name
            .as_deref()
            .map(str::parse::<EntityKind>)
            .transpose()
            .map_err(|e| ListAuditLogsError::InvalidFilter {
                field: "model_name",
                reason: e.to_string(),
            })?;
        let action = self
            .action
            .as_deref()
            .map(str::parse::<AuditAction>)
            .transpose()
            .map_err(|e| ListAuditLogsError::InvalidFilter {
                field: "action",
                reason: e.to_string(),
            })?;
        let ordering = match self.ordering.as_deref() {
            Some(raw) => raw
                .parse::<AuditOrdering>()
                .map_err(|reason| ListAuditLogsError::InvalidFilter {
                    field: "ordering",
                    reason,
                })?,
            None => AuditOrdering::default(),
        };

        Ok(AuditQuery {
            model_name,
            action,
            object_id: self.object_id,
            user_id: self.user,
            since: parse_timestamp("since", self.since.as_deref())?,
            until: parse_timestamp("until", self.until.as_deref())?,
            ordering,
            limit: params.per_page(),
            offset: params.offset(),
        })
    }
}

#[tracing::instrument(skip(store, actor))]
pub async fn handle(
    store: EntityStore,
    actor: Option<UserRef>,
    query: ListAuditLogsQuery,
) -> Result<ListAuditLogsResponse, ListAuditLogsError> {
    require_admin(actor.as_ref())?;
    let audit_query = query.to_audit_query()?;

    let (entries, total) = store.storage().audit.list(&audit_query).await?;

    Ok(Paginated::from_items(entries, &query.pagination(), total))
}

impl From<ListAuditLogsError> for AppError {
    fn from(err: ListAuditLogsError) -> Self {
        match err {
            ListAuditLogsError::InvalidPagination(_) | ListAuditLogsError::InvalidFilter { .. } => {
                AppError::Validation(err.to_string())
            },
            ListAuditLogsError::Permission(e) => e.into(),
            ListAuditLogsError::Database(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::{memory_store, seed_user};
    use crate::models::{NewSnippet, SnippetChanges};

    #[test]
    fn test_filter_parsing() {
        let query = ListAuditLogsQuery {
            model_name: Some("snippet".to_string()),
            action: Some("update".to_string()),
            since: Some("2024-01-01T00:00:00Z".to_string()),
            ordering: Some("timestamp".to_string()),
            ..Default::default()
        };
        let parsed = query.to_audit_query().unwrap();
        assert_eq!(parsed.model_name, Some(EntityKind::Snippet));
        assert_eq!(parsed.action, Some(AuditAction::Update));
        assert!(parsed.since.is_some());
        assert_eq!(parsed.ordering, AuditOrdering::OldestFirst);

        for bad in [
            ListAuditLogsQuery {
                model_name: Some("group".to_string()),
                ..Default::default()
            },
            ListAuditLogsQuery {
                action: Some("PURGE".to_string()),
                ..Default::default()
            },
            ListAuditLogsQuery {
                since: Some("yesterday".to_string()),
                ..Default::default()
            },
            ListAuditLogsQuery {
                ordering: Some("id".to_string()),
                ..Default::default()
            },
        ] {
            assert!(matches!(
                bad.to_audit_query(),
                Err(ListAuditLogsError::InvalidFilter { .. })
            ));
        }
    }

    #[tokio::test]
    async fn test_admin_only_with_filters() {
        let store = memory_store();
        let (_, admin) = seed_user(&store, "root", true).await;
        let (_, alice) = seed_user(&store, "alice", false).await;

        let new = NewSnippet {
            owner_id: alice.id,
            title: String::new(),
            code: "x".to_string(),
            linenos: false,
            language: "python".to_string(),
            style: "friendly".to_string(),
        };
        let snippet = store.create_snippet(new, &alice, Some(&alice)).await.unwrap();
        let changes = SnippetChanges {
            code: Some("y".to_string()),
            ..Default::default()
        };
        store.update_snippet(snippet.id, &changes, Some(&alice)).await.unwrap();

        assert!(matches!(
            handle(store.clone(), Some(alice.clone()), ListAuditLogsQuery::default()).await,
            Err(ListAuditLogsError::Permission(PermissionError::Forbidden(_)))
        ));
        assert!(matches!(
            handle(store.clone(), None, ListAuditLogsQuery::default()).await,
            Err(ListAuditLogsError::Permission(PermissionError::NotAuthenticated))
        ));

        let all = handle(store.clone(), Some(admin.clone()), ListAuditLogsQuery::default())
            .await
            .unwrap();
        assert_eq!(all.pagination.total, 2);
        assert_eq!(all.items[0].action, AuditAction::Update);

        let creates = ListAuditLogsQuery {
            action: Some("CREATE".to_string()),
            user: Some(alice.id),
            ..Default::default()
        };
        let page = handle(store, Some(admin), creates).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].object_id, snippet.id);
    }
}
