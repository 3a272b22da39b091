use mediator::Request;
use serde::{Deserialize, Serialize};

use crate::auth::{require_authenticated, PermissionError};
use crate::context::UserRef;
use crate::db::DbError;
use crate::error::AppError;
use crate::features::shared::{Paginated, PaginationParams};
use crate::features::users::types::UserView;
use crate::store::EntityStore;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListUsersQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<i64>,
    /// Only the literal `true` counts, and only for admins
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_deleted: Option<String>,
}

pub type ListUsersResponse = Paginated<UserView>;

#[derive(Debug, thiserror::Error)]
pub enum ListUsersError {
    #[error("{0}")]
    InvalidPagination(&'static str),
    #[error(transparent)]
    Permission(#[from] PermissionError),
    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl Request<Result<ListUsersResponse, ListUsersError>> for ListUsersQuery {}

impl crate::cqrs::Query for ListUsersQuery {}

impl ListUsersQuery {
    fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.per_page)
    }

    fn show_deleted(&self) -> bool {
        self.show_deleted.as_deref() == Some("true")
    }

    pub fn validate(&self) -> Result<(), ListUsersError> {
        self.pagination()
            .validate()
            .map_err(ListUsersError::InvalidPagination)
    }
}

#[tracing::instrument(skip(store, actor))]
pub async fn handle(
    store: EntityStore,
    actor: Option<UserRef>,
    query: ListUsersQuery,
) -> Result<ListUsersResponse, ListUsersError> {
    let requester = require_authenticated(actor.as_ref())?;
    query.validate()?;

    let params = query.pagination();
    let (users, total) = store
        .soft_delete_policy()
        .list_visible(Some(requester), query.show_deleted(), params.per_page(), params.offset())
        .await?;

    let repo = store.storage().users.as_ref();
    let mut items = Vec::with_capacity(users.len());
    for user in users {
        items.push(UserView::load(repo, user).await?);
    }

    tracing::debug!(count = items.len(), total, "Listed users");

    Ok(Paginated::from_items(items, &params, total))
}

impl From<ListUsersError> for AppError {
    fn from(err: ListUsersError) -> Self {
        match err {
            ListUsersError::InvalidPagination(msg) => AppError::Validation(msg.to_string()),
            ListUsersError::Permission(e) => e.into(),
            ListUsersError::Database(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::{memory_store, seed_user};

    fn names(page: &ListUsersResponse) -> Vec<&str> {
        page.items.iter().map(|u| u.username.as_str()).collect()
    }

    #[tokio::test]
    async fn test_show_deleted_visibility() {
        let store = memory_store();
        let (_, admin) = seed_user(&store, "admin", true).await;
        let (_, alice) = seed_user(&store, "alice", false).await;
        let (bob, _) = seed_user(&store, "bob", false).await;
        store.soft_delete_user(&bob, None).await.unwrap();

        let flagged = ListUsersQuery {
            show_deleted: Some("true".to_string()),
            ..Default::default()
        };

        let as_alice = handle(store.clone(), Some(alice.clone()), flagged.clone()).await.unwrap();
        assert_eq!(names(&as_alice), vec!["admin", "alice"]);

        let as_admin = handle(store.clone(), Some(admin.clone()), flagged).await.unwrap();
        assert_eq!(names(&as_admin), vec!["bob"]);
        assert_eq!(as_admin.pagination.total, 1);

        let default = handle(store, Some(admin), ListUsersQuery::default()).await.unwrap();
        assert_eq!(names(&default), vec!["admin", "alice"]);
    }

    #[tokio::test]
    async fn test_requires_authentication() {
        let store = memory_store();
        assert!(matches!(
            handle(store, None, ListUsersQuery::default()).await,
            Err(ListUsersError::Permission(PermissionError::NotAuthenticated))
        ));
    }

    #[tokio::test]
    async fn test_invalid_pagination() {
        let store = memory_store();
        let (_, alice) = seed_user(&store, "alice", false).await;
        let query = ListUsersQuery {
            per_page: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            handle(store, Some(alice), query).await,
            Err(ListUsersError::InvalidPagination(_))
        ));
    }
}
