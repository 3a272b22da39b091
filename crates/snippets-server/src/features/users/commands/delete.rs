//! Delete user command
//!
//! Deleting a user deactivates it. The row stays and the audit trail records
//! an update.

use mediator::Request;
use serde::{Deserialize, Serialize};

use crate::auth::{require_admin, PermissionError};
use crate::context::UserRef;
use crate::db::DbError;
use crate::error::AppError;
use crate::store::EntityStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteUserCommand {
    pub id: i64,

    #[serde(default)]
    pub show_deleted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteUserResponse {
    pub id: i64,
    pub is_active: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteUserError {
    #[error(transparent)]
    Permission(#[from] PermissionError),

    #[error("User {0} not found")]
    NotFound(i64),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl Request<Result<DeleteUserResponse, DeleteUserError>> for DeleteUserCommand {}

impl crate::cqrs::Command for DeleteUserCommand {}

#[tracing::instrument(skip(store, actor), fields(user_id = command.id))]
pub async fn handle(
    store: EntityStore,
    actor: Option<UserRef>,
    command: DeleteUserCommand,
) -> Result<DeleteUserResponse, DeleteUserError> {
    require_admin(actor.as_ref())?;

    let user = store
        .soft_delete_policy()
        .get_visible(command.id, actor.as_ref(), command.show_deleted)
        .await?
        .ok_or(DeleteUserError::NotFound(command.id))?;

    let user = store.soft_delete_user(&user, actor.as_ref()).await?;

    Ok(DeleteUserResponse {
        id: user.id,
        is_active: user.is_active,
    })
}

impl From<DeleteUserError> for AppError {
    fn from(err: DeleteUserError) -> Self {
        match err {
            DeleteUserError::Permission(e) => e.into(),
            DeleteUserError::NotFound(_) => AppError::NotFound(err.to_string()),
            DeleteUserError::Database(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditAction;
    use crate::features::shared::test_helpers::{audit_entries, memory_store, seed_user};

    #[tokio::test]
    async fn test_soft_delete_records_update_not_delete() {
        let store = memory_store();
        let (_, admin) = seed_user(&store, "admin", true).await;
        let (bob, _) = seed_user(&store, "bob", false).await;

        let command = DeleteUserCommand {
            id: bob.id,
            show_deleted: false,
        };
        let response = handle(store.clone(), Some(admin.clone()), command).await.unwrap();
        assert!(!response.is_active);

        let row = store.storage().users.find_user(bob.id).await.unwrap().unwrap();
        assert!(!row.is_active);

        let entries = audit_entries(&store).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::Update);
        assert_eq!(entries[0].user, Some(admin.id));
    }

    #[tokio::test]
    async fn test_repeat_delete_is_idempotent() {
        let store = memory_store();
        let (_, admin) = seed_user(&store, "admin", true).await;
        let (bob, _) = seed_user(&store, "bob", false).await;
        store.soft_delete_user(&bob, Some(&admin)).await.unwrap();

        // hidden without the flag
        let hidden = DeleteUserCommand {
            id: bob.id,
            show_deleted: false,
        };
        assert!(matches!(
            handle(store.clone(), Some(admin.clone()), hidden).await,
            Err(DeleteUserError::NotFound(_))
        ));

        let visible = DeleteUserCommand {
            id: bob.id,
            show_deleted: true,
        };
        handle(store.clone(), Some(admin), visible).await.unwrap();
        assert_eq!(audit_entries(&store).await.len(), 1);
    }

    #[tokio::test]
    async fn test_requires_admin() {
        let store = memory_store();
        let (bob, bob_ref) = seed_user(&store, "bob", false).await;
        let command = DeleteUserCommand {
            id: bob.id,
            show_deleted: false,
        };
        assert!(matches!(
            handle(store, Some(bob_ref), command).await,
            Err(DeleteUserError::Permission(PermissionError::Forbidden(_)))
        ));
    }
}
