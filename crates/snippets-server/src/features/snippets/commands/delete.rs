//! Delete snippet command
//!
//! Snippets are removed physically; the audit trail records a delete.

use mediator::Request;
use serde::{Deserialize, Serialize};

use crate::auth::{require_authenticated, require_owner, PermissionError};
use crate::context::UserRef;
use crate::db::DbError;
use crate::error::AppError;
use crate::store::EntityStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteSnippetCommand {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteSnippetResponse {
    pub id: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteSnippetError {
    #[error(transparent)]
    Permission(#[from] PermissionError),

    #[error("Snippet {0} not found")]
    NotFound(i64),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl Request<Result<DeleteSnippetResponse, DeleteSnippetError>> for DeleteSnippetCommand {}

impl crate::cqrs::Command for DeleteSnippetCommand {}

#[tracing::instrument(skip(store, actor), fields(snippet_id = command.id))]
pub async fn handle(
    store: EntityStore,
    actor: Option<UserRef>,
    command: DeleteSnippetCommand,
) -> Result<DeleteSnippetResponse, DeleteSnippetError> {
    require_authenticated(actor.as_ref())?;

    let existing = store
        .storage()
        .snippets
        .find_snippet(command.id)
        .await?
        .ok_or(DeleteSnippetError::NotFound(command.id))?;
    require_owner(actor.as_ref(), existing.owner_id)?;

    store
        .hard_delete_snippet(command.id, actor.as_ref())
        .await
        .map_err(|e| match e {
            DbError::NotFound(_) => DeleteSnippetError::NotFound(command.id),
            other => DeleteSnippetError::Database(other),
        })?;

    Ok(DeleteSnippetResponse { id: command.id })
}

impl From<DeleteSnippetError> for AppError {
    fn from(err: DeleteSnippetError) -> Self {
        match err {
            DeleteSnippetError::Permission(e) => e.into(),
            DeleteSnippetError::NotFound(_) => AppError::NotFound(err.to_string()),
            DeleteSnippetError::Database(e) => e.into(),
        }
    }
}
