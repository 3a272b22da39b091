use mediator::Request;
use serde::{Deserialize, Serialize};

use crate::auth::{require_authenticated, PermissionError};
use crate::context::UserRef;
use crate::db::DbError;
use crate::error::AppError;
use crate::features::users::types::UserView;
use crate::store::EntityStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetUserQuery {
    pub id: i64,
    #[serde(default)]
    pub show_deleted: bool,
}

pub type GetUserResponse = UserView;

#[derive(Debug, thiserror::Error)]
pub enum GetUserError {
    #[error("User {0} not found")]
    NotFound(i64),
    #[error(transparent)]
    Permission(#[from] PermissionError),
    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl Request<Result<GetUserResponse, GetUserError>> for GetUserQuery {}

impl crate::cqrs::Query for GetUserQuery {}

#[tracing::instrument(skip(store, actor))]
pub async fn handle(
    store: EntityStore,
    actor: Option<UserRef>,
    query: GetUserQuery,
) -> Result<GetUserResponse, GetUserError> {
    let requester = require_authenticated(actor.as_ref())?;

    let user = store
        .soft_delete_policy()
        .get_visible(query.id, Some(requester), query.show_deleted)
        .await?
        .ok_or(GetUserError::NotFound(query.id))?;

    Ok(UserView::load(store.storage().users.as_ref(), user).await?)
}

impl From<GetUserError> for AppError {
    fn from(err: GetUserError) -> Self {
        match err {
            GetUserError::NotFound(_) => AppError::NotFound(err.to_string()),
            GetUserError::Permission(e) => e.into(),
            GetUserError::Database(e) => e.into(),
        }
    }
}
