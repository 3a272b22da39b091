use mediator::Request;
use serde::{Deserialize, Serialize};

use crate::context::UserRef;
use crate::db::DbError;
use crate::error::AppError;
use crate::features::snippets::types::SnippetView;
use crate::models::Snippet;
use crate::store::EntityStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetSnippetQuery {
    pub id: i64,
}

pub type GetSnippetResponse = SnippetView;

#[derive(Debug, thiserror::Error)]
pub enum GetSnippetError {
    #[error("Snippet {0} not found")]
    NotFound(i64),
    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl Request<Result<GetSnippetResponse, GetSnippetError>> for GetSnippetQuery {}

impl crate::cqrs::Query for GetSnippetQuery {}

pub(crate) async fn load(store: &EntityStore, id: i64) -> Result<Snippet, GetSnippetError> {
    store
        .storage()
        .snippets
        .find_snippet(id)
        .await?
        .ok_or(GetSnippetError::NotFound(id))
}

#[tracing::instrument(skip(store, _actor))]
pub async fn handle(
    store: EntityStore,
    _actor: Option<UserRef>,
    query: GetSnippetQuery,
) -> Result<GetSnippetResponse, GetSnippetError> {
    Ok(load(&store, query.id).await?.into())
}

impl From<GetSnippetError> for AppError {
    fn from(err: GetSnippetError) -> Self {
        match err {
            GetSnippetError::NotFound(_) => AppError::NotFound(err.to_string()),
            GetSnippetError::Database(e) => e.into(),
        }
    }
}
