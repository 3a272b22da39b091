use mediator::Request;
use serde::{Deserialize, Serialize};

use crate::context::UserRef;
use crate::db::DbError;
use crate::error::AppError;
use crate::features::shared::{Paginated, PaginationParams};
use crate::features::snippets::types::SnippetView;
use crate::store::EntityStore;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListSnippetsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<i64>,
}

pub type ListSnippetsResponse = Paginated<SnippetView>;

#[derive(Debug, thiserror::Error)]
pub enum ListSnippetsError {
    #[error("{0}")]
    InvalidPagination(&'static str),
    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl Request<Result<ListSnippetsResponse, ListSnippetsError>> for ListSnippetsQuery {}

impl crate::cqrs::Query for ListSnippetsQuery {}

impl ListSnippetsQuery {
    fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.per_page)
    }

    pub fn validate(&self) -> Result<(), ListSnippetsError> {
        self.pagination()
            .validate()
            .map_err(ListSnippetsError::InvalidPagination)
    }
}

/// Snippets are readable by anyone, including anonymous requests.
#[tracing::instrument(skip(store, _actor))]
pub async fn handle(
    store: EntityStore,
    _actor: Option<UserRef>,
    query: ListSnippetsQuery,
) -> Result<ListSnippetsResponse, ListSnippetsError> {
    query.validate()?;

    let params = query.pagination();
    let (snippets, total) = store
        .storage()
        .snippets
        .list_snippets(params.per_page(), params.offset())
        .await?;

    Ok(Paginated::from_items(snippets, &params, total).map(SnippetView::from))
}

impl From<ListSnippetsError> for AppError {
    fn from(err: ListSnippetsError) -> Self {
        match err {
            ListSnippetsError::InvalidPagination(msg) => AppError::Validation(msg.to_string()),
            ListSnippetsError::Database(e) => e.into(),
        }
    }
}
