//! Snippet API routes
//!
//! - `GET /snippets` - List snippets (anyone)
//! - `POST /snippets` - Create a snippet (authenticated)
//! - `GET /snippets/:id` - Retrieve a snippet (anyone)
//! - `PUT /snippets/:id` - Replace a snippet (owner)
//! - `PATCH /snippets/:id` - Partially update a snippet (owner)
//! - `DELETE /snippets/:id` - Delete a snippet (owner)
//! - `GET /snippets/:id/highlight` - HTML rendering (anyone)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};

use super::commands::{CreateSnippetCommand, DeleteSnippetCommand, UpdateSnippetCommand};
use super::queries::{GetSnippetQuery, HighlightSnippetQuery, ListSnippetsQuery};
use crate::api::{response::ApiResponse, AppState};
use crate::context::RequestContext;
use crate::error::ApiResult;

pub fn snippets_routes() -> Router<AppState> {
    Router::new()
        .route("/snippets", get(list_snippets).post(create_snippet))
        .route(
            "/snippets/:id",
            get(get_snippet)
                .put(replace_snippet)
                .patch(patch_snippet)
                .delete(delete_snippet),
        )
        .route("/snippets/:id/highlight", get(highlight_snippet))
}

#[tracing::instrument(skip(state, ctx, command), fields(request_id = %ctx.request_id()))]
async fn create_snippet(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(command): Json<CreateSnippetCommand>,
) -> ApiResult<Response> {
    let snippet =
        super::commands::create::handle(state.store.clone(), ctx.current().cloned(), command)
            .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(snippet))).into_response())
}

#[tracing::instrument(skip(state, ctx), fields(request_id = %ctx.request_id()))]
async fn list_snippets(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<ListSnippetsQuery>,
) -> ApiResult<Response> {
    let page =
        super::queries::list::handle(state.store.clone(), ctx.current().cloned(), query).await?;
    Ok(ApiResponse::paginated(page).into_response())
}

#[tracing::instrument(skip(state, ctx), fields(request_id = %ctx.request_id()))]
async fn get_snippet(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> ApiResult<Response> {
    let snippet = super::queries::get::handle(
        state.store.clone(),
        ctx.current().cloned(),
        GetSnippetQuery { id },
    )
    .await?;
    Ok(ApiResponse::success(snippet).into_response())
}

#[tracing::instrument(skip(state, ctx), fields(request_id = %ctx.request_id()))]
async fn highlight_snippet(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> ApiResult<Response> {
    let html = super::queries::highlight::handle(
        state.store.clone(),
        ctx.current().cloned(),
        HighlightSnippetQuery { id },
    )
    .await?;
    Ok(Html(html).into_response())
}

async fn update_snippet(
    state: AppState,
    ctx: RequestContext,
    id: i64,
    mut command: UpdateSnippetCommand,
    partial: bool,
) -> ApiResult<Response> {
    command.id = id;
    command.partial = partial;

    let snippet =
        super::commands::update::handle(state.store.clone(), ctx.current().cloned(), command)
            .await?;
    Ok(ApiResponse::success(snippet).into_response())
}

#[tracing::instrument(skip(state, ctx, command), fields(request_id = %ctx.request_id()))]
async fn replace_snippet(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
    Json(command): Json<UpdateSnippetCommand>,
) -> ApiResult<Response> {
    update_snippet(state, ctx, id, command, false).await
}

#[tracing::instrument(skip(state, ctx, command), fields(request_id = %ctx.request_id()))]
async fn patch_snippet(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
    Json(command): Json<UpdateSnippetCommand>,
) -> ApiResult<Response> {
    update_snippet(state, ctx, id, command, true).await
}

#[tracing::instrument(skip(state, ctx), fields(request_id = %ctx.request_id()))]
async fn delete_snippet(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> ApiResult<Response> {
    super::commands::delete::handle(
        state.store.clone(),
        ctx.current().cloned(),
        DeleteSnippetCommand { id },
    )
    .await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
