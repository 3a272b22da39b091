//! User API routes
//!
//! - `GET /users` - List visible users (authenticated)
//! - `POST /users` - Create a user (admin)
//! - `GET /users/:id` - Retrieve a user (authenticated)
//! - `PUT /users/:id` - Replace a user (admin)
//! - `PATCH /users/:id` - Partially update a user (admin)
//! - `DELETE /users/:id` - Deactivate a user (admin)
//!
//! Every route accepts `?show_deleted=true`, which admins use to reach
//! deactivated accounts.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use super::commands::{CreateUserCommand, DeleteUserCommand, UpdateUserCommand};
use super::queries::{GetUserQuery, ListUsersQuery};
use super::types::ShowDeletedParams;
use crate::api::{response::ApiResponse, AppState};
use crate::context::RequestContext;
use crate::error::ApiResult;

pub fn users_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user)
                .put(replace_user)
                .patch(patch_user)
                .delete(delete_user),
        )
}

#[tracing::instrument(skip(state, ctx, command), fields(request_id = %ctx.request_id()))]
async fn create_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(command): Json<CreateUserCommand>,
) -> ApiResult<Response> {
    let response =
        super::commands::create::handle(state.store.clone(), ctx.current().cloned(), command)
            .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(state, ctx), fields(request_id = %ctx.request_id()))]
async fn list_users(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<Response> {
    let page =
        super::queries::list::handle(state.store.clone(), ctx.current().cloned(), query).await?;
    Ok(ApiResponse::paginated(page).into_response())
}

#[tracing::instrument(skip(state, ctx, params), fields(request_id = %ctx.request_id()))]
async fn get_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
    Query(params): Query<ShowDeletedParams>,
) -> ApiResult<Response> {
    let query = GetUserQuery {
        id,
        show_deleted: params.enabled(),
    };
    let user =
        super::queries::get::handle(state.store.clone(), ctx.current().cloned(), query).await?;
    Ok(ApiResponse::success(user).into_response())
}

async fn update_user(
    state: AppState,
    ctx: RequestContext,
    id: i64,
    params: ShowDeletedParams,
    mut command: UpdateUserCommand,
    partial: bool,
) -> ApiResult<Response> {
    command.id = id;
    command.show_deleted = params.enabled();
    command.partial = partial;

    let user =
        super::commands::update::handle(state.store.clone(), ctx.current().cloned(), command)
            .await?;
    Ok(ApiResponse::success(user).into_response())
}

#[tracing::instrument(skip(state, ctx, params, command), fields(request_id = %ctx.request_id()))]
async fn replace_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
    Query(params): Query<ShowDeletedParams>,
    Json(command): Json<UpdateUserCommand>,
) -> ApiResult<Response> {
    update_user(state, ctx, id, params, command, false).await
}

#[tracing::instrument(skip(state, ctx, params, command), fields(request_id = %ctx.request_id()))]
async fn patch_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
    Query(params): Query<ShowDeletedParams>,
    Json(command): Json<UpdateUserCommand>,
) -> ApiResult<Response> {
    update_user(state, ctx, id, params, command, true).await
}

#[tracing::instrument(skip(state, ctx, params), fields(request_id = %ctx.request_id()))]
async fn delete_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
    Query(params): Query<ShowDeletedParams>,
) -> ApiResult<Response> {
    let command = DeleteUserCommand {
        id,
        show_deleted: params.enabled(),
    };
    super::commands::delete::handle(state.store.clone(), ctx.current().cloned(), command).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
