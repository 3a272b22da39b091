//! Audit log API routes
//!
//! - `GET /audit-logs` - List audit entries (admin)
//!
//! The trail is read-only over HTTP. Other methods on the collection answer
//! 405 and there is no per-entry route.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use super::queries::ListAuditLogsQuery;
use crate::api::{response::ApiResponse, AppState};
use crate::context::RequestContext;
use crate::error::ApiResult;

pub fn audit_logs_routes() -> Router<AppState> {
    Router::new().route("/audit-logs", get(list_audit_logs))
}

#[tracing::instrument(skip(state, ctx), fields(request_id = %ctx.request_id()))]
async fn list_audit_logs(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<ListAuditLogsQuery>,
) -> ApiResult<Response> {
    let page =
        super::queries::list::handle(state.store.clone(), ctx.current().cloned(), query).await?;
    Ok(ApiResponse::paginated(page).into_response())
}
