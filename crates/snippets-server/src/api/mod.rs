pub mod response;

use axum::{
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::compression::CompressionLayer;

use crate::auth::{auth_layer, whoami};
use crate::config::CorsConfig;
use crate::features::{
    audit_logs::audit_logs_routes, snippets::snippets_routes, users::users_routes,
};
use crate::middleware;
use crate::store::EntityStore;

#[derive(Clone)]
pub struct AppState {
    pub store: EntityStore,
}

impl AppState {
    pub fn new(store: EntityStore) -> Self {
        Self { store }
    }
}

/// Build the application router with all routes and middleware
pub fn create_router(state: AppState, cors: &CorsConfig) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/auth/whoami", get(whoami))
        .merge(users_routes())
        .merge(snippets_routes())
        .merge(audit_logs_routes())
        .layer(from_fn_with_state(state.clone(), auth_layer))
        .with_state(state)
        // Apply layers from innermost to outermost
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(cors))
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "Snippets API",
        "version": env!("CARGO_PKG_VERSION"),
        "users": "/users",
        "snippets": "/snippets"
    }))
}

async fn health(State(state): State<AppState>) -> Response {
    let backend = state.store.storage().backend_name();
    match state.store.storage().ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "storage": backend
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, backend, "Storage health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "storage": backend
                })),
            )
                .into_response()
        },
    }
}
