//! HTTP Basic authentication
//!
//! [`auth_layer`] runs before every handler. It builds a fresh
//! [`RequestContext`] per request, binds the user when valid credentials are
//! supplied, and stores the context in the request extensions:
//!
//! - no `Authorization` header: anonymous context
//! - valid credentials of an active user: context bound to that user
//! - anything else: `401` with a `WWW-Authenticate` challenge
//!
//! ```rust,ignore
//! use axum::middleware::from_fn_with_state;
//!
//! let app = Router::new()
//!     .route("/snippets", get(list_snippets))
//!     .layer(from_fn_with_state(state.clone(), auth_layer));
//! ```

pub mod password;
pub mod permissions;

pub use password::{hash_password, verify_password, PasswordError, DUMMY_PASSWORD_HASH};
pub use permissions::{require_admin, require_authenticated, require_owner, PermissionError};

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use crate::api::{response::ApiResponse, AppState};
use crate::context::{RequestContext, UserRef};
use crate::db::{DbError, UserRepository};
use crate::error::AppError;
use crate::models::User;

/// Value of the `WWW-Authenticate` header on 401 responses
pub const BASIC_REALM_CHALLENGE: &str = "Basic realm=\"snippets\"";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid basic header: {0}")]
    MalformedHeader(&'static str),

    #[error("Invalid username/password")]
    InvalidCredentials,

    #[error("User inactive or deleted")]
    Inactive,

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Storage(#[from] DbError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Storage(e) => AppError::from(e),
            AuthError::Password(e) => AppError::Internal(e.to_string()),
            other => AppError::Unauthorized(other.to_string()),
        }
    }
}

/// Username and password decoded from a Basic header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

/// Decode the `Authorization` header; `Ok(None)` when absent.
///
/// Non-Basic schemes are treated as absent.
pub fn basic_credentials(headers: &HeaderMap) -> Result<Option<BasicCredentials>, AuthError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| AuthError::MalformedHeader("not valid ASCII"))?;

    let Some((scheme, encoded)) = value.split_once(' ') else {
        return Err(AuthError::MalformedHeader("no credentials provided"));
    };
    if !scheme.eq_ignore_ascii_case("basic") {
        return Ok(None);
    }

    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|_| AuthError::MalformedHeader("credentials not correctly base64 encoded"))?;
    let decoded =
        String::from_utf8(decoded).map_err(|_| AuthError::MalformedHeader("credentials not UTF-8"))?;
    let (username, password) = decoded
        .split_once(':')
        .ok_or(AuthError::MalformedHeader("missing ':' separator"))?;

    Ok(Some(BasicCredentials {
        username: username.to_string(),
        password: password.to_string(),
    }))
}

/// Hash to verify against; unknown usernames still pay for a full verify
fn candidate_hash(user: Option<&User>) -> &str {
    user.map_or(DUMMY_PASSWORD_HASH, |u| u.password_hash.as_str())
}

/// Look up and verify a user; inactive users never authenticate
pub async fn authenticate(
    users: &dyn UserRepository,
    credentials: &BasicCredentials,
) -> Result<User, AuthError> {
    let user = users.find_user_by_username(&credentials.username).await?;

    let matches = verify_password(candidate_hash(user.as_ref()), &credentials.password).await?;
    let user = match user {
        Some(user) if matches => user,
        _ => return Err(AuthError::InvalidCredentials),
    };
    if !user.is_active {
        return Err(AuthError::Inactive);
    }
    Ok(user)
}

/// Authentication middleware that builds the per-request context
#[instrument(
    name = "auth_layer",
    skip(state, request, next),
    fields(request_id = tracing::field::Empty, user_id = tracing::field::Empty)
)]
pub async fn auth_layer(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let mut ctx = RequestContext::new();
    let span = tracing::Span::current();
    span.record("request_id", tracing::field::display(ctx.request_id()));

    let credentials = match basic_credentials(request.headers()) {
        Ok(credentials) => credentials,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected malformed credentials");
            return AppError::from(e).into_response();
        },
    };

    if let Some(credentials) = credentials {
        match authenticate(state.store.storage().users.as_ref(), &credentials).await {
            Ok(user) => {
                span.record("user_id", user.id);
                ctx.bind(Some(UserRef::from(&user)));
            },
            Err(e) => {
                tracing::debug!(error = %e, "Authentication failed");
                return AppError::from(e).into_response();
            },
        }
    }

    request.extensions_mut().insert(ctx);
    next.run(request).await
}

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub request_id: Uuid,
    pub authenticated: bool,
    pub user: Option<UserRef>,
}

/// `GET /auth/whoami`: the identity bound to the current request
pub async fn whoami(ctx: RequestContext) -> ApiResponse<WhoAmI> {
    ApiResponse::success(WhoAmI {
        request_id: ctx.request_id(),
        authenticated: ctx.current().is_some(),
        user: ctx.current().cloned(),
    })
}
