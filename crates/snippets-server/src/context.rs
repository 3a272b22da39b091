//! Request-scoped acting identity
//!
//! A [`RequestContext`] is built fresh for every request by the
//! authentication middleware and stored in the request extensions. It is a
//! plain value owned by the request and dropped with the request future, even
//! on cancellation. Nothing is kept in thread-locals or statics.
//!
//! Handlers pass `ctx.current()` explicitly into every mutation of the
//! [`EntityStore`](crate::store::EntityStore).

use std::convert::Infallible;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::User;

/// Authenticated identity as seen by the core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
}

impl From<&User> for UserRef {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            is_admin: user.is_admin,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: Uuid,
    current_user: Option<UserRef>,
}

impl RequestContext {
    /// Anonymous context with a fresh request id
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            current_user: None,
        }
    }

    /// Context already bound to `user`
    pub fn for_user(user: UserRef) -> Self {
        let mut ctx = Self::new();
        ctx.bind(Some(user));
        ctx
    }

    /// Associate the acting user; re-binding overwrites
    pub fn bind(&mut self, user: Option<UserRef>) {
        self.current_user = user;
    }

    pub fn current(&self) -> Option<&UserRef> {
        self.current_user.as_ref()
    }

    pub fn clear(&mut self) {
        self.current_user = None;
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn is_admin(&self) -> bool {
        self.current_user.as_ref().is_some_and(|u| u.is_admin)
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Requests that never went through the auth middleware are anonymous.
#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn alice() -> UserRef {
        UserRef {
            id: 1,
            username: "alice".to_string(),
            is_admin: false,
        }
    }

    #[test]
    fn test_bind_overwrites_and_clear_removes() {
        let mut ctx = RequestContext::new();
        assert!(ctx.current().is_none());

        ctx.bind(Some(alice()));
        assert_eq!(ctx.current().map(|u| u.username.as_str()), Some("alice"));

        let admin = UserRef {
            id: 2,
            username: "root".to_string(),
            is_admin: true,
        };
        ctx.bind(Some(admin));
        assert!(ctx.is_admin());

        ctx.clear();
        assert!(ctx.current().is_none());
        assert!(!ctx.is_admin());
    }

    #[test]
    fn test_each_context_has_its_own_request_id() {
        assert_ne!(RequestContext::new().request_id(), RequestContext::new().request_id());
    }

    #[tokio::test]
    async fn test_extractor_defaults_to_anonymous() {
        let (mut parts, _) = Request::builder().uri("/").body(()).unwrap().into_parts();
        let ctx = RequestContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(ctx.current().is_none());

        parts.extensions.insert(RequestContext::for_user(alice()));
        let ctx = RequestContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ctx.current(), Some(&alice()));
    }
}
