//! Serialized user representation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{DbResult, UserRepository};
use crate::models::User;

/// User as returned by the API; the password hash is never exposed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub url: String,
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
    /// Ids of the snippets this user owns
    pub snippets: Vec<i64>,
}

impl UserView {
    pub fn new(user: User, snippets: Vec<i64>) -> Self {
        Self {
            url: format!("/users/{}", user.id),
            id: user.id,
            username: user.username,
            is_admin: user.is_admin,
            is_active: user.is_active,
            date_joined: user.date_joined,
            snippets,
        }
    }

    /// Build the view, loading owned snippet ids
    pub async fn load(users: &dyn UserRepository, user: User) -> DbResult<Self> {
        let snippets = users.snippet_ids_for_owner(user.id).await?;
        Ok(Self::new(user, snippets))
    }
}

/// `?show_deleted=true` on user endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShowDeletedParams {
    pub show_deleted: Option<String>,
}

impl ShowDeletedParams {
    /// Only the exact value `true` enables the flag
    pub fn enabled(&self) -> bool {
        self.show_deleted.as_deref() == Some("true")
    }
}
