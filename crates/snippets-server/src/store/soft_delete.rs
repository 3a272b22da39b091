//! Visibility rules for soft-deleted users

use std::sync::Arc;

use crate::context::UserRef;
use crate::db::{DbResult, UserFilter, UserRepository};
use crate::models::User;

/// Decides which users a requester may see.
///
/// Without the `include_inactive` flag everyone sees active users only. With
/// the flag an admin sees *inactive* users only; for anyone else the flag is
/// ignored.
#[derive(Clone)]
pub struct SoftDeletePolicy {
    users: Arc<dyn UserRepository>,
}

impl SoftDeletePolicy {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Value of `is_active` that visible users must have
    pub fn visible_active_state(requester: Option<&UserRef>, include_inactive: bool) -> bool {
        let is_admin = requester.is_some_and(|u| u.is_admin);
        !(include_inactive && is_admin)
    }

    pub async fn list_visible(
        &self,
        requester: Option<&UserRef>,
        include_inactive: bool,
        limit: i64,
        offset: i64,
    ) -> DbResult<(Vec<User>, i64)> {
        let filter = UserFilter {
            is_active: Some(Self::visible_active_state(requester, include_inactive)),
            limit,
            offset,
        };
        self.users.list_users(filter).await
    }

    /// Single-user lookup scoped by the same rule as [`Self::list_visible`]
    pub async fn get_visible(
        &self,
        id: i64,
        requester: Option<&UserRef>,
        include_inactive: bool,
    ) -> DbResult<Option<User>> {
        let wanted = Self::visible_active_state(requester, include_inactive);
        Ok(self
            .users
            .find_user(id)
            .await?
            .filter(|user| user.is_active == wanted))
    }
}
