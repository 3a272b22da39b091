//! Authorization checks applied by handlers before touching the store

use thiserror::Error;

use crate::context::UserRef;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PermissionError {
    #[error("Authentication credentials were not provided")]
    NotAuthenticated,

    #[error("{0}")]
    Forbidden(String),
}

/// Any logged-in user
pub fn require_authenticated(actor: Option<&UserRef>) -> Result<&UserRef, PermissionError> {
    actor.ok_or(PermissionError::NotAuthenticated)
}

/// Logged-in admin; 401 for anonymous, 403 for other users
pub fn require_admin(actor: Option<&UserRef>) -> Result<&UserRef, PermissionError> {
    let user = require_authenticated(actor)?;
    if !user.is_admin {
        return Err(PermissionError::Forbidden(
            "You do not have permission to perform this action".to_string(),
        ));
    }
    Ok(user)
}

/// Logged-in owner of the object identified by `owner_id`
pub fn require_owner(actor: Option<&UserRef>, owner_id: i64) -> Result<&UserRef, PermissionError> {
    let user = require_authenticated(actor)?;
    if user.id != owner_id {
        return Err(PermissionError::Forbidden(
            "Only the owner may modify this snippet".to_string(),
        ));
    }
    Ok(user)
}
