//! Update user command
//!
//! Admin only. The target is looked up through the soft-delete visibility
//! rule, so inactive users can only be edited with `show_deleted=true`.

use mediator::Request;
use serde::{Deserialize, Serialize};

use crate::auth::{hash_password, require_admin, PasswordError, PermissionError};
use crate::context::UserRef;
use crate::db::DbError;
use crate::error::AppError;
use crate::features::shared::validation::{
    validate_password, validate_username, PasswordValidationError, UsernameValidationError,
};
use crate::features::users::types::UserView;
use crate::models::UserChanges;
use crate::store::EntityStore;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserCommand {
    /// Set from the path
    #[serde(skip)]
    pub id: i64,

    /// Set from `?show_deleted=true`
    #[serde(skip)]
    pub show_deleted: bool,

    /// PATCH semantics; PUT requires `username`
    #[serde(skip)]
    pub partial: bool,

    pub username: Option<String>,

    #[serde(skip_serializing)]
    pub password: Option<String>,

    pub is_active: Option<bool>,

    pub is_admin: Option<bool>,
}

pub type UpdateUserResponse = UserView;

#[derive(Debug, thiserror::Error)]
pub enum UpdateUserError {
    #[error("Username validation failed: {0}")]
    UsernameValidation(#[from] UsernameValidationError),

    #[error("Password validation failed: {0}")]
    PasswordValidation(#[from] PasswordValidationError),

    #[error(transparent)]
    Permission(#[from] PermissionError),

    #[error("User {0} not found")]
    NotFound(i64),

    #[error("User with username '{0}' already exists")]
    DuplicateUsername(String),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl Request<Result<UpdateUserResponse, UpdateUserError>> for UpdateUserCommand {}

impl crate::cqrs::Command for UpdateUserCommand {}

impl UpdateUserCommand {
    pub fn validate(&self) -> Result<(), UpdateUserError> {
        match &self.username {
            Some(username) => validate_username(username)?,
            None if !self.partial => return Err(UsernameValidationError::Required.into()),
            None => {},
        }
        if let Some(password) = &self.password {
            validate_password(password)?;
        }
        Ok(())
    }
}

#[tracing::instrument(skip(store, actor, command), fields(user_id = command.id))]
pub async fn handle(
    store: EntityStore,
    actor: Option<UserRef>,
    command: UpdateUserCommand,
) -> Result<UpdateUserResponse, UpdateUserError> {
    require_admin(actor.as_ref())?;
    command.validate()?;

    store
        .soft_delete_policy()
        .get_visible(command.id, actor.as_ref(), command.show_deleted)
        .await?
        .ok_or(UpdateUserError::NotFound(command.id))?;

    let password_hash = match &command.password {
        Some(password) => Some(hash_password(password).await?),
        None => None,
    };
    let changes = UserChanges {
        username: command.username.clone(),
        password_hash,
        is_active: command.is_active,
        is_admin: command.is_admin,
    };

    let user = store
        .update_user(command.id, &changes, actor.as_ref())
        .await
        .map_err(|e| match e {
            DbError::Duplicate(_) => {
                UpdateUserError::DuplicateUsername(command.username.clone().unwrap_or_default())
            },
            DbError::NotFound(_) => UpdateUserError::NotFound(command.id),
            other => UpdateUserError::Database(other),
        })?;

    Ok(UserView::load(store.storage().users.as_ref(), user).await?)
}

impl From<UpdateUserError> for AppError {
    fn from(err: UpdateUserError) -> Self {
        match err {
            UpdateUserError::UsernameValidation(_) | UpdateUserError::PasswordValidation(_) => {
                AppError::Validation(err.to_string())
            },
            UpdateUserError::Permission(e) => e.into(),
            UpdateUserError::NotFound(_) => AppError::NotFound(err.to_string()),
            UpdateUserError::DuplicateUsername(_) => AppError::Conflict(err.to_string()),
            UpdateUserError::Password(e) => AppError::Internal(e.to_string()),
            UpdateUserError::Database(e) => e.into(),
        }
    }
}
