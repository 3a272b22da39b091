//! Create user command
//!
//! Admin only. The password is accepted in plain text, hashed with argon2
//! and never returned.

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
use crate::models::NewUser;
use crate::store::EntityStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserCommand {
    pub username: String,

    #[serde(skip_serializing)]
    pub password: String,

    #[serde(default)]
    pub is_admin: bool,
}

pub type CreateUserResponse = UserView;

#[derive(Debug, thiserror::Error)]
pub enum CreateUserError {
    #[error("Username validation failed: {0}")]
    UsernameValidation(#[from] UsernameValidationError),

    #[error("Password validation failed: {0}")]
    PasswordValidation(#[from] PasswordValidationError),

    #[error(transparent)]
    Permission(#[from] PermissionError),

    #[error("User with username '{0}' already exists")]
    DuplicateUsername(String),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl Request<Result<CreateUserResponse, CreateUserError>> for CreateUserCommand {}

impl crate::cqrs::Command for CreateUserCommand {}

impl CreateUserCommand {
    pub fn validate(&self) -> Result<(), CreateUserError> {
        validate_username(&self.username)?;
        validate_password(&self.password)?;
        Ok(())
    }
}

#[tracing::instrument(skip(store, actor, command), fields(username = %command.username))]
pub async fn handle(
    store: EntityStore,
    actor: Option<UserRef>,
    command: CreateUserCommand,
) -> Result<CreateUserResponse, CreateUserError> {
    require_admin(actor.as_ref())?;
    command.validate()?;

    let new_user = NewUser {
        username: command.username.clone(),
        password_hash: hash_password(&command.password).await?,
        is_admin: command.is_admin,
    };

    let user = store
        .create_user(new_user, actor.as_ref())
        .await
        .map_err(|e| match e {
            DbError::Duplicate(_) => CreateUserError::DuplicateUsername(command.username.clone()),
            other => CreateUserError::Database(other),
        })?;

    tracing::info!(user_id = user.id, "User created via API");

    Ok(UserView::load(store.storage().users.as_ref(), user).await?)
}

impl From<CreateUserError> for AppError {
    fn from(err: CreateUserError) -> Self {
        match err {
            CreateUserError::UsernameValidation(_) | CreateUserError::PasswordValidation(_) => {
                AppError::Validation(err.to_string())
            },
            CreateUserError::Permission(e) => e.into(),
            CreateUserError::DuplicateUsername(_) => AppError::Conflict(err.to_string()),
            CreateUserError::Password(e) => AppError::Internal(e.to_string()),
            CreateUserError::Database(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditAction;
    use crate::features::shared::test_helpers::{audit_entries, memory_store, seed_user};

    fn command(username: &str) -> CreateUserCommand {
        CreateUserCommand {
            username: username.to_string(),
            password: "s3cret".to_string(),
            is_admin: false,
        }
    }

    #[test]
    fn test_validation() {
        assert!(command("alice").validate().is_ok());
        assert!(matches!(
            command("bad name").validate(),
            Err(CreateUserError::UsernameValidation(_))
        ));
        let no_password = CreateUserCommand {
            password: String::new(),
            ..command("alice")
        };
        assert!(matches!(
            no_password.validate(),
            Err(CreateUserError::PasswordValidation(_))
        ));
    }

    #[tokio::test]
    async fn test_admin_creates_user_and_audit_entry() {
        let store = memory_store();
        let (_, admin) = seed_user(&store, "admin", true).await;

        let created = handle(store.clone(), Some(admin.clone()), command("alice")).await.unwrap();
        assert_eq!(created.username, "alice");
        assert!(created.is_active);
        assert!(created.snippets.is_empty());

        let stored = store.storage().users.find_user(created.id).await.unwrap().unwrap();
        assert!(crate::auth::verify_password(&stored.password_hash, "s3cret").await.unwrap());

        let entries = audit_entries(&store).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::Create);
        assert_eq!(entries[0].object_id, created.id);
        assert_eq!(entries[0].user, Some(admin.id));
    }

    #[tokio::test]
    async fn test_non_admin_rejected() {
        let store = memory_store();
        let (_, user) = seed_user(&store, "plain", false).await;

        assert!(matches!(
            handle(store.clone(), None, command("x")).await,
            Err(CreateUserError::Permission(PermissionError::NotAuthenticated))
        ));
        assert!(matches!(
            handle(store.clone(), Some(user), command("x")).await,
            Err(CreateUserError::Permission(PermissionError::Forbidden(_)))
        ));
        assert!(audit_entries(&store).await.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let store = memory_store();
        let (_, admin) = seed_user(&store, "admin", true).await;
        let result = handle(store, Some(admin), command("admin")).await;
        assert!(matches!(result, Err(CreateUserError::DuplicateUsername(name)) if name == "admin"));
    }
}
