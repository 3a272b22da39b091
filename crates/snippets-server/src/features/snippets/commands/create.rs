//! Create snippet command
//!
//! Any authenticated user may create a snippet; the requester becomes the
//! owner.

use mediator::Request;
use serde::{Deserialize, Serialize};

use crate::auth::{require_authenticated, PermissionError};
use crate::context::UserRef;
use crate::db::DbError;
use crate::error::AppError;
use crate::features::shared::validation::{validate_choice, validate_text, TextValidationError};
use crate::features::snippets::types::SnippetView;
use crate::features::snippets::MAX_TITLE_LENGTH;
use crate::models::{NewSnippet, DEFAULT_LANGUAGE, DEFAULT_STYLE, LANGUAGE_CHOICES, STYLE_CHOICES};
use crate::store::EntityStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSnippetCommand {
    #[serde(default)]
    pub title: String,

    pub code: String,

    #[serde(default)]
    pub linenos: bool,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_style")]
    pub style: String,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_style() -> String {
    DEFAULT_STYLE.to_string()
}

pub type CreateSnippetResponse = SnippetView;

#[derive(Debug, thiserror::Error)]
pub enum CreateSnippetError {
    #[error("Validation failed: {0}")]
    Validation(#[from] TextValidationError),

    #[error(transparent)]
    Permission(#[from] PermissionError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl Request<Result<CreateSnippetResponse, CreateSnippetError>> for CreateSnippetCommand {}

impl crate::cqrs::Command for CreateSnippetCommand {}

impl CreateSnippetCommand {
    pub fn validate(&self) -> Result<(), CreateSnippetError> {
        validate_text(&self.title, "title", MAX_TITLE_LENGTH, false)?;
        validate_text(&self.code, "code", usize::MAX, true)?;
        validate_choice(&self.language, "language", LANGUAGE_CHOICES)?;
        validate_choice(&self.style, "style", STYLE_CHOICES)?;
        Ok(())
    }
}

#[tracing::instrument(skip(store, actor, command), fields(title = %command.title))]
pub async fn handle(
    store: EntityStore,
    actor: Option<UserRef>,
    command: CreateSnippetCommand,
) -> Result<CreateSnippetResponse, CreateSnippetError> {
    let owner = require_authenticated(actor.as_ref())?;
    command.validate()?;

    let new_snippet = NewSnippet {
        owner_id: owner.id,
        title: command.title,
        code: command.code,
        linenos: command.linenos,
        language: command.language,
        style: command.style,
    };
    let snippet = store.create_snippet(new_snippet, owner, Some(owner)).await?;

    tracing::info!(snippet_id = snippet.id, owner_id = owner.id, "Snippet created via API");

    Ok(snippet.into())
}

impl From<CreateSnippetError> for AppError {
    fn from(err: CreateSnippetError) -> Self {
        match err {
            CreateSnippetError::Validation(_) => AppError::Validation(err.to_string()),
            CreateSnippetError::Permission(e) => e.into(),
            CreateSnippetError::Database(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditAction;
    use crate::features::shared::test_helpers::{audit_entries, memory_store, seed_user};

    fn command(code: &str) -> CreateSnippetCommand {
        serde_json::from_value(serde_json::json!({ "code": code })).unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let cmd = command("print(1)");
        assert_eq!(cmd.title, "");
        assert!(!cmd.linenos);
        assert_eq!(cmd.language, "python");
        assert_eq!(cmd.style, "friendly");
        assert!(cmd.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            command("   ").validate(),
            Err(CreateSnippetError::Validation(TextValidationError::Required { field: "code" }))
        ));
        let long_title = CreateSnippetCommand {
            title: "t".repeat(101),
            ..command("x")
        };
        assert!(long_title.validate().is_err());

        let unknown_language = CreateSnippetCommand {
            language: "klingon".to_string(),
            ..command("x")
        };
        assert!(matches!(
            unknown_language.validate(),
            Err(CreateSnippetError::Validation(TextValidationError::InvalidChoice {
                field: "language",
                ..
            }))
        ));
        let other_choices = CreateSnippetCommand {
            language: "rust".to_string(),
            style: "monokai".to_string(),
            ..command("x")
        };
        assert!(other_choices.validate().is_ok());
    }

    #[tokio::test]
    async fn test_create_sets_owner_and_logs_create() {
        let store = memory_store();
        let (_, alice) = seed_user(&store, "alice", false).await;

        let view = handle(store.clone(), Some(alice.clone()), command("print(1)")).await.unwrap();
        assert_eq!(view.owner, "alice");
        assert_eq!(view.highlight, format!("/snippets/{}/highlight", view.id));

        let entries = audit_entries(&store).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].model_name, "Snippet");
        assert_eq!(entries[0].action, AuditAction::Create);
        assert_eq!(entries[0].object_id, view.id);
        assert_eq!(entries[0].user, Some(alice.id));
    }

    #[tokio::test]
    async fn test_anonymous_rejected() {
        let store = memory_store();
        assert!(matches!(
            handle(store, None, command("x")).await,
            Err(CreateSnippetError::Permission(PermissionError::NotAuthenticated))
        ));
    }
}
