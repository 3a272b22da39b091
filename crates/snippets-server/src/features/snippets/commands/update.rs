//! Update snippet command
//!
//! Only the owner may update a snippet.

use mediator::Request;
use serde::{Deserialize, Serialize};

use crate::auth::{require_authenticated, require_owner, PermissionError};
use crate::context::UserRef;
use crate::db::DbError;
use crate::error::AppError;
use crate::features::shared::validation::{validate_choice, validate_text, TextValidationError};
use crate::features::snippets::types::SnippetView;
use crate::features::snippets::MAX_TITLE_LENGTH;
use crate::models::{SnippetChanges, LANGUAGE_CHOICES, STYLE_CHOICES};
use crate::store::EntityStore;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSnippetCommand {
    #[serde(skip)]
    pub id: i64,

    /// PATCH semantics; PUT requires `code`
    #[serde(skip)]
    pub partial: bool,

    pub title: Option<String>,
    pub code: Option<String>,
    pub linenos: Option<bool>,
    pub language: Option<String>,
    pub style: Option<String>,
}

pub type UpdateSnippetResponse = SnippetView;

#[derive(Debug, thiserror::Error)]
pub enum UpdateSnippetError {
    #[error("Validation failed: {0}")]
    Validation(#[from] TextValidationError),

    #[error(transparent)]
    Permission(#[from] PermissionError),

    #[error("Snippet {0} not found")]
    NotFound(i64),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl Request<Result<UpdateSnippetResponse, UpdateSnippetError>> for UpdateSnippetCommand {}

impl crate::cqrs::Command for UpdateSnippetCommand {}

impl UpdateSnippetCommand {
    pub fn validate(&self) -> Result<(), UpdateSnippetError> {
        if let Some(title) = &self.title {
            validate_text(title, "title", MAX_TITLE_LENGTH, false)?;
        }
        match &self.code {
            Some(code) => validate_text(code, "code", usize::MAX, true)?,
            None if !self.partial => return Err(TextValidationError::Required { field: "code" }.into()),
            None => {},
        }
        if let Some(language) = &self.language {
            validate_choice(language, "language", LANGUAGE_CHOICES)?;
        }
        if let Some(style) = &self.style {
            validate_choice(style, "style", STYLE_CHOICES)?;
        }
        Ok(())
    }

    fn changes(&self) -> SnippetChanges {
        SnippetChanges {
            title: self.title.clone(),
            code: self.code.clone(),
            linenos: self.linenos,
            language: self.language.clone(),
            style: self.style.clone(),
        }
    }
}

#[tracing::instrument(skip(store, actor, command), fields(snippet_id = command.id))]
pub async fn handle(
    store: EntityStore,
    actor: Option<UserRef>,
    command: UpdateSnippetCommand,
) -> Result<UpdateSnippetResponse, UpdateSnippetError> {
    require_authenticated(actor.as_ref())?;

    let existing = store
        .storage()
        .snippets
        .find_snippet(command.id)
        .await?
        .ok_or(UpdateSnippetError::NotFound(command.id))?;
    require_owner(actor.as_ref(), existing.owner_id)?;
    command.validate()?;

    let snippet = store
        .update_snippet(command.id, &command.changes(), actor.as_ref())
        .await
        .map_err(|e| match e {
            DbError::NotFound(_) => UpdateSnippetError::NotFound(command.id),
            other => UpdateSnippetError::Database(other),
        })?;

    Ok(snippet.into())
}

impl From<UpdateSnippetError> for AppError {
    fn from(err: UpdateSnippetError) -> Self {
        match err {
            UpdateSnippetError::Validation(_) => AppError::Validation(err.to_string()),
            UpdateSnippetError::Permission(e) => e.into(),
            UpdateSnippetError::NotFound(_) => AppError::NotFound(err.to_string()),
            UpdateSnippetError::Database(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditAction;
    use crate::features::shared::test_helpers::{audit_entries, memory_store, seed_user};
    use crate::models::NewSnippet;

    async fn seed_snippet(store: &EntityStore, owner: &UserRef) -> i64 {
        let new = NewSnippet {
            owner_id: owner.id,
            title: "first".to_string(),
            code: "a = 1".to_string(),
            linenos: false,
            language: "python".to_string(),
            style: "friendly".to_string(),
        };
        store.create_snippet(new, owner, None).await.unwrap().id
    }

    #[test]
    fn test_put_requires_code() {
        assert!(UpdateSnippetCommand::default().validate().is_err());
        let patch = UpdateSnippetCommand {
            partial: true,
            linenos: Some(true),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());

        let bad_style = UpdateSnippetCommand {
            partial: true,
            style: Some("neon".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            bad_style.validate(),
            Err(UpdateSnippetError::Validation(TextValidationError::InvalidChoice {
                field: "style",
                ..
            }))
        ));
    }

    #[tokio::test]
    async fn test_owner_update_logs_one_update() {
        let store = memory_store();
        let (_, alice) = seed_user(&store, "alice", false).await;
        let id = seed_snippet(&store, &alice).await;

        let command = UpdateSnippetCommand {
            id,
            partial: true,
            title: Some("second".to_string()),
            code: Some("a = 2".to_string()),
            linenos: Some(true),
            ..Default::default()
        };
        let view = handle(store.clone(), Some(alice.clone()), command).await.unwrap();
        assert_eq!(view.title, "second");
        assert!(view.linenos);

        let entries = audit_entries(&store).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::Update);
        assert_eq!(entries[0].object_id, id);
    }

    #[tokio::test]
    async fn test_non_owner_forbidden_and_missing_not_found() {
        let store = memory_store();
        let (_, alice) = seed_user(&store, "alice", false).await;
        let (_, mallory) = seed_user(&store, "mallory", true).await;
        let id = seed_snippet(&store, &alice).await;

        let command = UpdateSnippetCommand {
            id,
            partial: true,
            title: Some("pwned".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            handle(store.clone(), Some(mallory.clone()), command).await,
            Err(UpdateSnippetError::Permission(PermissionError::Forbidden(_)))
        ));

        let missing = UpdateSnippetCommand {
            id: 999,
            partial: true,
            ..Default::default()
        };
        assert!(matches!(
            handle(store.clone(), Some(mallory), missing).await,
            Err(UpdateSnippetError::NotFound(999))
        ));
        assert!(audit_entries(&store).await.is_empty());
    }
}
