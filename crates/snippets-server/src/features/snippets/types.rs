//! Serialized snippet representation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Snippet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetView {
    pub url: String,
    pub id: i64,
    pub highlight: String,
    pub title: String,
    pub code: String,
    pub linenos: bool,
    pub language: String,
    pub style: String,
    /// Owner's username
    pub owner: String,
    pub created: DateTime<Utc>,
}

impl From<Snippet> for SnippetView {
    fn from(snippet: Snippet) -> Self {
        Self {
            url: format!("/snippets/{}", snippet.id),
            highlight: format!("/snippets/{}/highlight", snippet.id),
            id: snippet.id,
            title: snippet.title,
            code: snippet.code,
            linenos: snippet.linenos,
            language: snippet.language,
            style: snippet.style,
            owner: snippet.owner_username,
            created: snippet.created,
        }
    }
}
