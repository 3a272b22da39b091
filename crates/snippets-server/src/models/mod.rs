//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub use snippets_common::types::EntityKind;

/// An entity type whose persistence events can be audited
pub trait TrackedEntity {
    const KIND: EntityKind;

    fn entity_id(&self) -> i64;
}

/// User account row
///
/// Users are soft-deleted: `is_active = false` hides them from default
/// listings and blocks authentication, but the row stays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub date_joined: DateTime<Utc>,
}

impl TrackedEntity for User {
    const KIND: EntityKind = EntityKind::User;

    fn entity_id(&self) -> i64 {
        self.id
    }
}

/// Input for inserting a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
}

/// Partial update of a user; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub is_active: Option<bool>,
    pub is_admin: Option<bool>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.password_hash.is_none()
            && self.is_active.is_none()
            && self.is_admin.is_none()
    }
}

/// Code snippet row, joined with the owner's username
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Snippet {
    pub id: i64,
    pub owner_id: i64,
    pub owner_username: String,
    pub title: String,
    pub code: String,
    pub linenos: bool,
    pub language: String,
    pub style: String,
    pub created: DateTime<Utc>,
}

impl TrackedEntity for Snippet {
    const KIND: EntityKind = EntityKind::Snippet;

    fn entity_id(&self) -> i64 {
        self.id
    }
}

pub const DEFAULT_LANGUAGE: &str = "python";
pub const DEFAULT_STYLE: &str = "friendly";

/// Accepted `language` values (highlighter lexer aliases)
pub const LANGUAGE_CHOICES: &[&str] = &[
    "bash", "c", "clojure", "cpp", "csharp", "css", "dart", "diff", "docker", "elixir", "erlang",
    "go", "graphql", "haskell", "html", "ini", "java", "javascript", "json", "julia", "kotlin",
    "lua", "make", "markdown", "nginx", "nim", "ocaml", "perl", "php", "powershell", "python",
    "python2", "r", "ruby", "rust", "scala", "scheme", "sql", "swift", "text", "toml",
    "typescript", "xml", "yaml", "zig",
];

/// Accepted `style` values (highlighter colour schemes)
pub const STYLE_CHOICES: &[&str] = &[
    "abap", "algol", "autumn", "borland", "bw", "colorful", "default", "dracula", "emacs",
    "friendly", "fruity", "github-dark", "gruvbox-dark", "gruvbox-light", "igor", "lovelace",
    "manni", "monokai", "murphy", "native", "nord", "paraiso-dark", "paraiso-light", "pastie",
    "perldoc", "rrt", "solarized-dark", "solarized-light", "tango", "trac", "vim", "vs", "xcode",
    "zenburn",
];

/// Input for inserting a snippet
#[derive(Debug, Clone)]
pub struct NewSnippet {
    pub owner_id: i64,
    pub title: String,
    pub code: String,
    pub linenos: bool,
    pub language: String,
    pub style: String,
}

/// Partial update of a snippet
#[derive(Debug, Clone, Default)]
pub struct SnippetChanges {
    pub title: Option<String>,
    pub code: Option<String>,
    pub linenos: Option<bool>,
    pub language: Option<String>,
    pub style: Option<String>,
}

impl SnippetChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.code.is_none()
            && self.linenos.is_none()
            && self.language.is_none()
            && self.style.is_none()
    }
}
