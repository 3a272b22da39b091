//! Code snippets owned by users and rendered to HTML on demand

pub mod commands;
pub mod queries;
pub mod routes;
pub mod types;

/// Maximum title length in characters
pub const MAX_TITLE_LENGTH: usize = 100;

pub use commands::{
    CreateSnippetCommand, CreateSnippetError, CreateSnippetResponse, DeleteSnippetCommand,
    DeleteSnippetError, DeleteSnippetResponse, UpdateSnippetCommand, UpdateSnippetError,
    UpdateSnippetResponse,
};
pub use queries::{
    GetSnippetError, GetSnippetQuery, GetSnippetResponse, HighlightSnippetQuery,
    ListSnippetsError, ListSnippetsQuery, ListSnippetsResponse,
};
pub use routes::snippets_routes;
pub use types::SnippetView;
