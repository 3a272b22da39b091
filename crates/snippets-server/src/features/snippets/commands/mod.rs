pub mod create;
pub mod delete;
pub mod update;

pub use create::{CreateSnippetCommand, CreateSnippetError, CreateSnippetResponse};
pub use delete::{DeleteSnippetCommand, DeleteSnippetError, DeleteSnippetResponse};
pub use update::{UpdateSnippetCommand, UpdateSnippetError, UpdateSnippetResponse};
