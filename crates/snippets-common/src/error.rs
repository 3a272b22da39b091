//! Error types shared across the snippets workspace

use thiserror::Error;

/// Result type alias for shared operations
pub type Result<T> = std::result::Result<T, SnippetsError>;

/// Main error type for shared code
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnippetsError {
    #[error("Unknown entity kind: {0}")]
    UnknownEntityKind(String),

    #[error("Unknown audit action: {0}")]
    UnknownAuditAction(String),
}
