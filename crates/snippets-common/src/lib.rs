//! Snippets Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, logging, and error handling for the snippets workspace.
//!
//! # Overview
//!
//! - **Error Handling**: `SnippetsError` and the crate-wide `Result` alias
//! - **Logging**: `tracing` subscriber setup shared by every binary
//! - **Types**: domain tags shared between the server and its tooling
//!   (tracked entity kinds, audit actions)
//!
//! # Example
//!
//! ```no_run
//! use snippets_common::types::{AuditAction, EntityKind};
//!
//! let kind: EntityKind = "snippet".parse().unwrap();
//! assert_eq!(kind.as_str(), "Snippet");
//! assert_eq!(AuditAction::Create.to_string(), "CREATE");
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{Result, SnippetsError};
