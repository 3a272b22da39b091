//! Shared utilities and types for feature modules
//!
//! - **pagination**: Common pagination types and helpers
//! - **validation**: Input validation utilities
//! - **test_helpers**: Test fixtures (test-only)

pub mod pagination;
pub mod validation;

#[cfg(test)]
pub mod test_helpers;

pub use pagination::{Paginated, PaginationMetadata, PaginationParams};
pub use validation::{
    validate_password, validate_text, validate_username, PasswordValidationError,
    TextValidationError, UsernameValidationError,
};
