//! Shared validation utilities
//!
//! # Examples
//!
//! ```rust,ignore
//! use snippets_server::features::shared::validation::{validate_username, validate_text};
//!
//! validate_username("alice")?;
//! validate_text(&command.title, "title", 100, false)?;
//! ```

use thiserror::Error;

/// Maximum username length, matching the `users.username` column
pub const MAX_USERNAME_LENGTH: usize = 150;

pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Errors that can occur during username validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UsernameValidationError {
    #[error("Username is required and cannot be empty")]
    Required,

    #[error("Username must be between 1 and {max_length} characters")]
    TooLong { max_length: usize },

    #[error("Username may contain only letters, digits and @/./+/-/_")]
    InvalidFormat,
}

/// Errors that can occur during password validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordValidationError {
    #[error("Password is required and cannot be empty")]
    Required,

    #[error("Password must be at most {max_length} characters")]
    TooLong { max_length: usize },
}

/// Errors for free-form text fields
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TextValidationError {
    #[error("{field} is required and cannot be empty")]
    Required { field: &'static str },

    #[error("{field} must be at most {max_length} characters")]
    TooLong { field: &'static str, max_length: usize },

    #[error("\"{value}\" is not a valid choice for {field}")]
    InvalidChoice { field: &'static str, value: String },
}

/// Validate a username
///
/// # Rules
/// - Must not be empty
/// - At most [`MAX_USERNAME_LENGTH`] characters
/// - Letters, digits and `@ . + - _` only
pub fn validate_username(username: &str) -> Result<(), UsernameValidationError> {
    if username.is_empty() {
        return Err(UsernameValidationError::Required);
    }

    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(UsernameValidationError::TooLong {
            max_length: MAX_USERNAME_LENGTH,
        });
    }

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(UsernameValidationError::InvalidFormat);
    }

    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), PasswordValidationError> {
    if password.is_empty() {
        return Err(PasswordValidationError::Required);
    }
    if password.chars().count() > MAX_PASSWORD_LENGTH {
        return Err(PasswordValidationError::TooLong {
            max_length: MAX_PASSWORD_LENGTH,
        });
    }
    Ok(())
}

/// Validate a text field against a length limit
///
/// With `required` set, blank values (after trimming) are rejected.
pub fn validate_text(
    value: &str,
    field: &'static str,
    max_length: usize,
    required: bool,
) -> Result<(), TextValidationError> {
    if required && value.trim().is_empty() {
        return Err(TextValidationError::Required { field });
    }
    if value.chars().count() > max_length {
        return Err(TextValidationError::TooLong { field, max_length });
    }
    Ok(())
}

/// Validate that `value` is one of `choices`
pub fn validate_choice(
    value: &str,
    field: &'static str,
    choices: &[&str],
) -> Result<(), TextValidationError> {
    if choices.contains(&value) {
        return Ok(());
    }
    Err(TextValidationError::InvalidChoice {
        field,
        value: value.to_string(),
    })
}
