//! Pre-flight checks on login input.
//!
//! The server remains the authority on credentials; these checks only stop
//! a request that cannot succeed from leaving the process.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ValidationError {
    #[error("Email is required")]
    EmailEmpty,
    #[error("Password is required")]
    PasswordEmpty,
}

/// Only presence is checked; the server decides whether the address exists.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(ValidationError::EmailEmpty);
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::PasswordEmpty);
    }
    Ok(())
}

pub fn validate_credentials(email: &str, password: &str) -> Result<(), ValidationError> {
    validate_email(email)?;
    validate_password(password)
}
