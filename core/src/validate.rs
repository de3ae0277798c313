//! Client-side preconditions checked before any request is built.

use crate::error::ApiError;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Trimmed title, or a validation error when nothing is left.
pub fn title(raw: &str) -> Result<&str, ApiError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(ApiError::Validation(
            "Please enter a title for your task.".to_string(),
        ));
    }
    Ok(title)
}

pub fn email(raw: &str) -> Result<&str, ApiError> {
    let email = raw.trim();
    if email.is_empty() {
        return Err(ApiError::Validation("Please enter your email.".to_string()));
    }
    Ok(email)
}

/// Sign-in only needs a password; the length rule is for new accounts.
pub fn login_password(raw: &str) -> Result<&str, ApiError> {
    if raw.is_empty() {
        return Err(ApiError::Validation("Please enter your password.".to_string()));
    }
    Ok(raw)
}

/// Length is counted in characters, not bytes.
pub fn password(raw: &str) -> Result<&str, ApiError> {
    if raw.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters."
        )));
    }
    Ok(raw)
}
