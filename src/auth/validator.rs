//! Form input validation
//!
//! Pre-flight checks run before any backend call. Values are checked as
//! typed; nothing is trimmed on the caller's behalf.

use super::credentials::CredentialInput;
use crate::config::AuthConfig;
use crate::error::AuthError;

/// Checks for characters that never belong in an identifier.
fn has_control_chars(input: &str) -> bool {
    input.contains(['\r', '\n', '\0'])
}

/// Validates the login form.
pub fn validate_login(input: &CredentialInput, config: &AuthConfig) -> Result<(), AuthError> {
    if input.identifier.is_empty() {
        return Err(AuthError::Validation(
            "Email or username is required".into(),
        ));
    }

    if input.secret.is_empty() {
        return Err(AuthError::Validation("Password is required".into()));
    }

    if input.identifier.chars().count() > config.max_identifier_length {
        return Err(AuthError::Validation(
            "Email or username is too long".into(),
        ));
    }

    if has_control_chars(&input.identifier) {
        return Err(AuthError::Validation(
            "Email or username contains invalid characters".into(),
        ));
    }

    Ok(())
}

/// Validates a username chosen at registration or on the profile page.
///
/// Usernames may not contain `@`, otherwise the login form would read them
/// as email addresses.
pub fn validate_username(username: &str, config: &AuthConfig) -> Result<(), String> {
    if username.trim().is_empty() {
        return Err("Username is required".into());
    }

    if username.contains('@') {
        return Err("Username cannot contain @".into());
    }

    if username.chars().count() > config.max_identifier_length || has_control_chars(username) {
        return Err("Invalid username format".into());
    }

    Ok(())
}

/// Validates an email address well enough to send it to the identity service.
pub fn validate_email(email: &str, config: &AuthConfig) -> Result<(), String> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
        None => false,
    };

    if !valid || email.chars().count() > config.max_identifier_length || has_control_chars(email) {
        return Err("A valid email address is required".into());
    }

    Ok(())
}
