//! Registration form validation
//!
//! Checks run in the order the form reports them; the first failure wins.

use crate::auth::{validate_email, validate_username};
use crate::config::AuthConfig;
use crate::error::RegistrationError;

/// What the registration form submits
#[derive(Clone)]
pub struct RegistrationForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub full_name: String,
    pub username: String,
}

impl std::fmt::Debug for RegistrationForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationForm")
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

pub fn validate_registration(
    form: &RegistrationForm,
    config: &AuthConfig,
) -> Result<(), RegistrationError> {
    if form.password != form.confirm_password {
        return Err(RegistrationError::Validation(
            "Passwords do not match".into(),
        ));
    }

    if form.password.chars().count() < config.min_password_length {
        return Err(RegistrationError::Validation(format!(
            "Use at least {} characters for your password",
            config.min_password_length
        )));
    }

    if form.full_name.trim().is_empty() {
        return Err(RegistrationError::Validation(
            "Full name is required".into(),
        ));
    }

    validate_username(&form.username, config).map_err(RegistrationError::Validation)?;
    validate_email(&form.email, config).map_err(RegistrationError::Validation)?;

    Ok(())
}
