//! Error handlers
//!
//! Turns errors into the text shown on the forms and logs the detail.

use crate::error::types::{
    AuthError, IdentityError, PortalError, ProfileError, RegistrationError, StoreError,
};
use log::error;

/// Shown for every transient failure; the detail only goes to the log.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred. Please try again.";

/// Handle a portal error
pub fn handle_error(err: &PortalError) {
    error!("Portal error: {}", err);
}

/// Log the error and return what the form should show
pub fn report(err: &PortalError) -> String {
    handle_error(err);
    user_message(err)
}

/// Convert error to the message rendered on the form
pub fn user_message(err: &PortalError) -> String {
    match err {
        PortalError::Auth(e) => auth_message(e),
        PortalError::Registration(e) => registration_message(e),
        PortalError::Profile(e) => profile_message(e),
        PortalError::Identity(IdentityError::Rejected { reason }) => reason.clone(),
        PortalError::Store(StoreError::Conflict(u)) => format!("Username {} is already taken", u),
        PortalError::Identity(_) | PortalError::Store(_) | PortalError::Config(_) => {
            UNEXPECTED_ERROR_MESSAGE.to_string()
        }
    }
}

fn auth_message(err: &AuthError) -> String {
    match err {
        AuthError::Validation(msg) => msg.clone(),
        AuthError::UserNotFound(_) => "User not found".to_string(),
        AuthError::InvalidCredentials => "Invalid login credentials".to_string(),
        AuthError::NotLoggedIn => "Please log in first".to_string(),
        AuthError::InvalidState(msg) => msg.clone(),
        AuthError::Transient(_) => UNEXPECTED_ERROR_MESSAGE.to_string(),
    }
}

fn registration_message(err: &RegistrationError) -> String {
    match err {
        RegistrationError::Validation(msg) => msg.clone(),
        RegistrationError::UsernameTaken(u) => format!("Username {} is already taken", u),
        RegistrationError::Rejected(reason) => reason.clone(),
        RegistrationError::Transient(_) => UNEXPECTED_ERROR_MESSAGE.to_string(),
    }
}

fn profile_message(err: &ProfileError) -> String {
    match err {
        ProfileError::NotLoggedIn => "Please log in first".to_string(),
        ProfileError::NotFound(_) => "Profile not found".to_string(),
        ProfileError::Validation(msg) => msg.clone(),
        ProfileError::UsernameTaken(u) => format!("Username {} is already taken", u),
        ProfileError::Transient(_) => UNEXPECTED_ERROR_MESSAGE.to_string(),
    }
}
