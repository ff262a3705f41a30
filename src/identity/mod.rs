//! Identity service
//!
//! The hosted service that checks passwords and issues sessions. Session
//! storage, refresh and expiry stay on its side.

pub mod session;

pub use session::{AccountId, Session, SignUp};

use crate::error::IdentityError;
use async_trait::async_trait;

/// Reason the identity service reports for a wrong email/password pair.
pub const INVALID_CREDENTIALS_REASON: &str = "Invalid login credentials";

#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Exchange an email and password for a session.
    async fn authenticate(&self, email: &str, secret: &str) -> Result<Session, IdentityError>;

    /// Create an account.
    async fn sign_up(&self, email: &str, secret: &str) -> Result<SignUp, IdentityError>;

    /// Revoke the session on the service side.
    async fn end_session(&self, session: &Session) -> Result<(), IdentityError>;
}

/// Returns true when a rejection reason means the email/password pair was wrong.
///
/// The match is exact; any other wording is treated as a service failure.
pub fn is_invalid_credentials(reason: &str) -> bool {
    reason == INVALID_CREDENTIALS_REASON
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_credential_rejection() {
        assert!(is_invalid_credentials("Invalid login credentials"));
        assert!(!is_invalid_credentials("invalid login credentials"));
        assert!(!is_invalid_credentials("Invalid login credentials\n"));
        assert!(!is_invalid_credentials("Email not confirmed"));
        assert!(!is_invalid_credentials(""));
    }
}
