//! Client result types
//!
//! Defines result structures returned by client operations.

use crate::identity::AccountId;

/// Result of a login operation
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub account_id: AccountId,
}

/// Result of a logout operation
#[derive(Debug, Clone)]
pub struct LogoutResult {
    pub account_id: AccountId,
    /// Whether the identity service confirmed the revocation.
    pub revoked: bool,
}
