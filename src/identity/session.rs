//! Session issued by the identity service
//!
//! The account flows never look inside the token; they only carry it back
//! to the service and read the account id it was issued for.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an account in the identity service.
///
/// Profile rows are keyed by the same value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Authenticated session
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    account_id: AccountId,
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(account_id: AccountId, access_token: impl Into<String>) -> Self {
        Self {
            account_id,
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
        }
    }

    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Account the session was issued for
    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Returns true once the expiry reported by the service has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

// Tokens never reach the logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("account_id", &self.account_id)
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Outcome of a successful sign-up
#[derive(Debug, Clone)]
pub struct SignUp {
    pub account_id: AccountId,
    /// Absent when the service wants the email confirmed first.
    pub session: Option<Session>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn debug_redacts_tokens() {
        let session = Session::new(AccountId::new("42"), "secret-token").with_refresh_token("r");
        let printed = format!("{:?}", session);
        assert!(printed.contains("42"));
        assert!(!printed.contains("secret-token"));
    }

    #[test]
    fn expiry_is_inclusive() {
        let now = Utc::now();
        let session = Session::new(AccountId::new("1"), "t").with_expiry(now);
        assert!(session.is_expired(now));
        assert!(!session.is_expired(now - Duration::seconds(1)));
        assert!(!Session::new(AccountId::new("1"), "t").is_expired(now));
    }
}
