//! Registration result types

use crate::identity::{AccountId, Session};

/// Result of a successful registration
#[derive(Debug, Clone)]
pub struct Registered {
    pub account_id: AccountId,
    /// `None` until the email address is confirmed.
    pub session: Option<Session>,
}

impl Registered {
    pub fn needs_confirmation(&self) -> bool {
        self.session.is_none()
    }
}
