//! Module `client`
//!
//! Defines the `Client` struct holding one visitor's sign-in state: the
//! session issued by the identity service, the identifier used to obtain
//! it, and whether a login request is in flight.

use crate::error::AuthError;
use crate::identity::Session;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Sign-in state of one visitor.
#[derive(Debug, Default)]
pub struct Client {
    session: Option<Session>,
    identifier: Option<String>,
    is_busy: Arc<AtomicBool>,
}

/// Marks a login request as in flight; the mark is lifted on drop, so a
/// cancelled request does not leave the client stuck.
#[derive(Debug)]
pub struct BusyGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl Client {
    /// Stores a freshly issued session.
    pub fn sign_in(&mut self, session: Session, identifier: String) {
        self.session = Some(session);
        self.identifier = Some(identifier);
    }

    /// Clears the session and identifier, returning the session that was held.
    pub fn logout(&mut self) -> Option<Session> {
        self.identifier = None;
        self.session.take()
    }

    // --------------------
    // Getter methods
    // --------------------

    /// Returns whether a session is held.
    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    /// Returns whether a login request is in flight.
    pub fn is_busy(&self) -> bool {
        self.is_busy.load(Ordering::SeqCst)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Returns the email or username the visitor signed in with.
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    /// Guard for pages that need a signed-in visitor.
    ///
    /// A session past its reported expiry counts as signed out and is dropped.
    pub fn require_session(&mut self, now: DateTime<Utc>) -> Result<&Session, AuthError> {
        if self.session.as_ref().is_some_and(|s| s.is_expired(now)) {
            self.logout();
        }
        self.session.as_ref().ok_or(AuthError::NotLoggedIn)
    }

    // --------------------
    // Setter methods
    // --------------------

    pub fn set_busy(&mut self, busy: bool) {
        self.is_busy.store(busy, Ordering::SeqCst);
    }

    /// Claims the busy flag, or returns `None` if a request is already in flight.
    pub fn begin_request(&self) -> Option<BusyGuard> {
        self.is_busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| BusyGuard {
                flag: Arc::clone(&self.is_busy),
            })
    }
}
