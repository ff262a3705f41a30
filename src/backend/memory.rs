//! In-memory backend
//!
//! Implements both collaborators over process-local maps. Used by the test
//! suites and for running the flows without a hosted project. Sign-up
//! creates the matching profile row the way the hosted database trigger
//! does.

use crate::error::{IdentityError, StoreError};
use crate::identity::{AccountId, INVALID_CREDENTIALS_REASON, IdentityService, Session, SignUp};
use crate::profile::{ProfileChanges, ProfileRecord, ProfileStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

struct Account {
    id: AccountId,
    password: String,
}

#[derive(Default)]
pub struct MemoryBackend {
    accounts: RwLock<HashMap<String, Account>>,
    profiles: RwLock<HashMap<AccountId, ProfileRecord>>,
    sessions: RwLock<HashSet<String>>,
    fail_profile_writes: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an account and its profile row in one go.
    pub async fn insert_account(&self, email: &str, password: &str, username: &str) -> AccountId {
        let id = AccountId::new(Uuid::new_v4().to_string());
        self.accounts.write().await.insert(
            email.to_string(),
            Account {
                id: id.clone(),
                password: password.to_string(),
            },
        );
        self.profiles.write().await.insert(
            id.clone(),
            ProfileRecord::new(id.clone(), Utc::now()).with_username(username),
        );
        id
    }

    /// Inserts a profile row as-is, bypassing the uniqueness check.
    pub async fn insert_profile(&self, record: ProfileRecord) {
        self.profiles.write().await.insert(record.id.clone(), record);
    }

    /// Makes every profile write fail until switched off again.
    pub fn set_fail_profile_writes(&self, fail: bool) {
        self.fail_profile_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_profile_writes.load(Ordering::SeqCst) {
            Err(StoreError::Backend("profile writes disabled".into()))
        } else {
            Ok(())
        }
    }

    async fn issue_session(&self, id: &AccountId) -> Session {
        let token = Uuid::new_v4().to_string();
        self.sessions.write().await.insert(token.clone());
        Session::new(id.clone(), token)
    }
}

#[async_trait]
impl IdentityService for MemoryBackend {
    async fn authenticate(&self, email: &str, secret: &str) -> Result<Session, IdentityError> {
        let id = {
            let accounts = self.accounts.read().await;
            match accounts.get(email) {
                Some(account) if account.password == secret => account.id.clone(),
                _ => {
                    return Err(IdentityError::Rejected {
                        reason: INVALID_CREDENTIALS_REASON.into(),
                    });
                }
            }
        };
        Ok(self.issue_session(&id).await)
    }

    async fn sign_up(&self, email: &str, secret: &str) -> Result<SignUp, IdentityError> {
        let id = {
            let mut accounts = self.accounts.write().await;
            if accounts.contains_key(email) {
                return Err(IdentityError::Rejected {
                    reason: "User already registered".into(),
                });
            }
            let id = AccountId::new(Uuid::new_v4().to_string());
            accounts.insert(
                email.to_string(),
                Account {
                    id: id.clone(),
                    password: secret.to_string(),
                },
            );
            id
        };

        self.profiles
            .write()
            .await
            .insert(id.clone(), ProfileRecord::new(id.clone(), Utc::now()));

        let session = self.issue_session(&id).await;
        Ok(SignUp {
            account_id: id,
            session: Some(session),
        })
    }

    async fn end_session(&self, session: &Session) -> Result<(), IdentityError> {
        if self.sessions.write().await.remove(session.access_token()) {
            Ok(())
        } else {
            Err(IdentityError::Rejected {
                reason: "Session not found".into(),
            })
        }
    }
}

#[async_trait]
impl ProfileStore for MemoryBackend {
    async fn find_by_username(&self, username: &str) -> Result<Option<ProfileRecord>, StoreError> {
        let profiles = self.profiles.read().await;
        let mut matches = profiles
            .values()
            .filter(|p| p.username.as_deref() == Some(username));

        let first = matches.next().cloned();
        let extra = matches.count();
        if extra > 0 {
            return Err(StoreError::Ambiguous {
                username: username.to_string(),
                matches: extra + 1,
            });
        }
        Ok(first)
    }

    async fn find_email_by_internal_id(&self, id: &AccountId) -> Result<Option<String>, StoreError> {
        Ok(self
            .accounts
            .read()
            .await
            .iter()
            .find(|(_, account)| &account.id == id)
            .map(|(email, _)| email.clone()))
    }

    async fn touch_login(&self, id: &AccountId, now: DateTime<Utc>) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .get_mut(id)
            .ok_or_else(|| StoreError::Backend(format!("no profile row for {}", id)))?;
        profile.last_login = Some(now);
        profile.updated_at = now;
        Ok(())
    }

    async fn get_profile(&self, id: &AccountId) -> Result<Option<ProfileRecord>, StoreError> {
        Ok(self.profiles.read().await.get(id).cloned())
    }

    async fn update_profile(
        &self,
        id: &AccountId,
        changes: &ProfileChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<ProfileRecord>, StoreError> {
        self.check_writable()?;
        let mut profiles = self.profiles.write().await;

        if let Some(username) = &changes.username {
            let taken = profiles
                .values()
                .any(|p| &p.id != id && p.username.as_deref() == Some(username.as_str()));
            if taken {
                return Err(StoreError::Conflict(username.clone()));
            }
        }

        Ok(profiles.get_mut(id).map(|profile| {
            profile.apply(changes, now);
            profile.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sign_up_creates_blank_profile() {
        let backend = MemoryBackend::new();
        let sign_up = backend.sign_up("j@example.com", "secret1").await.unwrap();

        let profile = backend.get_profile(&sign_up.account_id).await.unwrap().unwrap();
        assert_eq!(profile.username, None);
        assert_eq!(
            backend.find_email_by_internal_id(&sign_up.account_id).await.unwrap(),
            Some("j@example.com".to_string())
        );

        let err = backend.sign_up("j@example.com", "other").await.unwrap_err();
        assert!(matches!(err, IdentityError::Rejected { .. }));
    }

    #[tokio::test]
    async fn wrong_password_is_credential_rejection() {
        let backend = MemoryBackend::new();
        backend.insert_account("j@example.com", "x", "jdoe").await;

        let err = backend.authenticate("j@example.com", "y").await.unwrap_err();
        assert_eq!(
            err,
            IdentityError::Rejected {
                reason: INVALID_CREDENTIALS_REASON.into()
            }
        );
    }

    #[tokio::test]
    async fn usernames_stay_unique() {
        let backend = MemoryBackend::new();
        backend.insert_account("a@example.com", "x", "alice").await;
        let bob = backend.insert_account("b@example.com", "x", "bob").await;

        let changes = ProfileChanges {
            username: Some("alice".into()),
            ..ProfileChanges::default()
        };
        let err = backend.update_profile(&bob, &changes, Utc::now()).await.unwrap_err();
        assert_eq!(err, StoreError::Conflict("alice".into()));

        backend
            .insert_profile(ProfileRecord::new(AccountId::new("dup"), Utc::now()).with_username("alice"))
            .await;
        let err = backend.find_by_username("alice").await.unwrap_err();
        assert!(matches!(err, StoreError::Ambiguous { matches: 2, .. }));
    }

    #[tokio::test]
    async fn sessions_end_once() {
        let backend = MemoryBackend::new();
        backend.insert_account("j@example.com", "x", "jdoe").await;

        let session = backend.authenticate("j@example.com", "x").await.unwrap();
        assert_eq!(backend.active_sessions().await, 1);
        assert!(backend.end_session(&session).await.is_ok());
        assert!(backend.end_session(&session).await.is_err());
        assert_eq!(backend.active_sessions().await, 0);
    }
}
