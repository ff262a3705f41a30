//! Profile store
//!
//! The application's own row per account, kept in the backend's relational
//! store next to the identity service's account table.

use crate::error::StoreError;
use crate::identity::AccountId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the profile table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    #[serde(rename = "id_uuid")]
    pub id: AccountId,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl ProfileRecord {
    /// Fresh row as created when an account signs up
    pub fn new(id: AccountId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            username: None,
            full_name: None,
            avatar_url: None,
            bio: None,
            created_at: now,
            updated_at: now,
            last_login: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Apply an edit in place
    pub fn apply(&mut self, changes: &ProfileChanges, now: DateTime<Utc>) {
        if let Some(full_name) = &changes.full_name {
            self.full_name = Some(full_name.clone());
        }
        if let Some(username) = &changes.username {
            self.username = Some(username.clone());
        }
        if let Some(avatar_url) = &changes.avatar_url {
            self.avatar_url = Some(avatar_url.clone());
        }
        if let Some(bio) = &changes.bio {
            self.bio = Some(bio.clone());
        }
        self.updated_at = now;
    }
}

/// Editable profile fields; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.username.is_none()
            && self.avatar_url.is_none()
            && self.bio.is_none()
    }
}

/// Relational store holding profile rows.
///
/// Implementations keep `username` unique: lookups that find more than one
/// row return `StoreError::Ambiguous`, writes that would duplicate one
/// return `StoreError::Conflict`.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Row whose username equals `username` exactly.
    async fn find_by_username(&self, username: &str) -> Result<Option<ProfileRecord>, StoreError>;

    /// Canonical email of the account behind a profile.
    async fn find_email_by_internal_id(&self, id: &AccountId) -> Result<Option<String>, StoreError>;

    /// Set `last_login` and `updated_at` to `now`.
    async fn touch_login(&self, id: &AccountId, now: DateTime<Utc>) -> Result<(), StoreError>;

    async fn get_profile(&self, id: &AccountId) -> Result<Option<ProfileRecord>, StoreError>;

    /// Apply `changes` and set `updated_at`; `None` when no row has this id.
    async fn update_profile(
        &self,
        id: &AccountId,
        changes: &ProfileChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<ProfileRecord>, StoreError>;
}
