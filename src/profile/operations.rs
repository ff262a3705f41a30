//! Profile operations
//!
//! Viewing and editing the signed-in user's own profile row.

use super::store::{ProfileChanges, ProfileRecord, ProfileStore};
use crate::auth::validate_username;
use crate::config::AuthConfig;
use crate::error::ProfileError;
use crate::identity::Session;
use crate::utils::within;
use chrono::Utc;
use log::info;

/// Loads the profile of the account the session belongs to.
pub async fn view_profile(
    store: &dyn ProfileStore,
    session: &Session,
    config: &AuthConfig,
) -> Result<ProfileRecord, ProfileError> {
    let id = session.account_id();

    within(config.request_timeout(), "profile fetch", store.get_profile(id))
        .await
        .map_err(ProfileError::Transient)??
        .ok_or_else(|| ProfileError::NotFound(id.to_string()))
}

/// Applies `changes` to the signed-in user's profile and returns the new row.
pub async fn edit_profile(
    store: &dyn ProfileStore,
    session: &Session,
    changes: &ProfileChanges,
    config: &AuthConfig,
) -> Result<ProfileRecord, ProfileError> {
    let id = session.account_id();

    if changes.is_empty() {
        return view_profile(store, session, config).await;
    }

    if let Some(full_name) = &changes.full_name {
        if full_name.trim().is_empty() {
            return Err(ProfileError::Validation("Full name is required".into()));
        }
    }

    if let Some(username) = &changes.username {
        validate_username(username, config).map_err(ProfileError::Validation)?;

        let holder = within(
            config.request_timeout(),
            "username check",
            store.find_by_username(username),
        )
        .await
        .map_err(ProfileError::Transient)??;

        if holder.is_some_and(|profile| &profile.id != id) {
            return Err(ProfileError::UsernameTaken(username.clone()));
        }
    }

    let updated = within(
        config.request_timeout(),
        "profile update",
        store.update_profile(id, changes, Utc::now()),
    )
    .await
    .map_err(ProfileError::Transient)??
    .ok_or_else(|| ProfileError::NotFound(id.to_string()))?;

    info!("Profile {} updated", id);
    Ok(updated)
}
