//! Client operations
//!
//! The form-level handlers: they own the busy flag and the stored session
//! and delegate the actual work to the resolver, the identity service and
//! the profile operations.

use crate::auth::{CredentialInput, CredentialResolver};
use crate::client::Client;
use crate::client::results::{LoginResult, LogoutResult};
use crate::config::AuthConfig;
use crate::error::{AuthError, ProfileError};
use crate::identity::IdentityService;
use crate::profile::{self, ProfileChanges, ProfileRecord, ProfileStore};
use crate::utils::within;
use chrono::Utc;
use log::{info, warn};
use tokio::sync::Mutex;

/// Handles the login form submission.
///
/// Only one login may be in flight per client, and a signed-in client must
/// sign out before logging in again. The stored session changes only when
/// the resolver succeeds.
pub async fn process_login(
    client: &Mutex<Client>,
    resolver: &CredentialResolver,
    input: &CredentialInput,
) -> Result<LoginResult, AuthError> {
    // Held until this future completes or is dropped.
    let _busy = {
        let state = client.lock().await;
        if state.is_logged_in() {
            return Err(AuthError::InvalidState(
                "Already logged in; log out first".into(),
            ));
        }
        state.begin_request().ok_or_else(|| {
            AuthError::InvalidState("A login request is already in progress".into())
        })?
    };

    let session = resolver.resolve(input).await?;
    let account_id = session.account_id().clone();
    client.lock().await.sign_in(session, input.identifier.clone());

    Ok(LoginResult { account_id })
}

/// Handles sign-out.
///
/// Local state is cleared even when the identity service cannot be reached.
pub async fn process_logout(
    client: &Mutex<Client>,
    identity: &dyn IdentityService,
    config: &AuthConfig,
) -> Result<LogoutResult, AuthError> {
    let session = client
        .lock()
        .await
        .logout()
        .ok_or(AuthError::NotLoggedIn)?;

    let account_id = session.account_id().clone();
    let revoked = match within(
        config.request_timeout(),
        "sign-out",
        identity.end_session(&session),
    )
    .await
    {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            warn!("Failed to end session for {}: {}", account_id, e);
            false
        }
        Err(e) => {
            warn!("Failed to end session for {}: {}", account_id, e);
            false
        }
    };

    info!("Account {} signed out", account_id);
    Ok(LogoutResult {
        account_id,
        revoked,
    })
}

/// Loads the profile page for the signed-in visitor.
pub async fn process_view_profile(
    client: &Mutex<Client>,
    store: &dyn ProfileStore,
    config: &AuthConfig,
) -> Result<ProfileRecord, ProfileError> {
    let session = client
        .lock()
        .await
        .require_session(Utc::now())
        .map_err(|_| ProfileError::NotLoggedIn)?
        .clone();

    profile::view_profile(store, &session, config).await
}

/// Saves the profile edit form for the signed-in visitor.
pub async fn process_edit_profile(
    client: &Mutex<Client>,
    store: &dyn ProfileStore,
    changes: &ProfileChanges,
    config: &AuthConfig,
) -> Result<ProfileRecord, ProfileError> {
    let session = client
        .lock()
        .await
        .require_session(Utc::now())
        .map_err(|_| ProfileError::NotLoggedIn)?
        .clone();

    profile::edit_profile(store, &session, changes, config).await
}
