//! Registration operations
//!
//! Creates the account with the identity service, then fills in the
//! profile row the backend created for it.

use super::results::Registered;
use super::validation::{RegistrationForm, validate_registration};
use crate::config::AuthConfig;
use crate::error::{IdentityError, RegistrationError, StoreError};
use crate::identity::IdentityService;
use crate::profile::{ProfileChanges, ProfileStore};
use crate::utils::within;
use chrono::Utc;
use log::{error, info};

pub async fn register(
    identity: &dyn IdentityService,
    profiles: &dyn ProfileStore,
    form: &RegistrationForm,
    config: &AuthConfig,
) -> Result<Registered, RegistrationError> {
    validate_registration(form, config)?;
    let limit = config.request_timeout();

    let holder = within(limit, "username check", profiles.find_by_username(&form.username))
        .await
        .map_err(RegistrationError::Transient)?;
    match holder {
        Ok(None) => {}
        Ok(Some(_)) | Err(StoreError::Ambiguous { .. }) => {
            return Err(RegistrationError::UsernameTaken(form.username.clone()));
        }
        Err(e) => return Err(RegistrationError::Transient(e.to_string())),
    }

    let sign_up = within(limit, "sign-up", identity.sign_up(&form.email, &form.password))
        .await
        .map_err(RegistrationError::Transient)?
        .map_err(|e| match e {
            IdentityError::Rejected { reason } => RegistrationError::Rejected(reason),
            IdentityError::Transport(msg) => RegistrationError::Transient(msg),
        })?;

    info!("Account {} registered", sign_up.account_id);

    let changes = ProfileChanges {
        full_name: Some(form.full_name.clone()),
        username: Some(form.username.clone()),
        ..ProfileChanges::default()
    };

    // The account exists at this point; a failed profile fill-in is only logged.
    match within(
        limit,
        "profile fill-in",
        profiles.update_profile(&sign_up.account_id, &changes, Utc::now()),
    )
    .await
    {
        Ok(Ok(Some(_))) => {}
        Ok(Ok(None)) => error!("No profile row for new account {}", sign_up.account_id),
        Ok(Err(e)) => error!("Error updating profile for {}: {}", sign_up.account_id, e),
        Err(e) => error!("Error updating profile for {}: {}", sign_up.account_id, e),
    }

    Ok(Registered {
        account_id: sign_up.account_id,
        session: sign_up.session,
    })
}
