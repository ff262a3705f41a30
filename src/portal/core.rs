//! Portal core
//!
//! Builds the collaborators from configuration and routes the site's form
//! submissions to the login, registration and profile handlers.

use log::info;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::auth::{CredentialInput, CredentialResolver};
use crate::backend::RestBackend;
use crate::client::{self, Client, LoginResult, LogoutResult};
use crate::config::PortalConfig;
use crate::error::{AuthError, PortalError, ProfileError, RegistrationError};
use crate::identity::IdentityService;
use crate::profile::{ProfileChanges, ProfileRecord, ProfileStore};
use crate::registration::{self, Registered, RegistrationForm};

/// Wires the collaborators, the configuration and the form handlers together.
pub struct Portal {
    identity: Arc<dyn IdentityService>,
    profiles: Arc<dyn ProfileStore>,
    resolver: CredentialResolver,
    config: Arc<PortalConfig>,
}

impl Portal {
    pub fn new(
        identity: Arc<dyn IdentityService>,
        profiles: Arc<dyn ProfileStore>,
        config: PortalConfig,
    ) -> Self {
        let resolver = CredentialResolver::new(
            Arc::clone(&identity),
            Arc::clone(&profiles),
            config.auth.clone(),
        );

        Self {
            identity,
            profiles,
            resolver,
            config: Arc::new(config),
        }
    }

    /// Connects to the hosted project described by `config`.
    pub fn connect(config: PortalConfig) -> Result<Self, PortalError> {
        config.validate()?;

        let backend = Arc::new(RestBackend::new(&config.backend).map_err(|e| {
            PortalError::Config(config::ConfigError::Message(format!(
                "Failed to build HTTP client: {}",
                e
            )))
        })?);

        info!("Portal backend: {}", config.backend.base_url());
        Ok(Self::new(backend.clone(), backend, config))
    }

    /// Loads `config.toml` and the environment, then connects.
    pub fn from_env() -> Result<Self, PortalError> {
        Self::connect(PortalConfig::load()?)
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    pub async fn login(
        &self,
        client: &Mutex<Client>,
        input: &CredentialInput,
    ) -> Result<LoginResult, AuthError> {
        client::process_login(client, &self.resolver, input).await
    }

    pub async fn logout(&self, client: &Mutex<Client>) -> Result<LogoutResult, AuthError> {
        client::process_logout(client, self.identity.as_ref(), &self.config.auth).await
    }

    pub async fn register(&self, form: &RegistrationForm) -> Result<Registered, RegistrationError> {
        registration::register(
            self.identity.as_ref(),
            self.profiles.as_ref(),
            form,
            &self.config.auth,
        )
        .await
    }

    pub async fn view_profile(&self, client: &Mutex<Client>) -> Result<ProfileRecord, ProfileError> {
        client::process_view_profile(client, self.profiles.as_ref(), &self.config.auth).await
    }

    pub async fn edit_profile(
        &self,
        client: &Mutex<Client>,
        changes: &ProfileChanges,
    ) -> Result<ProfileRecord, ProfileError> {
        client::process_edit_profile(client, self.profiles.as_ref(), changes, &self.config.auth)
            .await
    }
}
