//! Configuration management for the xseclabs portal
//!
//! Separates the backend connection settings from the behaviour of the
//! account flows. Values come from `config.toml` layered with
//! `XSECLABS_*` environment variables (e.g. `XSECLABS_BACKEND__ANON_KEY`).

use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// Complete portal configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PortalConfig {
    pub backend: BackendConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

/// Where the hosted backend lives and which tables hold our rows
#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    /// Project URL, e.g. `https://abc.supabase.co`
    pub url: String,

    /// Public API key sent as `apikey` on every request
    pub anon_key: String,

    /// Table holding one profile row per account
    #[serde(default = "default_profile_table")]
    pub profile_table: String,

    /// Table or view exposing the canonical email per account id
    #[serde(default = "default_account_table")]
    pub account_table: String,
}

/// Behaviour of the login, registration and profile flows
#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Upper bound for every backend call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Minimum password length accepted at registration
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,

    /// Maximum identifier (email or username) length
    #[serde(default = "default_max_identifier_length")]
    pub max_identifier_length: usize,

    /// Run the post-login timestamp update as a detached task
    #[serde(default = "default_detach_login_touch")]
    pub detach_login_touch: bool,
}

fn default_profile_table() -> String {
    "user_profiles".to_string()
}

fn default_account_table() -> String {
    "users".to_string()
}

fn default_request_timeout_secs() -> u64 {
    5
}

fn default_min_password_length() -> usize {
    6
}

fn default_max_identifier_length() -> usize {
    254
}

fn default_detach_login_touch() -> bool {
    true
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            min_password_length: default_min_password_length(),
            max_identifier_length: default_max_identifier_length(),
            detach_login_touch: default_detach_login_touch(),
        }
    }
}

impl PortalConfig {
    /// Build a configuration in code with default flow settings
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            backend: BackendConfig {
                url: url.into(),
                anon_key: anon_key.into(),
                profile_table: default_profile_table(),
                account_table: default_account_table(),
            },
            auth: AuthConfig::default(),
        }
    }

    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        // Deployed layout first, then the working directory
        let config_paths = ["xseclabs/config", "config"];

        let mut builder = Config::builder();
        for config_path in config_paths {
            builder = builder.add_source(File::with_name(config_path).required(false));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix("XSECLABS")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: PortalConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.backend.url.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "backend.url cannot be empty".into(),
            ));
        }

        if self.backend.anon_key.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "backend.anon_key cannot be empty".into(),
            ));
        }

        if self.backend.profile_table.is_empty() || self.backend.account_table.is_empty() {
            return Err(config::ConfigError::Message(
                "backend table names cannot be empty".into(),
            ));
        }

        if self.auth.request_timeout_secs == 0 {
            return Err(config::ConfigError::Message(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.auth.min_password_length == 0 {
            return Err(config::ConfigError::Message(
                "min_password_length must be greater than 0".into(),
            ));
        }

        if self.auth.max_identifier_length == 0 {
            return Err(config::ConfigError::Message(
                "max_identifier_length must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

impl BackendConfig {
    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

impl AuthConfig {
    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
