//! Credential resolver
//!
//! Turns what the login form submitted into a session: usernames are
//! resolved to the account's canonical email through the profile store,
//! the identity service checks the password, and the profile's login
//! timestamps are refreshed on a best-effort basis.

use super::credentials::{CredentialInput, Identifier};
use super::validator::validate_login;
use crate::config::AuthConfig;
use crate::error::{AuthError, IdentityError, StoreError};
use crate::identity::{AccountId, IdentityService, Session, is_invalid_credentials};
use crate::profile::ProfileStore;
use crate::utils::within;
use chrono::Utc;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

pub struct CredentialResolver {
    identity: Arc<dyn IdentityService>,
    profiles: Arc<dyn ProfileStore>,
    config: AuthConfig,
}

impl CredentialResolver {
    pub fn new(
        identity: Arc<dyn IdentityService>,
        profiles: Arc<dyn ProfileStore>,
        config: AuthConfig,
    ) -> Self {
        Self {
            identity,
            profiles,
            config,
        }
    }

    /// Resolves a login attempt to exactly one outcome.
    ///
    /// Nothing is written to the profile store unless the identity service
    /// accepted the credentials.
    pub async fn resolve(&self, input: &CredentialInput) -> Result<Session, AuthError> {
        validate_login(input, &self.config)?;

        let email = match input.classify() {
            Identifier::Email(email) => email.to_string(),
            Identifier::Username(username) => self.email_for_username(username).await?,
        };

        let session = self.authenticate(&email, &input.secret).await?;
        info!("Account {} authenticated", session.account_id());

        self.record_login(session.account_id().clone()).await;

        Ok(session)
    }

    fn timeout(&self) -> Duration {
        self.config.request_timeout()
    }

    async fn email_for_username(&self, username: &str) -> Result<String, AuthError> {
        debug!("Resolving username {}", username);

        let profile = within(
            self.timeout(),
            "profile lookup",
            self.profiles.find_by_username(username),
        )
        .await
        .map_err(AuthError::Transient)?
        .map_err(|e| match e {
            StoreError::Ambiguous { .. } => {
                warn!("Username uniqueness violated: {}", e);
                AuthError::Transient(e.to_string())
            }
            other => AuthError::Transient(other.to_string()),
        })?
        .ok_or_else(|| AuthError::UserNotFound(username.to_string()))?;

        within(
            self.timeout(),
            "email lookup",
            self.profiles.find_email_by_internal_id(&profile.id),
        )
        .await
        .map_err(AuthError::Transient)?
        .map_err(|e| AuthError::Transient(e.to_string()))?
        .ok_or_else(|| AuthError::Transient(format!("No email on record for profile {}", profile.id)))
    }

    async fn authenticate(&self, email: &str, secret: &str) -> Result<Session, AuthError> {
        within(
            self.timeout(),
            "authentication",
            self.identity.authenticate(email, secret),
        )
        .await
        .map_err(AuthError::Transient)?
        .map_err(|e| match e {
            IdentityError::Rejected { reason } if is_invalid_credentials(&reason) => {
                AuthError::InvalidCredentials
            }
            IdentityError::Rejected { reason } => AuthError::Transient(reason),
            IdentityError::Transport(msg) => AuthError::Transient(msg),
        })
    }

    /// Refreshes `last_login`/`updated_at`. Failures are logged and dropped.
    async fn record_login(&self, account_id: AccountId) {
        let profiles = Arc::clone(&self.profiles);
        let limit = self.timeout();

        let touch = async move {
            match within(limit, "login timestamp update", profiles.touch_login(&account_id, Utc::now()))
                .await
            {
                Ok(Ok(())) => debug!("Recorded login for {}", account_id),
                Ok(Err(e)) => warn!("Failed to record login for {}: {}", account_id, e),
                Err(e) => warn!("Failed to record login for {}: {}", account_id, e),
            }
        };

        if self.config.detach_login_touch {
            tokio::spawn(touch);
        } else {
            touch.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::SignUp;
    use crate::profile::{ProfileChanges, ProfileRecord};
    use async_trait::async_trait;
    use chrono::DateTime;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeIdentity {
        calls: Mutex<Vec<(String, String)>>,
        reply: Mutex<Option<IdentityError>>,
        delay: Option<Duration>,
    }

    impl FakeIdentity {
        fn failing(err: IdentityError) -> Self {
            Self {
                reply: Mutex::new(Some(err)),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl IdentityService for FakeIdentity {
        async fn authenticate(&self, email: &str, secret: &str) -> Result<Session, IdentityError> {
            self.calls
                .lock()
                .unwrap()
                .push((email.to_string(), secret.to_string()));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match self.reply.lock().unwrap().clone() {
                Some(err) => Err(err),
                None => Ok(Session::new(AccountId::new("acct-1"), "token")),
            }
        }

        async fn sign_up(&self, _email: &str, _secret: &str) -> Result<SignUp, IdentityError> {
            unreachable!("not used by the resolver")
        }

        async fn end_session(&self, _session: &Session) -> Result<(), IdentityError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeProfiles {
        rows: Vec<(ProfileRecord, Option<String>)>,
        lookups: Mutex<Vec<String>>,
        touched: Mutex<Vec<AccountId>>,
        fail_touch: bool,
        lookup_delay: Option<Duration>,
    }

    impl FakeProfiles {
        fn with(mut self, username: &str, id: &str, email: Option<&str>) -> Self {
            let record = ProfileRecord::new(AccountId::new(id), Utc::now()).with_username(username);
            self.rows.push((record, email.map(str::to_string)));
            self
        }
    }

    #[async_trait]
    impl ProfileStore for FakeProfiles {
        async fn find_by_username(&self, username: &str) -> Result<Option<ProfileRecord>, StoreError> {
            self.lookups.lock().unwrap().push(username.to_string());
            if let Some(delay) = self.lookup_delay {
                tokio::time::sleep(delay).await;
            }
            let matches: Vec<_> = self
                .rows
                .iter()
                .filter(|(r, _)| r.username.as_deref() == Some(username))
                .collect();
            match matches.len() {
                0 => Ok(None),
                1 => Ok(Some(matches[0].0.clone())),
                n => Err(StoreError::Ambiguous {
                    username: username.to_string(),
                    matches: n,
                }),
            }
        }

        async fn find_email_by_internal_id(&self, id: &AccountId) -> Result<Option<String>, StoreError> {
            Ok(self
                .rows
                .iter()
                .find(|(r, _)| &r.id == id)
                .and_then(|(_, email)| email.clone()))
        }

        async fn touch_login(&self, id: &AccountId, _now: DateTime<Utc>) -> Result<(), StoreError> {
            self.touched.lock().unwrap().push(id.clone());
            if self.fail_touch {
                Err(StoreError::Backend("write refused".into()))
            } else {
                Ok(())
            }
        }

        async fn get_profile(&self, _id: &AccountId) -> Result<Option<ProfileRecord>, StoreError> {
            Ok(None)
        }

        async fn update_profile(
            &self,
            _id: &AccountId,
            _changes: &ProfileChanges,
            _now: DateTime<Utc>,
        ) -> Result<Option<ProfileRecord>, StoreError> {
            Ok(None)
        }
    }

    fn inline_config() -> AuthConfig {
        AuthConfig {
            detach_login_touch: false,
            ..AuthConfig::default()
        }
    }

    fn resolver(
        identity: &Arc<FakeIdentity>,
        profiles: &Arc<FakeProfiles>,
    ) -> CredentialResolver {
        CredentialResolver::new(identity.clone(), profiles.clone(), inline_config())
    }

    #[tokio::test]
    async fn email_goes_straight_to_identity() {
        let identity = Arc::new(FakeIdentity::default());
        let profiles = Arc::new(FakeProfiles::default().with("jdoe", "acct-1", Some("j@example.com")));

        let session = resolver(&identity, &profiles)
            .resolve(&CredentialInput::new("someone@example.com", "x"))
            .await
            .unwrap();

        assert_eq!(session.account_id().as_str(), "acct-1");
        assert_eq!(identity.calls(), vec![("someone@example.com".to_string(), "x".to_string())]);
        assert!(profiles.lookups.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn username_resolves_to_canonical_email() {
        let identity = Arc::new(FakeIdentity::default());
        let profiles = Arc::new(FakeProfiles::default().with("jdoe", "acct-1", Some("j@example.com")));

        let result = resolver(&identity, &profiles)
            .resolve(&CredentialInput::new("jdoe", "x"))
            .await;

        assert!(result.is_ok());
        assert_eq!(identity.calls(), vec![("j@example.com".to_string(), "x".to_string())]);
        assert_eq!(*profiles.touched.lock().unwrap(), vec![AccountId::new("acct-1")]);
    }

    #[tokio::test]
    async fn unknown_username_skips_identity() {
        let identity = Arc::new(FakeIdentity::default());
        let profiles = Arc::new(FakeProfiles::default());

        let err = resolver(&identity, &profiles)
            .resolve(&CredentialInput::new("nobody", "x"))
            .await
            .unwrap_err();

        assert_eq!(err, AuthError::UserNotFound("nobody".into()));
        assert!(identity.calls().is_empty());
    }

    #[tokio::test]
    async fn username_lookup_is_case_sensitive() {
        let identity = Arc::new(FakeIdentity::default());
        let profiles = Arc::new(FakeProfiles::default().with("jdoe", "acct-1", Some("j@example.com")));

        let err = resolver(&identity, &profiles)
            .resolve(&CredentialInput::new("JDoe", "x"))
            .await
            .unwrap_err();

        assert_eq!(err, AuthError::UserNotFound("JDoe".into()));
    }

    #[tokio::test]
    async fn duplicate_usernames_are_transient() {
        let identity = Arc::new(FakeIdentity::default());
        let profiles = Arc::new(
            FakeProfiles::default()
                .with("jdoe", "acct-1", Some("j@example.com"))
                .with("jdoe", "acct-2", Some("other@example.com")),
        );

        let err = resolver(&identity, &profiles)
            .resolve(&CredentialInput::new("jdoe", "x"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::Transient(_)));
        assert!(identity.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_email_is_transient() {
        let identity = Arc::new(FakeIdentity::default());
        let profiles = Arc::new(FakeProfiles::default().with("jdoe", "acct-1", None));

        let err = resolver(&identity, &profiles)
            .resolve(&CredentialInput::new("jdoe", "x"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::Transient(_)));
        assert!(identity.calls().is_empty());
    }

    #[tokio::test]
    async fn rejection_reasons_are_classified() {
        let profiles = Arc::new(FakeProfiles::default());

        let identity = Arc::new(FakeIdentity::failing(IdentityError::Rejected {
            reason: "Invalid login credentials".into(),
        }));
        let err = resolver(&identity, &profiles)
            .resolve(&CredentialInput::new("j@example.com", "bad"))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);

        let identity = Arc::new(FakeIdentity::failing(IdentityError::Rejected {
            reason: "Email not confirmed".into(),
        }));
        let err = resolver(&identity, &profiles)
            .resolve(&CredentialInput::new("j@example.com", "x"))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::Transient("Email not confirmed".into()));

        let identity = Arc::new(FakeIdentity::failing(IdentityError::Transport(
            "connection refused".into(),
        )));
        let err = resolver(&identity, &profiles)
            .resolve(&CredentialInput::new("j@example.com", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Transient(_)));

        assert!(profiles.touched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_touch_keeps_session() {
        let identity = Arc::new(FakeIdentity::default());
        let profiles = Arc::new(FakeProfiles {
            fail_touch: true,
            ..FakeProfiles::default()
        });

        let result = resolver(&identity, &profiles)
            .resolve(&CredentialInput::new("j@example.com", "x"))
            .await;

        assert!(result.is_ok());
        assert_eq!(profiles.touched.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_input_never_reaches_backend() {
        let identity = Arc::new(FakeIdentity::default());
        let profiles = Arc::new(FakeProfiles::default());
        let resolver = resolver(&identity, &profiles);

        for input in [CredentialInput::new("", "x"), CredentialInput::new("jdoe", "")] {
            let err = resolver.resolve(&input).await.unwrap_err();
            assert!(matches!(err, AuthError::Validation(_)));
        }

        assert!(identity.calls().is_empty());
        assert!(profiles.lookups.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_identity_service_is_transient() {
        let identity = Arc::new(FakeIdentity {
            delay: Some(Duration::from_secs(30)),
            ..FakeIdentity::default()
        });
        let profiles = Arc::new(FakeProfiles::default().with("jdoe", "acct-1", Some("j@example.com")));

        let err = resolver(&identity, &profiles)
            .resolve(&CredentialInput::new("jdoe", "x"))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            AuthError::Transient("authentication timed out after 5000ms".into())
        );
        assert_eq!(identity.calls().len(), 1);
        assert!(profiles.touched.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_profile_lookup_is_transient() {
        let identity = Arc::new(FakeIdentity::default());
        let profiles = Arc::new(FakeProfiles {
            lookup_delay: Some(Duration::from_secs(30)),
            ..FakeProfiles::default()
        }
        .with("jdoe", "acct-1", Some("j@example.com")));

        let err = resolver(&identity, &profiles)
            .resolve(&CredentialInput::new("jdoe", "x"))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            AuthError::Transient("profile lookup timed out after 5000ms".into())
        );
        assert!(identity.calls().is_empty());
        assert!(profiles.touched.lock().unwrap().is_empty());
    }
}
