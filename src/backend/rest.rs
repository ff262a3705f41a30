//! Hosted backend over HTTP
//!
//! Speaks the identity API under `/auth/v1` and the table API under
//! `/rest/v1` of a hosted project. Every request carries the project's
//! public key in the `apikey` header.

use crate::config::BackendConfig;
use crate::error::{IdentityError, StoreError};
use crate::identity::{AccountId, IdentityService, Session, SignUp};
use crate::profile::{ProfileChanges, ProfileRecord, ProfileStore};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::debug;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

/// Postgres unique-violation code as reported by the table API.
const UNIQUE_VIOLATION: &str = "23505";

pub struct RestBackend {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    profile_table: String,
    account_table: String,
}

#[derive(Debug, Deserialize)]
struct UserBody {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    user: UserBody,
}

/// Sign-up answers with a session when confirmation is off, a bare user otherwise.
#[derive(Debug, Deserialize)]
struct SignUpBody {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    user: Option<UserBody>,
    id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
    code: Option<serde_json::Value>,
}

impl ErrorBody {
    fn parse(text: &str) -> Self {
        serde_json::from_str(text).unwrap_or_default()
    }

    fn reason(self, fallback: &str) -> String {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
            .unwrap_or_else(|| fallback.to_string())
    }

    fn is_unique_violation(&self) -> bool {
        matches!(&self.code, Some(serde_json::Value::String(code)) if code == UNIQUE_VIOLATION)
    }
}

#[derive(Debug, Deserialize)]
struct EmailRow {
    email: Option<String>,
}

fn session_from(
    account_id: String,
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
) -> Session {
    let mut session = Session::new(AccountId::new(account_id), access_token);
    if let Some(token) = refresh_token {
        session = session.with_refresh_token(token);
    }
    if let Some(secs) = expires_in {
        session = session.with_expiry(Utc::now() + Duration::seconds(secs));
    }
    session
}

impl RestBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("xseclabs-auth/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url().to_string(),
            anon_key: config.anon_key.clone(),
            profile_table: config.profile_table.clone(),
            account_table: config.account_table.clone(),
        })
    }

    fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, endpoint)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn with_key(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("apikey", &self.anon_key)
    }

    /// Table requests run with the project key as bearer.
    fn table_request(&self, request: RequestBuilder) -> RequestBuilder {
        self.with_key(request).bearer_auth(&self.anon_key)
    }

    async fn identity_call<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, IdentityError> {
        let response = request
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        let response = Self::check_identity(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| IdentityError::Transport(format!("Unreadable identity response: {}", e)))
    }

    async fn check_identity(response: Response) -> Result<Response, IdentityError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let reason = ErrorBody::parse(&text).reason(status.canonical_reason().unwrap_or("error"));
        debug!("Identity service answered {}: {}", status, reason);

        if status.is_client_error() {
            Err(IdentityError::Rejected { reason })
        } else {
            Err(IdentityError::Transport(format!("{}: {}", status, reason)))
        }
    }

    async fn table_call(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body = ErrorBody::parse(&text);
        if status == StatusCode::CONFLICT || body.is_unique_violation() {
            return Err(StoreError::Conflict(
                body.reason("duplicate key value violates unique constraint"),
            ));
        }
        Err(StoreError::Backend(format!(
            "{}: {}",
            status,
            body.reason("request failed")
        )))
    }

    async fn table_rows<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Vec<T>, StoreError> {
        self.table_call(request)
            .await?
            .json::<Vec<T>>()
            .await
            .map_err(|e| StoreError::Backend(format!("Unreadable table response: {}", e)))
    }

    fn profile_by_id(&self, request: RequestBuilder, id: &AccountId) -> RequestBuilder {
        request.query(&[("id_uuid", format!("eq.{}", id))])
    }
}

#[async_trait]
impl IdentityService for RestBackend {
    async fn authenticate(&self, email: &str, secret: &str) -> Result<Session, IdentityError> {
        let request = self
            .with_key(self.http.post(self.auth_url("token")))
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": secret }));

        let body: TokenBody = self.identity_call(request).await?;
        Ok(session_from(
            body.user.id,
            body.access_token,
            body.refresh_token,
            body.expires_in,
        ))
    }

    async fn sign_up(&self, email: &str, secret: &str) -> Result<SignUp, IdentityError> {
        let request = self
            .with_key(self.http.post(self.auth_url("signup")))
            .json(&json!({ "email": email, "password": secret }));

        let body: SignUpBody = self.identity_call(request).await?;
        let account_id = body
            .user
            .map(|u| u.id)
            .or(body.id)
            .ok_or_else(|| IdentityError::Transport("Sign-up response without user id".into()))?;

        let session = body.access_token.map(|token| {
            session_from(account_id.clone(), token, body.refresh_token, body.expires_in)
        });

        Ok(SignUp {
            account_id: AccountId::new(account_id),
            session,
        })
    }

    async fn end_session(&self, session: &Session) -> Result<(), IdentityError> {
        let request = self
            .with_key(self.http.post(self.auth_url("logout")))
            .bearer_auth(session.access_token());

        let response = request
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;
        Self::check_identity(response).await?;
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for RestBackend {
    async fn find_by_username(&self, username: &str) -> Result<Option<ProfileRecord>, StoreError> {
        let request = self
            .table_request(self.http.get(self.table_url(&self.profile_table)))
            .query(&[("username", format!("eq.{}", username)), ("select", "*".into())]);

        let mut rows: Vec<ProfileRecord> = self.table_rows(request).await?;
        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            n => Err(StoreError::Ambiguous {
                username: username.to_string(),
                matches: n,
            }),
        }
    }

    async fn find_email_by_internal_id(&self, id: &AccountId) -> Result<Option<String>, StoreError> {
        let request = self
            .table_request(self.http.get(self.table_url(&self.account_table)))
            .query(&[("id", format!("eq.{}", id)), ("select", "email".into())]);

        let rows: Vec<EmailRow> = self.table_rows(request).await?;
        Ok(rows.into_iter().next().and_then(|row| row.email))
    }

    async fn touch_login(&self, id: &AccountId, now: DateTime<Utc>) -> Result<(), StoreError> {
        let request = self
            .profile_by_id(
                self.table_request(self.http.patch(self.table_url(&self.profile_table))),
                id,
            )
            .header("Prefer", "return=minimal")
            .json(&json!({ "last_login": now, "updated_at": now }));

        self.table_call(request).await?;
        Ok(())
    }

    async fn get_profile(&self, id: &AccountId) -> Result<Option<ProfileRecord>, StoreError> {
        let request = self
            .profile_by_id(
                self.table_request(self.http.get(self.table_url(&self.profile_table))),
                id,
            )
            .query(&[("select", "*")]);

        let rows: Vec<ProfileRecord> = self.table_rows(request).await?;
        Ok(rows.into_iter().next())
    }

    async fn update_profile(
        &self,
        id: &AccountId,
        changes: &ProfileChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<ProfileRecord>, StoreError> {
        let mut body = serde_json::to_value(changes)
            .map_err(|e| StoreError::Backend(format!("Unserializable profile change: {}", e)))?;
        if let Some(fields) = body.as_object_mut() {
            fields.insert("updated_at".into(), json!(now));
        }

        let request = self
            .profile_by_id(
                self.table_request(self.http.patch(self.table_url(&self.profile_table))),
                id,
            )
            .header("Prefer", "return=representation")
            .json(&body);

        let rows: Vec<ProfileRecord> = self.table_rows(request).await.map_err(|e| match e {
            StoreError::Conflict(_) => {
                StoreError::Conflict(changes.username.clone().unwrap_or_default())
            }
            other => other,
        })?;
        Ok(rows.into_iter().next())
    }
}
