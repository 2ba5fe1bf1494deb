//! Identity backend client.
//!
//! The backend vouches for two things: that an identity token came from a
//! fresh login, and what the live account record currently says (disabled
//! flag and the revocation watermark). Everything else about a session is
//! checked locally.

use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use std::{future::Future, pin::Pin, time::Duration};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::APP_USER_AGENT;

const API_KEY_HEADER: &str = "x-api-key";

pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, BackendError>> + Send + 'a>>;

/// Whether the backend must refuse identity tokens from stale logins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecentAuth {
    Required,
    NotRequired,
}

impl RecentAuth {
    const fn is_required(self) -> bool {
        matches!(self, Self::Required)
    }
}

/// Subject vouched for by a verified identity token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdTokenInfo {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Unix seconds of the login that produced the token.
    pub auth_time: i64,
}

/// Live account record used for revocation checks.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    /// Sessions authenticated before this unix second are revoked.
    #[serde(default)]
    pub tokens_valid_after: Option<i64>,
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("identity backend unavailable: {0}")]
    Unavailable(String),
    #[error("identity backend rejected the request: {0}")]
    Rejected(String),
}

/// Capability interface over the identity backend.
pub trait IdentityBackend: Send + Sync {
    fn verify_id_token<'a>(
        &'a self,
        id_token: &'a str,
        recent: RecentAuth,
    ) -> BackendFuture<'a, IdTokenInfo>;

    /// Returns `Ok(None)` when the account no longer exists.
    fn account<'a>(&'a self, uid: &'a str) -> BackendFuture<'a, Option<AccountRecord>>;
}

/// HTTP implementation of [`IdentityBackend`].
#[derive(Debug)]
pub struct RemoteBackend {
    client: Client,
    base_url: Url,
    api_key: SecretString,
}

impl RemoteBackend {
    /// Build a client with a hard request timeout; there are no retries.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: Url, api_key: SecretString, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path)
            .map_err(|err| BackendError::Unavailable(format!("invalid endpoint {path}: {err}")))
    }

    #[instrument(skip(self, id_token))]
    async fn fetch_id_token(
        &self,
        id_token: &str,
        recent: RecentAuth,
    ) -> Result<IdTokenInfo, BackendError> {
        let url = self.endpoint("v1/tokens:verify")?;
        let body = json!({
            "idToken": id_token,
            "requireRecentAuth": recent.is_required(),
        });

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|err| BackendError::Unavailable(err.to_string()))?;

        let status = response.status();
        debug!("token verify status: {}", status);

        match status {
            s if s.is_success() => response.json::<IdTokenInfo>().await.map_err(|err| {
                BackendError::Unavailable(format!("invalid token verify response: {err}"))
            }),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(BackendError::Rejected(format!("token verify returned {status}")))
            }
            _ => Err(BackendError::Unavailable(format!(
                "token verify returned {status}"
            ))),
        }
    }

    #[instrument(skip(self))]
    async fn fetch_account(&self, uid: &str) -> Result<Option<AccountRecord>, BackendError> {
        let mut url = self.endpoint("v1/accounts/")?;
        url.path_segments_mut()
            .map_err(|()| BackendError::Unavailable("identity API URL cannot be a base".into()))?
            .pop_if_empty()
            .push(uid);

        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .send()
            .await
            .map_err(|err| BackendError::Unavailable(err.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => response
                .json::<AccountRecord>()
                .await
                .map(Some)
                .map_err(|err| BackendError::Unavailable(format!("invalid account response: {err}"))),
            s => Err(BackendError::Unavailable(format!("account lookup returned {s}"))),
        }
    }
}

impl IdentityBackend for RemoteBackend {
    fn verify_id_token<'a>(
        &'a self,
        id_token: &'a str,
        recent: RecentAuth,
    ) -> BackendFuture<'a, IdTokenInfo> {
        Box::pin(self.fetch_id_token(id_token, recent))
    }

    fn account<'a>(&'a self, uid: &'a str) -> BackendFuture<'a, Option<AccountRecord>> {
        Box::pin(self.fetch_account(uid))
    }
}
