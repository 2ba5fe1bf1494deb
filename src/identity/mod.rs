//! Identity backend configuration and the process-wide session capability.
//!
//! The backend is configured from a service-account JSON document. Missing or
//! broken credentials do not stop the server: the capability resolves to
//! [`Unavailable`] once, at startup, and every admin request then fails closed.

pub mod backend;

pub use backend::{
    AccountRecord, BackendError, BackendFuture, IdTokenInfo, IdentityBackend, RecentAuth,
    RemoteBackend,
};

use base64ct::{Base64, Encoding};
use once_cell::sync::OnceCell;
use secrecy::{ExposeSecret, SecretBox, SecretString};
use serde::Deserialize;
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{error, info};
use url::Url;

use crate::auth::SessionAuthority;

/// HS256 keys shorter than this are refused.
const MIN_SIGNING_KEY_BYTES: usize = 32;

static IDENTITY: OnceCell<IdentityHandle> = OnceCell::new();

/// The session capability, or the reason it could not be built.
pub type IdentityHandle = Result<Arc<SessionAuthority>, Unavailable>;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("service account credentials are not configured")]
    NotConfigured,
    #[error("invalid service account JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("service account field `{0}` is empty")]
    MissingField(&'static str),
    #[error("invalid identity API URL: {0}")]
    InvalidUrl(String),
    #[error("invalid signing key: {0}")]
    SigningKey(String),
    #[error("failed to build identity client: {0}")]
    Client(#[from] reqwest::Error),
}

/// The identity backend cannot be used; admin access fails closed.
#[derive(Debug, Clone, Error)]
#[error("identity backend unavailable: {reason}")]
pub struct Unavailable {
    reason: String,
}

impl Unavailable {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

#[derive(Deserialize)]
struct RawServiceAccount {
    project_id: String,
    api_url: String,
    api_key: String,
    signing_key: String,
}

/// Parsed service-account credentials.
#[derive(Debug)]
pub struct ServiceAccount {
    project_id: String,
    api_url: Url,
    api_key: SecretString,
    signing_key: SecretBox<Vec<u8>>,
}

impl ServiceAccount {
    /// Parse and validate a service-account JSON document.
    ///
    /// # Errors
    /// Returns an error if a field is missing, the URL is invalid, or the
    /// signing key is not base64 of at least 32 bytes.
    pub fn from_json(json: &str) -> Result<Self, IdentityError> {
        let raw: RawServiceAccount = serde_json::from_str(json)?;

        if raw.project_id.trim().is_empty() {
            return Err(IdentityError::MissingField("project_id"));
        }
        if raw.api_key.is_empty() {
            return Err(IdentityError::MissingField("api_key"));
        }

        let mut api_url =
            Url::parse(&raw.api_url).map_err(|err| IdentityError::InvalidUrl(err.to_string()))?;
        if !matches!(api_url.scheme(), "http" | "https") {
            return Err(IdentityError::InvalidUrl(format!(
                "unsupported scheme {}",
                api_url.scheme()
            )));
        }
        // Relative endpoint joins need a trailing slash on the base path.
        if !api_url.path().ends_with('/') {
            let path = format!("{}/", api_url.path());
            api_url.set_path(&path);
        }

        let key = Base64::decode_vec(raw.signing_key.trim())
            .map_err(|err| IdentityError::SigningKey(err.to_string()))?;
        if key.len() < MIN_SIGNING_KEY_BYTES {
            return Err(IdentityError::SigningKey(format!(
                "expected at least {MIN_SIGNING_KEY_BYTES} bytes, got {}",
                key.len()
            )));
        }

        Ok(Self {
            project_id: raw.project_id,
            api_url,
            api_key: SecretString::from(raw.api_key),
            signing_key: SecretBox::new(Box::new(key)),
        })
    }

    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    #[must_use]
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }
}

/// Build the session capability from raw service-account JSON.
///
/// # Errors
/// Returns an error if the credentials are missing or invalid.
pub fn connect(
    service_account: Option<&SecretString>,
    timeout: Duration,
) -> Result<Arc<SessionAuthority>, IdentityError> {
    let raw = service_account.ok_or(IdentityError::NotConfigured)?;
    let account = ServiceAccount::from_json(raw.expose_secret())?;
    let backend = RemoteBackend::new(account.api_url.clone(), account.api_key.clone(), timeout)?;

    info!(
        project_id = account.project_id(),
        api_url = %account.api_url(),
        "identity backend configured"
    );

    Ok(Arc::new(SessionAuthority::new(
        Arc::new(backend),
        account.signing_key.expose_secret(),
        account.project_id(),
    )))
}

/// Resolve the process-wide identity handle, building it on first use.
///
/// Concurrent first callers block on the same initialization; later calls
/// return the cached handle and ignore their arguments.
pub fn init(service_account: Option<&SecretString>, timeout: Duration) -> IdentityHandle {
    IDENTITY
        .get_or_init(|| {
            connect(service_account, timeout).map_err(|err| {
                error!(
                    fault = "identity_backend_unavailable",
                    "Identity backend disabled, admin access will fail closed: {err}"
                );
                Unavailable::new(err.to_string())
            })
        })
        .clone()
}
