//! Auth configuration and the shared gate state.

use std::{fmt, str::FromStr, sync::Arc, time::Duration};

use super::{
    issuer::SessionIssuer,
    verifier::{verify_credential, Outcome, SessionVerifier},
};
use crate::identity::{IdentityHandle, Unavailable};

const DEFAULT_VERIFY_TIMEOUT_MS: u64 = 3_000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    environment: Environment,
    verify_timeout: Duration,
}

impl AuthConfig {
    #[must_use]
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            verify_timeout: Duration::from_millis(DEFAULT_VERIFY_TIMEOUT_MS),
        }
    }

    #[must_use]
    pub fn with_verify_timeout(mut self, timeout: Duration) -> Self {
        self.verify_timeout = timeout;
        self
    }

    #[must_use]
    pub fn environment(&self) -> Environment {
        self.environment
    }

    #[must_use]
    pub fn verify_timeout(&self) -> Duration {
        self.verify_timeout
    }

    /// Session cookies carry `Secure` in production, and only there.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.environment.is_production()
    }
}

/// Capabilities and config shared by the gate and the session handlers.
#[derive(Clone)]
pub struct AuthState {
    config: AuthConfig,
    verifier: Result<Arc<dyn SessionVerifier>, Unavailable>,
    issuer: Result<Arc<dyn SessionIssuer>, Unavailable>,
}

impl fmt::Debug for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthState")
            .field("config", &self.config)
            .field("verifier", &self.verifier.as_ref().map(|_| "configured"))
            .field("issuer", &self.issuer.as_ref().map(|_| "configured"))
            .finish()
    }
}

impl AuthState {
    /// Wire both capabilities from the process-wide identity handle.
    #[must_use]
    pub fn new(config: AuthConfig, identity: &IdentityHandle) -> Self {
        Self {
            config,
            verifier: identity
                .clone()
                .map(|authority| authority as Arc<dyn SessionVerifier>),
            issuer: identity
                .clone()
                .map(|authority| authority as Arc<dyn SessionIssuer>),
        }
    }

    /// Wire capabilities individually, e.g. with test doubles.
    #[must_use]
    pub fn with_capabilities(
        config: AuthConfig,
        verifier: Result<Arc<dyn SessionVerifier>, Unavailable>,
        issuer: Result<Arc<dyn SessionIssuer>, Unavailable>,
    ) -> Self {
        Self {
            config,
            verifier,
            issuer,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// # Errors
    /// Returns [`Unavailable`] when the identity backend is not configured.
    pub fn verifier(&self) -> Result<&dyn SessionVerifier, &Unavailable> {
        self.verifier.as_ref().map(|verifier| &**verifier)
    }

    /// # Errors
    /// Returns [`Unavailable`] when the identity backend is not configured.
    pub fn issuer(&self) -> Result<&dyn SessionIssuer, &Unavailable> {
        self.issuer.as_ref().map(|issuer| &**issuer)
    }

    /// Check a raw cookie value with the configured timeout.
    pub async fn verify(&self, credential: Option<&str>) -> Outcome {
        verify_credential(self.verifier(), credential, self.config.verify_timeout()).await
    }
}
