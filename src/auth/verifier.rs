//! Token verifier contract and outcome resolution.
//!
//! Verification yields one of four outcomes: no credential, a valid one, an
//! invalid one, or "could not tell" because the identity backend is down or
//! unconfigured. Callers only branch on the outcome; the reason behind an
//! invalid credential is kept for logs.

use futures_util::FutureExt;
use std::{future::Future, panic::AssertUnwindSafe, pin::Pin, time::Duration};
use thiserror::Error;

use super::credential::SessionClaims;
use crate::identity::Unavailable;

pub type VerifyFuture<'a> =
    Pin<Box<dyn Future<Output = Result<SessionClaims, VerifyError>> + Send + 'a>>;

/// Why a present credential was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    Malformed,
    BadSignature,
    Expired,
    Revoked,
    Disabled,
    UnknownAccount,
}

impl InvalidReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::BadSignature => "bad_signature",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
            Self::Disabled => "disabled",
            Self::UnknownAccount => "unknown_account",
        }
    }
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("invalid session credential ({})", .0.as_str())]
    Invalid(InvalidReason),
    #[error("identity backend unavailable: {0}")]
    Unavailable(String),
}

/// Checks a session credential. Read-only; safe to abandon mid-flight.
pub trait SessionVerifier: Send + Sync {
    fn verify<'a>(&'a self, credential: &'a str) -> VerifyFuture<'a>;
}

/// Result of checking the session cookie of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No cookie, or an empty one.
    Absent,
    Valid(SessionClaims),
    Invalid(InvalidReason),
    /// The identity backend could not answer; callers fail closed.
    Unavailable(String),
}

impl Outcome {
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Valid(_) => "valid",
            Self::Invalid(_) => "invalid",
            Self::Unavailable(_) => "service_unavailable",
        }
    }
}

/// Resolve a raw cookie value into an [`Outcome`].
///
/// A missing capability short-circuits to `Unavailable` before the cookie is
/// looked at, so a misconfigured deployment is reported even for anonymous
/// admin requests. The call is bounded by `timeout`; a timeout or a panic
/// inside the verifier is reported as `Unavailable`, never as `Valid`.
pub async fn verify_credential(
    verifier: Result<&dyn SessionVerifier, &Unavailable>,
    credential: Option<&str>,
    timeout: Duration,
) -> Outcome {
    let verifier = match verifier {
        Ok(verifier) => verifier,
        Err(unavailable) => return Outcome::Unavailable(unavailable.reason().to_string()),
    };

    let Some(credential) = credential.filter(|value| !value.is_empty()) else {
        return Outcome::Absent;
    };

    let call = AssertUnwindSafe(verifier.verify(credential)).catch_unwind();
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(Ok(claims))) => Outcome::Valid(claims),
        Ok(Ok(Err(VerifyError::Invalid(reason)))) => Outcome::Invalid(reason),
        Ok(Ok(Err(VerifyError::Unavailable(reason)))) => Outcome::Unavailable(reason),
        Ok(Err(_)) => Outcome::Unavailable("session verifier panicked".to_string()),
        Err(_) => Outcome::Unavailable(format!(
            "session verification timed out after {}ms",
            timeout.as_millis()
        )),
    }
}
