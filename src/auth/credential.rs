//! Session credential encoding.
//!
//! A session credential is an HS256 JWT carrying the subject, the time of the
//! login that minted it (`auth_time`), and a fixed 5-day expiry.

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::verifier::InvalidReason;

/// Session validity window, fixed at 5 days.
pub const SESSION_TTL_SECONDS: i64 = 5 * 24 * 60 * 60;

/// Claims carried by a session credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SessionClaims {
    pub iss: String,
    pub aud: String,
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub iat: i64,
    pub exp: i64,
    pub auth_time: i64,
    pub jti: String,
}

pub(crate) struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
}

impl SessionKeys {
    pub(crate) fn new(secret: &[u8], project_id: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer: format!("bombilla:{project_id}"),
            audience: project_id.to_string(),
        }
    }

    /// Mint a credential issued at `now`. The expiry is never caller-supplied.
    pub(crate) fn sign(
        &self,
        subject: &str,
        email: Option<String>,
        auth_time: i64,
        now: i64,
    ) -> Result<(String, SessionClaims), jsonwebtoken::errors::Error> {
        let claims = SessionClaims {
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            sub: subject.to_string(),
            email,
            iat: now,
            exp: now + SESSION_TTL_SECONDS,
            auth_time,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok((token, claims))
    }

    /// Check signature, issuer, audience and expiry. Revocation is the caller's job.
    pub(crate) fn decode(&self, token: &str) -> Result<SessionClaims, InvalidReason> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iat", "sub", "aud", "iss"]);

        decode::<SessionClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => InvalidReason::Expired,
                ErrorKind::InvalidSignature => InvalidReason::BadSignature,
                _ => InvalidReason::Malformed,
            })
    }
}
