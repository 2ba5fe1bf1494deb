//! `AdminSession` extractor for admin handlers.
//!
//! The gate normally verifies the session and stores the claims in request
//! extensions. Handlers still take `AdminSession` so an admin route mounted
//! outside the gate is refused instead of served.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::Response,
};
use std::sync::Arc;
use tracing::error;

use super::{
    cookie::extract_session_cookie,
    credential::SessionClaims,
    gate::{evaluate, redirect_response, GateAction, RouteClass},
    state::AuthState,
};

/// A verified administrator session.
#[derive(Clone, Debug)]
pub struct AdminSession {
    pub claims: SessionClaims,
}

impl AdminSession {
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.claims.sub
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<SessionClaims>() {
            return Ok(Self {
                claims: claims.clone(),
            });
        }

        let Some(auth) = parts.extensions.get::<Arc<AuthState>>().cloned() else {
            error!(
                fault = "session_gate_missing",
                path = parts.uri.path(),
                "Admin handler reached without auth state"
            );
            return Err(redirect_response(
                GateAction::RedirectToLogin {
                    clear_cookie: false,
                },
                false,
                &parts.method,
            ));
        };

        let credential = extract_session_cookie(&parts.headers);
        let (action, claims) =
            evaluate(&auth, RouteClass::AdminProtected, credential.as_deref()).await;

        claims
            .map(|claims| Self { claims })
            .ok_or_else(|| redirect_response(action, auth.config().secure_cookies(), &parts.method))
    }
}
