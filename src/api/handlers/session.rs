//! Session issuance, out-of-band verification and logout.
//!
//! Flow Overview: the login page obtains an identity token from the identity
//! provider and posts it to `/api/session`. The issuer exchanges it for a
//! session credential (5 days) which is returned as the `session` cookie.
//! `/api/verify-session` lets pages confirm the cookie without going through
//! the gate, and `/logout` drops the cookie unconditionally.

use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;

use crate::auth::{
    clear_session_cookie, extract_session_cookie, session_cookie, AuthState, IssueError, Outcome,
    LOGIN_PATH,
};

#[derive(ToSchema, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    #[serde(default)]
    id_token: String,
}

#[derive(ToSchema, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    success: bool,
    /// Unix seconds at which the session expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl SessionResponse {
    fn failure(status: StatusCode, message: &str) -> Response {
        (
            status,
            Json(Self {
                success: false,
                expires_at: None,
                error: Some(message.to_string()),
            }),
        )
            .into_response()
    }
}

#[derive(ToSchema, Serialize, Debug)]
pub struct VerifySessionResponse {
    valid: bool,
}

#[utoipa::path(
    post,
    path= "/api/session",
    request_body = SessionRequest,
    responses (
        (status = 200, description = "Session created; the session cookie is set", body = SessionResponse),
        (status = 400, description = "Missing identity token", body = SessionResponse),
        (status = 401, description = "Identity token is invalid, expired or not from a recent login", body = SessionResponse),
        (status = 500, description = "Identity backend unavailable or not configured", body = SessionResponse),
    ),
    tag= "session"
)]
#[instrument(skip_all)]
pub async fn create_session(
    auth: Extension<Arc<AuthState>>,
    payload: Option<Json<SessionRequest>>,
) -> Response {
    let id_token = match payload {
        Some(Json(request)) if !request.id_token.trim().is_empty() => request.id_token,
        _ => return SessionResponse::failure(StatusCode::BAD_REQUEST, "missing identity token"),
    };

    let issuer = match auth.issuer() {
        Ok(issuer) => issuer,
        Err(unavailable) => {
            error!(
                fault = "identity_backend_unavailable",
                "Session issuance unavailable: {}",
                unavailable.reason()
            );
            return SessionResponse::failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "authentication service not configured",
            );
        }
    };

    let timeout = auth.config().verify_timeout();
    let issued = match tokio::time::timeout(timeout, issuer.issue(&id_token)).await {
        Ok(result) => result,
        Err(_) => Err(IssueError::Unavailable(format!(
            "session issuance timed out after {}ms",
            timeout.as_millis()
        ))),
    };

    let session = match issued {
        Ok(session) => session,
        Err(IssueError::InvalidToken(reason)) => {
            warn!(reason = %reason, "Identity token rejected");
            return SessionResponse::failure(StatusCode::UNAUTHORIZED, "invalid identity token");
        }
        Err(IssueError::Unavailable(reason)) => {
            error!(
                fault = "identity_backend_unavailable",
                "Failed to create session: {reason}"
            );
            return SessionResponse::failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to create session",
            );
        }
    };

    let cookie = match session_cookie(&session.credential, auth.config().secure_cookies()) {
        Ok(cookie) => cookie,
        Err(err) => {
            error!("Failed to build session cookie: {err}");
            return SessionResponse::failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to create session",
            );
        }
    };

    info!(subject = %session.subject, "session created");

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    (
        StatusCode::OK,
        headers,
        Json(SessionResponse {
            success: true,
            expires_at: Some(session.expires_at),
            error: None,
        }),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path= "/api/verify-session",
    responses (
        (status = 200, description = "Session cookie is valid", body = VerifySessionResponse),
        (status = 401, description = "Session cookie is absent or invalid", body = VerifySessionResponse),
        (status = 500, description = "Identity backend unavailable", body = VerifySessionResponse),
    ),
    tag= "session"
)]
pub async fn verify_session(auth: Extension<Arc<AuthState>>, headers: HeaderMap) -> Response {
    let credential = extract_session_cookie(&headers);
    let outcome = auth.verify(credential.as_deref()).await;

    let status = match &outcome {
        Outcome::Valid(_) => StatusCode::OK,
        Outcome::Absent => StatusCode::UNAUTHORIZED,
        Outcome::Invalid(reason) => {
            warn!(reason = reason.as_str(), "session credential rejected");
            StatusCode::UNAUTHORIZED
        }
        Outcome::Unavailable(reason) => {
            error!(
                fault = "identity_backend_unavailable",
                "Session verification unavailable: {reason}"
            );
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (
        status,
        Json(VerifySessionResponse {
            valid: outcome.is_valid(),
        }),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path= "/logout",
    responses (
        (status = 303, description = "Session cookie cleared; redirect to the login page"),
    ),
    tag= "session"
)]
/// Drop the session cookie. Works the same with or without a cookie.
pub async fn logout(auth: Extension<Arc<AuthState>>) -> Response {
    let mut response = Redirect::to(LOGIN_PATH).into_response();
    match clear_session_cookie(auth.config().secure_cookies()) {
        Ok(cookie) => {
            response.headers_mut().insert(SET_COOKIE, cookie);
        }
        Err(err) => error!("Failed to build session clear cookie: {err}"),
    }
    debug!("session cookie cleared");
    response
}
