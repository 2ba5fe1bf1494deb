//! Session authentication: credentials, verification, issuance and the gate.
//!
//! Flow Overview:
//! 1) `POST /api/session` exchanges a fresh identity token for a signed session
//!    credential and sets it as the `session` cookie.
//! 2) Every non-static request runs through [`session_gate`], which verifies the
//!    cookie for admin and login paths and applies the gate table.
//! 3) Admin handlers take [`AdminSession`] so they never run unauthenticated.
//!
//! Security boundary: when the identity backend is unreachable or was never
//! configured, verification reports `Unavailable` and admin routes fail closed.

mod authority;
mod cookie;
mod credential;
mod extract;
mod gate;
mod issuer;
mod state;
mod verifier;

pub use authority::SessionAuthority;
pub use cookie::{
    clear_session_cookie, extract_session_cookie, session_cookie, SESSION_COOKIE_NAME,
};
pub use credential::{SessionClaims, SESSION_TTL_SECONDS};
pub use extract::AdminSession;
pub use gate::{
    decide, evaluate, is_static_asset, session_gate, GateAction, RouteClass, ADMIN_HOME_PATH,
    LOGIN_PATH,
};
pub use issuer::{IssueError, IssueFuture, IssuedSession, SessionIssuer, RECENT_AUTH_MAX_AGE_SECONDS};
pub use state::{AuthConfig, AuthState, Environment};
pub use verifier::{
    verify_credential, InvalidReason, Outcome, SessionVerifier, VerifyError, VerifyFuture,
};

#[cfg(test)]
pub(crate) use authority::test_support;
