//! Request gate.
//!
//! Flow Overview: skip static assets, classify the path, verify the session
//! cookie only when the route class needs it, then map (class, outcome) to a
//! single action. The table is total:
//!
//! | class | outcome                     | action                       |
//! |-------|-----------------------------|------------------------------|
//! | admin | absent                      | redirect `/login`            |
//! | admin | invalid                     | redirect `/login`, clear cookie |
//! | admin | unavailable                 | redirect `/login` (fail closed) |
//! | admin | valid                       | allow                        |
//! | login | valid                       | redirect `/admin`            |
//! | login | absent/invalid/unavailable  | allow                        |
//! | public| any                         | allow                        |
//!
//! Redirects answering `GET`/`HEAD` are `307`; any other method gets `303` so
//! the browser lands on the login page with a `GET`.
//!
//! Identical (path, cookie, backend answer) always yields the identical action.

use axum::{
    extract::{Request, State},
    http::{header::SET_COOKIE, Method},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::{
    cookie::{clear_session_cookie, extract_session_cookie},
    credential::SessionClaims,
    state::AuthState,
    verifier::Outcome,
};

pub const LOGIN_PATH: &str = "/login";
pub const ADMIN_HOME_PATH: &str = "/admin";

const ADMIN_PREFIX: &str = "/admin";
const STATIC_ASSET_PREFIXES: [&str; 2] = ["/static/", "/assets/"];
const STATIC_ASSET_PATHS: [&str; 1] = ["/favicon.ico"];

/// Static assets never reach the gate.
#[must_use]
pub fn is_static_asset(path: &str) -> bool {
    STATIC_ASSET_PATHS.contains(&path)
        || STATIC_ASSET_PREFIXES
            .iter()
            .any(|prefix| path.starts_with(prefix))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteClass {
    AdminProtected,
    Login,
    Public,
}

impl RouteClass {
    /// Classify a request path. Pure; static assets must be filtered first.
    #[must_use]
    pub fn classify(path: &str) -> Self {
        if path.starts_with(ADMIN_PREFIX) {
            Self::AdminProtected
        } else if path == LOGIN_PATH {
            Self::Login
        } else {
            Self::Public
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AdminProtected => "admin",
            Self::Login => "login",
            Self::Public => "public",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateAction {
    Allow,
    RedirectToLogin { clear_cookie: bool },
    RedirectToAdmin,
}

/// The gate's transition table.
#[must_use]
pub fn decide(class: RouteClass, outcome: &Outcome) -> GateAction {
    match (class, outcome) {
        (RouteClass::Public, _)
        | (RouteClass::AdminProtected, Outcome::Valid(_))
        | (RouteClass::Login, Outcome::Absent | Outcome::Invalid(_) | Outcome::Unavailable(_)) => {
            GateAction::Allow
        }
        (RouteClass::AdminProtected, Outcome::Absent | Outcome::Unavailable(_)) => {
            GateAction::RedirectToLogin {
                clear_cookie: false,
            }
        }
        (RouteClass::AdminProtected, Outcome::Invalid(_)) => GateAction::RedirectToLogin {
            clear_cookie: true,
        },
        (RouteClass::Login, Outcome::Valid(_)) => GateAction::RedirectToAdmin,
    }
}

/// Evaluate one request. Public routes never trigger a verification call,
/// and neither does the login page without a cookie: every outcome there
/// allows.
///
/// Returns the verified claims alongside `Allow` for admin routes so handlers
/// can use them without verifying twice.
pub async fn evaluate(
    auth: &AuthState,
    class: RouteClass,
    credential: Option<&str>,
) -> (GateAction, Option<SessionClaims>) {
    if class == RouteClass::Public {
        return (GateAction::Allow, None);
    }
    if class == RouteClass::Login && credential.map_or(true, str::is_empty) {
        debug!(route_class = class.as_str(), "no session cookie");
        return (GateAction::Allow, None);
    }

    let outcome = auth.verify(credential).await;
    log_outcome(class, &outcome);

    let action = decide(class, &outcome);
    let claims = match outcome {
        Outcome::Valid(claims) if action == GateAction::Allow => Some(claims),
        _ => None,
    };
    (action, claims)
}

fn log_outcome(class: RouteClass, outcome: &Outcome) {
    match outcome {
        Outcome::Absent => debug!(route_class = class.as_str(), "no session cookie"),
        Outcome::Valid(claims) => debug!(
            route_class = class.as_str(),
            subject = %claims.sub,
            "session accepted"
        ),
        Outcome::Invalid(reason) => warn!(
            route_class = class.as_str(),
            reason = reason.as_str(),
            "session credential rejected"
        ),
        Outcome::Unavailable(reason) => error!(
            fault = "identity_backend_unavailable",
            route_class = class.as_str(),
            "Session verification unavailable, failing closed: {reason}"
        ),
    }
}

fn redirect(to: &str, method: &Method) -> Response {
    if *method == Method::GET || *method == Method::HEAD {
        Redirect::temporary(to).into_response()
    } else {
        Redirect::to(to).into_response()
    }
}

/// Turn a non-allow action into its redirect response.
pub(crate) fn redirect_response(action: GateAction, secure: bool, method: &Method) -> Response {
    match action {
        GateAction::RedirectToAdmin => redirect(ADMIN_HOME_PATH, method),
        GateAction::RedirectToLogin { clear_cookie } => {
            let mut response = redirect(LOGIN_PATH, method);
            if clear_cookie {
                match clear_session_cookie(secure) {
                    Ok(cookie) => {
                        response.headers_mut().append(SET_COOKIE, cookie);
                    }
                    Err(err) => error!("Failed to build session clear cookie: {err}"),
                }
            }
            response
        }
        // Callers handle Allow themselves; fail closed if one does not.
        GateAction::Allow => redirect(LOGIN_PATH, method),
    }
}

/// Axum middleware running the gate before any handler.
pub async fn session_gate(
    State(auth): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if is_static_asset(path) {
        return next.run(request).await;
    }

    let class = RouteClass::classify(path);
    let credential = extract_session_cookie(request.headers());
    let (action, claims) = evaluate(&auth, class, credential.as_deref()).await;

    if action == GateAction::Allow {
        if let Some(claims) = claims {
            request.extensions_mut().insert(claims);
        }
        return next.run(request).await;
    }

    redirect_response(action, auth.config().secure_cookies(), request.method())
}
