//! End-to-end gate behavior against a mocked identity backend.

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        Method, Request, StatusCode,
    },
    response::Response,
    Router,
};
use base64ct::{Base64, Encoding};
use bombilla::{
    api::{self, AppContext},
    auth::{AuthConfig, AuthState, Environment},
    identity::{self, IdentityHandle, Unavailable},
    notify::{LogNotifier, OrderNotifier},
    store::Store,
};
use chrono::Utc;
use secrecy::SecretString;
use serde_json::{json, Value};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tower::ServiceExt;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

const ADMIN_UID: &str = "admin-1";
const VERIFY_TIMEOUT: Duration = Duration::from_millis(300);

fn service_account(api_url: &str) -> SecretString {
    SecretString::from(
        json!({
            "project_id": "bombilla-shop",
            "api_url": api_url,
            "api_key": "test-key",
            "signing_key": Base64::encode_string(&[42u8; 32]),
        })
        .to_string(),
    )
}

fn app(identity: &IdentityHandle, environment: Environment) -> Router {
    let config = AuthConfig::new(environment).with_verify_timeout(VERIFY_TIMEOUT);
    let notifier: Arc<dyn OrderNotifier> = Arc::new(LogNotifier);
    api::app(&AppContext {
        auth: Arc::new(AuthState::new(config, identity)),
        store: Arc::new(Store::seeded()),
        notifier,
        static_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("static"),
    })
}

async fn connected(server: &MockServer, environment: Environment) -> Result<Router> {
    let account = service_account(&server.uri());
    let authority = identity::connect(Some(&account), VERIFY_TIMEOUT)?;
    Ok(app(&Ok(authority), environment))
}

async fn mount_account(server: &MockServer, tokens_valid_after: Option<i64>) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/accounts/{ADMIN_UID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uid": ADMIN_UID,
            "email": "admin@bombilla.dev",
            "disabled": false,
            "tokensValidAfter": tokens_valid_after,
        })))
        .mount(server)
        .await;
}

async fn mount_fresh_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/tokens:verify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uid": ADMIN_UID,
            "email": "admin@bombilla.dev",
            "authTime": Utc::now().timestamp(),
        })))
        .mount(server)
        .await;
}

fn get(uri: &str, credential: Option<&str>) -> Result<Request<Body>> {
    let mut builder = Request::builder().uri(uri);
    if let Some(credential) = credential {
        builder = builder.header(COOKIE, format!("session={credential}"));
    }
    Ok(builder.body(Body::empty())?)
}

fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
}

fn set_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get(SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

async fn sign_in(app: &Router) -> Result<(String, String)> {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/session")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "idToken": "fresh-id-token" }).to_string()))?;
    let response = app.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let header = set_cookie(&response).context("session cookie not set")?;
    let credential = header
        .split(';')
        .next()
        .and_then(|pair| pair.strip_prefix("session="))
        .context("unexpected cookie name")?
        .to_string();
    Ok((credential, header))
}

#[tokio::test]
async fn signed_in_admin_reaches_back_office() -> Result<()> {
    let server = MockServer::start().await;
    mount_fresh_login(&server).await;
    mount_account(&server, None).await;
    let app = connected(&server, Environment::Development).await?;

    let (credential, header) = sign_in(&app).await?;
    assert!(header.contains("HttpOnly"));
    assert!(header.contains("SameSite=Lax"));
    assert!(header.contains("Max-Age=432000"));
    assert!(!header.contains("Secure"));

    let response = app.clone().oneshot(get("/admin", Some(&credential))?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response).is_none());

    let response = app.clone().oneshot(get("/login", Some(&credential))?).await?;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/admin"));
    Ok(())
}

#[tokio::test]
async fn production_cookie_is_secure() -> Result<()> {
    let server = MockServer::start().await;
    mount_fresh_login(&server).await;
    let app = connected(&server, Environment::Production).await?;

    let (_, header) = sign_in(&app).await?;
    assert!(header.contains("Secure"));
    Ok(())
}

#[tokio::test]
async fn revoked_session_is_cleared_and_redirected() -> Result<()> {
    let server = MockServer::start().await;
    mount_fresh_login(&server).await;
    let app = connected(&server, Environment::Development).await?;
    let (credential, _) = sign_in(&app).await?;

    mount_account(&server, Some(Utc::now().timestamp() + 1)).await;

    let response = app.clone().oneshot(get("/admin/orders", Some(&credential))?).await?;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/login"));
    let cleared = set_cookie(&response).context("cookie not cleared")?;
    assert!(cleared.starts_with("session=;"));
    assert!(cleared.contains("Max-Age=0"));
    Ok(())
}

#[tokio::test]
async fn backend_outage_fails_closed_without_clearing() -> Result<()> {
    let server = MockServer::start().await;
    mount_fresh_login(&server).await;
    let app = connected(&server, Environment::Development).await?;
    let (credential, _) = sign_in(&app).await?;

    Mock::given(method("GET"))
        .and(path(format!("/v1/accounts/{ADMIN_UID}")))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let response = app.clone().oneshot(get("/admin", Some(&credential))?).await?;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/login"));
    assert!(set_cookie(&response).is_none());
    Ok(())
}

#[tokio::test]
async fn slow_backend_times_out_closed() -> Result<()> {
    let server = MockServer::start().await;
    mount_fresh_login(&server).await;
    let app = connected(&server, Environment::Development).await?;
    let (credential, _) = sign_in(&app).await?;

    Mock::given(method("GET"))
        .and(path(format!("/v1/accounts/{ADMIN_UID}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "uid": ADMIN_UID }))
                .set_delay(VERIFY_TIMEOUT * 4),
        )
        .mount(&server)
        .await;

    let response = app.clone().oneshot(get("/admin", Some(&credential))?).await?;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/login"));
    Ok(())
}

#[tokio::test]
async fn stale_login_cannot_open_a_session() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/tokens:verify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uid": ADMIN_UID,
            "authTime": Utc::now().timestamp() - 3600,
        })))
        .mount(&server)
        .await;
    let app = connected(&server, Environment::Development).await?;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/session")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "idToken": "old-id-token" }).to_string()))?;
    let response = app.oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookie(&response).is_none());
    Ok(())
}

#[tokio::test]
async fn unconfigured_identity_denies_admin_but_serves_shop() -> Result<()> {
    let identity: IdentityHandle = Err(Unavailable::new("no service account"));
    let app = app(&identity, Environment::Production);

    let response = app.clone().oneshot(get("/admin", None)?).await?;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/login"));

    let response = app.clone().oneshot(get("/api/products/featured", None)?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let featured: Value = serde_json::from_slice(&bytes)?;
    assert_eq!(featured.as_array().map(Vec::len), Some(4));

    let response = app.clone().oneshot(get("/static/app.css", None)?).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/health", None)?).await?;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    Ok(())
}
