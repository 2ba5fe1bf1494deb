use crate::{
    api::handlers::{admin, catalog, checkout, health, login, session},
    auth::{session_gate, AuthState},
    notify::OrderNotifier,
    store::Store,
};
use anyhow::Result;
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Extension, Router,
};
use std::{path::PathBuf, sync::Arc};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, services::ServeDir, set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use utoipa_swagger_ui::SwaggerUi;

pub(crate) mod handlers;
mod openapi;

pub use openapi::openapi;

/// Shared collaborators injected into every request.
#[derive(Clone)]
pub struct AppContext {
    pub auth: Arc<AuthState>,
    pub store: Arc<Store>,
    pub notifier: Arc<dyn OrderNotifier>,
    pub static_dir: PathBuf,
}

/// Build the application router.
///
/// Every route except `/static` runs behind the session gate. Static files
/// are mounted after the gate layer so they never reach it.
pub fn app(ctx: &AppContext) -> Router {
    let routes = Router::new()
        .route("/health", get(health::health))
        .route("/login", get(login::login_page))
        .route("/logout", get(session::logout).post(session::logout))
        .route("/api/session", post(session::create_session))
        .route("/api/verify-session", post(session::verify_session))
        .route("/api/categories", get(catalog::categories))
        .route("/api/products", get(catalog::products))
        .route("/api/products/featured", get(catalog::featured))
        .route("/api/products/:id", get(catalog::product))
        .route("/api/orders", post(checkout::create_order))
        .route("/api/orders/:id", get(checkout::order_confirmation))
        .route("/admin", get(admin::dashboard))
        .route(
            "/admin/products",
            get(admin::list_products).post(admin::create_product),
        )
        .route(
            "/admin/products/:id",
            get(admin::get_product)
                .put(admin::update_product)
                .delete(admin::delete_product),
        )
        .route(
            "/admin/orders",
            get(admin::list_orders).post(admin::create_manual_order),
        )
        .route("/admin/orders/:id", get(admin::get_order))
        .route("/admin/orders/:id/status", put(admin::update_order_status))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi()))
        .layer(from_fn_with_state(ctx.auth.clone(), session_gate));

    routes
        .nest_service("/static", ServeDir::new(&ctx.static_dir))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(ctx.auth.clone()))
                .layer(Extension(ctx.store.clone()))
                .layer(Extension(ctx.notifier.clone())),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn serve(port: u16, ctx: AppContext) -> Result<()> {
    let app = app(&ctx);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {err}");
                std::future::pending::<()>().await;
            }
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
