//! Admin back office: dashboard, product management and order lifecycle.
//!
//! Every handler takes an [`AdminSession`], so none of them runs without a
//! verified administrator session even if mounted outside the gate.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

use super::{dispatch_notification, ApiError};
use crate::{
    auth::AdminSession,
    notify::OrderNotifier,
    store::{Dashboard, ManualOrderRequest, Order, OrderStatus, Product, ProductForm, Store},
};

#[derive(ToSchema, Deserialize, Debug)]
pub struct StatusUpdate {
    status: OrderStatus,
}

#[utoipa::path(
    get,
    path= "/admin",
    responses (
        (status = 200, description = "Business overview", body = Dashboard),
        (status = 307, description = "No valid session; redirect to /login"),
    ),
    tag= "admin"
)]
pub async fn dashboard(_session: AdminSession, store: Extension<Arc<Store>>) -> Json<Dashboard> {
    Json(store.dashboard().await)
}

#[utoipa::path(
    get,
    path= "/admin/products",
    responses (
        (status = 200, description = "All products", body = [Product]),
        (status = 307, description = "No valid session; redirect to /login"),
    ),
    tag= "admin"
)]
pub async fn list_products(
    _session: AdminSession,
    store: Extension<Arc<Store>>,
) -> Json<Vec<Product>> {
    Json(store.products(None).await)
}

#[utoipa::path(
    post,
    path= "/admin/products",
    request_body = ProductForm,
    responses (
        (status = 201, description = "Product created", body = Product),
        (status = 422, description = "Invalid fields or unknown category", body = super::ErrorBody),
        (status = 307, description = "No valid session; redirect to /login"),
    ),
    tag= "admin"
)]
#[instrument(skip_all, fields(admin = %session.subject()))]
pub async fn create_product(
    session: AdminSession,
    store: Extension<Arc<Store>>,
    Json(form): Json<ProductForm>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let product = store.create_product(form.into_draft()?).await?;
    info!(product_id = %product.id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    get,
    path= "/admin/products/{id}",
    params(("id" = String, Path, description = "Product id")),
    responses (
        (status = 200, description = "Product", body = Product),
        (status = 404, description = "Unknown product", body = super::ErrorBody),
        (status = 307, description = "No valid session; redirect to /login"),
    ),
    tag= "admin"
)]
pub async fn get_product(
    _session: AdminSession,
    store: Extension<Arc<Store>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    store
        .product(&id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("product {id} not found")))
}

#[utoipa::path(
    put,
    path= "/admin/products/{id}",
    params(("id" = String, Path, description = "Product id")),
    request_body = ProductForm,
    responses (
        (status = 200, description = "Product updated", body = Product),
        (status = 404, description = "Unknown product", body = super::ErrorBody),
        (status = 422, description = "Invalid fields or unknown category", body = super::ErrorBody),
        (status = 307, description = "No valid session; redirect to /login"),
    ),
    tag= "admin"
)]
#[instrument(skip_all, fields(admin = %session.subject(), product_id = %id))]
pub async fn update_product(
    session: AdminSession,
    store: Extension<Arc<Store>>,
    Path(id): Path<String>,
    Json(form): Json<ProductForm>,
) -> Result<Json<Product>, ApiError> {
    let product = store.update_product(&id, form.into_draft()?).await?;
    info!("product updated");
    Ok(Json(product))
}

#[utoipa::path(
    delete,
    path= "/admin/products/{id}",
    params(("id" = String, Path, description = "Product id")),
    responses (
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Unknown product", body = super::ErrorBody),
        (status = 307, description = "No valid session; redirect to /login"),
    ),
    tag= "admin"
)]
#[instrument(skip_all, fields(admin = %session.subject(), product_id = %id))]
pub async fn delete_product(
    session: AdminSession,
    store: Extension<Arc<Store>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    store.delete_product(&id).await?;
    info!("product deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path= "/admin/orders",
    responses (
        (status = 200, description = "All orders, newest first", body = [Order]),
        (status = 307, description = "No valid session; redirect to /login"),
    ),
    tag= "admin"
)]
pub async fn list_orders(_session: AdminSession, store: Extension<Arc<Store>>) -> Json<Vec<Order>> {
    Json(store.orders().await)
}

#[utoipa::path(
    post,
    path= "/admin/orders",
    request_body = ManualOrderRequest,
    responses (
        (status = 201, description = "Manual order stored as pending", body = Order),
        (status = 422, description = "Invalid fields", body = super::ErrorBody),
        (status = 307, description = "No valid session; redirect to /login"),
    ),
    tag= "admin"
)]
#[instrument(skip_all, fields(admin = %session.subject()))]
pub async fn create_manual_order(
    session: AdminSession,
    store: Extension<Arc<Store>>,
    notifier: Extension<Arc<dyn OrderNotifier>>,
    Json(request): Json<ManualOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let order = store.create_order(request.into_new_order()?).await?;
    info!(order_id = %order.id, total = order.total, "manual order created");
    dispatch_notification(notifier.0.as_ref(), &order);
    Ok((StatusCode::CREATED, Json(order)))
}

#[utoipa::path(
    get,
    path= "/admin/orders/{id}",
    params(("id" = String, Path, description = "Order id")),
    responses (
        (status = 200, description = "Order", body = Order),
        (status = 404, description = "Unknown order", body = super::ErrorBody),
        (status = 307, description = "No valid session; redirect to /login"),
    ),
    tag= "admin"
)]
pub async fn get_order(
    _session: AdminSession,
    store: Extension<Arc<Store>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    store
        .order(&id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("order {id} not found")))
}

#[utoipa::path(
    put,
    path= "/admin/orders/{id}/status",
    params(("id" = String, Path, description = "Order id")),
    request_body = StatusUpdate,
    responses (
        (status = 200, description = "Status updated", body = Order),
        (status = 404, description = "Unknown order", body = super::ErrorBody),
        (status = 307, description = "No valid session; redirect to /login"),
    ),
    tag= "admin"
)]
#[instrument(skip_all, fields(admin = %session.subject(), order_id = %id))]
pub async fn update_order_status(
    session: AdminSession,
    store: Extension<Arc<Store>>,
    Path(id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<Order>, ApiError> {
    let order = store.update_order_status(&id, update.status).await?;
    info!(status = %order.status, "order status updated");
    Ok(Json(order))
}
