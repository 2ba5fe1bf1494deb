use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

use super::{dispatch_notification, ApiError};
use crate::{
    notify::OrderNotifier,
    store::{CheckoutRequest, NewOrder, Order, OrderItem, OrderStatus, Store},
};

#[derive(ToSchema, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    success: bool,
    order_id: String,
}

/// What the customer sees after checkout.
#[derive(ToSchema, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    id: String,
    customer_name: String,
    customer_whatsapp: String,
    customer_address: String,
    items: Vec<OrderItem>,
    total: u64,
    status: OrderStatus,
    created_at: DateTime<Utc>,
}

impl From<Order> for OrderConfirmation {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            customer_name: order.customer_name,
            customer_whatsapp: order.customer_whatsapp,
            customer_address: order.customer_address,
            items: order.items,
            total: order.total,
            status: order.status,
            created_at: order.created_at,
        }
    }
}

#[utoipa::path(
    post,
    path= "/api/orders",
    request_body = CheckoutRequest,
    responses (
        (status = 201, description = "Order stored as pending", body = OrderCreated),
        (status = 422, description = "Invalid fields or a product is no longer available", body = super::ErrorBody),
    ),
    tag= "orders"
)]
#[instrument(skip_all)]
pub async fn create_order(
    store: Extension<Arc<Store>>,
    notifier: Extension<Arc<dyn OrderNotifier>>,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<OrderCreated>), ApiError> {
    request.validate()?;

    let items = store.price_cart(&request.cart).await?;
    let order = store
        .create_order(NewOrder {
            customer_name: request.name.trim().to_string(),
            customer_whatsapp: request.whatsapp.trim().to_string(),
            customer_address: request.address.trim().to_string(),
            items,
            is_manual: false,
        })
        .await?;

    info!(order_id = %order.id, total = order.total, "online order created");
    dispatch_notification(notifier.0.as_ref(), &order);

    Ok((
        StatusCode::CREATED,
        Json(OrderCreated {
            success: true,
            order_id: order.id,
        }),
    ))
}

#[utoipa::path(
    get,
    path= "/api/orders/{id}",
    params(("id" = String, Path, description = "Order id returned by checkout")),
    responses (
        (status = 200, description = "Order summary", body = OrderConfirmation),
        (status = 404, description = "Unknown order", body = super::ErrorBody),
    ),
    tag= "orders"
)]
pub async fn order_confirmation(
    store: Extension<Arc<Store>>,
    Path(id): Path<String>,
) -> Result<Json<OrderConfirmation>, ApiError> {
    store
        .order(&id)
        .await
        .map(|order| Json(OrderConfirmation::from(order)))
        .ok_or_else(|| ApiError::NotFound(format!("order {id} not found")))
}
