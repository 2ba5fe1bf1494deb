pub mod admin;
pub mod catalog;
pub mod checkout;
pub mod health;
pub mod login;
pub mod session;

// common types for the handlers
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{error, warn};
use utoipa::ToSchema;

use crate::{
    notify::OrderNotifier,
    store::{Order, StoreError, ValidationError},
};

/// Error payload returned by every JSON endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, Vec<String>>>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Unprocessable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ProductNotFound(_) | StoreError::OrderNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            StoreError::UnknownProduct(_)
            | StoreError::UnknownCategory(_)
            | StoreError::TotalOverflow => Self::Unprocessable(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, fields) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message, None),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message, None),
            Self::Validation(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid fields".to_string(),
                Some(err.errors),
            ),
            Self::Unprocessable(message) => (StatusCode::UNPROCESSABLE_ENTITY, message, None),
            Self::Internal(detail) => {
                error!("Request failed: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                    None,
                )
            }
        };

        let body = ErrorBody {
            success: false,
            error,
            fields,
        };
        (status, Json(body)).into_response()
    }
}

/// Send the order notification. A failed delivery is logged, never returned.
pub(crate) fn dispatch_notification(notifier: &dyn OrderNotifier, order: &Order) {
    if let Err(err) = notifier.notify(order) {
        warn!(order_id = %order.id, "Failed to send order notification: {err:#}");
    }
}
