//! Catalog and order records.
//!
//! These payloads are shared between the store, the handlers and `OpenAPI`
//! generation. Prices and totals are whole currency units.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: u64,
    pub images: Vec<String>,
    /// Category name, not slug.
    pub category: String,
    pub featured: bool,
}

/// Validated product fields, used for both create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: u64,
    pub images: Vec<String>,
    pub category: String,
    pub featured: bool,
}

/// A cart line as sent by the storefront. Name and price are informational;
/// the order is always priced from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: u64,
    #[serde(default)]
    pub image: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub price: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "completed" => Ok(Self::Completed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub customer_name: String,
    pub customer_whatsapp: String,
    pub customer_address: String,
    pub items: Vec<OrderItem>,
    pub total: u64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub is_manual: bool,
}

/// Validated order fields; the store assigns id, total, status and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_name: String,
    pub customer_whatsapp: String,
    pub customer_address: String,
    pub items: Vec<OrderItem>,
    pub is_manual: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub product_count: usize,
    pub order_count: usize,
    pub pending_orders: usize,
    /// Sum of all non-cancelled order totals.
    pub revenue: u64,
    pub recent_orders: Vec<Order>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_parses_and_displays() {
        assert_eq!("Shipped".parse::<OrderStatus>(), Ok(OrderStatus::Shipped));
        assert_eq!("canceled".parse::<OrderStatus>(), Ok(OrderStatus::Cancelled));
        assert!("lost".parse::<OrderStatus>().is_err());
        assert_eq!(OrderStatus::Processing.to_string(), "processing");
    }

    #[test]
    fn order_status_serializes_lowercase() -> anyhow::Result<()> {
        assert_eq!(serde_json::to_string(&OrderStatus::Completed)?, "\"completed\"");
        let status: OrderStatus = serde_json::from_str("\"pending\"")?;
        assert_eq!(status, OrderStatus::Pending);
        Ok(())
    }
}
