//! Request payloads for storefront and admin writes, and their validation.
//!
//! Validation collects every failing field instead of stopping at the first,
//! so forms can show all problems at once.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use utoipa::ToSchema;

use super::models::{CartItem, NewOrder, OrderItem, ProductDraft};

/// Field name to messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error, ToSchema)]
#[error("validation failed: {}", joined(.errors))]
pub struct ValidationError {
    pub errors: BTreeMap<String, Vec<String>>,
}

fn joined(errors: &BTreeMap<String, Vec<String>>) -> String {
    errors.keys().cloned().collect::<Vec<_>>().join(", ")
}

impl ValidationError {
    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    fn min_chars(&mut self, field: &str, value: &str, min: usize, message: &str) {
        if value.trim().chars().count() < min {
            self.push(field, message);
        }
    }

    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    fn into_result(self) -> Result<(), Self> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Storefront checkout form.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub whatsapp: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub cart: Vec<CartItem>,
}

impl CheckoutRequest {
    /// # Errors
    /// Returns every failing field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = ValidationError::default();
        errors.min_chars("name", &self.name, 3, "name is required");
        errors.min_chars("whatsapp", &self.whatsapp, 10, "whatsapp number is not valid");
        errors.min_chars("address", &self.address, 5, "address is required");
        if self.cart.is_empty() {
            errors.push("cart", "cart is empty");
        } else if self.cart.iter().any(|item| item.quantity == 0) {
            errors.push("cart", "every quantity must be at least 1");
        }
        errors.into_result()
    }
}

/// Admin product form. `images` is a comma-separated list of URLs.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: u64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub images: String,
    #[serde(default)]
    pub featured: bool,
}

impl ProductForm {
    /// # Errors
    /// Returns every failing field.
    pub fn into_draft(self) -> Result<ProductDraft, ValidationError> {
        let images: Vec<String> = self
            .images
            .split(',')
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .collect();

        let mut errors = ValidationError::default();
        errors.min_chars("name", &self.name, 3, "name must be at least 3 characters");
        errors.min_chars(
            "description",
            &self.description,
            10,
            "description must be at least 10 characters",
        );
        if self.category.trim().is_empty() {
            errors.push("category", "a category must be selected");
        }
        if images.is_empty() {
            errors.push("images", "at least one image URL is required");
        }
        errors.into_result()?;

        Ok(ProductDraft {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            price: self.price,
            images,
            category: self.category.trim().to_string(),
            featured: self.featured,
        })
    }
}

/// Admin manual order form. Prices come from the form, not the catalog.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManualOrderRequest {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_whatsapp: String,
    #[serde(default)]
    pub customer_address: String,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

impl ManualOrderRequest {
    /// # Errors
    /// Returns every failing field.
    pub fn into_new_order(self) -> Result<NewOrder, ValidationError> {
        let mut errors = ValidationError::default();
        errors.min_chars("customerName", &self.customer_name, 3, "name is required");
        errors.min_chars(
            "customerWhatsapp",
            &self.customer_whatsapp,
            9,
            "whatsapp number is not valid",
        );
        errors.min_chars(
            "customerAddress",
            &self.customer_address,
            5,
            "address is required",
        );
        if self.items.is_empty() {
            errors.push("items", "add at least one product to the order");
        } else if self.items.iter().any(|item| item.quantity == 0) {
            errors.push("items", "every quantity must be at least 1");
        }
        errors.into_result()?;

        Ok(NewOrder {
            customer_name: self.customer_name.trim().to_string(),
            customer_whatsapp: self.customer_whatsapp.trim().to_string(),
            customer_address: self.customer_address.trim().to_string(),
            items: self.items,
            is_manual: true,
        })
    }
}
