//! Public catalog endpoints.

use axum::{
    extract::{Extension, Path, Query},
    response::Json,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

use super::ApiError;
use crate::store::{Category, Product, Store};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ProductQuery {
    /// Category slug, e.g. `mates-calabaza`.
    category: Option<String>,
}

#[utoipa::path(
    get,
    path= "/api/categories",
    responses (
        (status = 200, description = "All categories", body = [Category]),
    ),
    tag= "catalog"
)]
pub async fn categories(store: Extension<Arc<Store>>) -> Json<Vec<Category>> {
    Json(store.categories().await)
}

#[utoipa::path(
    get,
    path= "/api/products",
    params(ProductQuery),
    responses (
        (status = 200, description = "Products, optionally filtered by category slug", body = [Product]),
    ),
    tag= "catalog"
)]
pub async fn products(
    store: Extension<Arc<Store>>,
    Query(query): Query<ProductQuery>,
) -> Json<Vec<Product>> {
    let slug = query.category.as_deref().filter(|slug| !slug.is_empty());
    Json(store.products(slug).await)
}

#[utoipa::path(
    get,
    path= "/api/products/featured",
    responses (
        (status = 200, description = "Featured products", body = [Product]),
    ),
    tag= "catalog"
)]
pub async fn featured(store: Extension<Arc<Store>>) -> Json<Vec<Product>> {
    Json(store.featured_products().await)
}

#[utoipa::path(
    get,
    path= "/api/products/{id}",
    params(("id" = String, Path, description = "Product id")),
    responses (
        (status = 200, description = "Product", body = Product),
        (status = 404, description = "Unknown product", body = super::ErrorBody),
    ),
    tag= "catalog"
)]
pub async fn product(
    store: Extension<Arc<Store>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    store
        .product(&id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("product {id} not found")))
}
