//! In-memory catalog and order store.
//!
//! The store never consults the identity backend; admin writes are only
//! reachable after the session gate allowed the request.

pub mod models;
mod seed;
pub mod validate;

pub use models::{
    CartItem, Category, Dashboard, NewOrder, Order, OrderItem, OrderStatus, Product, ProductDraft,
};
pub use validate::{CheckoutRequest, ManualOrderRequest, ProductForm, ValidationError};

use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use ulid::Ulid;

const RECENT_ORDERS: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("product {0} not found")]
    ProductNotFound(String),
    #[error("order {0} not found")]
    OrderNotFound(String),
    #[error("product \"{0}\" is no longer available")]
    UnknownProduct(String),
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("order total overflows")]
    TotalOverflow,
}

#[derive(Debug, Default)]
struct Inner {
    categories: Vec<Category>,
    products: Vec<Product>,
    orders: Vec<Order>,
}

#[derive(Debug, Default)]
pub struct Store {
    inner: RwLock<Inner>,
}

impl Store {
    /// A store holding the shop's initial catalog and one sample order.
    #[must_use]
    pub fn seeded() -> Self {
        let products = seed::products();
        let orders = seed::orders(&products);
        Self {
            inner: RwLock::new(Inner {
                categories: seed::categories(),
                products,
                orders,
            }),
        }
    }

    pub async fn categories(&self) -> Vec<Category> {
        self.inner.read().await.categories.clone()
    }

    /// List products, optionally restricted to a category slug. An unknown
    /// slug yields an empty list.
    pub async fn products(&self, category_slug: Option<&str>) -> Vec<Product> {
        let inner = self.inner.read().await;
        let Some(slug) = category_slug else {
            return inner.products.clone();
        };
        let Some(category) = inner.categories.iter().find(|c| c.slug == slug) else {
            return Vec::new();
        };
        inner
            .products
            .iter()
            .filter(|product| product.category == category.name)
            .cloned()
            .collect()
    }

    pub async fn featured_products(&self) -> Vec<Product> {
        self.inner
            .read()
            .await
            .products
            .iter()
            .filter(|product| product.featured)
            .cloned()
            .collect()
    }

    pub async fn product(&self, id: &str) -> Option<Product> {
        self.inner
            .read()
            .await
            .products
            .iter()
            .find(|product| product.id == id)
            .cloned()
    }

    /// # Errors
    /// Returns an error if the category does not exist.
    #[instrument(skip_all, fields(name = %draft.name))]
    pub async fn create_product(&self, draft: ProductDraft) -> Result<Product, StoreError> {
        let mut inner = self.inner.write().await;
        ensure_category(&inner, &draft.category)?;

        let product = Product {
            id: Ulid::new().to_string(),
            name: draft.name,
            description: draft.description,
            price: draft.price,
            images: draft.images,
            category: draft.category,
            featured: draft.featured,
        };
        inner.products.push(product.clone());
        debug!(product_id = %product.id, "product created");
        Ok(product)
    }

    /// Replace every editable field of a product.
    ///
    /// # Errors
    /// Returns an error if the product or the category does not exist.
    #[instrument(skip(self, draft))]
    pub async fn update_product(&self, id: &str, draft: ProductDraft) -> Result<Product, StoreError> {
        let mut inner = self.inner.write().await;
        ensure_category(&inner, &draft.category)?;

        let product = inner
            .products
            .iter_mut()
            .find(|product| product.id == id)
            .ok_or_else(|| StoreError::ProductNotFound(id.to_string()))?;

        product.name = draft.name;
        product.description = draft.description;
        product.price = draft.price;
        product.images = draft.images;
        product.category = draft.category;
        product.featured = draft.featured;
        Ok(product.clone())
    }

    /// # Errors
    /// Returns an error if the product does not exist.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let index = inner
            .products
            .iter()
            .position(|product| product.id == id)
            .ok_or_else(|| StoreError::ProductNotFound(id.to_string()))?;
        inner.products.remove(index);
        Ok(())
    }

    /// All orders, newest first.
    pub async fn orders(&self) -> Vec<Order> {
        newest_first(&self.inner.read().await.orders)
    }

    pub async fn order(&self, id: &str) -> Option<Order> {
        self.inner
            .read()
            .await
            .orders
            .iter()
            .find(|order| order.id == id)
            .cloned()
    }

    /// Price cart lines from the catalog. The cart's own prices are ignored.
    ///
    /// # Errors
    /// Returns an error naming the first line whose product no longer exists.
    pub async fn price_cart(&self, cart: &[CartItem]) -> Result<Vec<OrderItem>, StoreError> {
        let inner = self.inner.read().await;
        cart.iter()
            .map(|line| -> Result<OrderItem, StoreError> {
                let product = inner
                    .products
                    .iter()
                    .find(|product| product.id == line.id)
                    .ok_or_else(|| {
                        let label = if line.name.is_empty() { &line.id } else { &line.name };
                        StoreError::UnknownProduct(label.clone())
                    })?;
                Ok(OrderItem {
                    product_id: product.id.clone(),
                    product_name: product.name.clone(),
                    quantity: line.quantity,
                    price: product.price,
                })
            })
            .collect()
    }

    /// Store a new pending order. The total is computed here.
    ///
    /// # Errors
    /// Returns an error if the total overflows.
    #[instrument(skip_all, fields(manual = new.is_manual))]
    pub async fn create_order(&self, new: NewOrder) -> Result<Order, StoreError> {
        let total = order_total(&new.items)?;
        let order = Order {
            id: Ulid::new().to_string(),
            customer_name: new.customer_name,
            customer_whatsapp: new.customer_whatsapp,
            customer_address: new.customer_address,
            items: new.items,
            total,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            is_manual: new.is_manual,
        };
        self.inner.write().await.orders.push(order.clone());
        debug!(order_id = %order.id, total, "order created");
        Ok(order)
    }

    /// # Errors
    /// Returns an error if the order does not exist.
    #[instrument(skip(self))]
    pub async fn update_order_status(
        &self,
        id: &str,
        status: OrderStatus,
    ) -> Result<Order, StoreError> {
        let mut inner = self.inner.write().await;
        let order = inner
            .orders
            .iter_mut()
            .find(|order| order.id == id)
            .ok_or_else(|| StoreError::OrderNotFound(id.to_string()))?;
        order.status = status;
        Ok(order.clone())
    }

    pub async fn dashboard(&self) -> Dashboard {
        let inner = self.inner.read().await;
        let orders = newest_first(&inner.orders);
        Dashboard {
            product_count: inner.products.len(),
            order_count: orders.len(),
            pending_orders: orders
                .iter()
                .filter(|order| order.status == OrderStatus::Pending)
                .count(),
            revenue: orders
                .iter()
                .filter(|order| order.status != OrderStatus::Cancelled)
                .fold(0_u64, |sum, order| sum.saturating_add(order.total)),
            recent_orders: orders.into_iter().take(RECENT_ORDERS).collect(),
        }
    }
}

fn ensure_category(inner: &Inner, name: &str) -> Result<(), StoreError> {
    if inner.categories.iter().any(|category| category.name == name) {
        Ok(())
    } else {
        Err(StoreError::UnknownCategory(name.to_string()))
    }
}

fn newest_first(orders: &[Order]) -> Vec<Order> {
    // Reverse first so orders with equal timestamps keep insertion recency.
    let mut sorted: Vec<Order> = orders.iter().rev().cloned().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted
}

/// Sum of `price * quantity` over all lines.
///
/// # Errors
/// Returns an error on overflow.
pub fn order_total(items: &[OrderItem]) -> Result<u64, StoreError> {
    items.iter().try_fold(0_u64, |sum, item| {
        item.price
            .checked_mul(u64::from(item.quantity))
            .and_then(|line| sum.checked_add(line))
            .ok_or(StoreError::TotalOverflow)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn draft(name: &str, category: &str) -> ProductDraft {
        ProductDraft {
            name: name.to_string(),
            description: "Una descripcion larga".to_string(),
            price: 1500,
            images: vec!["https://placehold.co/600x600.png".to_string()],
            category: category.to_string(),
            featured: false,
        }
    }

    fn new_order(items: Vec<OrderItem>) -> NewOrder {
        NewOrder {
            customer_name: "Juan".to_string(),
            customer_whatsapp: "1122334455".to_string(),
            customer_address: "Calle 123".to_string(),
            items,
            is_manual: false,
        }
    }

    #[tokio::test]
    async fn seeded_catalog() {
        let store = Store::seeded();
        assert_eq!(store.categories().await.len(), 7);
        assert_eq!(store.products(None).await.len(), 9);
        assert_eq!(store.featured_products().await.len(), 4);
        assert_eq!(store.products(Some("mates-calabaza")).await.len(), 3);
        assert!(store.products(Some("no-such-slug")).await.is_empty());
        assert_eq!(store.orders().await.len(), 1);
    }

    #[tokio::test]
    async fn product_crud() -> Result<()> {
        let store = Store::seeded();
        let created = store.create_product(draft("Mate Nuevo", "Termos")).await?;
        assert_eq!(store.product(&created.id).await, Some(created.clone()));

        let mut changes = draft("Mate Renombrado", "Yerbas");
        changes.featured = true;
        let updated = store.update_product(&created.id, changes).await?;
        assert_eq!(updated.name, "Mate Renombrado");
        assert!(updated.featured);

        store.delete_product(&created.id).await?;
        assert_eq!(store.product(&created.id).await, None);
        assert_eq!(
            store.delete_product(&created.id).await,
            Err(StoreError::ProductNotFound(created.id.clone()))
        );
        Ok(())
    }

    #[tokio::test]
    async fn product_requires_known_category() {
        let store = Store::seeded();
        let result = store.create_product(draft("Mate", "Cuchillos")).await;
        assert_eq!(result, Err(StoreError::UnknownCategory("Cuchillos".into())));
    }

    #[tokio::test]
    async fn price_cart_uses_catalog_prices() -> Result<()> {
        let store = Store::seeded();
        let product = store
            .products(Some("termos"))
            .await
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("seeded termo missing"))?;

        let cart = vec![CartItem {
            id: product.id.clone(),
            name: product.name.clone(),
            price: 1,
            image: String::new(),
            quantity: 2,
        }];
        let items = store.price_cart(&cart).await?;
        assert_eq!(items[0].price, 25_000);
        assert_eq!(order_total(&items)?, 50_000);

        let ghost = vec![CartItem {
            id: "gone".into(),
            name: "Mate Fantasma".into(),
            price: 1,
            image: String::new(),
            quantity: 1,
        }];
        assert_eq!(
            store.price_cart(&ghost).await,
            Err(StoreError::UnknownProduct("Mate Fantasma".into()))
        );
        Ok(())
    }

    #[tokio::test]
    async fn orders_are_newest_first_and_status_updates() -> Result<()> {
        let store = Store::default();
        let item = OrderItem {
            product_id: "p".into(),
            product_name: "Mate".into(),
            quantity: 3,
            price: 100,
        };
        let first = store.create_order(new_order(vec![item.clone()])).await?;
        let second = store.create_order(new_order(vec![item])).await?;
        assert_eq!(first.total, 300);
        assert_eq!(first.status, OrderStatus::Pending);

        let ids: Vec<String> = store.orders().await.into_iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![second.id.clone(), first.id.clone()]);

        let shipped = store
            .update_order_status(&first.id, OrderStatus::Shipped)
            .await?;
        assert_eq!(shipped.status, OrderStatus::Shipped);
        assert_eq!(
            store
                .update_order_status("missing", OrderStatus::Shipped)
                .await,
            Err(StoreError::OrderNotFound("missing".into()))
        );
        Ok(())
    }

    #[tokio::test]
    async fn dashboard_excludes_cancelled_revenue() -> Result<()> {
        let store = Store::default();
        let item = |price| OrderItem {
            product_id: "p".into(),
            product_name: "Mate".into(),
            quantity: 1,
            price,
        };
        store.create_order(new_order(vec![item(1_000)])).await?;
        let cancelled = store.create_order(new_order(vec![item(500)])).await?;
        store
            .update_order_status(&cancelled.id, OrderStatus::Cancelled)
            .await?;

        let dashboard = store.dashboard().await;
        assert_eq!(dashboard.order_count, 2);
        assert_eq!(dashboard.pending_orders, 1);
        assert_eq!(dashboard.revenue, 1_000);
        Ok(())
    }

    #[test]
    fn order_total_detects_overflow() {
        let items = vec![OrderItem {
            product_id: "p".into(),
            product_name: "Mate".into(),
            quantity: 2,
            price: u64::MAX,
        }];
        assert_eq!(order_total(&items), Err(StoreError::TotalOverflow));
    }
}
