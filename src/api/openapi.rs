use super::handlers::{admin, catalog, checkout, health, login, session, ErrorBody};
use crate::{
    auth::SessionClaims,
    store::{
        CartItem, Category, CheckoutRequest, Dashboard, ManualOrderRequest, Order, OrderItem,
        OrderStatus, Product, ProductForm, ValidationError,
    },
};
use utoipa::{
    openapi::{Contact, InfoBuilder, License},
    OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        login::login_page,
        session::create_session,
        session::verify_session,
        session::logout,
        catalog::categories,
        catalog::products,
        catalog::featured,
        catalog::product,
        checkout::create_order,
        checkout::order_confirmation,
        admin::dashboard,
        admin::list_products,
        admin::create_product,
        admin::get_product,
        admin::update_product,
        admin::delete_product,
        admin::list_orders,
        admin::create_manual_order,
        admin::get_order,
        admin::update_order_status,
    ),
    components(schemas(
        health::Health,
        session::SessionRequest,
        session::SessionResponse,
        session::VerifySessionResponse,
        checkout::OrderCreated,
        checkout::OrderConfirmation,
        admin::StatusUpdate,
        ErrorBody,
        SessionClaims,
        Category,
        Product,
        ProductForm,
        CartItem,
        CheckoutRequest,
        ManualOrderRequest,
        Order,
        OrderItem,
        OrderStatus,
        Dashboard,
        ValidationError,
    )),
    tags(
        (name = "health", description = "Service status"),
        (name = "session", description = "Admin session issuance and logout"),
        (name = "catalog", description = "Public product catalog"),
        (name = "orders", description = "Storefront checkout and order confirmation"),
        (name = "admin", description = "Back office, behind the session gate"),
    )
)]
struct ApiDoc;

/// The `OpenAPI` document with info taken from Cargo metadata.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info = cargo_info();
    doc
}

fn cargo_info() -> utoipa::openapi::Info {
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.contact = cargo_contact();
    info.license = optional_str(env!("CARGO_PKG_LICENSE")).map(|identifier| {
        let mut license = License::new(identifier);
        license.identifier = Some(identifier.to_string());
        license
    });
    info
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors may read "Name <email>".
    let primary = env!("CARGO_PKG_AUTHORS").split(':').next().map(str::trim)?;
    let (name, email) = match primary.split_once('<') {
        Some((name, email)) => (name.trim(), email.trim_end_matches('>').trim()),
        None => (primary, ""),
    };
    if name.is_empty() && email.is_empty() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = optional_str(name).map(str::to_string);
    contact.email = optional_str(email).map(str::to_string);
    Some(contact)
}

fn optional_str(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_info_from_cargo() {
        let spec = openapi();
        assert_eq!(spec.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(spec.info.version, env!("CARGO_PKG_VERSION"));

        let contact = spec.info.contact.unwrap_or_default();
        assert_eq!(contact.name.as_deref(), Some("Team Bombilla"));
        assert_eq!(contact.email.as_deref(), Some("team@bombilla.dev"));

        let license = spec.info.license.map(|license| license.name);
        assert_eq!(license.as_deref(), Some("BSD-3-Clause"));
    }

    #[test]
    fn openapi_documents_gate_routes() {
        let spec = openapi();
        for path in [
            "/api/session",
            "/api/verify-session",
            "/logout",
            "/login",
            "/admin",
            "/admin/orders/{id}/status",
            "/api/products/{id}",
            "/api/orders/{id}",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
