//! # Bombilla (Storefront & Admin Back Office)
//!
//! `bombilla` serves a small shop: customers browse the catalog, check out a
//! cart, and an administrator manages products and the order lifecycle from a
//! protected panel.
//!
//! ## Session Gate
//!
//! Every request (except static assets) passes through the session gate before
//! any handler runs. The gate classifies the path as admin, login or public and,
//! for admin and login paths, verifies the `session` cookie against the
//! identity backend.
//!
//! - **Admin paths** (`/admin*`) require a valid session; anything else
//!   redirects to `/login`. Invalid cookies are cleared on the way out.
//! - **Login** (`/login`) redirects to `/admin` when the session is already valid.
//! - **Fail closed:** when the identity backend is unreachable or was never
//!   configured, admin access is denied and the fault is logged at `ERROR`.
//!
//! ## Sessions
//!
//! A fresh identity token from the identity provider is exchanged once for a
//! signed session credential valid for 5 days. Verification checks signature,
//! expiry, and the live account record so a session can be revoked before it
//! expires.

pub mod api;
pub mod auth;
pub mod cli;
pub mod identity;
pub mod notify;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
