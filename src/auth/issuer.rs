//! Session issuer contract.

use std::{future::Future, pin::Pin};
use thiserror::Error;

/// Identity tokens older than this (by login time) cannot mint a session.
pub const RECENT_AUTH_MAX_AGE_SECONDS: i64 = 5 * 60;

pub type IssueFuture<'a> = Pin<Box<dyn Future<Output = Result<IssuedSession, IssueError>> + Send + 'a>>;

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("identity backend unavailable: {0}")]
    Unavailable(String),
    #[error("invalid identity token: {0}")]
    InvalidToken(String),
}

/// A freshly minted session credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedSession {
    pub credential: String,
    pub subject: String,
    /// Unix seconds; always issuance time plus the fixed session window.
    pub expires_at: i64,
}

/// Exchanges a fresh identity token for a long-lived session credential.
pub trait SessionIssuer: Send + Sync {
    fn issue<'a>(&'a self, id_token: &'a str) -> IssueFuture<'a>;
}
