//! In-process session authority backed by the identity backend.
//!
//! Signature and expiry are checked locally; revocation costs one account
//! lookup per verification. Nothing is cached between requests.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::{
    credential::{SessionClaims, SessionKeys},
    issuer::{IssueError, IssueFuture, IssuedSession, SessionIssuer, RECENT_AUTH_MAX_AGE_SECONDS},
    verifier::{InvalidReason, SessionVerifier, VerifyError, VerifyFuture},
};
use crate::identity::{BackendError, IdentityBackend, RecentAuth};

/// Login times this far in the future are tolerated (clock skew).
const AUTH_TIME_SKEW_SECONDS: i64 = 30;

pub struct SessionAuthority {
    backend: Arc<dyn IdentityBackend>,
    keys: SessionKeys,
}

impl std::fmt::Debug for SessionAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionAuthority").finish_non_exhaustive()
    }
}

impl SessionAuthority {
    #[must_use]
    pub fn new(backend: Arc<dyn IdentityBackend>, signing_key: &[u8], project_id: &str) -> Self {
        Self {
            backend,
            keys: SessionKeys::new(signing_key, project_id),
        }
    }

    #[instrument(skip_all)]
    async fn check(&self, credential: &str) -> Result<SessionClaims, VerifyError> {
        let claims = self.keys.decode(credential).map_err(VerifyError::Invalid)?;

        let account = self.backend.account(&claims.sub).await.map_err(|err| match err {
            BackendError::Unavailable(reason) | BackendError::Rejected(reason) => {
                VerifyError::Unavailable(reason)
            }
        })?;

        let Some(account) = account else {
            return Err(VerifyError::Invalid(InvalidReason::UnknownAccount));
        };
        if account.disabled {
            return Err(VerifyError::Invalid(InvalidReason::Disabled));
        }
        if account
            .tokens_valid_after
            .is_some_and(|valid_after| claims.auth_time < valid_after)
        {
            return Err(VerifyError::Invalid(InvalidReason::Revoked));
        }

        debug!(subject = %claims.sub, "session credential verified");
        Ok(claims)
    }

    pub(crate) async fn exchange_at(
        &self,
        id_token: &str,
        now: i64,
    ) -> Result<IssuedSession, IssueError> {
        let info = self
            .backend
            .verify_id_token(id_token, RecentAuth::Required)
            .await
            .map_err(|err| match err {
                BackendError::Unavailable(reason) => IssueError::Unavailable(reason),
                BackendError::Rejected(reason) => IssueError::InvalidToken(reason),
            })?;

        // The backend was asked to refuse stale logins; check again locally.
        let age = now - info.auth_time;
        if age > RECENT_AUTH_MAX_AGE_SECONDS || age < -AUTH_TIME_SKEW_SECONDS {
            return Err(IssueError::InvalidToken(
                "recent sign-in required".to_string(),
            ));
        }

        let (credential, claims) = self
            .keys
            .sign(&info.uid, info.email, info.auth_time, now)
            .map_err(|err| IssueError::Unavailable(format!("failed to sign session: {err}")))?;

        Ok(IssuedSession {
            credential,
            subject: claims.sub,
            expires_at: claims.exp,
        })
    }

    #[cfg(test)]
    pub(crate) fn keys(&self) -> &SessionKeys {
        &self.keys
    }
}

impl SessionVerifier for SessionAuthority {
    fn verify<'a>(&'a self, credential: &'a str) -> VerifyFuture<'a> {
        Box::pin(self.check(credential))
    }
}

impl SessionIssuer for SessionAuthority {
    fn issue<'a>(&'a self, id_token: &'a str) -> IssueFuture<'a> {
        Box::pin(self.exchange_at(id_token, Utc::now().timestamp()))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! In-memory identity backend for tests.

    use crate::identity::{
        AccountRecord, BackendError, BackendFuture, IdTokenInfo, IdentityBackend, RecentAuth,
    };
    use std::collections::HashMap;
    use std::sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    };

    #[derive(Default)]
    pub(crate) struct MemoryBackend {
        accounts: Mutex<HashMap<String, AccountRecord>>,
        id_tokens: Mutex<HashMap<String, IdTokenInfo>>,
        down: AtomicBool,
        pub(crate) lookups: AtomicUsize,
    }

    impl MemoryBackend {
        pub(crate) fn with_account(self, uid: &str) -> Self {
            if let Ok(mut accounts) = self.accounts.lock() {
                accounts.insert(
                    uid.to_string(),
                    AccountRecord {
                        uid: uid.to_string(),
                        email: Some(format!("{uid}@example.com")),
                        disabled: false,
                        tokens_valid_after: None,
                    },
                );
            }
            self
        }

        pub(crate) fn with_id_token(self, token: &str, uid: &str, auth_time: i64) -> Self {
            if let Ok(mut tokens) = self.id_tokens.lock() {
                tokens.insert(
                    token.to_string(),
                    IdTokenInfo {
                        uid: uid.to_string(),
                        email: Some(format!("{uid}@example.com")),
                        auth_time,
                    },
                );
            }
            self
        }

        pub(crate) fn revoke(&self, uid: &str, valid_after: i64) {
            if let Ok(mut accounts) = self.accounts.lock() {
                if let Some(account) = accounts.get_mut(uid) {
                    account.tokens_valid_after = Some(valid_after);
                }
            }
        }

        pub(crate) fn disable(&self, uid: &str) {
            if let Ok(mut accounts) = self.accounts.lock() {
                if let Some(account) = accounts.get_mut(uid) {
                    account.disabled = true;
                }
            }
        }

        pub(crate) fn set_down(&self, down: bool) {
            self.down.store(down, Ordering::SeqCst);
        }

        fn is_down(&self) -> bool {
            self.down.load(Ordering::SeqCst)
        }
    }

    impl IdentityBackend for MemoryBackend {
        fn verify_id_token<'a>(
            &'a self,
            id_token: &'a str,
            _recent: RecentAuth,
        ) -> BackendFuture<'a, IdTokenInfo> {
            Box::pin(async move {
                if self.is_down() {
                    return Err(BackendError::Unavailable("backend down".into()));
                }
                self.id_tokens
                    .lock()
                    .ok()
                    .and_then(|tokens| tokens.get(id_token).cloned())
                    .ok_or_else(|| BackendError::Rejected("unknown id token".into()))
            })
        }

        fn account<'a>(&'a self, uid: &'a str) -> BackendFuture<'a, Option<AccountRecord>> {
            Box::pin(async move {
                self.lookups.fetch_add(1, Ordering::SeqCst);
                if self.is_down() {
                    return Err(BackendError::Unavailable("backend down".into()));
                }
                Ok(self
                    .accounts
                    .lock()
                    .ok()
                    .and_then(|accounts| accounts.get(uid).cloned()))
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::MemoryBackend;
    use super::*;
    use anyhow::Result;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";
    const DAY: i64 = 24 * 60 * 60;

    fn authority(backend: MemoryBackend) -> (Arc<MemoryBackend>, SessionAuthority) {
        let backend = Arc::new(backend);
        let authority = SessionAuthority::new(backend.clone(), SECRET, "shop");
        (backend, authority)
    }

    #[tokio::test]
    async fn three_day_old_session_is_valid() -> Result<()> {
        let (_, authority) = authority(MemoryBackend::default().with_account("admin-1"));
        let issued_at = Utc::now().timestamp() - 3 * DAY;
        let (credential, _) = authority.keys().sign("admin-1", None, issued_at, issued_at)?;

        let claims = authority.verify(&credential).await?;
        assert_eq!(claims.sub, "admin-1");
        Ok(())
    }

    #[tokio::test]
    async fn revoked_session_is_invalid() -> Result<()> {
        let (backend, authority) = authority(MemoryBackend::default().with_account("admin-1"));
        let now = Utc::now().timestamp();
        let (credential, _) = authority.keys().sign("admin-1", None, now - 60, now - 60)?;
        assert!(authority.verify(&credential).await.is_ok());

        backend.revoke("admin-1", now - 1);
        let result = authority.verify(&credential).await;
        assert!(matches!(result, Err(VerifyError::Invalid(InvalidReason::Revoked))));
        Ok(())
    }

    #[tokio::test]
    async fn disabled_and_deleted_accounts_are_invalid() -> Result<()> {
        let (backend, authority) = authority(MemoryBackend::default().with_account("admin-1"));
        let now = Utc::now().timestamp();
        let (credential, _) = authority.keys().sign("admin-1", None, now, now)?;
        backend.disable("admin-1");
        assert!(matches!(
            authority.verify(&credential).await,
            Err(VerifyError::Invalid(InvalidReason::Disabled))
        ));

        let (ghost, _) = authority.keys().sign("ghost", None, now, now)?;
        assert!(matches!(
            authority.verify(&ghost).await,
            Err(VerifyError::Invalid(InvalidReason::UnknownAccount))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn bad_signature_never_reaches_backend() {
        let (backend, authority) = authority(MemoryBackend::default().with_account("admin-1"));
        let result = authority.verify("garbage").await;
        assert!(matches!(result, Err(VerifyError::Invalid(InvalidReason::Malformed))));
        assert_eq!(backend.lookups.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn backend_outage_is_unavailable_not_invalid() -> Result<()> {
        let (backend, authority) = authority(MemoryBackend::default().with_account("admin-1"));
        let now = Utc::now().timestamp();
        let (credential, _) = authority.keys().sign("admin-1", None, now, now)?;
        backend.set_down(true);
        assert!(matches!(
            authority.verify(&credential).await,
            Err(VerifyError::Unavailable(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn issue_mints_five_day_session() -> Result<()> {
        let now = Utc::now().timestamp();
        let (_, authority) = authority(
            MemoryBackend::default()
                .with_account("admin-1")
                .with_id_token("fresh", "admin-1", now - 30),
        );

        let issued = authority.exchange_at("fresh", now).await?;
        assert_eq!(issued.subject, "admin-1");
        assert_eq!(issued.expires_at, now + crate::auth::SESSION_TTL_SECONDS);

        let claims = authority.verify(&issued.credential).await?;
        assert_eq!(claims.auth_time, now - 30);
        Ok(())
    }

    #[tokio::test]
    async fn issue_refuses_stale_login() {
        let now = Utc::now().timestamp();
        let (_, authority) = authority(
            MemoryBackend::default().with_id_token("stale", "admin-1", now - 10 * 60),
        );
        let result = authority.exchange_at("stale", now).await;
        assert!(matches!(result, Err(IssueError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn issue_maps_backend_errors() {
        let (backend, authority) = authority(MemoryBackend::default());
        let now = Utc::now().timestamp();
        assert!(matches!(
            authority.exchange_at("unknown", now).await,
            Err(IssueError::InvalidToken(_))
        ));

        backend.set_down(true);
        assert!(matches!(
            authority.exchange_at("unknown", now).await,
            Err(IssueError::Unavailable(_))
        ));
    }
}
