use crate::{
    api::{self, AppContext},
    auth::{AuthConfig, AuthState, Environment},
    cli::telemetry,
    identity,
    notify::{LogNotifier, OrderNotifier},
    store::Store,
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing::{info, warn};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub environment: Environment,
    pub service_account: Option<SecretString>,
    pub verify_timeout: Duration,
    pub static_dir: PathBuf,
}

/// Execute the server action.
///
/// A missing or broken service account does not stop startup; admin access
/// fails closed until it is fixed.
///
/// # Errors
/// Returns an error if the server fails to bind or serve.
pub async fn execute(args: Args) -> Result<()> {
    info!(
        environment = args.environment.as_str(),
        verify_timeout_ms = u64::try_from(args.verify_timeout.as_millis()).unwrap_or(u64::MAX),
        "starting bombilla"
    );

    let identity = identity::init(args.service_account.as_ref(), args.verify_timeout);

    let config = AuthConfig::new(args.environment).with_verify_timeout(args.verify_timeout);
    let auth = Arc::new(AuthState::new(config, &identity));

    if !args.static_dir.is_dir() {
        warn!(
            static_dir = %args.static_dir.display(),
            "static directory not found, /static will return 404"
        );
    }

    let notifier: Arc<dyn OrderNotifier> = Arc::new(LogNotifier);
    let ctx = AppContext {
        auth,
        store: Arc::new(Store::seeded()),
        notifier,
        static_dir: args.static_dir,
    };

    let result = api::serve(args.port, ctx)
        .await
        .with_context(|| format!("server on port {} failed", args.port));

    telemetry::shutdown_tracer();

    result
}
