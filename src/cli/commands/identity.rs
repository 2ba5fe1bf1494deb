//! Identity backend and session arguments.

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;
use std::time::Duration;

use crate::auth::Environment;

pub const ARG_ENVIRONMENT: &str = "environment";
pub const ARG_SERVICE_ACCOUNT: &str = "service-account";
pub const ARG_VERIFY_TIMEOUT_MS: &str = "verify-timeout-ms";

#[derive(Debug)]
pub struct Options {
    pub environment: Environment,
    pub service_account: Option<SecretString>,
    pub verify_timeout: Duration,
}

impl Options {
    /// Parse identity arguments from matches.
    ///
    /// A blank service account counts as not configured.
    ///
    /// # Errors
    /// Returns an error if a defaulted argument is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let environment = matches
            .get_one::<Environment>(ARG_ENVIRONMENT)
            .copied()
            .context("missing required argument: --environment")?;

        let service_account = matches
            .get_one::<String>(ARG_SERVICE_ACCOUNT)
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| SecretString::from(raw.clone()));

        let verify_timeout = matches
            .get_one::<u64>(ARG_VERIFY_TIMEOUT_MS)
            .copied()
            .map(Duration::from_millis)
            .context("missing required argument: --verify-timeout-ms")?;

        Ok(Self {
            environment,
            service_account,
            verify_timeout,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ENVIRONMENT)
                .short('e')
                .long(ARG_ENVIRONMENT)
                .help("Deployment environment: development or production")
                .long_help(
                    "Deployment environment. Production marks the session cookie Secure.",
                )
                .default_value("development")
                .env("BOMBILLA_ENVIRONMENT")
                .value_parser(|value: &str| value.parse::<Environment>()),
        )
        .arg(
            Arg::new(ARG_SERVICE_ACCOUNT)
                .long(ARG_SERVICE_ACCOUNT)
                .help("Identity backend service account (JSON)")
                .long_help(
                    "Identity backend service account as a JSON document with project_id, api_url, api_key and signing_key. Without it the server starts but every admin request is denied.",
                )
                .env("BOMBILLA_SERVICE_ACCOUNT")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_VERIFY_TIMEOUT_MS)
                .long(ARG_VERIFY_TIMEOUT_MS)
                .help("Upper bound for one session verification, in milliseconds")
                .default_value("3000")
                .env("BOMBILLA_VERIFY_TIMEOUT_MS")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}
