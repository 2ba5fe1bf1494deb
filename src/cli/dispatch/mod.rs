//! Map validated CLI arguments to the action to run.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{identity, ARG_PORT, ARG_STATIC_DIR};
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if a defaulted argument is missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let static_dir = matches
        .get_one::<String>(ARG_STATIC_DIR)
        .map(PathBuf::from)
        .context("missing required argument: --static-dir")?;

    let identity_opts = identity::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        environment: identity_opts.environment,
        service_account: identity_opts.service_account,
        verify_timeout: identity_opts.verify_timeout,
        static_dir,
    }))
}
