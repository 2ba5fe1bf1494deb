pub mod identity;
pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

pub const ARG_PORT: &str = "port";
pub const ARG_STATIC_DIR: &str = "static-dir";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("bombilla")
        .about("Storefront and admin back office")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("8080")
                .env("BOMBILLA_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_STATIC_DIR)
                .long(ARG_STATIC_DIR)
                .help("Directory served under /static")
                .default_value("static")
                .env("BOMBILLA_STATIC_DIR"),
        );

    let command = identity::with_args(command);
    logging::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Environment;
    use anyhow::Result;
    use secrecy::ExposeSecret;
    use std::time::Duration;

    const ENV_VARS: [&str; 6] = [
        "BOMBILLA_PORT",
        "BOMBILLA_STATIC_DIR",
        "BOMBILLA_ENVIRONMENT",
        "BOMBILLA_SERVICE_ACCOUNT",
        "BOMBILLA_VERIFY_TIMEOUT_MS",
        "BOMBILLA_LOG_LEVEL",
    ];

    fn cleared() -> Vec<(&'static str, Option<&'static str>)> {
        ENV_VARS.iter().map(|name| (*name, None)).collect()
    }

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "bombilla");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Storefront and admin back office".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_defaults() -> Result<()> {
        temp_env::with_vars(cleared(), || {
            let matches = new().try_get_matches_from(["bombilla"])?;
            assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(8080));
            assert_eq!(
                matches.get_one::<String>(ARG_STATIC_DIR).cloned(),
                Some("static".to_string())
            );

            let options = identity::Options::parse(&matches)?;
            assert_eq!(options.environment, Environment::Development);
            assert!(options.service_account.is_none());
            assert_eq!(options.verify_timeout, Duration::from_secs(3));
            Ok(())
        })
    }

    #[test]
    fn test_env_fallbacks() -> Result<()> {
        let mut vars = cleared();
        vars.extend([
            ("BOMBILLA_PORT", Some("9090")),
            ("BOMBILLA_ENVIRONMENT", Some("production")),
            ("BOMBILLA_SERVICE_ACCOUNT", Some(r#"{"project_id":"shop"}"#)),
            ("BOMBILLA_VERIFY_TIMEOUT_MS", Some("250")),
        ]);

        temp_env::with_vars(vars, || {
            let matches = new().try_get_matches_from(["bombilla"])?;
            assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(9090));

            let options = identity::Options::parse(&matches)?;
            assert_eq!(options.environment, Environment::Production);
            assert_eq!(
                options
                    .service_account
                    .as_ref()
                    .map(|account| account.expose_secret().to_string()),
                Some(r#"{"project_id":"shop"}"#.to_string())
            );
            assert_eq!(options.verify_timeout, Duration::from_millis(250));
            Ok(())
        })
    }

    #[test]
    fn test_blank_service_account_is_unset() -> Result<()> {
        let mut vars = cleared();
        vars.push(("BOMBILLA_SERVICE_ACCOUNT", Some("  ")));

        temp_env::with_vars(vars, || {
            let matches = new().try_get_matches_from(["bombilla"])?;
            let options = identity::Options::parse(&matches)?;
            assert!(options.service_account.is_none());
            Ok(())
        })
    }

    #[test]
    fn test_rejects_unknown_environment() {
        temp_env::with_vars(cleared(), || {
            let result = new().try_get_matches_from(["bombilla", "--environment", "staging"]);
            assert!(result.is_err());
        });
    }

    #[test]
    fn test_rejects_zero_verify_timeout() {
        temp_env::with_vars(cleared(), || {
            let result = new().try_get_matches_from(["bombilla", "--verify-timeout-ms", "0"]);
            assert!(result.is_err());
        });
    }

    #[test]
    fn test_verbosity_count_and_names() {
        temp_env::with_vars(cleared(), || {
            let matches = new().get_matches_from(["bombilla", "-vvv"]);
            assert_eq!(
                matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                Some(3)
            );
        });

        let parser = logging::validator_log_level();
        let command = Command::new("level").arg(Arg::new("level").value_parser(parser));
        let matches = command.get_matches_from(["level", "debug"]);
        assert_eq!(matches.get_one::<u8>("level").copied(), Some(3));
    }
}
