//! API key arguments: one default key plus an optional override per route.

use crate::api::{ApiKeyRoute, ApiKeys};
use anyhow::{bail, Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_API_KEY: &str = "api-key";

#[must_use]
pub fn with_args(command: Command) -> Command {
    let command = command.arg(
        Arg::new(ARG_API_KEY)
            .long(ARG_API_KEY)
            .help("API key expected by every route without its own key")
            .env("STOREKEEPER_API_KEY")
            .hide_env_values(true)
            .required(true),
    );

    ApiKeyRoute::ALL.iter().fold(command, |command, route| {
        command.arg(
            Arg::new(route.arg_id())
                .long(route.arg_id())
                .help(format!(
                    "API key for {} (sent in the `{}` header)",
                    route.describe(),
                    route.header()
                ))
                .env(route.env_var())
                .hide_env_values(true)
                .help_heading("Per-route API keys"),
        )
    })
}

/// Build the key table from parsed arguments.
///
/// # Errors
/// Returns an error if the default key is missing or any key is blank.
pub fn parse(matches: &ArgMatches) -> Result<ApiKeys> {
    let default = matches
        .get_one::<String>(ARG_API_KEY)
        .context("missing required argument: --api-key")?;
    if default.trim().is_empty() {
        bail!("--{ARG_API_KEY} must not be empty");
    }

    let mut keys = ApiKeys::new(SecretString::from(default.clone()));
    for route in ApiKeyRoute::ALL {
        if let Some(key) = matches.get_one::<String>(route.arg_id()) {
            if key.trim().is_empty() {
                bail!("--{} must not be empty", route.arg_id());
            }
            keys = keys.with_override(route, SecretString::from(key.clone()));
        }
    }

    Ok(keys)
}
