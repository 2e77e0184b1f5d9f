use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

use super::database;

pub const CMD_BOOTSTRAP_ADMIN: &str = "bootstrap-admin";

#[must_use]
pub fn command() -> Command {
    let command = Command::new(CMD_BOOTSTRAP_ADMIN)
        .about("Create the first admin user, the operator every later write needs")
        .arg(
            Arg::new("email")
                .long("email")
                .help("Admin email")
                .env("STOREKEEPER_ADMIN_EMAIL")
                .required(true),
        )
        .arg(
            Arg::new("name")
                .long("name")
                .help("Admin display name (unique)")
                .env("STOREKEEPER_ADMIN_NAME")
                .required(true),
        )
        .arg(
            Arg::new("password")
                .long("password")
                .help("Admin password")
                .env("STOREKEEPER_ADMIN_PASSWORD")
                .hide_env_values(true)
                .required(true),
        );

    database::with_args(command)
}

#[derive(Debug)]
pub struct Options {
    pub email: String,
    pub name: String,
    pub password: SecretString,
}

impl Options {
    /// # Errors
    /// Returns an error if a required argument is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let value = |id: &str| -> Result<String> {
            matches
                .get_one::<String>(id)
                .cloned()
                .with_context(|| format!("missing required argument: --{id}"))
        };

        Ok(Self {
            email: value("email")?,
            name: value("name")?,
            password: SecretString::from(value("password")?),
        })
    }
}
