use anyhow::Result;
use clap::{Arg, ArgMatches, Command};

use super::{api_keys, database};

pub const CMD_SERVER: &str = "server";
pub const ARG_PORT: &str = "port";
pub const ARG_ALLOWED_ORIGIN: &str = "allowed-origin";

#[must_use]
pub fn command() -> Command {
    let command = Command::new(CMD_SERVER)
        .about("Serve the inventory REST API")
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("STOREKEEPER_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_ALLOWED_ORIGIN)
                .long("allowed-origin")
                .help("Browser origin allowed through CORS, example: https://admin.example.com")
                .env("STOREKEEPER_ALLOWED_ORIGIN"),
        );

    let command = database::with_args(command);
    api_keys::with_args(command)
}

#[derive(Debug)]
pub struct Options {
    pub port: u16,
    pub allowed_origin: Option<String>,
}

impl Options {
    /// # Errors
    /// Never fails today; kept fallible like the other option parsers.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        Ok(Self {
            port: matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080),
            allowed_origin: matches
                .get_one::<String>(ARG_ALLOWED_ORIGIN)
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty()),
        })
    }
}
