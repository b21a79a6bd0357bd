use crate::edge::gate::{CANONICAL_HOST, IDN_HOST};
use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use secrecy::SecretString;

pub const ARG_UPSTREAM_URL: &str = "upstream-url";
pub const ARG_UPSTREAM_TIMEOUT: &str = "upstream-timeout";
pub const ARG_CANONICAL_HOST: &str = "canonical-host";
pub const ARG_IDN_HOST: &str = "idn-host";
pub const ARG_BYPASS_SECRET: &str = "maintenance-bypass-secret";
pub const ARG_REVALIDATION_SECRET: &str = "revalidation-secret";
pub const ARG_PRODUCTION: &str = "production";

#[derive(Debug)]
pub struct Options {
    pub upstream_url: String,
    pub upstream_timeout_seconds: u64,
    pub canonical_host: String,
    pub idn_host: String,
    pub bypass_secret: Option<SecretString>,
    pub revalidation_secret: Option<SecretString>,
    pub production: bool,
}

impl Options {
    /// # Errors
    /// Returns an error if the upstream URL is missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let secret = |name: &str| {
            matches
                .get_one::<String>(name)
                .filter(|value| !value.is_empty())
                .map(|value| SecretString::from(value.as_str()))
        };

        Ok(Self {
            upstream_url: matches
                .get_one::<String>(ARG_UPSTREAM_URL)
                .cloned()
                .context("missing required argument: --upstream-url")?,
            upstream_timeout_seconds: matches
                .get_one::<u64>(ARG_UPSTREAM_TIMEOUT)
                .copied()
                .unwrap_or(30),
            canonical_host: matches
                .get_one::<String>(ARG_CANONICAL_HOST)
                .cloned()
                .unwrap_or_else(|| CANONICAL_HOST.to_string()),
            idn_host: matches
                .get_one::<String>(ARG_IDN_HOST)
                .cloned()
                .unwrap_or_else(|| IDN_HOST.to_string()),
            bypass_secret: secret(ARG_BYPASS_SECRET),
            revalidation_secret: secret(ARG_REVALIDATION_SECRET),
            production: matches.get_flag(ARG_PRODUCTION),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_UPSTREAM_URL)
                .short('u')
                .long(ARG_UPSTREAM_URL)
                .help("Base URL of the page renderer requests are forwarded to")
                .env("NAGLASUPAN_UPSTREAM_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_UPSTREAM_TIMEOUT)
                .long(ARG_UPSTREAM_TIMEOUT)
                .help("Upstream request timeout in seconds")
                .env("NAGLASUPAN_UPSTREAM_TIMEOUT")
                .default_value("30")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_CANONICAL_HOST)
                .long(ARG_CANONICAL_HOST)
                .help("Public host every request is normalized to")
                .env("NAGLASUPAN_CANONICAL_HOST")
                .default_value(CANONICAL_HOST),
        )
        .arg(
            Arg::new(ARG_IDN_HOST)
                .long(ARG_IDN_HOST)
                .help("Punycode alias redirected to the canonical host")
                .env("NAGLASUPAN_IDN_HOST")
                .default_value(IDN_HOST),
        )
        .arg(
            Arg::new(ARG_BYPASS_SECRET)
                .long(ARG_BYPASS_SECRET)
                .help("Secret accepted in ?bypass_maintenance= to set the bypass cookie")
                .env("MAINTENANCE_BYPASS_SECRET")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_REVALIDATION_SECRET)
                .long(ARG_REVALIDATION_SECRET)
                .help("Shared secret required by POST /api/revalidate")
                .env("REVALIDATION_SECRET")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_PRODUCTION)
                .long(ARG_PRODUCTION)
                .help("Mark cookies set by the edge as Secure")
                .env("NAGLASUPAN_PRODUCTION")
                .action(ArgAction::SetTrue),
        )
}
