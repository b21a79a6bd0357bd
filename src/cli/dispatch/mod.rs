//! Maps validated CLI arguments to the action the binary runs.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::edge;
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let edge_opts = edge::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        upstream_url: edge_opts.upstream_url,
        upstream_timeout_seconds: edge_opts.upstream_timeout_seconds,
        canonical_host: edge_opts.canonical_host,
        idn_host: edge_opts.idn_host,
        bypass_secret: edge_opts.bypass_secret,
        revalidation_secret: edge_opts.revalidation_secret,
        production: edge_opts.production,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_server_action_from_env() {
        temp_env::with_vars(
            [
                ("NAGLASUPAN_PORT", Some("9000")),
                ("NAGLASUPAN_UPSTREAM_URL", Some("http://renderer:3000")),
                ("NAGLASUPAN_PRODUCTION", None),
                ("MAINTENANCE_BYPASS_SECRET", None),
                ("REVALIDATION_SECRET", Some("cms")),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec!["naglasupan"]);
                let result = handler(&matches);
                assert!(result.is_ok());
                if let Ok(Action::Server(args)) = result {
                    assert_eq!(args.port, 9000);
                    assert_eq!(args.upstream_url, "http://renderer:3000");
                    assert!(args.bypass_secret.is_none());
                    assert!(args.revalidation_secret.is_some());
                    assert!(!args.production);
                }
            },
        );
    }
}
