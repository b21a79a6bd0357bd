//! `-v`/`--verbose`, repeatable on the command line or given as a level name
//! through `NAGLASUPAN_LOG_LEVEL`. Both end up as the same count.

use clap::{Arg, ArgAction, Command, builder::ValueParser};

pub const ARG_VERBOSITY: &str = "verbosity";
pub const ENV_LOG_LEVEL: &str = "NAGLASUPAN_LOG_LEVEL";

/// Index is the verbosity count.
const LEVEL_NAMES: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

fn parse_level(value: &str) -> Result<u8, String> {
    let value = value.trim().to_ascii_lowercase();
    value
        .parse::<usize>()
        .ok()
        .filter(|count| *count < LEVEL_NAMES.len())
        .or_else(|| LEVEL_NAMES.iter().position(|name| *name == value))
        .and_then(|count| u8::try_from(count).ok())
        .ok_or_else(|| {
            format!(
                "invalid log level '{value}', expected one of: {}",
                LEVEL_NAMES.join(", ")
            )
        })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
            .env(ENV_LOG_LEVEL)
            .global(true)
            .action(ArgAction::Count)
            .value_parser(ValueParser::from(parse_level)),
    )
}
