use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};

pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_SESSION_COOKIE_SECURE: &str = "session-cookie-secure";

#[derive(Debug)]
pub struct Options {
    pub session_ttl_seconds: i64,
    pub session_cookie_secure: bool,
}

impl Options {
    /// Read session options from validated matches.
    /// # Errors
    /// Never fails today; kept fallible to match the other option groups.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        Ok(Self {
            session_ttl_seconds: matches
                .get_one::<i64>(ARG_SESSION_TTL_SECONDS)
                .copied()
                .unwrap_or(604_800),
            session_cookie_secure: matches.get_flag(ARG_SESSION_COOKIE_SECURE),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Session cookie TTL in seconds")
                .env("CLICKER_SESSION_TTL_SECONDS")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_SESSION_COOKIE_SECURE)
                .long(ARG_SESSION_COOKIE_SECURE)
                .help("Mark session and flash cookies as Secure (serve over HTTPS)")
                .env("CLICKER_SESSION_COOKIE_SECURE")
                .action(ArgAction::SetTrue),
        )
}
