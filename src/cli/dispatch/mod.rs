//! Map parsed command-line arguments to the action to run.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::auth;
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        session_ttl_seconds: auth_opts.session_ttl_seconds,
        session_cookie_secure: auth_opts.session_cookie_secure,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_builds_server_action() {
        temp_env::with_vars(
            [
                ("CLICKER_PORT", None::<&str>),
                ("CLICKER_SESSION_TTL_SECONDS", None::<&str>),
                ("CLICKER_SESSION_COOKIE_SECURE", None::<&str>),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec![
                    "clicker",
                    "--dsn",
                    "postgres://clicker@localhost:5432/clicker",
                    "--session-ttl-seconds",
                    "120",
                    "--session-cookie-secure",
                ]);

                let action = handler(&matches);
                assert!(action.is_ok());
                if let Ok(Action::Server(args)) = action {
                    assert_eq!(args.port, 8080);
                    assert_eq!(args.dsn, "postgres://clicker@localhost:5432/clicker");
                    assert_eq!(args.session_ttl_seconds, 120);
                    assert!(args.session_cookie_secure);
                }
            },
        );
    }
}
