use crate::api::{self, AuthConfig};
use anyhow::{anyhow, Context, Result};
use tracing::{debug, info};
use url::Url;

// Ten years; larger values overflow the session expiry arithmetic in Postgres.
const MAX_SESSION_TTL_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub session_ttl_seconds: i64,
    pub session_cookie_secure: bool,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the DSN is invalid or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let dsn = Url::parse(&args.dsn).context("Invalid database connection string")?;

    if !matches!(dsn.scheme(), "postgres" | "postgresql") {
        return Err(anyhow!(
            "Unsupported database scheme '{}', expected postgres://",
            dsn.scheme()
        ));
    }

    info!(
        "Using database {}{}",
        dsn.host_str().unwrap_or("localhost"),
        dsn.path()
    );

    if args.session_ttl_seconds <= 0 {
        return Err(anyhow!("Session TTL must be a positive number of seconds"));
    }

    if args.session_ttl_seconds > MAX_SESSION_TTL_SECONDS {
        return Err(anyhow!(
            "Session TTL must not exceed {MAX_SESSION_TTL_SECONDS} seconds"
        ));
    }

    let auth_config = AuthConfig::new()
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_session_cookie_secure(args.session_cookie_secure);

    debug!("Auth config: {:?}", auth_config);

    api::new(args.port, dsn.to_string(), auth_config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn execute_rejects_non_postgres_dsn() {
        let args = Args {
            port: 0,
            dsn: "mysql://user@localhost/clicker".to_string(),
            session_ttl_seconds: 60,
            session_cookie_secure: false,
        };
        let result = execute(args).await;
        assert!(result.is_err());
        if let Err(err) = result {
            assert!(err.to_string().contains("Unsupported database scheme"));
        }
    }

    #[tokio::test]
    async fn execute_rejects_non_positive_ttl() {
        let args = Args {
            port: 0,
            dsn: "postgres://user@localhost/clicker".to_string(),
            session_ttl_seconds: 0,
            session_cookie_secure: false,
        };
        let result = execute(args).await;
        assert!(result.is_err());
        if let Err(err) = result {
            assert!(err.to_string().contains("Session TTL"));
        }
    }

    #[tokio::test]
    async fn execute_rejects_ttl_above_ten_years() {
        for ttl in [MAX_SESSION_TTL_SECONDS + 1, i64::MAX] {
            let args = Args {
                port: 0,
                dsn: "postgres://user@localhost/clicker".to_string(),
                session_ttl_seconds: ttl,
                session_cookie_secure: false,
            };
            let result = execute(args).await;
            assert!(result.is_err());
            if let Err(err) = result {
                assert!(err.to_string().contains("must not exceed"), "{ttl}");
            }
        }
    }
}
