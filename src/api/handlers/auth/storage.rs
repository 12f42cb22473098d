//! Database helpers for accounts and sessions.

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use sqlx::{PgPool, Row};
use std::future::Future;
use tracing::Instrument;

use super::forms::AccountLookup;
use super::utils::{generate_session_token, hash_session_token, is_unique_violation};

/// Account as seen by the pages: never carries the password hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub clicks: i64,
}

/// Minimal fields needed to check a login attempt.
pub(crate) struct CredentialRecord {
    pub(crate) account_id: i64,
    pub(crate) password_hash: String,
}

/// Outcome when attempting to create a new account.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum CreateOutcome {
    Created(i64),
    Conflict,
}

impl AccountLookup for PgPool {
    fn username_exists(&self, username: &str) -> impl Future<Output = Result<bool>> + Send {
        username_exists(self, username)
    }
}

pub(crate) async fn username_exists(pool: &PgPool, username: &str) -> Result<bool> {
    let query = "SELECT EXISTS(SELECT 1 FROM accounts WHERE username = $1) AS exists";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to check if username exists")?;

    Ok(row.get("exists"))
}

pub(crate) async fn insert_account(
    pool: &PgPool,
    username: &str,
    password_hash: &str,
) -> Result<CreateOutcome> {
    let query = r"
        INSERT INTO accounts (username, password_hash)
        VALUES ($1, $2)
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .bind(password_hash)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(CreateOutcome::Created(row.get("id"))),
        // Lost a race against a concurrent registration of the same name.
        Err(err) if is_unique_violation(&err) => Ok(CreateOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert account"),
    }
}

pub(crate) async fn lookup_credentials(
    pool: &PgPool,
    username: &str,
) -> Result<Option<CredentialRecord>> {
    let query = "SELECT id, password_hash FROM accounts WHERE username = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup credentials")?;

    Ok(row.map(|row| CredentialRecord {
        account_id: row.get("id"),
        password_hash: row.get("password_hash"),
    }))
}

/// Add exactly one click and return the new total.
///
/// Returns `Ok(None)` if the account no longer exists.
pub(crate) async fn increment_clicks(pool: &PgPool, account_id: i64) -> Result<Option<i64>> {
    // Single statement: concurrent clicks serialize on the row lock, none are lost.
    let query = r"
        UPDATE accounts
        SET clicks = clicks + 1
        WHERE id = $1
        RETURNING clicks
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(account_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to increment clicks")?;

    Ok(row.map(|row| row.get("clicks")))
}

pub(super) async fn insert_session(
    pool: &PgPool,
    account_id: i64,
    ttl_seconds: i64,
) -> Result<String> {
    // Generate a random token, store only its hash, and return the raw value
    // so the caller can set the session cookie.
    let query = r"
        INSERT INTO account_sessions (account_id, session_hash, expires_at)
        VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 second'))
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );

    for _ in 0..3 {
        let token = generate_session_token()?;
        let token_hash = hash_session_token(&token);
        let result = sqlx::query(query)
            .bind(account_id)
            .bind(token_hash)
            .bind(ttl_seconds)
            .execute(pool)
            .instrument(span.clone())
            .await;

        match result {
            Ok(_) => return Ok(token),
            Err(err) if is_unique_violation(&err) => {}
            Err(err) => return Err(err).context("failed to insert session"),
        }
    }

    Err(anyhow!("failed to generate unique session token"))
}

pub(super) async fn lookup_session(pool: &PgPool, token_hash: &[u8]) -> Result<Option<Account>> {
    let query = r"
        SELECT accounts.id, accounts.username, accounts.clicks
        FROM account_sessions
        JOIN accounts ON accounts.id = account_sessions.account_id
        WHERE account_sessions.session_hash = $1
          AND account_sessions.expires_at > NOW()
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token_hash)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup session")?;

    let Some(row) = row else {
        return Ok(None);
    };

    // Record activity without extending the session TTL.
    let query = r"
        UPDATE account_sessions
        SET last_seen_at = NOW()
        WHERE session_hash = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(token_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to update session last_seen_at")?;

    Ok(Some(Account {
        id: row.get("id"),
        username: row.get("username"),
        clicks: row.get("clicks"),
    }))
}

pub(super) async fn delete_session(pool: &PgPool, token_hash: &[u8]) -> Result<()> {
    // Logout is idempotent; it's fine if no rows are deleted.
    let query = "DELETE FROM account_sessions WHERE session_hash = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(token_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete session")?;
    Ok(())
}

pub(super) async fn purge_expired_sessions(pool: &PgPool) -> Result<u64> {
    let query = "DELETE FROM account_sessions WHERE expires_at <= NOW()";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to purge expired sessions")?;
    Ok(result.rows_affected())
}
