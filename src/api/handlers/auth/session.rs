//! Session cookies: create on login, resolve per request, tear down on logout.

use anyhow::{Context, Result};
use axum::{
    extract::Extension,
    http::{
        header::{InvalidHeaderValue, SET_COOKIE},
        HeaderMap, HeaderValue,
    },
    response::{IntoResponse, Redirect, Response},
};
use sqlx::PgPool;
use tracing::{debug, error, instrument, warn};

use super::{
    state::AuthConfig,
    storage::{
        delete_session, insert_session, lookup_session, purge_expired_sessions, Account,
    },
    utils::{cookie_value, hash_session_token},
};

const SESSION_COOKIE_NAME: &str = "clicker_session";

/// Resolve the session cookie into its account, if any.
///
/// Returns `Ok(None)` when the cookie is missing, unknown or expired.
pub(crate) async fn authenticate_session(
    headers: &HeaderMap,
    pool: &PgPool,
) -> Result<Option<Account>> {
    let Some(token) = cookie_value(headers, SESSION_COOKIE_NAME) else {
        return Ok(None);
    };
    // Only the hash is stored; never compare raw tokens against the database.
    let token_hash = hash_session_token(&token);
    lookup_session(pool, &token_hash).await
}

/// Create a session for `account_id` and return the `Set-Cookie` value.
pub(crate) async fn start_session(
    pool: &PgPool,
    config: &AuthConfig,
    account_id: i64,
) -> Result<HeaderValue> {
    match purge_expired_sessions(pool).await {
        Ok(0) => {}
        Ok(purged) => debug!("Purged {purged} expired sessions"),
        Err(err) => warn!("Failed to purge expired sessions: {err:#}"),
    }

    let token = insert_session(pool, account_id, config.session_ttl_seconds()).await?;
    session_cookie(config, &token).context("failed to build session cookie")
}

#[instrument(skip(headers, pool, config))]
pub async fn logout(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<AuthConfig>,
) -> Response {
    if let Some(token) = cookie_value(&headers, SESSION_COOKIE_NAME) {
        let token_hash = hash_session_token(&token);
        if let Err(err) = delete_session(&pool, &token_hash).await {
            error!("Failed to delete session: {err:#}");
        }
    }

    // Always clear the cookie, even if the session record was missing.
    let mut response_headers = HeaderMap::new();
    if let Ok(cookie) = clear_session_cookie(&config) {
        response_headers.insert(SET_COOKIE, cookie);
    }
    (response_headers, Redirect::to("/login")).into_response()
}

/// Build a secure `HttpOnly` cookie for the session token.
fn session_cookie(config: &AuthConfig, token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = config.session_ttl_seconds();
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    );
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn clear_session_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}
