//! Current-account resolution for protected pages.

use axum::{
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use sqlx::PgPool;
use tracing::error;

use super::{
    flash::{flash_cookie, Flash},
    session::authenticate_session,
    state::AuthConfig,
    storage::Account,
};

pub(crate) const MSG_LOGIN_REQUIRED: &str = "Please log in to access this page.";

/// Resolve the session into an account, or build the response to send instead.
///
/// Without a valid session the caller gets a redirect to `/login`, never an error status.
pub(crate) async fn require_account(
    headers: &HeaderMap,
    pool: &PgPool,
    config: &AuthConfig,
) -> Result<Account, Response> {
    match authenticate_session(headers, pool).await {
        Ok(Some(account)) => Ok(account),
        Ok(None) => Err(login_redirect(config)),
        Err(err) => {
            error!("Failed to lookup session: {err:#}");
            Err(StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
    }
}

pub(crate) fn login_redirect(config: &AuthConfig) -> Response {
    let mut headers = HeaderMap::new();
    match flash_cookie(config, &[Flash::info(MSG_LOGIN_REQUIRED)]) {
        Ok(cookie) => {
            headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => error!("Failed to build flash cookie: {err:#}"),
    }
    (headers, Redirect::to("/login")).into_response()
}

/// For pages only anonymous users need: `Some(response)` sends signed-in users home.
pub(crate) async fn redirect_if_authenticated(
    headers: &HeaderMap,
    pool: &PgPool,
) -> Option<Response> {
    match authenticate_session(headers, pool).await {
        Ok(Some(_)) => Some(Redirect::to("/").into_response()),
        Ok(None) => None,
        Err(err) => {
            error!("Failed to lookup session: {err:#}");
            Some(StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
    }
}
