use crate::api::handlers::{
    auth::{
        principal::{login_redirect, require_account},
        storage::increment_clicks,
        AuthConfig,
    },
    internal_error,
};
use axum::{
    extract::Extension,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use sqlx::PgPool;
use tracing::{debug, error, instrument, warn};

/// Add one click for the signed-in account, then go back home.
#[instrument(skip(headers, pool, config))]
pub async fn click(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<AuthConfig>,
) -> Response {
    let account = match require_account(&headers, &pool, &config).await {
        Ok(account) => account,
        Err(response) => return response,
    };

    match increment_clicks(&pool, account.id).await {
        Ok(Some(clicks)) => {
            debug!("Account {} now has {} clicks", account.id, clicks);
            Redirect::to("/").into_response()
        }
        Ok(None) => {
            warn!("Account {} vanished before its click was counted", account.id);
            login_redirect(&config)
        }
        Err(err) => {
            error!("Failed to increment clicks: {err:#}");
            internal_error()
        }
    }
}
