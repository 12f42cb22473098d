use crate::api::{
    handlers::{
        auth::{consume_flashes, principal::require_account, AuthConfig},
        page,
    },
    views::Views,
};
use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::Response,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::instrument;

/// Home page: the signed-in account and its click count.
#[instrument(skip(headers, pool, config, views))]
pub async fn home(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<AuthConfig>,
    views: Extension<Arc<Views>>,
) -> Response {
    let account = match require_account(&headers, &pool, &config).await {
        Ok(account) => account,
        Err(response) => return response,
    };

    let (flashes, response_headers) = consume_flashes(&headers, &config);
    page(
        StatusCode::OK,
        response_headers,
        views.index(&account, &flashes),
    )
}
