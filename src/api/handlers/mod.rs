//! Route handlers.
//!
//! Every page handler takes the pool, the auth config and the rendered views as
//! request extensions and always answers: failures are logged and become a 500.

pub mod auth;
pub mod click;
pub mod health;
pub mod home;
pub mod login;
pub mod register;

use anyhow::Result;
use axum::{
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};
use tracing::error;

/// Turn a rendered page into a response, carrying any `Set-Cookie` headers along.
pub(crate) fn page(status: StatusCode, headers: HeaderMap, rendered: Result<String>) -> Response {
    match rendered {
        Ok(html) => (status, headers, Html(html)).into_response(),
        Err(err) => {
            error!("Failed to render page: {err:#}");
            internal_error()
        }
    }
}

pub(crate) fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}
