use crate::api::{
    handlers::{
        auth::{
            consume_flashes,
            principal::redirect_if_authenticated,
            session::start_session,
            storage::lookup_credentials,
            verify_dummy, verify_password, AuthConfig, FieldErrors, Flash, LoginForm,
        },
        internal_error, page,
    },
    views::Views,
};
use axum::{
    extract::{Extension, Form},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Shown for both unknown usernames and wrong passwords.
pub(crate) const MSG_INVALID_CREDENTIALS: &str = "Invalid username or password.";

#[instrument(skip(headers, pool, config, views))]
pub async fn login_form(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<AuthConfig>,
    views: Extension<Arc<Views>>,
) -> Response {
    if let Some(response) = redirect_if_authenticated(&headers, &pool).await {
        return response;
    }

    let (flashes, response_headers) = consume_flashes(&headers, &config);
    page(
        StatusCode::OK,
        response_headers,
        views.login("", &FieldErrors::default(), &flashes),
    )
}

#[instrument(skip(headers, pool, config, views, payload))]
pub async fn login(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<AuthConfig>,
    views: Extension<Arc<Views>>,
    payload: Option<Form<LoginForm>>,
) -> Response {
    if let Some(response) = redirect_if_authenticated(&headers, &pool).await {
        return response;
    }

    let Some(Form(form)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing form data").into_response();
    };

    debug!("form: {:?}", form);

    let (mut flashes, response_headers) = consume_flashes(&headers, &config);

    let credentials = match form.validate() {
        Ok(credentials) => credentials,
        Err(errors) => {
            return page(
                StatusCode::OK,
                response_headers,
                views.login(form.username(), &errors, &flashes),
            );
        }
    };

    let record = match lookup_credentials(&pool, &credentials.username).await {
        Ok(record) => record,
        Err(err) => {
            error!("Failed to lookup credentials: {err:#}");
            return internal_error();
        }
    };

    let password = credentials.password;
    let verified = tokio::task::spawn_blocking(move || match record {
        Some(record) if verify_password(&password, &record.password_hash) => {
            Some(record.account_id)
        }
        Some(_) => None,
        None => {
            verify_dummy(&password);
            None
        }
    })
    .await;

    let account_id = match verified {
        Ok(Some(account_id)) => account_id,
        Ok(None) => {
            debug!("Rejected login attempt");
            flashes.push(Flash::danger(MSG_INVALID_CREDENTIALS));
            return page(
                StatusCode::OK,
                response_headers,
                views.login(form.username(), &FieldErrors::default(), &flashes),
            );
        }
        Err(err) => {
            error!("Password verification task failed: {err}");
            return internal_error();
        }
    };

    match start_session(&pool, &config, account_id).await {
        Ok(cookie) => {
            info!("Account {account_id} logged in");
            let mut headers = response_headers;
            headers.append(SET_COOKIE, cookie);
            (headers, Redirect::to("/")).into_response()
        }
        Err(err) => {
            error!("Failed to start session: {err:#}");
            internal_error()
        }
    }
}
