use crate::api::{
    handlers::{
        auth::{
            consume_flashes, flash_cookie, hash_password,
            principal::redirect_if_authenticated,
            storage::{insert_account, CreateOutcome},
            AuthConfig, FieldErrors, Flash, RegistrationForm, MSG_USERNAME_TAKEN,
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

pub(crate) const MSG_REGISTERED: &str = "Registration successful!";

#[instrument(skip(headers, pool, config, views))]
pub async fn register_form(
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
        views.register("", &FieldErrors::default(), &flashes),
    )
}

#[instrument(skip(headers, pool, config, views, payload))]
pub async fn register(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<AuthConfig>,
    views: Extension<Arc<Views>>,
    payload: Option<Form<RegistrationForm>>,
) -> Response {
    if let Some(response) = redirect_if_authenticated(&headers, &pool).await {
        return response;
    }

    let Some(Form(form)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing form data").into_response();
    };

    debug!("form: {:?}", form);

    let (flashes, response_headers) = consume_flashes(&headers, &config);
    let rerender = |errors: &FieldErrors| {
        page(
            StatusCode::OK,
            response_headers.clone(),
            views.register(form.username(), errors, &flashes),
        )
    };

    let account = match form.validate(&*pool).await {
        Ok(Ok(account)) => account,
        Ok(Err(errors)) => return rerender(&errors),
        Err(err) => {
            error!("Failed to validate registration: {err:#}");
            return internal_error();
        }
    };

    let password = account.password;
    let password_hash = match tokio::task::spawn_blocking(move || hash_password(&password)).await {
        Ok(Ok(hash)) => hash,
        Ok(Err(err)) => {
            error!("Failed to hash password: {err:#}");
            return internal_error();
        }
        Err(err) => {
            error!("Password hashing task failed: {err}");
            return internal_error();
        }
    };

    match insert_account(&pool, &account.username, &password_hash).await {
        Ok(CreateOutcome::Created(id)) => {
            info!("Registered account {id}");
        }
        Ok(CreateOutcome::Conflict) => {
            let mut errors = FieldErrors::default();
            errors.add("username", MSG_USERNAME_TAKEN);
            return rerender(&errors);
        }
        Err(err) => {
            error!("Failed to create account: {err:#}");
            return internal_error();
        }
    }

    let mut headers = HeaderMap::new();
    match flash_cookie(&config, &[Flash::success(MSG_REGISTERED)]) {
        Ok(cookie) => {
            headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => error!("Failed to build flash cookie: {err:#}"),
    }
    (headers, Redirect::to("/login")).into_response()
}
