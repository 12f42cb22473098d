//! One-shot notices carried across a redirect in a cookie.
//!
//! The cookie value is `base64url(json).base64url(hmac)`; the HMAC-SHA256 tag is
//! keyed by the config's flash key, so values the server did not issue are dropped.

use anyhow::{anyhow, Context, Result};
use axum::http::{
    header::{InvalidHeaderValue, SET_COOKIE},
    HeaderMap, HeaderValue,
};
use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::debug;

use super::{state::AuthConfig, utils::cookie_value};

const FLASH_COOKIE_NAME: &str = "clicker_flash";

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashCategory {
    Success,
    Info,
    Danger,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub category: FlashCategory,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            category: FlashCategory::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            category: FlashCategory::Info,
            message: message.into(),
        }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            category: FlashCategory::Danger,
            message: message.into(),
        }
    }
}

/// Build the cookie that carries `flashes` to the next rendered page.
pub(crate) fn flash_cookie(config: &AuthConfig, flashes: &[Flash]) -> Result<HeaderValue> {
    let json = serde_json::to_vec(flashes).context("failed to serialize flash messages")?;
    let payload = Base64UrlUnpadded::encode_string(&json);
    let tag = sign(config, &payload)?;
    let mut cookie = format!("{FLASH_COOKIE_NAME}={payload}.{tag}; Path=/; HttpOnly; SameSite=Lax");
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).context("failed to build flash cookie")
}

fn mac(config: &AuthConfig) -> Result<HmacSha256> {
    HmacSha256::new_from_slice(config.flash_key()).map_err(|err| anyhow!("invalid flash key: {err}"))
}

fn sign(config: &AuthConfig, payload: &str) -> Result<String> {
    let mut mac = mac(config)?;
    mac.update(payload.as_bytes());
    Ok(Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes()))
}

/// Constant-time check of `tag` against the payload.
fn verify(config: &AuthConfig, payload: &str, tag: &str) -> bool {
    let (Ok(mut mac), Ok(tag)) = (mac(config), Base64UrlUnpadded::decode_vec(tag)) else {
        return false;
    };
    mac.update(payload.as_bytes());
    mac.verify_slice(&tag).is_ok()
}

fn clear_flash_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{FLASH_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Decode pending flashes from the request. Unsigned or unreadable cookies yield nothing.
fn read_flashes(headers: &HeaderMap, config: &AuthConfig) -> Vec<Flash> {
    let Some(value) = cookie_value(headers, FLASH_COOKIE_NAME) else {
        return Vec::new();
    };

    let Some((payload, tag)) = value.split_once('.') else {
        debug!("Ignoring unsigned flash cookie");
        return Vec::new();
    };
    if !verify(config, payload, tag) {
        debug!("Ignoring flash cookie with a bad signature");
        return Vec::new();
    }

    Base64UrlUnpadded::decode_vec(payload)
        .ok()
        .and_then(|json| serde_json::from_slice::<Vec<Flash>>(&json).ok())
        .unwrap_or_else(|| {
            debug!("Ignoring unreadable flash cookie");
            Vec::new()
        })
}

/// Take pending flashes and the response headers that clear them.
pub(crate) fn consume_flashes(headers: &HeaderMap, config: &AuthConfig) -> (Vec<Flash>, HeaderMap) {
    let mut response_headers = HeaderMap::new();

    if cookie_value(headers, FLASH_COOKIE_NAME).is_none() {
        return (Vec::new(), response_headers);
    }

    let flashes = read_flashes(headers, config);
    if let Ok(cookie) = clear_flash_cookie(config) {
        response_headers.append(SET_COOKIE, cookie);
    }

    (flashes, response_headers)
}
