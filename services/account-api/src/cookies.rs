//! Auth cookie handling

use axum::http::{header, HeaderMap};
use axum::response::AppendHeaders;

use vidhub_auth_core::TokenPair;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

type SetCookies = AppendHeaders<[(header::HeaderName, String); 2]>;

fn cookie(name: &str, value: &str, secure: bool, max_age: Option<u64>) -> String {
    let mut cookie = format!("{name}={value}; HttpOnly; Path=/");
    if secure {
        cookie.push_str("; Secure");
    }
    if let Some(max_age) = max_age {
        cookie.push_str(&format!("; Max-Age={max_age}"));
    }
    cookie
}

/// `Set-Cookie` headers carrying a fresh token pair
pub fn set_auth_cookies(tokens: &TokenPair, secure: bool) -> SetCookies {
    AppendHeaders([
        (
            header::SET_COOKIE,
            cookie(ACCESS_TOKEN_COOKIE, &tokens.access_token, secure, None),
        ),
        (
            header::SET_COOKIE,
            cookie(REFRESH_TOKEN_COOKIE, &tokens.refresh_token, secure, None),
        ),
    ])
}

/// `Set-Cookie` headers that expire both auth cookies
pub fn clear_auth_cookies(secure: bool) -> SetCookies {
    AppendHeaders([
        (
            header::SET_COOKIE,
            cookie(ACCESS_TOKEN_COOKIE, "", secure, Some(0)),
        ),
        (
            header::SET_COOKIE,
            cookie(REFRESH_TOKEN_COOKIE, "", secure, Some(0)),
        ),
    ])
}

/// Read a cookie value from the request headers
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}
