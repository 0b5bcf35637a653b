//! Session handlers (register, login, logout, refresh, change password)

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use vidhub_auth_core::{AuthError, Credentials, LoginOutcome, Registration, TokenPair};
use vidhub_types::{Empty, PublicUser};

use crate::cookies::{clear_auth_cookies, read_cookie, set_auth_cookies, REFRESH_TOKEN_COOKIE};
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::response::Envelope;
use crate::staging::stage_multipart;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: PublicUser,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
}

fn record_outcome<T>(metric: &'static str, result: &Result<T, AuthError>) {
    let outcome = match result {
        Ok(_) => "success",
        Err(e) if e.is_client_error() => "rejected",
        Err(_) => "error",
    };
    metrics::counter!(metric, "outcome" => outcome).increment(1);
}

/// 200 carrying the user and tokens, with both token cookies set
fn login_response(outcome: LoginOutcome, secure: bool) -> Response {
    (
        set_auth_cookies(&outcome.tokens, secure),
        Envelope::ok(
            LoginResponse {
                user: outcome.user,
                access_token: outcome.tokens.access_token,
                refresh_token: outcome.tokens.refresh_token,
            },
            "User logged in successfully",
        ),
    )
        .into_response()
}

/// 200 carrying the rotated pair, with both token cookies replaced
fn refresh_response(tokens: TokenPair, secure: bool) -> Response {
    (
        set_auth_cookies(&tokens, secure),
        Envelope::ok(tokens, "Access token refreshed"),
    )
        .into_response()
}

/// 200 with both token cookies expired
fn logout_response(secure: bool) -> Response {
    (
        clear_auth_cookies(secure),
        Envelope::ok(Empty {}, "User logged out"),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/users/register
///
/// Multipart: fullName, email, username, password, avatar, coverImage
pub async fn register(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<impl IntoResponse> {
    let mut form = stage_multipart(multipart?, &state.config.upload_dir).await?;

    let registration = Registration {
        full_name: form.text("fullName"),
        email: form.text("email"),
        username: form.text("username"),
        password: form.text("password"),
        avatar: form.take_file("avatar"),
        cover_image: form.take_file("coverImage"),
    };
    form.discard().await;

    let user = state.accounts.register(registration).await?;
    metrics::counter!("accounts_registered_total").increment(1);

    Ok(Envelope::created(user, "User registered successfully"))
}

/// POST /api/v1/users/login
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = body?;

    let result = state
        .accounts
        .login(Credentials {
            username: req.username,
            email: req.email,
            password: req.password,
        })
        .await;
    record_outcome("auth_logins_total", &result);

    Ok(login_response(result?, state.config.cookie_secure))
}

/// POST /api/v1/users/logout
pub async fn logout(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> ApiResult<impl IntoResponse> {
    state.accounts.logout(auth_user.id()).await?;

    Ok(logout_response(state.config.cookie_secure))
}

/// POST /api/v1/users/refresh-token
///
/// Token from the `refreshToken` cookie, or `refreshToken` in a JSON body
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let presented = read_cookie(&headers, REFRESH_TOKEN_COOKIE).or_else(|| {
        serde_json::from_slice::<RefreshRequest>(&body)
            .unwrap_or_default()
            .refresh_token
    });

    let result = state.accounts.refresh(presented.as_deref()).await;
    record_outcome("auth_refresh_total", &result);

    Ok(refresh_response(result?, state.config.cookie_secure))
}

/// POST /api/v1/users/change-password
pub async fn change_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    body: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> ApiResult<Envelope<Empty>> {
    let Json(req) = body?;

    state
        .accounts
        .change_password(auth_user.id(), &req.old_password, &req.new_password)
        .await?;

    Ok(Envelope::ok(Empty {}, "Password changed successfully"))
}
