//! Axum extractors for authentication

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};

use vidhub_auth_core::AuthError;
use vidhub_types::{PublicUser, UserId};

use crate::cookies::{read_cookie, ACCESS_TOKEN_COOKIE};
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthUser(pub PublicUser);

impl AuthUser {
    pub fn id(&self) -> UserId {
        self.0.id
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let token = extract_token(&parts.headers).ok_or(AuthError::Unauthenticated)?;

        let user = app_state.accounts.authenticate(&token).await.map_err(|e| {
            tracing::debug!(error = %e, "Access token rejected");
            e
        })?;

        Ok(AuthUser(user))
    }
}

/// Extract the access token from the `accessToken` cookie or a Bearer header
fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = read_cookie(headers, ACCESS_TOKEN_COOKIE) {
        return Some(token);
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
}
