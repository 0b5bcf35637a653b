//! Auth errors

use thiserror::Error;

use crate::media::MediaError;

/// Authentication and account errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Missing or malformed input
    #[error("{0}")]
    BadRequest(String),

    /// Username or email already taken
    #[error("{0}")]
    Conflict(String),

    /// No token was presented
    #[error("unauthorized request")]
    Unauthenticated,

    /// Invalid token (malformed, bad signature, wrong kind, unknown user)
    #[error("invalid token")]
    InvalidToken,

    /// Token has expired
    #[error("token expired")]
    TokenExpired,

    /// Refresh token is well-formed but no longer the one on file
    #[error("refresh token is expired or used")]
    SessionRevoked,

    /// User not found
    #[error("user not found")]
    UserNotFound,

    /// Invalid credentials (wrong password, etc.)
    #[error("invalid user credentials")]
    InvalidCredentials,

    /// Media host failed on a required asset
    #[error("media upload failed: {0}")]
    MediaUpload(String),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::Unauthenticated
            | Self::InvalidToken
            | Self::TokenExpired
            | Self::SessionRevoked
            | Self::InvalidCredentials => 401,
            Self::UserNotFound => 404,
            Self::Conflict(_) => 409,
            Self::MediaUpload(_)
            | Self::Database(_)
            | Self::Configuration(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Conflict(_) => "CONFLICT",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::SessionRevoked => "SESSION_REVOKED",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::MediaUpload(_) => "MEDIA_UPLOAD_FAILED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether this error is the caller's fault (4xx)
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

impl From<vidhub_db::DbError> for AuthError {
    fn from(err: vidhub_db::DbError) -> Self {
        match err {
            vidhub_db::DbError::NotFound => Self::UserNotFound,
            vidhub_db::DbError::Conflict(constraint) => {
                tracing::debug!(constraint = %constraint, "Unique constraint violated");
                Self::Conflict("user with email or username already exists".to_string())
            }
            vidhub_db::DbError::Sqlx(e) => {
                tracing::error!("Database error: {}", e);
                Self::Database(e.to_string())
            }
        }
    }
}

impl From<MediaError> for AuthError {
    fn from(err: MediaError) -> Self {
        tracing::error!("Media host error: {}", err);
        Self::MediaUpload(err.to_string())
    }
}
