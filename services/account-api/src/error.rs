//! Error types for the Account API service.

use axum::extract::rejection::JsonRejection;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use vidhub_auth_core::AuthError;
use vidhub_types::ApiErrorBody;

/// Message shown for any 5xx; the detail only goes to the log
const INTERNAL_MESSAGE: &str = "Something went wrong";

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request body could not be parsed
    #[error("{message}")]
    Malformed {
        message: &'static str,
        detail: String,
    },

    /// Staging an upload on local disk failed
    #[error("Upload staging failed: {0}")]
    Staging(#[from] std::io::Error),

    #[error("route not found")]
    RouteNotFound,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("request timed out")]
    Timeout,

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Malformed { .. } => StatusCode::BAD_REQUEST,
            Self::Staging(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Timeout => StatusCode::REQUEST_TIMEOUT,
            Self::Auth(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Malformed { .. } => "MALFORMED_REQUEST",
            Self::Staging(_) => "INTERNAL_ERROR",
            Self::RouteNotFound => "NOT_FOUND",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::Timeout => "TIMEOUT",
            Self::Auth(e) => e.error_code(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Malformed {
            message: "Invalid JSON body",
            detail: rejection.body_text(),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::Malformed {
            message: "Invalid multipart body",
            detail: err.body_text(),
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::Malformed {
            message: "Invalid multipart body",
            detail: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "Internal API error");
            ApiErrorBody::new(status.as_u16(), INTERNAL_MESSAGE)
        } else {
            tracing::debug!(error = %self, code = self.error_code(), "Request rejected");
            let body = ApiErrorBody::new(status.as_u16(), self.to_string());
            match self {
                Self::Malformed { detail, .. } => body.with_errors(vec![detail]),
                _ => body,
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn render(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_client_error_envelope() {
        let (status, body) = render(AuthError::InvalidCredentials.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["statusCode"], 401);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "invalid user credentials");
        assert_eq!(body["errors"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_conflict_and_not_found() {
        let (status, _) = render(AuthError::Conflict("taken".into()).into()).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = render(AuthError::UserNotFound.into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_server_error_hides_detail() {
        let (status, body) =
            render(AuthError::Database("connection refused at 10.0.0.5".into()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], INTERNAL_MESSAGE);
        assert!(!body.to_string().contains("10.0.0.5"));
    }

    #[tokio::test]
    async fn test_transport_errors_use_envelope() {
        let (status, body) = render(ApiError::RouteNotFound).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["statusCode"], 404);
        assert_eq!(body["success"], false);

        let (status, body) = render(ApiError::MethodNotAllowed).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["message"], "method not allowed");

        let (status, body) = render(ApiError::Timeout).await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(body["statusCode"], 408);
        assert_eq!(body["errors"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_malformed_carries_detail() {
        let err = ApiError::Malformed {
            message: "Invalid JSON body",
            detail: "missing field `password`".to_string(),
        };
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0], "missing field `password`");
    }
}
