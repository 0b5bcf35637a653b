//! Fallbacks for requests no route accepts

use crate::error::ApiError;

/// Any path without a route
pub async fn not_found() -> ApiError {
    ApiError::RouteNotFound
}

/// A known path hit with a method it does not serve
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
