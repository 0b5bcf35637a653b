//! Success envelope as an axum response

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use vidhub_types::ApiResponse;

/// Wraps `ApiResponse` so handlers can return it directly
#[derive(Debug)]
pub struct Envelope<T>(pub ApiResponse<T>);

impl<T> Envelope<T> {
    /// 200 with `data`
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self(ApiResponse::ok(data, message))
    }

    /// 201 with `data`
    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self(ApiResponse::created(data, message))
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code).unwrap_or(StatusCode::OK);
        (status, Json(self.0)).into_response()
    }
}
