//! API request/response types

use serde::{Deserialize, Serialize};

/// Standard success envelope: `{statusCode, data, message, success: true}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// HTTP status code echoed in the body
    pub status_code: u16,
    /// Response payload
    pub data: T,
    /// Human-readable message
    pub message: String,
    /// Always `true` for this envelope
    pub success: bool,
}

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn new(status_code: u16, data: T, message: impl Into<String>) -> Self {
        Self {
            status_code,
            data,
            message: message.into(),
            success: status_code < 400,
        }
    }

    /// 200 response
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::new(200, data, message)
    }

    /// 201 response
    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self::new(201, data, message)
    }
}

/// Standard failure envelope: `{statusCode, message, success: false, errors: []}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    /// HTTP status code echoed in the body
    pub status_code: u16,
    /// Human-readable error message
    pub message: String,
    /// Always `false` for this envelope
    pub success: bool,
    /// Field-level error details, empty when there are none
    pub errors: Vec<String>,
}

impl ApiErrorBody {
    /// Create a new error body
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
            success: false,
            errors: Vec::new(),
        }
    }

    /// Attach field-level error details
    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = errors;
        self
    }
}

/// Empty JSON object payload (`{}`)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Empty {}
