//! REST API module for Inkboard
//!
//! Provides:
//! - Health check endpoint
//! - Canvas CRUD endpoints under `/api/canvas`
//!
//! Every body uses the `{ success, data?, error? }` envelope.

pub mod canvas;
pub mod health;

pub use canvas::canvas_routes;
pub use health::health_routes;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

/// Standard API response envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> ApiResponse<T> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Failure of a request/response operation, rendered as an error envelope
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

/// Handler result
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

impl From<inkboard_core::Error> for ApiError {
    fn from(err: inkboard_core::Error) -> Self {
        use inkboard_core::Error;

        let status = match &err {
            Error::Authentication(_) => StatusCode::UNAUTHORIZED,
            Error::Authorization(_) => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::Database(_) | Error::Serialization(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            error!(code = err.code(), error = %err, "Canvas operation failed");
        }
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<inkboard_realtime::Error> for ApiError {
    fn from(err: inkboard_realtime::Error) -> Self {
        match err {
            inkboard_realtime::Error::Core(err) => err.into(),
            inkboard_realtime::Error::ShuttingDown => Self {
                status: StatusCode::SERVICE_UNAVAILABLE,
                message: err.to_string(),
            },
            inkboard_realtime::Error::NotMember { .. } => Self {
                status: StatusCode::BAD_REQUEST,
                message: err.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::<()>::error(self.message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkboard_core::{AuthenticationError, Error};

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (Error::from(AuthenticationError::Expired), StatusCode::UNAUTHORIZED),
            (Error::authorization("x"), StatusCode::FORBIDDEN),
            (Error::not_found("x"), StatusCode::NOT_FOUND),
            (Error::validation("x"), StatusCode::BAD_REQUEST),
            (Error::conflict("x"), StatusCode::CONFLICT),
            (Error::database("x"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }

        let err = ApiError::from(inkboard_realtime::Error::Core(Error::not_found("gone")));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "not found: gone");
    }

    #[test]
    fn test_envelope_omits_empty_fields() {
        let json = serde_json::to_value(ApiResponse::success(3)).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true, "data": 3 }));

        let json = serde_json::to_value(ApiResponse::<()>::error("nope")).unwrap();
        assert_eq!(json, serde_json::json!({ "success": false, "error": "nope" }));
    }
}
