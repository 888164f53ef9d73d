//! Error handling for the bookstore HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::Level;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use uuid::Uuid;

/// Standard error body returned by every failing request
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub details: Vec<serde_json::Value>,
    pub trace_id: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {message}")]
    Validation {
        details: Vec<serde_json::Value>,
        code: String,
        message: String,
    },

    #[error("bad request: {message}")]
    BadRequest { message: String, code: String },

    #[error("not found: {message}")]
    NotFound { message: String, code: String },

    #[error("request timeout: {message}")]
    Timeout { message: String, code: String },

    #[error("service unavailable: {message}")]
    Unavailable { message: String, code: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a validation error
    pub fn validation(details: Vec<serde_json::Value>, message: impl Into<String>) -> Self {
        Self::Validation {
            details,
            code: "validation_error".to_string(),
            message: message.into(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            code: "bad_request".to_string(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            code: "not_found".to_string(),
        }
    }

    /// Create a request timeout error
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
            code: "request_timeout".to_string(),
        }
    }

    /// Create a service unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
            code: "unavailable".to_string(),
        }
    }

    /// HTTP status this error is reported with
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
            AppError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let trace_id = Uuid::new_v4();
        let status = self.status();

        let (code, message, details) = match self {
            AppError::Validation {
                details,
                code,
                message,
            } => (code, message, details),
            AppError::BadRequest { message, code }
            | AppError::NotFound { message, code }
            | AppError::Timeout { message, code }
            | AppError::Unavailable { message, code } => (code, message, Vec::new()),
            AppError::Internal(e) => {
                // Logged once, with the full cause chain
                tracing::error!(
                    trace_id = %trace_id,
                    status_code = %status.as_u16(),
                    error = ?e,
                    "internal error"
                );
                ("internal_error".to_string(), e.to_string(), Vec::new())
            }
        };

        if status != StatusCode::INTERNAL_SERVER_ERROR {
            let level = log_level(status);
            if level == Level::ERROR {
                tracing::error!(
                    trace_id = %trace_id,
                    error_code = %code,
                    status_code = %status.as_u16(),
                    message = %message,
                    "request error"
                );
            } else if level == Level::WARN {
                tracing::warn!(
                    trace_id = %trace_id,
                    error_code = %code,
                    status_code = %status.as_u16(),
                    message = %message,
                    "request rejected"
                );
            } else {
                tracing::debug!(
                    trace_id = %trace_id,
                    error_code = %code,
                    status_code = %status.as_u16(),
                    message = %message,
                    "request rejected"
                );
            }
        }

        // Internal details stay in the logs for release builds
        let message = if cfg!(not(debug_assertions)) && status == StatusCode::INTERNAL_SERVER_ERROR
        {
            "An internal server error occurred".to_string()
        } else {
            message
        };

        let body = ErrorEnvelope {
            error: ErrorBody {
                code,
                message,
                details,
                trace_id: trace_id.to_string(),
                timestamp: OffsetDateTime::now_utc()
                    .format(&Rfc3339)
                    .unwrap_or_default(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Level a failed request is logged at. Server faults are errors; a lookup of
/// a missing record is routine.
fn log_level(status: StatusCode) -> Level {
    if status.is_server_error() {
        Level::ERROR
    } else if status == StatusCode::NOT_FOUND {
        Level::DEBUG
    } else {
        Level::WARN
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_validation_error() {
        let details = vec![serde_json::json!({"field": "bookId", "error": "must be a positive integer"})];
        let error = AppError::validation(details.clone(), "invalid book id");

        match error {
            AppError::Validation {
                details: d,
                code,
                message,
            } => {
                assert_eq!(d, details);
                assert_eq!(code, "validation_error");
                assert_eq!(message, "invalid book id");
            }
            _ => panic!("Expected Validation error"),
        }
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::validation(vec![], "bad id").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::bad_request("bad body").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::not_found("missing").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::timeout("too slow").status(),
            StatusCode::REQUEST_TIMEOUT
        );
        assert_eq!(
            AppError::unavailable("db down").status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::from(anyhow::anyhow!("Database connection failed")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_error_response_format() {
        let response = AppError::not_found("book 7 not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "not_found");
        assert_eq!(body["error"]["message"], "book 7 not found");
        assert_eq!(body["error"]["details"], serde_json::json!([]));
        assert!(Uuid::parse_str(body["error"]["trace_id"].as_str().unwrap()).is_ok());
        assert!(OffsetDateTime::parse(body["error"]["timestamp"].as_str().unwrap(), &Rfc3339).is_ok());
    }

    #[test]
    fn test_log_levels_follow_status() {
        assert_eq!(log_level(StatusCode::INTERNAL_SERVER_ERROR), Level::ERROR);
        assert_eq!(log_level(StatusCode::SERVICE_UNAVAILABLE), Level::ERROR);
        assert_eq!(log_level(StatusCode::BAD_REQUEST), Level::WARN);
        assert_eq!(log_level(StatusCode::REQUEST_TIMEOUT), Level::WARN);
        assert_eq!(log_level(StatusCode::NOT_FOUND), Level::DEBUG);
    }

    #[tokio::test]
    async fn test_validation_details_are_returned() {
        let details = vec![serde_json::json!({"field": "bookId", "error": "must be a positive integer"})];
        let response = AppError::validation(details, "invalid book id 'abc'").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "validation_error");
        assert_eq!(body["error"]["details"][0]["field"], "bookId");
    }
}
