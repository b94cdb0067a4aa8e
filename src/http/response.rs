//! Response relay and error mapping.
//!
//! # Responsibilities
//! - Serialize executor results to JSON
//! - Map normalizer and executor failures to HTTP status codes
//! - Give extractor rejections and layer-generated 408/413 answers the
//!   same body (see `middleware.rs`)
//!
//! # Design Decisions
//! - Executor errors are relayed with their own message, never rewritten
//! - Every failure on the records route uses [`ErrorBody`]. Requests that
//!   match no route or method get axum's empty 404/405.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::records::{ExecutionError, MalformedRequestError};

/// JSON error body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
    pub status: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Stable machine-readable error kind.
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable message.
    pub reason: String,
}

/// Error returned by the records handler.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    reason: String,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: &'static str, reason: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            reason: reason.into(),
        }
    }

    /// Error for a status produced outside the normalizer and executor:
    /// extractor rejections and middleware answers.
    pub fn from_status(status: StatusCode, reason: impl Into<String>) -> Self {
        let kind = match status {
            StatusCode::REQUEST_TIMEOUT => "request_timeout",
            StatusCode::PAYLOAD_TOO_LARGE => "payload_too_large",
            s if s.is_server_error() => "internal_error",
            _ => "malformed_request",
        };
        Self::new(status, kind, reason)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: ErrorDetail {
                kind: self.kind.to_string(),
                reason: self.reason.clone(),
            },
            status: self.status.as_u16(),
        }
    }
}

impl From<MalformedRequestError> for ApiError {
    fn from(err: MalformedRequestError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "malformed_request", err.to_string())
    }
}

impl From<ExecutionError> for ApiError {
    fn from(err: ExecutionError) -> Self {
        let (status, kind) = match &err {
            ExecutionError::JobNotFound(_) => (StatusCode::NOT_FOUND, "resource_not_found"),
            ExecutionError::ResultWindowTooLarge { .. } => {
                (StatusCode::BAD_REQUEST, "result_window_too_large")
            }
            ExecutionError::UnknownSortField(_) => (StatusCode::BAD_REQUEST, "unknown_sort_field"),
            ExecutionError::InvalidTimeExpression { .. } => {
                (StatusCode::BAD_REQUEST, "invalid_time_expression")
            }
            ExecutionError::Backend(_) => (StatusCode::INTERNAL_SERVER_ERROR, "backend_failure"),
        };
        Self::new(status, kind, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body())).into_response()
    }
}
