//! Error types and error handling for the application
//!
//! The monitor surfaces exactly two kinds of errors to callers: a referenced
//! agent/task id that is absent from the store, and an enum value that does
//! not name a recognized member. Both convert to HTTP responses via
//! `IntoResponse`. Persistence and callback failures are deliberately not
//! represented here: they are logged and swallowed so that tracking
//! correctness is never coupled to an unrelated subsystem.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors returned by monitor operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MonitorError {
    /// Agent with the given ID was not found
    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    /// Task with the given ID was not found
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// A status string did not match any recognized status
    #[error("Invalid status value: {0}")]
    InvalidStatus(String),

    /// A priority string did not match any recognized priority
    #[error("Invalid priority value: {0}")]
    InvalidPriority(String),
}

impl IntoResponse for MonitorError {
    fn into_response(self) -> Response {
        let status = match self {
            MonitorError::AgentNotFound(_) | MonitorError::TaskNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            MonitorError::InvalidStatus(_) | MonitorError::InvalidPriority(_) => {
                StatusCode::BAD_REQUEST
            }
        };

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
