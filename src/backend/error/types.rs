/**
 * Backend Error Types
 *
 * This module defines the errors raised by the hub's HTTP surface and by
 * the collaborators it calls (activity feed, ingest queue).
 *
 * # Error Types
 *
 * - `ProtocolError` - A WebSocket frame or ingest body did not parse
 * - `Unavailable` - A collaborator or queue cannot take work right now
 * - `SharedError` - An ingested activity could not become a domain value
 *
 * Errors from a single connection never escalate past that connection; the
 * socket actor answers with an empty result or an `activities:error` frame
 * instead of returning these to the client.
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::shared::SharedError;

/// Backend-specific error types
///
/// ```rust
/// use activity_hub::backend::error::BackendError;
/// use axum::http::StatusCode;
///
/// let err = BackendError::protocol("unknown event");
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
///
/// let err = BackendError::unavailable("ingest queue is full");
/// assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Malformed frame or ingest payload
    #[error("Protocol error: {message}")]
    ProtocolError {
        /// Human-readable error message
        message: String,
    },

    /// A collaborator or internal queue is temporarily unable to take work
    #[error("Unavailable: {message}")]
    Unavailable {
        /// Human-readable error message
        message: String,
    },

    /// Error from the shared domain types
    #[error(transparent)]
    SharedError(#[from] SharedError),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl BackendError {
    /// Create a new protocol error
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::ProtocolError {
            message: message.into(),
        }
    }

    /// Create a new unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `ProtocolError` - 400 Bad Request
    /// - `Unavailable` - 503 Service Unavailable
    /// - `SharedError` - 422 Unprocessable Entity
    /// - `SerializationError` - 400 Bad Request
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ProtocolError { .. } => StatusCode::BAD_REQUEST,
            Self::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::SharedError(SharedError::MalformedActivity { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::SerializationError(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Get the error message
    pub fn message(&self) -> String {
        match self {
            Self::ProtocolError { message }
            | Self::Unavailable { message } => message.clone(),
            Self::SharedError(err) => err.to_string(),
            Self::SerializationError(err) => err.to_string(),
        }
    }
}
