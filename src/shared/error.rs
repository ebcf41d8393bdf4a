//! Shared Error Types
//!
//! This module defines error types that are shared between the hub's domain
//! types and its backend. They describe input that could not be turned into
//! a domain value.
//!
//! # Error Categories
//!
//! - `MalformedActivity` - An activity event lacks the fields every activity needs
//!
//! # Usage
//!
//! ```rust
//! use activity_hub::shared::error::SharedError;
//!
//! let error = SharedError::malformed("activity is missing an id");
//! assert!(error.to_string().contains("missing an id"));
//! ```
use thiserror::Error;

/// Errors raised while decoding or validating shared types
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// Activity event without an id or activity type
    #[error("Malformed activity: {message}")]
    MalformedActivity {
        /// Human-readable error message
        message: String,
    },
}

impl SharedError {
    /// Create a new malformed-activity error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedActivity {
            message: message.into(),
        }
    }
}
