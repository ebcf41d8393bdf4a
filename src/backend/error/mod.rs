//! Backend Error Module
//!
//! - **`types`** - `BackendError` and its constructors
//! - **`conversion`** - Axum `IntoResponse` for `BackendError`

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

pub use types::BackendError;
