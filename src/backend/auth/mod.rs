//! Authentication Module
//!
//! The hub does not issue credentials. It only verifies the JWT a client
//! presents during the WebSocket handshake (`sessions::verify_token`).
//! A client without a token connects as an anonymous viewer unless the hub
//! is configured to require authentication.

/// JWT verification
pub mod sessions;

pub use sessions::{create_token, verify_token, Claims, TokenError};
