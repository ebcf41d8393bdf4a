//! Backend Module
//!
//! Server-side code, compiled only with the `ssr` feature.
//!
//! # Architecture
//!
//! ```text
//! collaborators ──POST /events/*──┐
//!       │                         ▼
//!       └──HubEvents──▶ ingest task ──▶ Dispatcher ──▶ per-connection outbox ──▶ socket writer
//!                                          ▲
//!   clients ──GET /ws──▶ socket reader ──▶ ActivityHub ◀── LifecycleManager (idle sweep)
//! ```
//!
//! - **`realtime`** - connection registry, dispatcher, lifecycle sweep, WebSocket actor
//! - **`activity`** - message formatting, priority scoring, recent activity feed
//! - **`reference`** - language display-name cache
//! - **`auth`** - handshake token verification
//! - **`error`** - `BackendError` and its HTTP mapping
//! - **`server`** / **`routes`** - state, wiring and HTTP routes

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Real-time delivery
pub mod realtime;

/// Activity formatting and feeds
pub mod activity;

/// Language reference data
pub mod reference;

/// Backend error types
pub mod error;

/// Handshake authentication
pub mod auth;

pub use error::BackendError;
pub use realtime::{ActivityHub, HubEvents};
pub use server::create_app;
