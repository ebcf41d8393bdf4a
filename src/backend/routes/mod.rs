//! Route Configuration Module
//!
//! HTTP routes for the hub server.
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs          - Module exports and documentation
//! ├── router.rs       - Main router creation
//! └── api_routes.rs   - Ingest and introspection handlers
//! ```
//!
//! # Routes
//!
//! - `GET /ws` - WebSocket upgrade (`token`, `region`, `languages` query)
//! - `POST /events/activity` - collaborator `activity.created`
//! - `POST /events/stats` - collaborator `activity.stats_updated`
//! - `GET /health` - liveness
//! - `GET /stats` - connection statistics

/// Main router creation
pub mod router;

/// API endpoint handlers
pub mod api_routes;

pub use router::create_router;
