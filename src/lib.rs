//! Activity Hub
//!
//! Real-time activity broadcast hub. Collaborators report platform
//! activities (words added, translations, community posts, logins); the hub
//! formats each one into a human-readable message, scores its priority and
//! pushes it to every connected WebSocket client. Clients can also ask for
//! recent activity and see live connection statistics.
//!
//! # Module Structure
//!
//! - **`shared`** - activity types, configuration and errors with no server
//!   dependencies
//! - **`backend`** - the Axum server (only compiled with the `ssr` feature)
//!
//! # Feature Flags
//!
//! - **`ssr`** (default) - enables `backend` and the server binary
//!
//! # Usage
//!
//! ```rust,no_run
//! use activity_hub::backend::server::create_app;
//! use activity_hub::shared::{HubConfig, RawActivityEvent};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (app, runtime) = create_app(HubConfig::load()?, None);
//!
//! // Collaborators in the same process publish through `HubEvents`
//! let activity: RawActivityEvent = serde_json::from_str(
//!     r#"{"id": "42", "activityType": "user_registered", "username": "amina"}"#,
//! )?;
//! runtime.events().activity_created(activity, None)?;
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! Connection state lives behind `std::sync::RwLock`s that are never held
//! across an `.await`. Broadcasting never blocks: a client whose outbound
//! queue is full misses that frame and nothing else is affected.

pub mod shared;

#[cfg(feature = "ssr")]
pub mod backend;
