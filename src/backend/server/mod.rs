//! Server Module
//!
//! Wiring for the Axum server: shared state, configuration loading and app
//! creation.
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs          - Module exports and documentation
//! ├── state.rs        - AppState and FromRef implementations
//! ├── config.rs       - HubConfig and database loading
//! └── init.rs         - create_app and HubRuntime
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use activity_hub::backend::server::create_app;
//! use activity_hub::shared::HubConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (app, runtime) = create_app(HubConfig::default(), None);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app).await?;
//! runtime.shutdown().await;
//! # Ok(())
//! # }
//! ```

/// Application state management
pub mod state;

/// Server configuration loading
pub mod config;

/// Server initialization
pub mod init;

pub use init::{create_app, HubRuntime};
pub use state::AppState;
