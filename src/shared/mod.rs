//! Shared Module
//!
//! This module contains types and data structures that do not depend on the
//! server runtime: the activity domain model, the hub configuration and the
//! shared error type. Collaborators that only produce activity events can use
//! this module without enabling the `ssr` feature.

/// Activity events and enriched activity payloads
pub mod activity;

/// Shared error types
pub mod error;

/// Hub configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use activity::{ActivityDetails, ActivityEvent, ActivityType, FormattedActivity, RawActivityEvent};
pub use config::{ConfigError, HubConfig, HubConfigBuilder, PriorityConfig};
pub use error::SharedError;
