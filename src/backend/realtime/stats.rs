//! Aggregate connection statistics
//!
//! Always recomputed from a registry snapshot, never maintained
//! incrementally.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::registry::ClientConnection;

/// Snapshot pushed as `activities:connection_stats`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStats {
    /// Live connections
    #[serde(rename = "totalUsers")]
    pub total_clients: usize,
    /// Distinct signed-in users among them
    #[serde(rename = "onlineNow")]
    pub online_now: usize,
    #[serde(rename = "regions")]
    pub clients_by_region: BTreeMap<String, usize>,
    /// Connections listing each language (a connection counts once per language)
    #[serde(rename = "languages")]
    pub clients_by_language: BTreeMap<String, usize>,
    #[serde(rename = "timestamp")]
    pub last_updated: DateTime<Utc>,
}

impl ConnectionStats {
    pub fn compute(connections: &[ClientConnection], now: DateTime<Utc>) -> Self {
        let mut clients_by_region = BTreeMap::new();
        let mut clients_by_language = BTreeMap::new();
        let mut users = HashSet::new();

        for connection in connections {
            *clients_by_region.entry(connection.region.clone()).or_insert(0) += 1;
            for language in &connection.preferred_languages {
                *clients_by_language.entry(language.clone()).or_insert(0) += 1;
            }
            if let Some(user_id) = &connection.user_id {
                users.insert(user_id.as_str());
            }
        }

        Self {
            total_clients: connections.len(),
            online_now: users.len(),
            clients_by_region,
            clients_by_language,
            last_updated: now,
        }
    }
}
