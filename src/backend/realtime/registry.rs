/**
 * Connection Registry
 *
 * The single source of truth for which clients are connected. Every live
 * socket has one `ClientConnection` entry here, keyed by its connection id,
 * together with the sending half of its outbound queue.
 *
 * # Ownership of the Outbox
 *
 * The registry holds the only long-lived `Sender` of each connection's
 * queue. Removing an entry (explicit disconnect or eviction) drops that
 * sender, which ends the connection's writer task once the queue drains.
 *
 * # Concurrency
 *
 * All access goes through the methods below; the map itself is never
 * handed out. Reads return copies. Locks are held only for the map
 * operation and never across an `.await`.
 */

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Opaque connection identifier
pub type ConnectionId = Uuid;

/// Serialized outbound frame, shared by every recipient of a broadcast
pub type Frame = Arc<str>;

/// Sending half of a connection's outbound queue
pub type Outbox = mpsc::Sender<Frame>;

/// Region used when the handshake gives no hint
pub const UNKNOWN_REGION: &str = "unknown";

/// One live client connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConnection {
    pub id: ConnectionId,
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub region: String,
    /// Ordered, duplicate-free locale codes
    pub preferred_languages: Vec<String>,
    pub connected_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl ClientConnection {
    /// Anonymous connection with a fresh id, active now
    pub fn new<I, S>(region: impl Into<String>, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let now = Utc::now();
        let region = region.into();
        let mut preferred_languages: Vec<String> = Vec::new();
        for code in languages {
            let code = code.as_ref().trim().to_lowercase();
            if !code.is_empty() && !preferred_languages.contains(&code) {
                preferred_languages.push(code);
            }
        }
        Self {
            id: Uuid::new_v4(),
            user_id: None,
            username: None,
            region: if region.trim().is_empty() {
                UNKNOWN_REGION.to_string()
            } else {
                region
            },
            preferred_languages,
            connected_at: now,
            last_activity_at: now,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>, username: Option<String>) -> Self {
        self.user_id = Some(user_id.into());
        self.username = username;
        self
    }

    /// Override the last activity timestamp
    pub fn last_active(mut self, at: DateTime<Utc>) -> Self {
        self.last_activity_at = at;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }
}

/// Registry errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("connection {0} is already registered")]
    AlreadyRegistered(ConnectionId),
}

struct Entry {
    connection: ClientConnection,
    outbox: Outbox,
}

/// Thread-safe registry of live connections
#[derive(Default)]
pub struct ConnectionRegistry {
    entries: RwLock<HashMap<ConnectionId, Entry>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<ConnectionId, Entry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ConnectionId, Entry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a connection; rejects an id that is already present
    pub fn register(&self, connection: ClientConnection, outbox: Outbox) -> Result<(), RegistryError> {
        let mut entries = self.write();
        if entries.contains_key(&connection.id) {
            return Err(RegistryError::AlreadyRegistered(connection.id));
        }
        entries.insert(connection.id, Entry { connection, outbox });
        Ok(())
    }

    /// Remove a connection; `false` if it was not registered
    pub fn unregister(&self, id: &ConnectionId) -> bool {
        self.write().remove(id).is_some()
    }

    /// Mark a connection active now; no-op for unknown ids
    pub fn touch(&self, id: &ConnectionId) -> bool {
        self.touch_at(id, Utc::now())
    }

    pub fn touch_at(&self, id: &ConnectionId, at: DateTime<Utc>) -> bool {
        match self.write().get_mut(id) {
            Some(entry) => {
                if at > entry.connection.last_activity_at {
                    entry.connection.last_activity_at = at;
                }
                true
            }
            None => false,
        }
    }

    /// Remove `id` only if it has been idle since before `cutoff`
    ///
    /// The idle check is repeated under the write lock, so a touch that
    /// lands after the caller's snapshot keeps the connection alive.
    pub fn evict_if_idle(&self, id: &ConnectionId, cutoff: DateTime<Utc>) -> bool {
        let mut entries = self.write();
        let idle = entries
            .get(id)
            .is_some_and(|entry| entry.connection.last_activity_at < cutoff);
        if idle {
            entries.remove(id);
        }
        idle
    }

    pub fn get(&self, id: &ConnectionId) -> Option<ClientConnection> {
        self.read().get(id).map(|entry| entry.connection.clone())
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.read().contains_key(id)
    }

    /// Point-in-time copy of every connection
    pub fn snapshot(&self) -> Vec<ClientConnection> {
        self.read()
            .values()
            .map(|entry| entry.connection.clone())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.read().len()
    }

    /// Outbox of a single connection
    pub fn outbox(&self, id: &ConnectionId) -> Option<Outbox> {
        self.read().get(id).map(|entry| entry.outbox.clone())
    }

    /// Outboxes of every connection, for fan-out outside the lock
    pub fn outboxes(&self) -> Vec<(ConnectionId, Outbox)> {
        self.read()
            .iter()
            .map(|(id, entry)| (*id, entry.outbox.clone()))
            .collect()
    }
}
