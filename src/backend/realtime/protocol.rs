//! WebSocket wire protocol
//!
//! Every frame is a JSON text frame shaped `{"event": "<name>", "data": {...}}`.
//! [`ClientRequest`] covers what clients may send, [`ServerEvent`] what the
//! hub pushes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::registry::Frame;
use super::stats::ConnectionStats;
use crate::backend::error::BackendError;
use crate::shared::{ActivityType, FormattedActivity};

pub const REQUEST_RECENT: &str = "activities:request_recent";
pub const REQUEST_BY_TYPE: &str = "activities:request_by_type";
pub const PING: &str = "ping";

pub const EVENT_NEW: &str = "activities:new";
pub const EVENT_RECENT: &str = "activities:recent";
pub const EVENT_BY_TYPE: &str = "activities:by_type";
pub const EVENT_CONNECTION_STATS: &str = "activities:connection_stats";
pub const EVENT_STATS: &str = "activities:stats";
pub const EVENT_ERROR: &str = "activities:error";

/// Close code sent when the handshake token has expired
pub const CLOSE_TOKEN_EXPIRED: u16 = 4001;
/// Close code sent when the handshake token is missing or invalid
pub const CLOSE_TOKEN_INVALID: u16 = 4002;

#[derive(Debug, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentRequest {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub prioritize_african: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ByTypeRequest {
    pub activity_type: ActivityType,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// A decoded client frame
#[derive(Debug, Clone, PartialEq)]
pub enum ClientRequest {
    Recent(RecentRequest),
    ByType(ByTypeRequest),
    Ping,
}

impl ClientRequest {
    /// Decode a text frame
    ///
    /// A missing or `null` `data` is treated as an empty object.
    pub fn parse(text: &str) -> Result<Self, BackendError> {
        let envelope: Envelope = serde_json::from_str(text)?;
        let data = match envelope.data {
            Value::Null => Value::Object(Map::new()),
            data => data,
        };
        match envelope.event.as_str() {
            REQUEST_RECENT => Ok(Self::Recent(serde_json::from_value(data)?)),
            REQUEST_BY_TYPE => Ok(Self::ByType(serde_json::from_value(data)?)),
            PING => Ok(Self::Ping),
            other => Err(BackendError::protocol(format!("unknown event {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewActivityPayload {
    pub activity: FormattedActivity,
    pub timestamp: DateTime<Utc>,
    pub priority: u8,
    pub engagement: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentPayload {
    pub activities: Vec<FormattedActivity>,
    pub personalized: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ByTypePayload {
    pub activity_type: ActivityType,
    pub activities: Vec<FormattedActivity>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub message: String,
}

/// Frames pushed by the hub
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "activities:new")]
    New(NewActivityPayload),
    #[serde(rename = "activities:recent")]
    Recent(RecentPayload),
    #[serde(rename = "activities:by_type")]
    ByType(ByTypePayload),
    #[serde(rename = "activities:connection_stats")]
    ConnectionStats(ConnectionStats),
    /// Collaborator stats object with a `realTimeData` block added
    #[serde(rename = "activities:stats")]
    Stats(Map<String, Value>),
    #[serde(rename = "activities:error")]
    Error(ErrorPayload),
}

impl ServerEvent {
    pub fn new_activity(activity: FormattedActivity, timestamp: DateTime<Utc>) -> Self {
        let priority = activity.priority;
        Self::New(NewActivityPayload {
            activity,
            timestamp,
            priority,
            engagement: true,
        })
    }

    pub fn recent(activities: Vec<FormattedActivity>, personalized: bool, timestamp: DateTime<Utc>) -> Self {
        Self::Recent(RecentPayload {
            activities,
            personalized,
            timestamp,
        })
    }

    pub fn by_type(
        activity_type: ActivityType,
        activities: Vec<FormattedActivity>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::ByType(ByTypePayload {
            activity_type,
            activities,
            timestamp,
        })
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorPayload {
            message: message.into(),
        })
    }

    /// Wire name of this event
    pub fn name(&self) -> &'static str {
        match self {
            Self::New(_) => EVENT_NEW,
            Self::Recent(_) => EVENT_RECENT,
            Self::ByType(_) => EVENT_BY_TYPE,
            Self::ConnectionStats(_) => EVENT_CONNECTION_STATS,
            Self::Stats(_) => EVENT_STATS,
            Self::Error(_) => EVENT_ERROR,
        }
    }

    /// Serialize once for delivery to any number of connections
    pub fn to_frame(&self) -> Result<Frame, serde_json::Error> {
        serde_json::to_string(self).map(Frame::from)
    }
}
