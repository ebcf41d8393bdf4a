/**
 * Broadcast Dispatcher
 *
 * Fans formatted activities and stats snapshots out to every registered
 * connection, and answers single connections with unicast frames.
 *
 * # Slow Consumers
 *
 * Each connection has a bounded outbound queue drained by its own writer
 * task. The dispatcher only ever calls `try_send`: when a queue is full
 * the frame is dropped for that connection and logged. One slow or broken
 * client therefore never delays delivery to the others, and the dispatcher
 * never waits on a socket.
 */

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::mpsc::error::TrySendError;

use super::protocol::ServerEvent;
use super::registry::{ConnectionId, ConnectionRegistry, Frame, Outbox};
use super::stats::ConnectionStats;
use crate::backend::activity::{ActivityFormatter, LanguageNames};
use crate::shared::{ActivityEvent, ActivityType, FormattedActivity};

/// Formatter over any shared language lookup
pub type SharedFormatter = ActivityFormatter<Arc<dyn LanguageNames>>;

/// Outcome of delivering one frame to one connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Queued,
    /// Outbound queue full; frame dropped for this connection
    Dropped,
    /// Connection is gone or its writer has stopped
    Closed,
}

/// Per-broadcast delivery counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub queued: usize,
    pub dropped: usize,
    pub closed: usize,
}

impl DeliveryReport {
    fn record(&mut self, delivery: Delivery) {
        match delivery {
            Delivery::Queued => self.queued += 1,
            Delivery::Dropped => self.dropped += 1,
            Delivery::Closed => self.closed += 1,
        }
    }
}

pub struct Dispatcher {
    registry: Arc<ConnectionRegistry>,
    formatter: SharedFormatter,
}

impl Dispatcher {
    pub fn new(registry: Arc<ConnectionRegistry>, formatter: SharedFormatter) -> Self {
        Self { registry, formatter }
    }

    pub fn formatter(&self) -> &SharedFormatter {
        &self.formatter
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    fn deliver(id: &ConnectionId, outbox: &Outbox, frame: &Frame, event: &'static str) -> Delivery {
        match outbox.try_send(frame.clone()) {
            Ok(()) => Delivery::Queued,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(connection = %id, event, "[Dispatcher] Outbound queue full, dropping frame");
                Delivery::Dropped
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(connection = %id, event, "[Dispatcher] Connection closed, frame discarded");
                Delivery::Closed
            }
        }
    }

    /// Push one event to every registered connection
    pub fn broadcast(&self, event: &ServerEvent) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        let frame = match event.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(event = event.name(), error = %e, "[Dispatcher] Failed to serialize event");
                return report;
            }
        };

        for (id, outbox) in self.registry.outboxes() {
            report.record(Self::deliver(&id, &outbox, &frame, event.name()));
        }

        tracing::debug!(
            event = event.name(),
            queued = report.queued,
            dropped = report.dropped,
            closed = report.closed,
            "[Dispatcher] Broadcast complete"
        );
        report
    }

    /// Push one event to a single registered connection
    pub fn unicast(&self, id: &ConnectionId, event: &ServerEvent) -> Delivery {
        let Some(outbox) = self.registry.outbox(id) else {
            return Delivery::Closed;
        };
        self.send_to(id, &outbox, event)
    }

    /// Push one event onto an outbox the caller holds, registered or not
    pub fn send_to(&self, id: &ConnectionId, outbox: &Outbox, event: &ServerEvent) -> Delivery {
        match event.to_frame() {
            Ok(frame) => Self::deliver(id, outbox, &frame, event.name()),
            Err(e) => {
                tracing::error!(event = event.name(), error = %e, "[Dispatcher] Failed to serialize event");
                Delivery::Dropped
            }
        }
    }

    /// Format, score and broadcast one activity as `activities:new`
    pub fn broadcast_activity(&self, event: &ActivityEvent) -> DeliveryReport {
        let formatted = self.formatter.format(event);
        tracing::info!(
            activity = %event.id,
            activity_type = %event.activity_type(),
            priority = formatted.priority,
            "[Dispatcher] Broadcasting activity"
        );
        self.broadcast(&ServerEvent::new_activity(formatted, Utc::now()))
    }

    pub fn broadcast_stats(&self, stats: &ConnectionStats) -> DeliveryReport {
        self.broadcast(&ServerEvent::ConnectionStats(stats.clone()))
    }

    /// Recompute stats from the registry and broadcast them
    pub fn publish_connection_stats(&self) -> ConnectionStats {
        let stats = ConnectionStats::compute(&self.registry.snapshot(), Utc::now());
        self.broadcast_stats(&stats);
        stats
    }

    /// Relay collaborator stats with live connection counts as `realTimeData`
    pub fn broadcast_enriched_stats(&self, mut stats: Map<String, Value>) -> DeliveryReport {
        let live = ConnectionStats::compute(&self.registry.snapshot(), Utc::now());
        let live = serde_json::to_value(&live).unwrap_or(Value::Null);
        stats.insert("realTimeData".to_string(), live);
        stats
            .entry("timestamp")
            .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
        self.broadcast(&ServerEvent::Stats(stats))
    }

    pub fn send_recent(&self, id: &ConnectionId, activities: Vec<FormattedActivity>, personalized: bool) -> Delivery {
        self.unicast(id, &ServerEvent::recent(activities, personalized, Utc::now()))
    }

    pub fn send_by_type(
        &self,
        id: &ConnectionId,
        activity_type: ActivityType,
        activities: Vec<FormattedActivity>,
    ) -> Delivery {
        self.unicast(id, &ServerEvent::by_type(activity_type, activities, Utc::now()))
    }

    /// Non-fatal notice to one connection; never closes it
    pub fn send_error(&self, id: &ConnectionId, message: impl Into<String>) -> Delivery {
        self.unicast(id, &ServerEvent::error(message))
    }
}
