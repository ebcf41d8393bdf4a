//! Lifecycle Manager
//!
//! Runs on a fixed interval and evicts connections that have been idle
//! longer than the configured threshold. Eviction goes through
//! [`ConnectionRegistry::evict_if_idle`], so it never races ordinary
//! connect, disconnect or touch traffic. A stats snapshot is broadcast
//! whenever a sweep removed anything.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::dispatcher::Dispatcher;
use super::registry::{ConnectionId, ConnectionRegistry};
use super::stats::ConnectionStats;

/// Result of one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub evicted: Vec<ConnectionId>,
    pub remaining: usize,
    /// Stats broadcast after the sweep, if anything was evicted
    pub stats: Option<ConnectionStats>,
}

pub struct LifecycleManager {
    registry: Arc<ConnectionRegistry>,
    dispatcher: Arc<Dispatcher>,
    interval: Duration,
    idle_timeout: Duration,
}

impl LifecycleManager {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        dispatcher: Arc<Dispatcher>,
        interval: Duration,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            interval,
            idle_timeout,
        }
    }

    /// Evict every connection idle for longer than the threshold at `now`
    pub fn sweep(&self, now: DateTime<Utc>) -> SweepReport {
        let idle = chrono::Duration::from_std(self.idle_timeout).unwrap_or(chrono::Duration::MAX);
        let cutoff = now.checked_sub_signed(idle).unwrap_or(DateTime::<Utc>::MIN_UTC);

        let mut evicted = Vec::new();
        for connection in self.registry.snapshot() {
            if connection.last_activity_at >= cutoff {
                continue;
            }
            if self.registry.evict_if_idle(&connection.id, cutoff) {
                tracing::info!(
                    connection = %connection.id,
                    region = %connection.region,
                    idle_secs = (now - connection.last_activity_at).num_seconds(),
                    "[Lifecycle] Evicted idle connection"
                );
                evicted.push(connection.id);
            }
        }

        let stats = if evicted.is_empty() {
            None
        } else {
            let stats = ConnectionStats::compute(&self.registry.snapshot(), now);
            self.dispatcher.broadcast_stats(&stats);
            Some(stats)
        };

        SweepReport {
            remaining: self.registry.count(),
            evicted,
            stats,
        }
    }

    /// Run sweeps until `shutdown` flips to `true`
    ///
    /// The first sweep happens one interval after the task starts.
    pub fn spawn(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tracing::info!(
                interval_secs = self.interval.as_secs(),
                idle_timeout_secs = self.idle_timeout.as_secs(),
                "[Lifecycle] Sweep task started"
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let report = self.sweep(Utc::now());
                        tracing::debug!(
                            evicted = report.evicted.len(),
                            remaining = report.remaining,
                            "[Lifecycle] Sweep complete"
                        );
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::info!("[Lifecycle] Sweep task stopped");
        })
    }
}
