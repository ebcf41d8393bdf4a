/**
 * Activity Hub
 *
 * Ties the registry, dispatcher and activity feed together. Socket actors
 * call `connect`, `handle_frame` and `disconnect`; collaborators feed it
 * through `HubEvents`.
 *
 * # Ingest Ordering
 *
 * Collaborator events go through one bounded queue drained by a single
 * task (`spawn_ingest`), so activities are broadcast in the order they
 * arrived. Unicast replies to client requests are sent from the
 * requesting connection's own task and have no ordering relation to
 * broadcasts.
 */

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::dispatcher::{Delivery, DeliveryReport, Dispatcher};
use super::lifecycle::LifecycleManager;
use super::protocol::{ByTypeRequest, ClientRequest, RecentRequest, ServerEvent};
use super::registry::{ClientConnection, ConnectionId, ConnectionRegistry, Frame, RegistryError};
use super::stats::ConnectionStats;
use crate::backend::activity::{clamp_limit, prioritize, ActivityFeed, ActivityFormatter, LanguageNames, PriorityScorer, RecentActivities};
use crate::backend::error::BackendError;
use crate::shared::{ActivityEvent, HubConfig, RawActivityEvent};

/// Event pushed by a domain collaborator
#[derive(Debug, Clone, PartialEq)]
pub enum HubEvent {
    /// `activity.created`
    ActivityCreated {
        activity: RawActivityEvent,
        user_id: Option<String>,
    },
    /// `activity.stats_updated`
    StatsUpdated(Map<String, Value>),
}

/// Cloneable ingest handle for collaborators
#[derive(Clone, Debug)]
pub struct HubEvents {
    tx: mpsc::Sender<HubEvent>,
}

/// Create the bounded ingest queue
pub fn ingest_channel(depth: usize) -> (HubEvents, mpsc::Receiver<HubEvent>) {
    let (tx, rx) = mpsc::channel(depth.max(1));
    (HubEvents { tx }, rx)
}

impl HubEvents {
    /// Enqueue without waiting; fails when the queue is full
    pub fn try_publish(&self, event: HubEvent) -> Result<(), BackendError> {
        self.tx.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => BackendError::unavailable("ingest queue is full"),
            TrySendError::Closed(_) => BackendError::unavailable("hub is shutting down"),
        })
    }

    pub fn activity_created(&self, activity: RawActivityEvent, user_id: Option<String>) -> Result<(), BackendError> {
        self.try_publish(HubEvent::ActivityCreated { activity, user_id })
    }

    pub fn stats_updated(&self, stats: Map<String, Value>) -> Result<(), BackendError> {
        self.try_publish(HubEvent::StatsUpdated(stats))
    }
}

pub struct ActivityHub {
    registry: Arc<ConnectionRegistry>,
    dispatcher: Arc<Dispatcher>,
    feed: Arc<dyn ActivityFeed>,
    recent: Arc<RecentActivities>,
    outbound_queue: usize,
}

impl ActivityHub {
    /// Build a hub whose feed is its own in-memory recent snapshot
    pub fn new(config: &HubConfig, names: Arc<dyn LanguageNames>) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let formatter = ActivityFormatter::new(names, PriorityScorer::new(config.priority.clone()));
        let dispatcher = Arc::new(Dispatcher::new(registry.clone(), formatter));
        let recent = Arc::new(RecentActivities::new(config.recent_capacity));

        Self {
            registry,
            dispatcher,
            feed: recent.clone(),
            recent,
            outbound_queue: config.outbound_queue.max(1),
        }
    }

    /// Answer recent/by-type requests from another feed
    pub fn with_feed(mut self, feed: Arc<dyn ActivityFeed>) -> Self {
        self.feed = feed;
        self
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn recent_activities(&self) -> &Arc<RecentActivities> {
        &self.recent
    }

    /// Lifecycle manager sharing this hub's registry and dispatcher
    pub fn lifecycle(&self, config: &HubConfig) -> LifecycleManager {
        LifecycleManager::new(
            self.registry.clone(),
            self.dispatcher.clone(),
            config.sweep_interval,
            config.idle_timeout,
        )
    }

    pub fn connection_stats(&self) -> ConnectionStats {
        ConnectionStats::compute(&self.registry.snapshot(), Utc::now())
    }

    /// Register a connection and return the receiving end of its outbox
    ///
    /// The recent activities are queued on the new outbox before it is
    /// registered, so they are always its first frame. Everyone then gets
    /// updated connection stats.
    pub async fn connect(&self, connection: ClientConnection) -> Result<mpsc::Receiver<Frame>, RegistryError> {
        let (tx, rx) = mpsc::channel(self.outbound_queue);
        let id = connection.id;
        tracing::info!(
            connection = %id,
            user = connection.user_id.as_deref().unwrap_or("anonymous"),
            region = %connection.region,
            languages = ?connection.preferred_languages,
            "[Hub] Client connected"
        );
        let recent = self
            .recent_event(&id, &RecentRequest::default(), connection.is_authenticated())
            .await;
        self.dispatcher.send_to(&id, &tx, &recent);

        self.registry.register(connection, tx)?;
        self.dispatcher.publish_connection_stats();
        Ok(rx)
    }

    /// Remove a connection; stats are broadcast only if it was still registered
    pub fn disconnect(&self, id: &ConnectionId) -> bool {
        let removed = self.registry.unregister(id);
        if removed {
            tracing::info!(connection = %id, "[Hub] Client disconnected");
            self.dispatcher.publish_connection_stats();
        }
        removed
    }

    /// Handle one inbound text frame
    ///
    /// Frames that do not parse are answered with an empty recent list. A
    /// well-formed envelope naming an unknown event also gets an
    /// `activities:error` notice first.
    pub async fn handle_frame(&self, id: &ConnectionId, text: &str) {
        match ClientRequest::parse(text) {
            Ok(request) => self.handle_request(id, request).await,
            Err(e) => {
                self.registry.touch(id);
                tracing::debug!(connection = %id, error = %e, "[Hub] Malformed client frame");
                if let BackendError::ProtocolError { message } = e {
                    self.dispatcher.send_error(id, message);
                }
                let personalized = self.is_personalized(id);
                self.dispatcher.send_recent(id, Vec::new(), personalized);
            }
        }
    }

    pub async fn handle_request(&self, id: &ConnectionId, request: ClientRequest) {
        self.registry.touch(id);
        match request {
            ClientRequest::Recent(request) => {
                self.send_recent(id, &request).await;
            }
            ClientRequest::ByType(request) => {
                self.send_by_type(id, request).await;
            }
            ClientRequest::Ping => {}
        }
    }

    fn is_personalized(&self, id: &ConnectionId) -> bool {
        self.registry
            .get(id)
            .is_some_and(|connection| connection.is_authenticated())
    }

    async fn send_recent(&self, id: &ConnectionId, request: &RecentRequest) -> Delivery {
        let event = self.recent_event(id, request, self.is_personalized(id)).await;
        self.dispatcher.unicast(id, &event)
    }

    async fn recent_event(&self, id: &ConnectionId, request: &RecentRequest, personalized: bool) -> ServerEvent {
        let limit = clamp_limit(request.limit);
        let events = match self.feed.recent(limit).await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(connection = %id, error = %e, "[Hub] Recent activity feed failed");
                Vec::new()
            }
        };
        let formatter = self.dispatcher.formatter();
        let events = if request.prioritize_african {
            prioritize(events, formatter.scorer())
        } else {
            events
        };

        let now = Utc::now();
        let activities = events.iter().map(|event| formatter.format_at(event, now)).collect();
        ServerEvent::recent(activities, personalized, now)
    }

    async fn send_by_type(&self, id: &ConnectionId, request: ByTypeRequest) -> Delivery {
        let limit = clamp_limit(request.limit);
        let events = match self.feed.by_type(&request.activity_type, limit).await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(
                    connection = %id,
                    activity_type = %request.activity_type,
                    error = %e,
                    "[Hub] Activity feed failed for type"
                );
                Vec::new()
            }
        };

        let formatter = self.dispatcher.formatter();
        let now = Utc::now();
        let activities = events.iter().map(|event| formatter.format_at(event, now)).collect();
        self.dispatcher.send_by_type(id, request.activity_type, activities)
    }

    /// Record and broadcast one activity
    ///
    /// Private activities are neither kept nor broadcast.
    pub fn publish_activity(&self, event: ActivityEvent) -> DeliveryReport {
        if !event.is_public {
            tracing::debug!(activity = %event.id, "[Hub] Skipping private activity");
            return DeliveryReport::default();
        }
        let report = self.dispatcher.broadcast_activity(&event);
        self.recent.push(event);
        report
    }

    pub fn handle_event(&self, event: HubEvent) {
        match event {
            HubEvent::ActivityCreated { mut activity, user_id } => {
                if activity.actor_user_id.is_none() {
                    activity.actor_user_id = user_id;
                }
                match ActivityEvent::try_from(activity) {
                    Ok(event) => {
                        self.publish_activity(event);
                    }
                    Err(e) => tracing::warn!(error = %e, "[Hub] Dropping malformed activity"),
                }
            }
            HubEvent::StatsUpdated(stats) => {
                self.dispatcher.broadcast_enriched_stats(stats);
            }
        }
    }

    /// Drain the ingest queue until it closes or `shutdown` flips to `true`
    pub fn spawn_ingest(
        self: Arc<Self>,
        mut events: mpsc::Receiver<HubEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!("[Hub] Ingest task started");
            loop {
                tokio::select! {
                    event = events.recv() => match event {
                        Some(event) => self.handle_event(event),
                        None => break,
                    },
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::info!("[Hub] Ingest task stopped");
        })
    }
}
