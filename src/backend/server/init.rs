/**
 * Server Initialization
 *
 * Builds the hub, its collaborators and the router, and starts the
 * background tasks.
 *
 * # Initialization Process
 *
 * 1. Build the language cache (database backed if a source is given)
 * 2. Build the `ActivityHub` on top of the cache
 * 3. Create the ingest channel collaborators publish into
 * 4. Spawn the ingest task, the lifecycle sweep and the first cache refresh
 * 5. Create the router
 *
 * Every background task watches the same shutdown signal. `HubRuntime`
 * owns the sending half and the task handles.
 */

use std::sync::Arc;

use axum::Router;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::backend::activity::LanguageNames;
use crate::backend::realtime::{ingest_channel, ActivityHub, HubEvents, SocketSettings};
use crate::backend::reference::{LanguageCache, LanguageSource};
use crate::backend::routes::create_router;
use crate::backend::server::state::AppState;
use crate::shared::HubConfig;

/// Handle on the hub's background tasks
pub struct HubRuntime {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
    events: HubEvents,
    hub: Arc<ActivityHub>,
}

impl HubRuntime {
    /// In-process publisher for collaborator events
    pub fn events(&self) -> &HubEvents {
        &self.events
    }

    pub fn hub(&self) -> &Arc<ActivityHub> {
        &self.hub
    }

    /// Signal every background task and wait for them to finish
    pub async fn shutdown(self) {
        tracing::info!(tasks = self.tasks.len(), "Stopping hub background tasks");
        let _ = self.shutdown.send(true);
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Background task ended abnormally");
            }
        }
        tracing::info!("Hub background tasks stopped");
    }
}

/// Create the application router and start the hub
///
/// Must be called from within a Tokio runtime. Without a `source` the
/// language cache serves the built-in table only.
pub fn create_app(config: HubConfig, source: Option<Arc<dyn LanguageSource>>) -> (Router, HubRuntime) {
    tracing::info!("Initializing activity hub");

    let has_source = source.is_some();
    let languages = match source {
        Some(source) => LanguageCache::new(source, config.cache_ttl),
        None => LanguageCache::static_only(),
    };
    let names: Arc<dyn LanguageNames> = Arc::new(languages.clone());
    let hub = Arc::new(ActivityHub::new(&config, names));
    let (events, ingest) = ingest_channel(config.ingest_queue);
    let (shutdown, shutdown_rx) = watch::channel(false);

    let mut tasks = Vec::with_capacity(3);
    tasks.push(hub.clone().spawn_ingest(ingest, shutdown_rx.clone()));
    tasks.push(Arc::new(hub.lifecycle(&config)).spawn(shutdown_rx.clone()));
    if has_source {
        tasks.push(spawn_initial_refresh(languages.clone(), shutdown_rx));
    }

    let state = AppState {
        hub: hub.clone(),
        events: events.clone(),
        languages,
        socket: SocketSettings::from_config(&config),
    };
    let app = create_router(state);

    tracing::info!(
        outbound_queue = config.outbound_queue,
        ingest_queue = config.ingest_queue,
        "Router configured with background tasks"
    );

    let runtime = HubRuntime {
        shutdown,
        tasks,
        events,
        hub,
    };
    (app, runtime)
}

/// Warm the cache once at startup
///
/// A failed refresh leaves the built-in table in place; later stale misses
/// retry on their own.
fn spawn_initial_refresh(languages: LanguageCache, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            result = languages.refresh() => match result {
                Ok(count) => tracing::info!(languages = count, "Language cache warmed"),
                Err(e) => tracing::warn!(error = %e, "Initial language refresh failed, using built-in names"),
            },
            _ = shutdown.changed() => {}
        }
    })
}
