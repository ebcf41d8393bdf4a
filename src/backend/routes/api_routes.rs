/**
 * API Route Handlers
 *
 * # Routes
 *
 * ## Collaborator ingest
 * - `POST /events/activity` - `activity.created`, body `{activity, userId}`
 * - `POST /events/stats` - `activity.stats_updated`, body is any JSON object
 *
 * Both only enqueue: they answer `202 Accepted` once the event is on the
 * ingest queue and `503` when the queue is full. Broadcasting happens on
 * the hub's ingest task, in arrival order.
 *
 * ## Introspection
 * - `GET /health` - liveness plus connection and cache counters
 * - `GET /stats` - current connection statistics
 *
 * The ingest routes carry no authentication; they are meant to be reachable
 * from inside the deployment only.
 */

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::backend::error::BackendError;
use crate::backend::realtime::{ActivityHub, ConnectionStats, HubEvents};
use crate::backend::reference::LanguageCache;
use crate::backend::server::state::AppState;
use crate::shared::{ActivityEvent, RawActivityEvent};

/// Body of `POST /events/activity`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityCreatedRequest {
    pub activity: RawActivityEvent,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Add the ingest and introspection routes
pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/events/activity", post(post_activity))
        .route("/events/stats", post(post_stats))
        .route("/health", get(health))
        .route("/stats", get(connection_stats))
}

fn accepted() -> (StatusCode, Json<Value>) {
    (StatusCode::ACCEPTED, Json(json!({ "status": "accepted" })))
}

/// Validate and enqueue an `activity.created` event
///
/// Activities missing an `id` or `activityType` are refused with 422 here
/// instead of being dropped silently on the ingest task.
pub async fn post_activity(
    State(events): State<HubEvents>,
    Json(request): Json<ActivityCreatedRequest>,
) -> Result<(StatusCode, Json<Value>), BackendError> {
    ActivityEvent::try_from(request.activity.clone())?;
    events.activity_created(request.activity, request.user_id)?;
    Ok(accepted())
}

/// Enqueue an `activity.stats_updated` event
pub async fn post_stats(
    State(events): State<HubEvents>,
    Json(stats): Json<Map<String, Value>>,
) -> Result<(StatusCode, Json<Value>), BackendError> {
    events.stats_updated(stats)?;
    Ok(accepted())
}

pub async fn health(State(hub): State<Arc<ActivityHub>>, State(languages): State<LanguageCache>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "connections": hub.registry().count(),
        "languagesCached": languages.len(),
        "languagesStale": languages.is_stale(),
    }))
}

pub async fn connection_stats(State(hub): State<Arc<ActivityHub>>) -> Json<ConnectionStats> {
    Json(hub.connection_stats())
}
