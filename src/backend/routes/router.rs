/**
 * Router Configuration
 *
 * Combines the WebSocket endpoint and the API routes into one router.
 *
 * # Route Order
 *
 * 1. `/ws` upgrade for activity clients
 * 2. API routes (ingest, health, stats)
 * 3. Fallback handler (404)
 *
 * Requests are traced through `tower-http`'s `TraceLayer`.
 */

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::backend::realtime::ws_handler;
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = Router::new().route("/ws", get(ws_handler));
    let router = configure_api_routes(router);

    router
        .fallback(|| async { (StatusCode::NOT_FOUND, "404 Not Found") })
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
