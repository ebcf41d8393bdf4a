/**
 * Application State Management
 *
 * `AppState` is the Axum router state. Handlers extract only the part they
 * need through the `FromRef` implementations below: the socket actor takes
 * `Arc<ActivityHub>` and `SocketSettings`, ingest handlers take
 * `HubEvents`, the health endpoint takes the `LanguageCache`.
 *
 * Every field is a cheap clone of a shared handle.
 */

use std::sync::Arc;

use axum::extract::FromRef;

use crate::backend::realtime::{ActivityHub, HubEvents, SocketSettings};
use crate::backend::reference::LanguageCache;

#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<ActivityHub>,
    pub events: HubEvents,
    pub languages: LanguageCache,
    pub socket: SocketSettings,
}

impl FromRef<AppState> for Arc<ActivityHub> {
    fn from_ref(state: &AppState) -> Self {
        state.hub.clone()
    }
}

impl FromRef<AppState> for HubEvents {
    fn from_ref(state: &AppState) -> Self {
        state.events.clone()
    }
}

impl FromRef<AppState> for LanguageCache {
    fn from_ref(state: &AppState) -> Self {
        state.languages.clone()
    }
}

impl FromRef<AppState> for SocketSettings {
    fn from_ref(state: &AppState) -> Self {
        state.socket.clone()
    }
}
