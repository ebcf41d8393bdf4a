/**
 * WebSocket Connection Actor
 *
 * `GET /ws` upgrades to a WebSocket and runs one actor per connection:
 *
 * - a **writer** task drains the connection's outbound queue into the
 *   socket, each write bounded by the configured send timeout
 * - the **reader** loop hands inbound frames to the hub
 *
 * The connection ends when the client closes, a write fails or times out,
 * or the registry drops the connection's outbox (eviction). In every case
 * the actor unregisters itself on the way out; unregistering twice is
 * harmless.
 *
 * # Handshake
 *
 * Query parameters `token`, `region` and `languages` (comma list), with
 * header fallbacks: `Authorization: Bearer`, geo headers for the region
 * and `Accept-Language` for languages. A bad token is answered with
 * `activities:error` followed by a close frame.
 */

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{header, HeaderMap},
    response::Response,
};
use futures_util::{stream::StreamExt, Sink, SinkExt, Stream};
use serde::Deserialize;
use tokio::sync::mpsc;

use super::hub::ActivityHub;
use super::protocol::{ServerEvent, CLOSE_TOKEN_EXPIRED, CLOSE_TOKEN_INVALID};
use super::registry::{ClientConnection, ConnectionId, Frame, UNKNOWN_REGION};
use crate::backend::auth::{verify_token, TokenError};
use crate::shared::HubConfig;

/// Headers consulted for the client's region, in order
const REGION_HEADERS: [&str; 3] = ["cf-ipcountry", "x-vercel-ip-country", "x-region"];

/// Per-socket settings taken from `HubConfig`
#[derive(Debug, Clone)]
pub struct SocketSettings {
    pub jwt_secret: Arc<str>,
    pub require_auth: bool,
    pub default_language: String,
    pub send_timeout: Duration,
}

impl SocketSettings {
    pub fn from_config(config: &HubConfig) -> Self {
        Self {
            jwt_secret: Arc::from(config.jwt_secret.as_str()),
            require_auth: config.require_auth,
            default_language: config.default_language.clone(),
            send_timeout: config.send_timeout,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct HandshakeParams {
    pub token: Option<String>,
    pub region: Option<String>,
    pub languages: Option<String>,
}

/// Who is on the other end of the socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    User {
        user_id: String,
        username: Option<String>,
    },
}

/// Authentication fault at connect time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeRejection {
    Missing,
    Expired,
    Invalid,
}

impl HandshakeRejection {
    pub fn close_code(&self) -> u16 {
        match self {
            Self::Expired => CLOSE_TOKEN_EXPIRED,
            Self::Missing | Self::Invalid => CLOSE_TOKEN_INVALID,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Missing => "Authentication required",
            Self::Expired => "Authentication token expired",
            Self::Invalid => "Invalid authentication token",
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Token from the query string, else from `Authorization: Bearer`
pub fn resolve_token(params: &HandshakeParams, headers: &HeaderMap) -> Option<String> {
    if let Some(token) = non_empty(params.token.as_deref()) {
        return Some(token.to_string());
    }
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    non_empty(value.strip_prefix("Bearer ")).map(str::to_string)
}

pub fn resolve_region(params: &HandshakeParams, headers: &HeaderMap) -> String {
    if let Some(region) = non_empty(params.region.as_deref()) {
        return region.to_string();
    }
    REGION_HEADERS
        .iter()
        .find_map(|name| non_empty(headers.get(*name)?.to_str().ok()))
        .unwrap_or(UNKNOWN_REGION)
        .to_string()
}

/// Languages from the query, else primary tags of `Accept-Language`,
/// else the configured default
pub fn resolve_languages(params: &HandshakeParams, headers: &HeaderMap, default_language: &str) -> Vec<String> {
    let parse = |list: &str, strip_subtags: bool| -> Vec<String> {
        list.split(',')
            .filter_map(|part| {
                let tag = part.split(';').next()?.trim();
                let tag = if strip_subtags { tag.split('-').next()? } else { tag };
                (!tag.is_empty() && tag != "*").then(|| tag.to_lowercase())
            })
            .collect()
    };

    if let Some(list) = non_empty(params.languages.as_deref()) {
        let languages = parse(list, false);
        if !languages.is_empty() {
            return languages;
        }
    }
    if let Some(list) = non_empty(headers.get(header::ACCEPT_LANGUAGE).and_then(|v| v.to_str().ok())) {
        let languages = parse(list, true);
        if !languages.is_empty() {
            return languages;
        }
    }
    vec![default_language.to_string()]
}

pub fn authenticate(token: Option<&str>, settings: &SocketSettings) -> Result<Identity, HandshakeRejection> {
    let Some(token) = token else {
        return if settings.require_auth {
            Err(HandshakeRejection::Missing)
        } else {
            Ok(Identity::Anonymous)
        };
    };
    match verify_token(token, &settings.jwt_secret) {
        Ok(claims) => Ok(Identity::User {
            user_id: claims.sub,
            username: claims.username,
        }),
        Err(TokenError::Expired) => Err(HandshakeRejection::Expired),
        Err(TokenError::Invalid(reason)) => {
            tracing::debug!(%reason, "[Socket] Rejecting handshake token");
            Err(HandshakeRejection::Invalid)
        }
    }
}

/// `GET /ws`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<HandshakeParams>,
    headers: HeaderMap,
    State(hub): State<Arc<ActivityHub>>,
    State(settings): State<SocketSettings>,
) -> Response {
    let token = resolve_token(&params, &headers);
    let identity = authenticate(token.as_deref(), &settings);
    let region = resolve_region(&params, &headers);
    let languages = resolve_languages(&params, &headers, &settings.default_language);

    ws.on_upgrade(move |socket| async move {
        match identity {
            Err(rejection) => reject(socket, rejection).await,
            Ok(identity) => {
                let mut connection = ClientConnection::new(region, languages);
                if let Identity::User { user_id, username } = identity {
                    connection = connection.with_user(user_id, username);
                }
                run_connection(socket, hub, settings, connection).await;
            }
        }
    })
}

async fn reject(mut socket: WebSocket, rejection: HandshakeRejection) {
    tracing::info!(reason = rejection.message(), "[Socket] Handshake rejected");
    if let Ok(frame) = ServerEvent::error(rejection.message()).to_frame() {
        let _ = socket.send(Message::Text(Utf8Bytes::from(frame.to_string()))).await;
    }
    let close = CloseFrame {
        code: rejection.close_code(),
        reason: Utf8Bytes::from_static(rejection.message()),
    };
    let _ = socket.send(Message::Close(Some(close))).await;
}

async fn run_connection<S, E>(socket: S, hub: Arc<ActivityHub>, settings: SocketSettings, connection: ClientConnection)
where
    S: Stream<Item = Result<Message, E>> + Sink<Message, Error = E> + Send + 'static,
    E: Display + Send + 'static,
{
    let id = connection.id;
    let outbox = match hub.connect(connection).await {
        Ok(outbox) => outbox,
        Err(e) => {
            tracing::error!(connection = %id, error = %e, "[Socket] Failed to register connection");
            return;
        }
    };

    let (sender, mut receiver) = socket.split();
    let mut writer = tokio::spawn(write_frames(sender, outbox, settings.send_timeout, id));

    loop {
        tokio::select! {
            message = receiver.next() => match message {
                Some(Ok(Message::Text(text))) => hub.handle_frame(&id, text.as_str()).await,
                Some(Ok(Message::Binary(bytes))) => {
                    hub.handle_frame(&id, &String::from_utf8_lossy(&bytes)).await;
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                    hub.registry().touch(&id);
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    tracing::debug!(connection = %id, error = %e, "[Socket] Read failed");
                    break;
                }
            },
            _ = &mut writer => break,
        }
    }

    writer.abort();
    hub.disconnect(&id);
}

async fn write_frames<W>(mut sender: W, mut outbox: mpsc::Receiver<Frame>, send_timeout: Duration, id: ConnectionId)
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    while let Some(frame) = outbox.recv().await {
        let message = Message::Text(Utf8Bytes::from(frame.to_string()));
        match tokio::time::timeout(send_timeout, sender.send(message)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(connection = %id, error = %e, "[Socket] Write failed");
                return;
            }
            Err(_) => {
                tracing::warn!(connection = %id, "[Socket] Write timed out, dropping connection");
                return;
            }
        }
    }

    // Outbox closed: the connection was removed from the registry.
    tracing::debug!(connection = %id, "[Socket] Outbox closed, closing socket");
    let _ = tokio::time::timeout(send_timeout, sender.send(Message::Close(None))).await;
}
