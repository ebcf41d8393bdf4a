//! WebSocket end-to-end tests
//!
//! Each test serves the full app on an ephemeral port and talks to it with
//! `tokio-tungstenite`.

use std::net::SocketAddr;
use std::time::Duration;

use activity_hub::backend::auth::create_token;
use activity_hub::backend::server::{create_app, HubRuntime};
use activity_hub::shared::HubConfig;
use futures_util::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::common::*;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const SECRET: &str = "e2e-secret";

async fn serve() -> (SocketAddr, HubRuntime) {
    let config = assert_ok!(HubConfig::builder().jwt_secret(SECRET).build());
    let (app, runtime) = create_app(config, None);
    let listener = assert_ok!(TcpListener::bind("127.0.0.1:0").await);
    let addr = assert_ok!(listener.local_addr());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, runtime)
}

async fn connect(addr: SocketAddr, query: &str) -> Client {
    let url = format!("ws://{addr}/ws?{query}");
    let (client, _) = assert_ok!(connect_async(url).await);
    client
}

/// Next message that is not a ping or pong
async fn next_message(client: &mut Client) -> Message {
    loop {
        let message = match tokio::time::timeout(Duration::from_secs(2), client.next()).await {
            Ok(Some(Ok(message))) => message,
            Ok(Some(Err(e))) => panic!("socket error: {e}"),
            Ok(None) => panic!("socket closed"),
            Err(_) => panic!("timed out waiting for a message"),
        };
        if !matches!(message, Message::Ping(_) | Message::Pong(_)) {
            return message;
        }
    }
}

async fn next_event(client: &mut Client) -> Value {
    match next_message(client).await {
        Message::Text(text) => assert_ok!(serde_json::from_str(text.as_str())),
        other => panic!("expected a text frame, got {other:?}"),
    }
}

#[tokio::test]
async fn test_authenticated_client_receives_activity_stream() {
    let (addr, runtime) = serve().await;
    let token = assert_ok!(create_token("user-1", Some("amina"), SECRET, Duration::from_secs(3600)));
    let mut client = connect(addr, &format!("token={token}&region=KE&languages=sw,en")).await;

    let recent = next_event(&mut client).await;
    assert_eq!(recent["event"], "activities:recent");
    assert_eq!(recent["data"]["personalized"], true);

    let stats = next_event(&mut client).await;
    assert_eq!(stats["event"], "activities:connection_stats");
    assert_eq!(stats["data"]["totalUsers"], 1);
    assert_eq!(stats["data"]["onlineNow"], 1);
    assert_eq!(stats["data"]["regions"]["KE"], 1);

    assert_ok!(runtime.events().activity_created(translation("t-1", "kofi", "yo", "en"), None));

    let new = next_event(&mut client).await;
    assert_eq!(new["event"], "activities:new");
    assert_eq!(new["data"]["activity"]["message"], "kofi translated \"maji\" from Yoruba to English");
    assert_eq!(new["data"]["priority"], 9);

    let request = json!({"event": "activities:request_by_type", "data": {"activityType": "translation_added"}});
    assert_ok!(client.send(Message::Text(request.to_string().into())).await);

    let by_type = next_event(&mut client).await;
    assert_eq!(by_type["event"], "activities:by_type");
    assert_eq!(by_type["data"]["activities"][0]["id"], "t-1");

    assert_ok!(client.close(None).await);
    runtime.shutdown().await;
}

#[tokio::test]
async fn test_anonymous_client_defaults_region_to_unknown() {
    let (addr, runtime) = serve().await;
    let mut client = connect(addr, "languages=yo").await;

    let recent = next_event(&mut client).await;
    assert_eq!(recent["data"]["personalized"], false);

    let stats = next_event(&mut client).await;
    assert_eq!(stats["data"]["onlineNow"], 0);
    assert_eq!(stats["data"]["regions"]["unknown"], 1);
    assert_eq!(stats["data"]["languages"]["yo"], 1);

    runtime.shutdown().await;
}

#[tokio::test]
async fn test_malformed_frame_is_answered_with_empty_recent() {
    let (addr, runtime) = serve().await;
    let mut client = connect(addr, "region=NG").await;
    next_event(&mut client).await;
    next_event(&mut client).await;

    assert_ok!(client.send(Message::Text("not json".into())).await);

    let reply = next_event(&mut client).await;
    assert_eq!(reply["event"], "activities:recent");
    assert_eq!(reply["data"]["activities"], json!([]));

    runtime.shutdown().await;
}

#[tokio::test]
async fn test_invalid_token_is_closed_with_4002() {
    let (addr, runtime) = serve().await;
    let mut client = connect(addr, "token=not-a-jwt").await;

    let error = next_event(&mut client).await;
    assert_eq!(error["event"], "activities:error");

    match next_message(&mut client).await {
        Message::Close(Some(frame)) => assert_eq!(u16::from(frame.code), 4002),
        other => panic!("expected a close frame, got {other:?}"),
    }

    assert_eq!(runtime.hub().registry().count(), 0);
    runtime.shutdown().await;
}

#[tokio::test]
async fn test_disconnect_updates_remaining_clients() {
    let (addr, runtime) = serve().await;
    let mut first = connect(addr, "region=KE").await;
    next_event(&mut first).await;
    next_event(&mut first).await;

    let mut second = connect(addr, "region=GH").await;
    next_event(&mut second).await;
    next_event(&mut second).await;
    let joined = next_event(&mut first).await;
    assert_eq!(joined["data"]["totalUsers"], 2);

    assert_ok!(second.close(None).await);

    let left = next_event(&mut first).await;
    assert_eq!(left["event"], "activities:connection_stats");
    assert_eq!(left["data"]["totalUsers"], 1);
    assert!(left["data"]["regions"].get("GH").is_none());

    runtime.shutdown().await;
}
