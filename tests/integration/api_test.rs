//! HTTP route integration tests

use std::sync::Arc;

use activity_hub::backend::realtime::{ingest_channel, ActivityHub, ClientConnection, SocketSettings};
use activity_hub::backend::reference::LanguageCache;
use activity_hub::backend::routes::create_router;
use activity_hub::backend::server::{create_app, AppState};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::common::*;

fn post_json(uri: &str, body: Value) -> Request<Body> {
    assert_ok!(Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string())))
}

fn get(uri: &str) -> Request<Body> {
    assert_ok!(Request::builder().uri(uri).body(Body::empty()))
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    assert_ok!(app.clone().oneshot(request).await)
}

async fn json_body(response: Response) -> Value {
    let bytes = assert_ok!(axum::body::to_bytes(response.into_body(), usize::MAX).await);
    assert_ok!(serde_json::from_slice(&bytes))
}

#[tokio::test]
async fn test_posted_activity_reaches_connected_clients() {
    let (app, runtime) = create_app(test_config(), None);
    let mut rx = assert_ok!(runtime.hub().connect(ClientConnection::new("KE", ["sw"])).await);
    drain(&mut rx);

    let response = send(
        &app,
        post_json(
            "/events/activity",
            json!({
                "activity": {
                    "id": 77,
                    "activityType": "word_created",
                    "actorUsername": "wanjiru",
                    "metadata": {"wordName": "mti", "languageCode": "sw"}
                },
                "userId": "user-7"
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let frame = next_frame(&mut rx).await;
    assert_eq!(frame["event"], "activities:new");
    assert_eq!(frame["data"]["activity"]["id"], "77");
    assert_eq!(frame["data"]["activity"]["actorUserId"], "user-7");
    assert_eq!(frame["data"]["activity"]["message"], "wanjiru added \"mti\" in Swahili");

    runtime.shutdown().await;
}

#[tokio::test]
async fn test_activity_without_id_is_rejected() {
    let (app, runtime) = create_app(test_config(), None);

    let response = send(
        &app,
        post_json("/events/activity", json!({"activity": {"activityType": "word_created"}})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["status"], 422);
    assert_contains!(assert_ok!(body["error"].as_str().ok_or("error is not a string")), "id");

    runtime.shutdown().await;
}

#[tokio::test]
async fn test_stats_are_accepted() {
    let (app, runtime) = create_app(test_config(), None);

    let response = send(&app, post_json("/events/stats", json!({"totalWords": 10}))).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    runtime.shutdown().await;
}

#[tokio::test]
async fn test_full_ingest_queue_returns_service_unavailable() {
    let hub = Arc::new(ActivityHub::new(&test_config(), test_names()));
    let (events, _ingest) = ingest_channel(1);
    let app = create_router(AppState {
        hub,
        events,
        languages: LanguageCache::static_only(),
        socket: SocketSettings::from_config(&test_config()),
    });

    let first = send(&app, post_json("/events/stats", json!({}))).await;
    assert_eq!(first.status(), StatusCode::ACCEPTED);

    let second = send(&app, post_json("/events/stats", json!({}))).await;
    assert_eq!(second.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(second).await["status"], 503);
}

#[tokio::test]
async fn test_health_and_stats_report_connections() {
    let (app, runtime) = create_app(test_config(), None);
    let connection = ClientConnection::new("KE", ["sw", "en"]).with_user("user-1", None);
    let _rx = assert_ok!(runtime.hub().connect(connection).await);

    let health = send(&app, get("/health")).await;
    assert_eq!(health.status(), StatusCode::OK);
    let health = json_body(health).await;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["connections"], 1);

    let stats = json_body(send(&app, get("/stats")).await).await;
    assert_eq!(stats["totalUsers"], 1);
    assert_eq!(stats["onlineNow"], 1);
    assert_eq!(stats["languages"]["en"], 1);

    runtime.shutdown().await;
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (app, runtime) = create_app(test_config(), None);
    let response = send(&app, get("/nope")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    runtime.shutdown().await;
}
