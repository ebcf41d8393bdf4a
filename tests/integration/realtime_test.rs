//! Connection lifecycle and broadcast integration tests

use std::sync::Arc;

use activity_hub::backend::realtime::{ingest_channel, ClientConnection, HubEvent};
use activity_hub::shared::ActivityEvent;
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::{json, Map};
use tokio::sync::{mpsc, watch};

use crate::common::*;

#[tokio::test]
async fn test_connect_sends_recent_then_stats() {
    let hub = test_hub();
    let connection = ClientConnection::new("KE", ["sw", "en"]).with_user("user-1", Some("amina".to_string()));

    let mut rx = assert_ok!(hub.connect(connection).await);

    let recent = assert_next_event!(rx, "activities:recent");
    assert_eq!(recent["activities"], json!([]));
    assert_eq!(recent["personalized"], true);

    let stats = assert_next_event!(rx, "activities:connection_stats");
    assert_eq!(stats["totalUsers"], 1);
    assert_eq!(stats["onlineNow"], 1);
    assert_eq!(stats["regions"]["KE"], 1);
    assert_eq!(stats["languages"]["sw"], 1);
}

#[tokio::test]
async fn test_full_queue_only_affects_its_own_connection() {
    let hub = hub_with_queue(4);
    let mut slow = assert_ok!(hub.connect(ClientConnection::new("NG", ["yo"])).await);
    let mut fast_a = assert_ok!(hub.connect(ClientConnection::new("KE", ["sw"])).await);
    let mut fast_b = assert_ok!(hub.connect(ClientConnection::new("GH", ["tw"])).await);

    // slow now holds recent + three stats frames and is full
    drain(&mut fast_a);
    drain(&mut fast_b);

    let event = assert_ok!(ActivityEvent::try_from(translation("t-1", "amina", "sw", "en")));
    let report = hub.publish_activity(event);

    assert_eq!(report.queued, 2);
    assert_eq!(report.dropped, 1);
    assert_eq!(report.closed, 0);

    for rx in [&mut fast_a, &mut fast_b] {
        let data = assert_next_event!(rx, "activities:new");
        assert_eq!(data["activity"]["message"], "amina translated \"maji\" from Swahili to English");
        assert_eq!(data["priority"], 9);
    }

    let mut queued = Vec::new();
    while let Ok(frame) = slow.try_recv() {
        queued.push(frame);
    }
    assert_eq!(queued.len(), 4);
    assert!(queued.iter().all(|frame| !frame.contains("activities:new")));
}

#[tokio::test]
async fn test_sweep_evicts_after_idle_threshold() {
    let hub = test_hub();
    let now = Utc::now();
    let stale = ClientConnection::new("KE", ["sw"]).last_active(now - Duration::minutes(31));
    let fresh = ClientConnection::new("NG", ["yo"]).last_active(now - Duration::minutes(29));
    let stale_id = stale.id;
    let fresh_id = fresh.id;

    let mut stale_rx = assert_ok!(hub.connect(stale).await);
    let mut fresh_rx = assert_ok!(hub.connect(fresh).await);
    drain(&mut fresh_rx);

    let report = hub.lifecycle(&test_config()).sweep(now);

    assert_eq!(report.evicted, vec![stale_id]);
    assert!(hub.registry().contains(&fresh_id));
    assert!(!hub.registry().contains(&stale_id));

    let stats = assert_next_event!(fresh_rx, "activities:connection_stats");
    assert_eq!(stats["totalUsers"], 1);

    drain(&mut stale_rx);
    assert_eq!(stale_rx.try_recv(), Err(mpsc::error::TryRecvError::Disconnected));
}

#[tokio::test]
async fn test_touch_keeps_connection_alive() {
    let hub = test_hub();
    let now = Utc::now();
    let connection = ClientConnection::new("KE", ["sw"]).last_active(now - Duration::minutes(45));
    let id = connection.id;
    let _rx = assert_ok!(hub.connect(connection).await);

    hub.handle_frame(&id, r#"{"event": "ping"}"#).await;

    let report = hub.lifecycle(&test_config()).sweep(Utc::now());
    assert!(report.evicted.is_empty());
    assert!(hub.registry().contains(&id));
}

#[tokio::test]
async fn test_ingest_broadcasts_in_arrival_order() {
    let hub = Arc::new(test_hub());
    let mut rx = assert_ok!(hub.connect(ClientConnection::new("KE", ["sw"])).await);
    drain(&mut rx);

    let (events, ingest) = ingest_channel(16);
    let (shutdown, shutdown_rx) = watch::channel(false);
    let task = hub.clone().spawn_ingest(ingest, shutdown_rx);

    for i in 1..=5 {
        assert_ok!(events.activity_created(registration(&format!("r-{i}"), "kofi"), None));
    }

    for i in 1..=5 {
        let frame = next_frame(&mut rx).await;
        assert_eq!(frame["event"], "activities:new");
        assert_eq!(frame["data"]["activity"]["id"], format!("r-{i}"));
    }

    assert_ok!(shutdown.send(true));
    assert_ok!(task.await);
}

#[tokio::test]
async fn test_ingest_fills_actor_from_user_id() {
    let hub = test_hub();
    let mut rx = assert_ok!(hub.connect(ClientConnection::new("KE", ["sw"])).await);
    drain(&mut rx);

    hub.handle_event(HubEvent::ActivityCreated {
        activity: registration("r-1", "kofi"),
        user_id: Some("user-9".to_string()),
    });

    let data = assert_next_event!(rx, "activities:new");
    assert_eq!(data["activity"]["actorUserId"], "user-9");
}

#[tokio::test]
async fn test_private_and_malformed_activities_are_not_broadcast() {
    let hub = test_hub();
    let mut rx = assert_ok!(hub.connect(ClientConnection::new("KE", ["sw"])).await);
    drain(&mut rx);

    hub.handle_event(HubEvent::ActivityCreated {
        activity: raw_activity(json!({"id": "p-1", "activityType": "user_logged_in", "isPublic": false})),
        user_id: None,
    });
    hub.handle_event(HubEvent::ActivityCreated {
        activity: raw_activity(json!({"activityType": "word_created"})),
        user_id: None,
    });

    assert!(rx.try_recv().is_err());
    assert!(hub.recent_activities().is_empty());
}

#[tokio::test]
async fn test_collaborator_stats_carry_live_counts() {
    let hub = test_hub();
    let mut rx = assert_ok!(hub.connect(ClientConnection::new("KE", ["sw"])).await);
    drain(&mut rx);

    let mut stats = Map::new();
    stats.insert("totalWords".to_string(), json!(1200));
    hub.handle_event(HubEvent::StatsUpdated(stats));

    let data = assert_next_event!(rx, "activities:stats");
    assert_eq!(data["totalWords"], 1200);
    assert_eq!(data["realTimeData"]["totalUsers"], 1);
    assert!(data["timestamp"].is_string());
}

#[tokio::test]
async fn test_recent_request_prioritizes_priority_languages() {
    let hub = test_hub();
    for (id, from) in [("t-1", "fr"), ("t-2", "yo"), ("t-3", "en")] {
        let event = assert_ok!(ActivityEvent::try_from(translation(id, "amina", from, "en")));
        hub.publish_activity(event);
    }

    let connection = ClientConnection::new("KE", ["sw"]);
    let id = connection.id;
    let mut rx = assert_ok!(hub.connect(connection).await);
    drain(&mut rx);

    hub.handle_frame(
        &id,
        r#"{"event": "activities:request_recent", "data": {"limit": 10, "prioritizeAfrican": true}}"#,
    )
    .await;

    let data = assert_next_event!(rx, "activities:recent");
    let ids: Vec<_> = assert_ok!(data["activities"].as_array().ok_or("activities is not an array"))
        .iter()
        .map(|activity| activity["id"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(ids, vec!["t-2", "t-3", "t-1"]);
    assert_eq!(data["personalized"], false);
}

#[tokio::test]
async fn test_feed_failure_answers_empty_list() {
    let hub = test_hub().with_feed(Arc::new(BrokenFeed));
    let connection = ClientConnection::new("KE", ["sw"]);
    let id = connection.id;
    let mut rx = assert_ok!(hub.connect(connection).await);

    let recent = assert_next_event!(rx, "activities:recent");
    assert_eq!(recent["activities"], json!([]));
    drain(&mut rx);

    hub.handle_frame(
        &id,
        r#"{"event": "activities:request_by_type", "data": {"activityType": "word_created"}}"#,
    )
    .await;

    let data = assert_next_event!(rx, "activities:by_type");
    assert_eq!(data["activityType"], "word_created");
    assert_eq!(data["activities"], json!([]));
    assert!(hub.registry().contains(&id));
}
