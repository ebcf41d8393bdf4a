//! Activity and hub fixtures

use std::collections::HashMap;
use std::sync::Arc;

use activity_hub::backend::activity::LanguageNames;
use activity_hub::backend::realtime::ActivityHub;
use activity_hub::shared::{HubConfig, RawActivityEvent};
use serde_json::{json, Value};

/// Wire-form activity built from JSON
pub fn raw_activity(value: Value) -> RawActivityEvent {
    match serde_json::from_value(value) {
        Ok(activity) => activity,
        Err(e) => panic!("fixture is not a valid activity: {e}"),
    }
}

pub fn translation(id: &str, username: &str, from: &str, to: &str) -> RawActivityEvent {
    raw_activity(json!({
        "id": id,
        "actorUserId": format!("user-{username}"),
        "actorUsername": username,
        "activityType": "translation_added",
        "metadata": {
            "wordName": "maji",
            "languageCode": from,
            "targetLanguageCode": to,
        },
    }))
}

pub fn registration(id: &str, username: &str) -> RawActivityEvent {
    raw_activity(json!({
        "id": id,
        "actorUsername": username,
        "activityType": "user_registered",
    }))
}

pub fn test_names() -> Arc<dyn LanguageNames> {
    Arc::new(HashMap::from([
        ("sw".to_string(), "Swahili".to_string()),
        ("yo".to_string(), "Yoruba".to_string()),
        ("en".to_string(), "English".to_string()),
        ("fr".to_string(), "French".to_string()),
    ]))
}

pub fn test_config() -> HubConfig {
    HubConfig::default()
}

pub fn test_hub() -> ActivityHub {
    ActivityHub::new(&test_config(), test_names())
}

pub fn hub_with_queue(depth: usize) -> ActivityHub {
    let config = match HubConfig::builder().outbound_queue(depth).build() {
        Ok(config) => config,
        Err(e) => panic!("invalid test config: {e}"),
    };
    ActivityHub::new(&config, test_names())
}

/// Wait for the next frame on an outbox and parse it
pub async fn next_frame(rx: &mut tokio::sync::mpsc::Receiver<activity_hub::backend::realtime::registry::Frame>) -> Value {
    let frame = match tokio::time::timeout(std::time::Duration::from_secs(2), rx.recv()).await {
        Ok(Some(frame)) => frame,
        Ok(None) => panic!("outbox closed"),
        Err(_) => panic!("timed out waiting for a frame"),
    };
    match serde_json::from_str(&frame) {
        Ok(value) => value,
        Err(e) => panic!("frame is not JSON ({e}): {frame}"),
    }
}

/// Discard everything currently queued on an outbox
pub fn drain(rx: &mut tokio::sync::mpsc::Receiver<activity_hub::backend::realtime::registry::Frame>) -> usize {
    let mut count = 0;
    while rx.try_recv().is_ok() {
        count += 1;
    }
    count
}
