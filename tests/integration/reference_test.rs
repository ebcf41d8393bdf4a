//! Language cache integration tests

use std::sync::Arc;
use std::time::Duration;

use activity_hub::backend::activity::{ActivityFormatter, PriorityScorer};
use activity_hub::backend::reference::{LanguageCache, ReferenceError};
use activity_hub::shared::{ActivityDetails, ActivityEvent};
use pretty_assertions::assert_eq;

use crate::common::*;

#[tokio::test]
async fn test_refresh_overrides_and_extends_static_names() {
    let source = Arc::new(FakeLanguageSource::new(&[("sw", "Kiswahili"), ("nup", "Nupe")]));
    let cache = LanguageCache::new(source.clone(), Duration::from_secs(3600));

    assert_eq!(cache.get("sw").as_deref(), Some("Swahili"));
    assert_eq!(cache.get("nup"), None);

    let loaded = assert_ok!(cache.refresh().await);
    assert_eq!(loaded, 2);
    assert_eq!(cache.get("SW").as_deref(), Some("Kiswahili"));
    assert_eq!(cache.get("nup").as_deref(), Some("Nupe"));
    assert_eq!(cache.get("yo").as_deref(), Some("Yoruba"));
    assert!(!cache.is_stale());
}

#[tokio::test]
async fn test_unreachable_store_falls_back_to_static_table() {
    let cache = LanguageCache::new(Arc::new(FakeLanguageSource::failing()), Duration::from_secs(3600));

    assert_err!(cache.refresh().await, ReferenceError::Unavailable(_));
    assert_eq!(cache.get("ha").as_deref(), Some("Hausa"));
    assert!(cache.is_empty());
    assert!(cache.is_stale());
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_snapshot() {
    let source = Arc::new(FakeLanguageSource::new(&[("nup", "Nupe")]));
    let cache = LanguageCache::new(source.clone(), Duration::from_secs(3600));
    assert_ok!(cache.refresh().await);

    source.set_failing(true);
    assert_err!(cache.refresh().await);

    assert_eq!(cache.get("nup").as_deref(), Some("Nupe"));
    assert_eq!(cache.generation(), 1);
}

#[tokio::test]
async fn test_concurrent_refreshes_hit_store_once() {
    let source = Arc::new(FakeLanguageSource::new(&[("nup", "Nupe")]).with_delay(Duration::from_millis(50)));
    let cache = LanguageCache::new(source.clone(), Duration::from_secs(3600));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.refresh().await })
        })
        .collect();
    for task in tasks {
        assert_ok!(assert_ok!(task.await));
    }

    assert_eq!(source.calls(), 1);
    assert_eq!(cache.generation(), 1);
}

#[tokio::test]
async fn test_concurrent_refreshes_against_down_store_hit_it_once() {
    let source = Arc::new(FakeLanguageSource::failing().with_delay(Duration::from_millis(50)));
    let cache = LanguageCache::new(source.clone(), Duration::ZERO);

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.refresh().await })
        })
        .collect();
    for task in tasks {
        assert_err!(assert_ok!(task.await), ReferenceError::Unavailable(_));
    }
    assert_eq!(source.calls(), 1);

    // Stale misses right after the failure do not reach the store again.
    for _ in 0..8 {
        assert_eq!(cache.lookup("nup"), None);
    }
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn test_formatter_reads_names_through_cache() {
    let source = Arc::new(FakeLanguageSource::new(&[("nup", "Nupe")]));
    let cache = LanguageCache::new(source, Duration::from_secs(3600));
    assert_ok!(cache.refresh().await);

    let formatter = ActivityFormatter::new(cache, PriorityScorer::default());
    let event = ActivityEvent::new(
        "w-1",
        ActivityDetails::WordCreated {
            word_name: Some("eba".to_string()),
            language_code: Some("nup".to_string()),
        },
    )
    .with_actor("user-1", "musa");

    assert_eq!(formatter.message(&event), "musa added \"eba\" in Nupe");
    assert_eq!(formatter.language(Some("xx")), "XX");
}
