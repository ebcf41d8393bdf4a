//! Test doubles for the hub's external seams

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use activity_hub::backend::activity::ActivityFeed;
use activity_hub::backend::error::BackendError;
use activity_hub::backend::reference::{LanguageRecord, LanguageSource, ReferenceError};
use activity_hub::shared::{ActivityEvent, ActivityType};
use async_trait::async_trait;

/// In-memory language source that counts calls and can be made to fail
pub struct FakeLanguageSource {
    records: Vec<LanguageRecord>,
    failing: AtomicBool,
    delay: Duration,
    calls: AtomicUsize,
}

impl FakeLanguageSource {
    pub fn new(records: &[(&str, &str)]) -> Self {
        Self {
            records: records
                .iter()
                .map(|(code, name)| LanguageRecord::new(*code, *name))
                .collect(),
            failing: AtomicBool::new(false),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        let source = Self::new(&[]);
        source.set_failing(true);
        source
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageSource for FakeLanguageSource {
    async fn find_all_languages(&self) -> Result<Vec<LanguageRecord>, ReferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(ReferenceError::Unavailable("fake source is down".to_string()));
        }
        Ok(self.records.clone())
    }
}

/// Feed whose every query fails
pub struct BrokenFeed;

#[async_trait]
impl ActivityFeed for BrokenFeed {
    async fn recent(&self, _limit: usize) -> Result<Vec<ActivityEvent>, BackendError> {
        Err(BackendError::unavailable("feed offline"))
    }

    async fn by_type(&self, _activity_type: &ActivityType, _limit: usize) -> Result<Vec<ActivityEvent>, BackendError> {
        Err(BackendError::unavailable("feed offline"))
    }
}
