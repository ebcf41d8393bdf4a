//! Recent activity feed
//!
//! Answers `activities:request_recent` and `activities:request_by_type`.
//! The hub does not persist activities; [`RecentActivities`] keeps the most
//! recent broadcasts in memory and is the default [`ActivityFeed`].

use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use super::priority::PriorityScorer;
use crate::backend::error::BackendError;
use crate::shared::{ActivityEvent, ActivityType};

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 100;

/// Clamp a client-supplied limit into `[1, MAX_LIMIT]`
pub fn clamp_limit(limit: Option<i64>) -> usize {
    match limit {
        None => DEFAULT_LIMIT,
        Some(n) if n < 1 => 1,
        Some(n) => usize::try_from(n).map_or(MAX_LIMIT, |n| n.min(MAX_LIMIT)),
    }
}

/// Source of recent activities, newest first
#[async_trait]
pub trait ActivityFeed: Send + Sync {
    async fn recent(&self, limit: usize) -> Result<Vec<ActivityEvent>, BackendError>;

    async fn by_type(
        &self,
        activity_type: &ActivityType,
        limit: usize,
    ) -> Result<Vec<ActivityEvent>, BackendError>;
}

/// Stable partition: activities touching a priority language first
pub fn prioritize(events: Vec<ActivityEvent>, scorer: &PriorityScorer) -> Vec<ActivityEvent> {
    let (mut front, back): (Vec<_>, Vec<_>) = events
        .into_iter()
        .partition(|event| scorer.touches_priority_language(event));
    front.extend(back);
    front
}

/// Bounded in-memory ring of recently broadcast activities
#[derive(Debug)]
pub struct RecentActivities {
    capacity: usize,
    events: RwLock<VecDeque<ActivityEvent>>,
}

impl RecentActivities {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            events: RwLock::new(VecDeque::with_capacity(capacity.max(1))),
        }
    }

    /// Record an activity, dropping the oldest when full
    ///
    /// Private activities are not kept.
    pub fn push(&self, event: ActivityEvent) {
        if !event.is_public {
            return;
        }
        let mut events = self.events.write().unwrap_or_else(PoisonError::into_inner);
        if events.len() == self.capacity {
            events.pop_back();
        }
        events.push_front(event);
    }

    pub fn len(&self) -> usize {
        self.events.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn collect<F>(&self, limit: usize, keep: F) -> Vec<ActivityEvent>
    where
        F: Fn(&ActivityEvent) -> bool,
    {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|event| keep(event))
            .take(limit)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ActivityFeed for RecentActivities {
    async fn recent(&self, limit: usize) -> Result<Vec<ActivityEvent>, BackendError> {
        Ok(self.collect(limit, |_| true))
    }

    async fn by_type(
        &self,
        activity_type: &ActivityType,
        limit: usize,
    ) -> Result<Vec<ActivityEvent>, BackendError> {
        Ok(self.collect(limit, |event| &event.activity_type() == activity_type))
    }
}
