//! Broadcast priority scoring
//!
//! Every activity gets a score in `1..=10`. The base comes from a fixed
//! per-type table; activities touching a configured priority language get a
//! bonus on top.

use crate::shared::{ActivityEvent, ActivityType, PriorityConfig};

pub const MIN_PRIORITY: u8 = 1;
pub const MAX_PRIORITY: u8 = 10;

/// Base score used for activity types without a table entry
const OTHER_BASE: u8 = 2;

/// Scores activities for broadcast
#[derive(Debug, Clone, Default)]
pub struct PriorityScorer {
    config: PriorityConfig,
}

impl PriorityScorer {
    pub fn new(config: PriorityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PriorityConfig {
        &self.config
    }

    /// Score before any language bonus
    pub fn base_score(activity_type: &ActivityType) -> u8 {
        match activity_type {
            ActivityType::TranslationAdded | ActivityType::WordApproved => 8,
            ActivityType::WordVerified => 7,
            ActivityType::WordCreated | ActivityType::CommunityCreated => 6,
            ActivityType::SynonymAdded | ActivityType::CommunityPostCreated => 5,
            ActivityType::CommunityJoined | ActivityType::UserRegistered => 4,
            ActivityType::CommentAdded => 3,
            ActivityType::UserLoggedIn => 1,
            ActivityType::Other(_) => OTHER_BASE,
        }
    }

    /// Whether the source or target language is on the priority list
    pub fn touches_priority_language(&self, event: &ActivityEvent) -> bool {
        event
            .details
            .language_codes()
            .any(|code| self.config.is_priority(code))
    }

    /// Final score, clamped to `[MIN_PRIORITY, MAX_PRIORITY]`
    pub fn score(&self, event: &ActivityEvent) -> u8 {
        let mut score = Self::base_score(&event.activity_type());
        if self.touches_priority_language(event) {
            score = score.saturating_add(self.config.bonus);
        }
        score.clamp(MIN_PRIORITY, MAX_PRIORITY)
    }
}
