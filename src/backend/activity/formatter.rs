/**
 * Activity Formatter
 *
 * Turns an `ActivityEvent` into the `FormattedActivity` payload clients
 * render: a human-readable message, a relative timestamp, a flag glyph and
 * the broadcast priority.
 *
 * # Purity
 *
 * Formatting never performs I/O. Language names come from a
 * `LanguageNames` implementation; in production that is the
 * `LanguageCache`, whose lookups only read the in-memory snapshot. Tests
 * use a plain `HashMap`.
 *
 * # Templates
 *
 * One template per known activity type, plus a generic fallback for
 * anything else. Missing metadata is replaced with neutral wording so every
 * template always produces a sentence.
 */

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::priority::PriorityScorer;
use crate::backend::reference::LanguageCache;
use crate::shared::{ActivityDetails, ActivityEvent, FormattedActivity};

/// Flag shown when the activity carries none
pub const DEFAULT_FLAG: &str = "🌍";

/// Actor shown when the activity has no username
const ANONYMOUS_ACTOR: &str = "Someone";

/// Read-only `code -> display name` lookup
pub trait LanguageNames: Send + Sync {
    fn language_name(&self, code: &str) -> Option<String>;
}

impl LanguageNames for HashMap<String, String> {
    fn language_name(&self, code: &str) -> Option<String> {
        self.get(&code.trim().to_lowercase()).cloned()
    }
}

impl<T: LanguageNames + ?Sized> LanguageNames for std::sync::Arc<T> {
    fn language_name(&self, code: &str) -> Option<String> {
        (**self).language_name(code)
    }
}

impl LanguageNames for LanguageCache {
    fn language_name(&self, code: &str) -> Option<String> {
        self.lookup(code)
    }
}

/// Relative time string for an elapsed number of seconds
///
/// Negative values (clock skew, future timestamps) read as "just now".
pub fn time_ago(elapsed_secs: i64) -> String {
    const MINUTE: i64 = 60;
    const HOUR: i64 = 60 * MINUTE;
    const DAY: i64 = 24 * HOUR;

    if elapsed_secs < MINUTE {
        return "just now".to_string();
    }
    if elapsed_secs < HOUR {
        return format!("{} min ago", elapsed_secs / MINUTE);
    }
    if elapsed_secs < DAY {
        let hours = elapsed_secs / HOUR;
        return format!("{} hour{} ago", hours, plural(hours));
    }
    let days = elapsed_secs / DAY;
    format!("{} day{} ago", days, plural(days))
}

fn plural(n: i64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Formats and scores activities for delivery
#[derive(Clone)]
pub struct ActivityFormatter<N> {
    names: N,
    scorer: PriorityScorer,
}

impl<N: LanguageNames> ActivityFormatter<N> {
    pub fn new(names: N, scorer: PriorityScorer) -> Self {
        Self { names, scorer }
    }

    pub fn scorer(&self) -> &PriorityScorer {
        &self.scorer
    }

    pub fn format(&self, event: &ActivityEvent) -> FormattedActivity {
        self.format_at(event, Utc::now())
    }

    /// Format relative to a fixed `now`
    pub fn format_at(&self, event: &ActivityEvent, now: DateTime<Utc>) -> FormattedActivity {
        let elapsed = now.signed_duration_since(event.created_at).num_seconds();
        FormattedActivity {
            activity: event.to_raw(),
            message: self.message(event),
            time_ago: time_ago(elapsed),
            flag: event
                .language_flag
                .clone()
                .unwrap_or_else(|| DEFAULT_FLAG.to_string()),
            priority: self.scorer.score(event),
        }
    }

    /// Display name for a language code
    ///
    /// Unknown codes are shown upper-cased; a missing code reads as
    /// "a language".
    pub fn language(&self, code: Option<&str>) -> String {
        match code.map(str::trim).filter(|code| !code.is_empty()) {
            Some(code) => self
                .names
                .language_name(code)
                .unwrap_or_else(|| code.to_uppercase()),
            None => "a language".to_string(),
        }
    }

    pub fn message(&self, event: &ActivityEvent) -> String {
        let actor = event
            .actor_username
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(ANONYMOUS_ACTOR);
        let word = |name: &Option<String>| match name.as_deref() {
            Some(name) => format!("\"{}\"", name),
            None => "a word".to_string(),
        };
        let community = |name: &Option<String>| match name.as_deref() {
            Some(name) => name.to_string(),
            None => "a community".to_string(),
        };
        let language = |code: &Option<String>| self.language(code.as_deref());

        match &event.details {
            ActivityDetails::WordCreated { word_name, language_code } => {
                format!("{} added {} in {}", actor, word(word_name), language(language_code))
            }
            ActivityDetails::TranslationAdded {
                word_name,
                language_code,
                target_language_code,
            } => format!(
                "{} translated {} from {} to {}",
                actor,
                word(word_name),
                language(language_code),
                language(target_language_code)
            ),
            ActivityDetails::SynonymAdded {
                word_name,
                language_code,
                synonyms_count,
            } => {
                let count = match synonyms_count {
                    Some(1) => "a synonym".to_string(),
                    Some(n) => format!("{} synonyms", n),
                    None => "synonyms".to_string(),
                };
                format!(
                    "{} added {} for {} in {}",
                    actor,
                    count,
                    word(word_name),
                    language(language_code)
                )
            }
            ActivityDetails::WordApproved { word_name, language_code } => {
                format!("{} approved {} in {}", actor, word(word_name), language(language_code))
            }
            ActivityDetails::WordVerified { word_name, language_code } => {
                format!("{} verified {} in {}", actor, word(word_name), language(language_code))
            }
            ActivityDetails::CommunityPostCreated { community_name, .. } => {
                format!("{} posted in {}", actor, community(community_name))
            }
            ActivityDetails::UserRegistered => format!("{} joined the community", actor),
            ActivityDetails::UserLoggedIn => format!("{} is now online", actor),
            ActivityDetails::CommunityJoined { community_name, .. } => {
                format!("{} joined {}", actor, community(community_name))
            }
            ActivityDetails::CommunityCreated { community_name, .. } => {
                format!("{} created {}", actor, community(community_name))
            }
            ActivityDetails::CommentAdded {
                word_name,
                community_name,
                ..
            } => match (word_name, community_name) {
                (Some(_), _) => format!("{} commented on {}", actor, word(word_name)),
                (None, Some(_)) => format!("{} commented in {}", actor, community(community_name)),
                (None, None) => format!("{} left a comment", actor),
            },
            ActivityDetails::Other { .. } => format!("{} performed an action", actor),
        }
    }
}
