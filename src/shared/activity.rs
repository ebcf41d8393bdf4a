/**
 * Activity Data Structures
 *
 * This module defines the domain activity events the hub consumes from its
 * collaborators and the enriched payload it pushes to clients.
 *
 * # Wire Form vs Typed Form
 *
 * Collaborators send activities as camelCase JSON with a free-form
 * `metadata` object whose shape depends on `activityType`. The hub converts
 * that wire form (`RawActivityEvent`) into `ActivityEvent`, where the
 * metadata is an `ActivityDetails` variant carrying only the fields relevant
 * to that activity type. Unknown activity types are kept as
 * `ActivityDetails::Other` so they still flow through the hub.
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::shared::error::SharedError;

/// Kind of domain activity
///
/// Serialized as the snake_case string used on the wire
/// (e.g. `"translation_added"`). Any string that is not one of the known
/// kinds deserializes into `ActivityType::Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActivityType {
    WordCreated,
    TranslationAdded,
    SynonymAdded,
    WordApproved,
    WordVerified,
    CommunityPostCreated,
    UserRegistered,
    UserLoggedIn,
    CommunityJoined,
    CommunityCreated,
    CommentAdded,
    /// An activity type this hub does not know about
    Other(String),
}

impl ActivityType {
    /// Every activity type the hub has a message template for
    pub const KNOWN: [ActivityType; 11] = [
        ActivityType::WordCreated,
        ActivityType::TranslationAdded,
        ActivityType::SynonymAdded,
        ActivityType::WordApproved,
        ActivityType::WordVerified,
        ActivityType::CommunityPostCreated,
        ActivityType::UserRegistered,
        ActivityType::UserLoggedIn,
        ActivityType::CommunityJoined,
        ActivityType::CommunityCreated,
        ActivityType::CommentAdded,
    ];

    /// Wire name of this activity type
    pub fn as_str(&self) -> &str {
        match self {
            Self::WordCreated => "word_created",
            Self::TranslationAdded => "translation_added",
            Self::SynonymAdded => "synonym_added",
            Self::WordApproved => "word_approved",
            Self::WordVerified => "word_verified",
            Self::CommunityPostCreated => "community_post_created",
            Self::UserRegistered => "user_registered",
            Self::UserLoggedIn => "user_logged_in",
            Self::CommunityJoined => "community_joined",
            Self::CommunityCreated => "community_created",
            Self::CommentAdded => "comment_added",
            Self::Other(name) => name.as_str(),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<&str> for ActivityType {
    fn from(value: &str) -> Self {
        match value.trim() {
            "word_created" => Self::WordCreated,
            "translation_added" => Self::TranslationAdded,
            "synonym_added" => Self::SynonymAdded,
            "word_approved" => Self::WordApproved,
            "word_verified" => Self::WordVerified,
            "community_post_created" => Self::CommunityPostCreated,
            "user_registered" => Self::UserRegistered,
            "user_logged_in" => Self::UserLoggedIn,
            "community_joined" => Self::CommunityJoined,
            "community_created" => Self::CommunityCreated,
            "comment_added" => Self::CommentAdded,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for ActivityType {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<ActivityType> for String {
    fn from(value: ActivityType) -> Self {
        match value {
            ActivityType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-activity-type metadata
///
/// Each variant carries only the fields its activity type uses. Fields are
/// optional because collaborators are not required to fill every one of
/// them; the formatter substitutes neutral wording for anything missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityDetails {
    WordCreated {
        word_name: Option<String>,
        language_code: Option<String>,
    },
    TranslationAdded {
        word_name: Option<String>,
        language_code: Option<String>,
        target_language_code: Option<String>,
    },
    SynonymAdded {
        word_name: Option<String>,
        language_code: Option<String>,
        synonyms_count: Option<u32>,
    },
    WordApproved {
        word_name: Option<String>,
        language_code: Option<String>,
    },
    WordVerified {
        word_name: Option<String>,
        language_code: Option<String>,
    },
    CommunityPostCreated {
        community_name: Option<String>,
        language_code: Option<String>,
    },
    UserRegistered,
    UserLoggedIn,
    CommunityJoined {
        community_name: Option<String>,
        language_code: Option<String>,
    },
    CommunityCreated {
        community_name: Option<String>,
        language_code: Option<String>,
    },
    CommentAdded {
        word_name: Option<String>,
        community_name: Option<String>,
        language_code: Option<String>,
    },
    Other {
        activity_type: String,
        language_code: Option<String>,
    },
}

impl ActivityDetails {
    /// Build the typed details for `activity_type` from a wire metadata object
    ///
    /// Only the keys relevant to the activity type are read; everything else
    /// in the map is ignored.
    pub fn from_metadata(activity_type: &ActivityType, metadata: &Map<String, Value>) -> Self {
        let text = |key: &str| string_field(metadata, key);
        match activity_type {
            ActivityType::WordCreated => Self::WordCreated {
                word_name: text("wordName"),
                language_code: text("languageCode"),
            },
            ActivityType::TranslationAdded => Self::TranslationAdded {
                word_name: text("wordName"),
                language_code: text("languageCode"),
                target_language_code: text("targetLanguageCode"),
            },
            ActivityType::SynonymAdded => Self::SynonymAdded {
                word_name: text("wordName"),
                language_code: text("languageCode"),
                synonyms_count: count_field(metadata, "synonymsCount"),
            },
            ActivityType::WordApproved => Self::WordApproved {
                word_name: text("wordName"),
                language_code: text("languageCode"),
            },
            ActivityType::WordVerified => Self::WordVerified {
                word_name: text("wordName"),
                language_code: text("languageCode"),
            },
            ActivityType::CommunityPostCreated => Self::CommunityPostCreated {
                community_name: text("communityName"),
                language_code: text("languageCode"),
            },
            ActivityType::UserRegistered => Self::UserRegistered,
            ActivityType::UserLoggedIn => Self::UserLoggedIn,
            ActivityType::CommunityJoined => Self::CommunityJoined {
                community_name: text("communityName"),
                language_code: text("languageCode"),
            },
            ActivityType::CommunityCreated => Self::CommunityCreated {
                community_name: text("communityName"),
                language_code: text("languageCode"),
            },
            ActivityType::CommentAdded => Self::CommentAdded {
                word_name: text("wordName"),
                community_name: text("communityName"),
                language_code: text("languageCode"),
            },
            ActivityType::Other(name) => Self::Other {
                activity_type: name.clone(),
                language_code: text("languageCode"),
            },
        }
    }

    pub fn activity_type(&self) -> ActivityType {
        match self {
            Self::WordCreated { .. } => ActivityType::WordCreated,
            Self::TranslationAdded { .. } => ActivityType::TranslationAdded,
            Self::SynonymAdded { .. } => ActivityType::SynonymAdded,
            Self::WordApproved { .. } => ActivityType::WordApproved,
            Self::WordVerified { .. } => ActivityType::WordVerified,
            Self::CommunityPostCreated { .. } => ActivityType::CommunityPostCreated,
            Self::UserRegistered => ActivityType::UserRegistered,
            Self::UserLoggedIn => ActivityType::UserLoggedIn,
            Self::CommunityJoined { .. } => ActivityType::CommunityJoined,
            Self::CommunityCreated { .. } => ActivityType::CommunityCreated,
            Self::CommentAdded { .. } => ActivityType::CommentAdded,
            Self::Other { activity_type, .. } => ActivityType::Other(activity_type.clone()),
        }
    }

    /// Source language of the activity, if it has one
    pub fn language_code(&self) -> Option<&str> {
        match self {
            Self::WordCreated { language_code, .. }
            | Self::TranslationAdded { language_code, .. }
            | Self::SynonymAdded { language_code, .. }
            | Self::WordApproved { language_code, .. }
            | Self::WordVerified { language_code, .. }
            | Self::CommunityPostCreated { language_code, .. }
            | Self::CommunityJoined { language_code, .. }
            | Self::CommunityCreated { language_code, .. }
            | Self::CommentAdded { language_code, .. }
            | Self::Other { language_code, .. } => language_code.as_deref(),
            Self::UserRegistered | Self::UserLoggedIn => None,
        }
    }

    /// Target language, only present on translations
    pub fn target_language_code(&self) -> Option<&str> {
        match self {
            Self::TranslationAdded { target_language_code, .. } => target_language_code.as_deref(),
            _ => None,
        }
    }

    pub fn word_name(&self) -> Option<&str> {
        match self {
            Self::WordCreated { word_name, .. }
            | Self::TranslationAdded { word_name, .. }
            | Self::SynonymAdded { word_name, .. }
            | Self::WordApproved { word_name, .. }
            | Self::WordVerified { word_name, .. }
            | Self::CommentAdded { word_name, .. } => word_name.as_deref(),
            _ => None,
        }
    }

    pub fn community_name(&self) -> Option<&str> {
        match self {
            Self::CommunityPostCreated { community_name, .. }
            | Self::CommunityJoined { community_name, .. }
            | Self::CommunityCreated { community_name, .. }
            | Self::CommentAdded { community_name, .. } => community_name.as_deref(),
            _ => None,
        }
    }

    /// Every language code this activity touches (source first, then target)
    pub fn language_codes(&self) -> impl Iterator<Item = &str> {
        self.language_code().into_iter().chain(self.target_language_code())
    }

    /// Rebuild the wire metadata object for these details
    pub fn to_metadata(&self) -> Map<String, Value> {
        let mut map = Map::new();
        let mut put = |key: &str, value: Option<&str>| {
            if let Some(value) = value {
                map.insert(key.to_string(), Value::String(value.to_string()));
            }
        };
        put("wordName", self.word_name());
        put("languageCode", self.language_code());
        put("targetLanguageCode", self.target_language_code());
        put("communityName", self.community_name());
        if let Self::SynonymAdded { synonyms_count: Some(count), .. } = self {
            map.insert("synonymsCount".to_string(), Value::from(*count));
        }
        map
    }
}

/// A domain activity as received from a collaborator (typed form)
///
/// The hub never persists or mutates these; it only reads them to build
/// `FormattedActivity` payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEvent {
    pub id: String,
    pub actor_user_id: Option<String>,
    pub actor_username: Option<String>,
    pub details: ActivityDetails,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    /// Flag glyph supplied by the collaborator (`metadata.languageFlag`)
    pub language_flag: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_public: bool,
}

impl ActivityEvent {
    /// Create a public activity with no actor or entity, timestamped now
    pub fn new(id: impl Into<String>, details: ActivityDetails) -> Self {
        Self {
            id: id.into(),
            actor_user_id: None,
            actor_username: None,
            details,
            entity_type: None,
            entity_id: None,
            language_flag: None,
            created_at: Utc::now(),
            is_public: true,
        }
    }

    pub fn with_actor(mut self, user_id: impl Into<String>, username: impl Into<String>) -> Self {
        self.actor_user_id = Some(user_id.into());
        self.actor_username = Some(username.into());
        self
    }

    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.language_flag = Some(flag.into());
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn activity_type(&self) -> ActivityType {
        self.details.activity_type()
    }

    /// Convert back to the camelCase wire form
    pub fn to_raw(&self) -> RawActivityEvent {
        let mut metadata = self.details.to_metadata();
        if let Some(flag) = &self.language_flag {
            metadata.insert("languageFlag".to_string(), Value::String(flag.clone()));
        }
        RawActivityEvent {
            id: Some(self.id.clone()),
            actor_user_id: self.actor_user_id.clone(),
            actor_username: self.actor_username.clone(),
            activity_type: Some(self.activity_type().to_string()),
            entity_type: self.entity_type.clone(),
            entity_id: self.entity_id.clone(),
            metadata,
            created_at: Some(self.created_at),
            is_public: self.is_public,
        }
    }
}

/// Wire form of an activity event
///
/// Accepts both the `actorUserId`/`actorUsername` names and the shorter
/// `userId`/`username` ones collaborators have historically sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawActivityEvent {
    #[serde(default, deserialize_with = "id_from_any")]
    pub id: Option<String>,
    #[serde(default, alias = "userId")]
    pub actor_user_id: Option<String>,
    #[serde(default, alias = "username")]
    pub actor_username: Option<String>,
    #[serde(default)]
    pub activity_type: Option<String>,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default, deserialize_with = "id_from_any")]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

fn default_public() -> bool {
    true
}

/// Identifiers arrive as strings or numbers depending on the collaborator
fn id_from_any<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

impl TryFrom<RawActivityEvent> for ActivityEvent {
    type Error = SharedError;

    fn try_from(raw: RawActivityEvent) -> Result<Self, Self::Error> {
        let id = raw
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| SharedError::malformed("activity is missing an id"))?;
        let activity_type: ActivityType = raw
            .activity_type
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| SharedError::malformed(format!("activity {id} is missing activityType")))?
            .into();

        let details = ActivityDetails::from_metadata(&activity_type, &raw.metadata);
        let language_flag = string_field(&raw.metadata, "languageFlag");

        Ok(Self {
            id,
            actor_user_id: raw.actor_user_id,
            actor_username: raw.actor_username,
            details,
            entity_type: raw.entity_type,
            entity_id: raw.entity_id,
            language_flag,
            created_at: raw.created_at.unwrap_or_else(Utc::now),
            is_public: raw.is_public,
        })
    }
}

/// Enriched, ready-to-send activity
///
/// Computed per delivery from an `ActivityEvent`; never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedActivity {
    #[serde(flatten)]
    pub activity: RawActivityEvent,
    pub message: String,
    pub time_ago: String,
    pub flag: String,
    pub priority: u8,
}

fn string_field(metadata: &Map<String, Value>, key: &str) -> Option<String> {
    match metadata.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn count_field(metadata: &Map<String, Value>, key: &str) -> Option<u32> {
    match metadata.get(key)? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        Value::Array(items) => u32::try_from(items.len()).ok(),
        _ => None,
    }
}
