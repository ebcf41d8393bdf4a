//! Activity enrichment
//!
//! - **`formatter`** - message templates, relative time, flag glyph
//! - **`priority`** - 1-10 broadcast priority
//! - **`feed`** - recent-activity source for client requests

pub mod feed;
pub mod formatter;
pub mod priority;

pub use feed::{clamp_limit, prioritize, ActivityFeed, RecentActivities};
pub use formatter::{time_ago, ActivityFormatter, LanguageNames, DEFAULT_FLAG};
pub use priority::PriorityScorer;
