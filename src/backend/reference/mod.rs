//! Reference data used while enriching activities
//!
//! - **`source`** - the backing store trait and its Postgres implementation
//! - **`cache`** - TTL-refreshed, single-flighted `code -> name` cache
//! - **`fallback`** - built-in names served when the store never answered

pub mod cache;
pub mod fallback;
pub mod source;

pub use cache::{LanguageCache, RETRY_COOLDOWN};
pub use fallback::static_language_name;
pub use source::{LanguageRecord, LanguageSource, PgLanguageSource, ReferenceError};
