/**
 * Reference Data Source
 *
 * The backing store the language cache refreshes from. The hub only ever
 * needs one operation from it: list every language with its display name.
 *
 * The trait is the seam tests use to substitute an in-memory or failing
 * source; production wires `PgLanguageSource` when `DATABASE_URL` is set.
 */

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

/// One row of reference data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageRecord {
    pub code: String,
    pub display_name: String,
}

impl LanguageRecord {
    pub fn new(code: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            display_name: display_name.into(),
        }
    }
}

/// Errors from the reference data source
#[derive(Debug, Error)]
pub enum ReferenceError {
    /// The backing store could not be reached or answered with an error
    #[error("reference data unavailable: {0}")]
    Unavailable(String),

    /// Database error from the Postgres source
    #[error("reference database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The cache has no backing source configured
    #[error("no reference data source configured")]
    NoSource,
}

/// Backing store for language reference data
#[async_trait]
pub trait LanguageSource: Send + Sync {
    /// Return every known language
    async fn find_all_languages(&self) -> Result<Vec<LanguageRecord>, ReferenceError>;
}

/// Postgres-backed source reading the `languages` table
#[derive(Clone)]
pub struct PgLanguageSource {
    pool: PgPool,
}

impl PgLanguageSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LanguageSource for PgLanguageSource {
    async fn find_all_languages(&self) -> Result<Vec<LanguageRecord>, ReferenceError> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT code, name FROM languages ORDER BY code",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(code, name)| LanguageRecord::new(code, name))
            .collect())
    }
}
