//! Language Reference Cache
//!
//! Maps language codes to display names for the activity formatter.
//!
//! # Read Path
//!
//! [`LanguageCache::get`] never performs I/O. It consults the last snapshot
//! loaded from the backing [`LanguageSource`] and then the static table in
//! [`super::fallback`].
//!
//! # Refresh Path
//!
//! [`LanguageCache::refresh`] reloads the whole snapshot. Refreshes are
//! single-flighted: callers that arrive while one is in flight wait for it and
//! reuse its outcome, success or failure, instead of hitting the store again.
//! The new snapshot is
//! swapped in under a short write lock, so readers see either the old or the
//! new map, never a partial one.
//!
//! A failed refresh keeps the previous snapshot. When a lookup misses and
//! the snapshot is older than the configured TTL, a background refresh is
//! scheduled and the lookup returns immediately. After a failed attempt,
//! lookups wait [`RETRY_COOLDOWN`] before scheduling another one.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use super::fallback::static_language_name;
use super::source::{LanguageSource, ReferenceError};

/// Minimum gap between a failed refresh and the next lookup-triggered one
pub const RETRY_COOLDOWN: Duration = Duration::from_secs(30);

#[derive(Debug, Default)]
struct Snapshot {
    names: HashMap<String, String>,
    refreshed_at: Option<Instant>,
}

/// Outcome of the most recent refresh attempt
#[derive(Debug, Clone)]
struct Attempt {
    at: Instant,
    /// `None` on success
    error: Option<String>,
}

struct Inner {
    snapshot: RwLock<Arc<Snapshot>>,
    source: Option<Arc<dyn LanguageSource>>,
    ttl: Duration,
    /// Serializes refreshes
    refresh_lock: Mutex<()>,
    /// Bumped after every successful refresh
    generation: AtomicU64,
    /// Bumped after every attempt, successful or not
    attempts: AtomicU64,
    last_attempt: RwLock<Option<Attempt>>,
    /// Set while a background refresh task is scheduled
    background: AtomicBool,
}

/// Cloneable handle to the shared language cache
#[derive(Clone)]
pub struct LanguageCache {
    inner: Arc<Inner>,
}

impl LanguageCache {
    /// Create a cache backed by `source`, considered stale after `ttl`
    pub fn new(source: Arc<dyn LanguageSource>, ttl: Duration) -> Self {
        Self::build(Some(source), ttl)
    }

    /// Create a cache that only serves the static table
    pub fn static_only() -> Self {
        Self::build(None, Duration::MAX)
    }

    fn build(source: Option<Arc<dyn LanguageSource>>, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                snapshot: RwLock::new(Arc::new(Snapshot::default())),
                source,
                ttl,
                refresh_lock: Mutex::new(()),
                generation: AtomicU64::new(0),
                attempts: AtomicU64::new(0),
                last_attempt: RwLock::new(None),
                background: AtomicBool::new(false),
            }),
        }
    }

    fn snapshot(&self) -> Arc<Snapshot> {
        self.inner
            .snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Cache-only lookup
    ///
    /// Returns `None` when neither the loaded snapshot nor the static table
    /// knows `code`.
    pub fn get(&self, code: &str) -> Option<String> {
        let code = code.trim().to_lowercase();
        if let Some(name) = self.snapshot().names.get(&code) {
            return Some(name.clone());
        }
        static_language_name(&code).map(str::to_string)
    }

    /// Lookup that schedules a background refresh on a stale miss
    pub fn lookup(&self, code: &str) -> Option<String> {
        let found = self.get(code);
        if found.is_none() && self.is_stale() && !self.cooling_down() {
            self.schedule_refresh();
        }
        found
    }

    /// Whether the snapshot is older than the TTL (or was never loaded)
    pub fn is_stale(&self) -> bool {
        if self.inner.source.is_none() {
            return false;
        }
        match self.snapshot().refreshed_at {
            Some(at) => at.elapsed() > self.inner.ttl,
            None => true,
        }
    }

    /// Whether the last attempt failed less than [`RETRY_COOLDOWN`] ago
    fn cooling_down(&self) -> bool {
        match self.last_attempt() {
            Some(Attempt { at, error: Some(_) }) => at.elapsed() < RETRY_COOLDOWN,
            _ => false,
        }
    }

    fn last_attempt(&self) -> Option<Attempt> {
        self.inner
            .last_attempt
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record_attempt(&self, error: Option<String>) {
        *self
            .inner
            .last_attempt
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Attempt {
            at: Instant::now(),
            error,
        });
        self.inner.attempts.fetch_add(1, Ordering::AcqRel);
    }

    /// Number of codes loaded from the backing store
    pub fn len(&self) -> usize {
        self.snapshot().names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Successful refreshes so far
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::Acquire)
    }

    /// Reload the snapshot from the backing store
    ///
    /// Returns the number of loaded codes. On failure the previous snapshot
    /// stays in place and the error is logged and returned. Callers that
    /// waited on an in-flight attempt get that attempt's outcome.
    pub async fn refresh(&self) -> Result<usize, ReferenceError> {
        let source = self.inner.source.clone().ok_or(ReferenceError::NoSource)?;
        let seen = self.inner.attempts.load(Ordering::Acquire);

        let _guard = self.inner.refresh_lock.lock().await;
        if self.inner.attempts.load(Ordering::Acquire) != seen {
            // Another caller attempted while we waited.
            return match self.last_attempt().and_then(|attempt| attempt.error) {
                None => Ok(self.len()),
                Some(message) => Err(ReferenceError::Unavailable(message)),
            };
        }

        match source.find_all_languages().await {
            Ok(records) => {
                let names: HashMap<String, String> = records
                    .into_iter()
                    .filter(|record| !record.code.trim().is_empty())
                    .map(|record| (record.code.trim().to_lowercase(), record.display_name))
                    .collect();
                let count = names.len();
                let fresh = Arc::new(Snapshot {
                    names,
                    refreshed_at: Some(Instant::now()),
                });
                *self
                    .inner
                    .snapshot
                    .write()
                    .unwrap_or_else(PoisonError::into_inner) = fresh;
                self.inner.generation.fetch_add(1, Ordering::AcqRel);
                self.record_attempt(None);
                tracing::info!(languages = count, "[Reference] Language cache refreshed");
                Ok(count)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    cached = self.len(),
                    "[Reference] Language refresh failed, serving cached and static names"
                );
                let message = match &e {
                    ReferenceError::Unavailable(message) => message.clone(),
                    other => other.to_string(),
                };
                self.record_attempt(Some(message));
                Err(e)
            }
        }
    }

    /// Spawn a refresh unless one is already scheduled
    ///
    /// A no-op outside a Tokio runtime.
    pub fn schedule_refresh(&self) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("[Reference] No runtime available, skipping background refresh");
            return;
        };
        if self
            .inner
            .background
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let cache = self.clone();
        handle.spawn(async move {
            // Errors are already logged inside refresh.
            let _ = cache.refresh().await;
            cache.inner.background.store(false, Ordering::Release);
        });
    }
}
