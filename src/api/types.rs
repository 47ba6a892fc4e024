//! Shared types for the API layer.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::Connection;

use crate::cache::TtlCache;
use crate::config::{DEFAULT_DOG_CACHE_CAPACITY, DEFAULT_DOG_CACHE_TTL_SECS};
use crate::core_state::{CoreError, CoreState};
use crate::db;
use crate::models::DogSummary;

// ═══════════════════════════════════════════════════════════
// API context: shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
/// Wraps `CoreState` plus API-specific caches.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
    pub dog_cache: Arc<Mutex<TtlCache<String, DogSummary>>>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self::with_dog_cache(
            core,
            Duration::from_secs(DEFAULT_DOG_CACHE_TTL_SECS),
            DEFAULT_DOG_CACHE_CAPACITY,
        )
    }

    pub fn with_dog_cache(core: Arc<CoreState>, ttl: Duration, capacity: usize) -> Self {
        Self {
            core,
            dog_cache: Arc::new(Mutex::new(TtlCache::new(ttl, capacity))),
        }
    }

    /// Dog display fields, served from cache when fresh.
    ///
    /// Runs under the caller's DB guard; a missing dog yields `None` and is
    /// not cached.
    pub fn dog_summary(
        &self,
        conn: &Connection,
        dog_id: &str,
    ) -> Result<Option<DogSummary>, CoreError> {
        let key = dog_id.to_string();
        {
            let mut cache = self.dog_cache.lock().map_err(|_| CoreError::LockPoisoned)?;
            if let Some(hit) = cache.get(&key) {
                return Ok(Some(hit));
            }
        }

        let summary = db::get_dog_summary(conn, dog_id).map_err(CoreError::from)?;
        if let Some(summary) = &summary {
            let mut cache = self.dog_cache.lock().map_err(|_| CoreError::LockPoisoned)?;
            cache.insert(key, summary.clone());
        }
        Ok(summary)
    }

    /// Drop a cached dog summary, e.g. after the dog was edited.
    pub fn invalidate_dog(&self, dog_id: &str) -> Result<bool, CoreError> {
        let mut cache = self.dog_cache.lock().map_err(|_| CoreError::LockPoisoned)?;
        Ok(cache.invalidate(&dog_id.to_string()))
    }
}
