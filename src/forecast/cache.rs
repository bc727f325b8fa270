//! Content-addressed cache of forecast outcomes
//!
//! A forecast is fully determined by the dataset contents and the request,
//! so outcomes are keyed by a SHA-256 over the dataset version, the sorted
//! vintage selection, the horizon, the discount rate and the curve mode.
//! Nothing expires on its own: callers invalidate a dataset version when it
//! is replaced, or clear the cache.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;

use super::engine::ForecastOutcome;
use super::request::ForecastRequest;
use crate::account::loader::hex_encode;

/// Hex SHA-256 identifying one (dataset, request) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(dataset_version: &str, request: &ForecastRequest) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(dataset_version.as_bytes());
        hasher.update([0u8]);
        for vintage in request.normalized_vintages() {
            hasher.update(vintage.to_string().as_bytes());
            hasher.update([b',']);
        }
        hasher.update([0u8]);
        hasher.update(request.horizon_months.to_le_bytes());
        hasher.update(request.discount_rate_pct.to_bits().to_le_bytes());
        hasher.update([request.cumulative as u8]);
        CacheKey(hex_encode(&hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Cached outcome; `None` records a run that selected no accounts
#[derive(Debug, Clone)]
struct CacheEntry {
    dataset_version: String,
    outcome: Option<Arc<ForecastOutcome>>,
}

/// Cache manager for forecast outcomes
#[derive(Debug, Default)]
pub struct ForecastCache {
    entries: HashMap<CacheKey, CacheEntry>,

    /// Statistics
    pub cache_hits: u64,
    pub cache_misses: u64,
}

impl ForecastCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an outcome; the outer `Option` is the cache hit
    pub fn get(&self, key: &CacheKey) -> Option<Option<Arc<ForecastOutcome>>> {
        self.entries.get(key).map(|e| e.outcome.clone())
    }

    pub fn insert(&mut self, key: CacheKey, dataset_version: &str, outcome: Option<Arc<ForecastOutcome>>) {
        self.entries.insert(
            key,
            CacheEntry {
                dataset_version: dataset_version.to_string(),
                outcome,
            },
        );
    }

    /// Return the cached outcome or compute and store it; errors are not cached
    pub fn get_or_compute<E, F>(
        &mut self,
        dataset_version: &str,
        request: &ForecastRequest,
        compute: F,
    ) -> Result<Option<Arc<ForecastOutcome>>, E>
    where
        F: FnOnce() -> Result<Option<ForecastOutcome>, E>,
    {
        let key = CacheKey::new(dataset_version, request);
        if let Some(outcome) = self.get(&key) {
            self.record_hit();
            return Ok(outcome);
        }

        self.record_miss();
        let outcome = compute()?.map(Arc::new);
        self.insert(key, dataset_version, outcome.clone());
        Ok(outcome)
    }

    /// Drop every entry computed from a dataset version; returns how many were removed
    pub fn invalidate_dataset(&mut self, dataset_version: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.dataset_version != dataset_version);
        before - self.entries.len()
    }

    /// Clear all cached data
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cache_hits = 0;
        self.cache_misses = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn record_hit(&mut self) {
        self.cache_hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.cache_misses += 1;
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}
