//! TTL cache for computed recommendations.
//!
//! Keyed by `(entity_id, vector content hash)` so any change to an
//! entity's feature vector misses the cache. Expiry runs against an
//! injected [`Clock`], which makes TTL behavior testable without sleeps.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use waypoint_core::recommendation::MovementRecommendation;
use waypoint_core::{Clock, FxHashMap};

#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

struct CacheEntry {
    recommendation: MovementRecommendation,
    inserted_at: DateTime<Utc>,
}

pub struct RecommendationCache {
    entries: Mutex<FxHashMap<(String, u64), CacheEntry>>,
    ttl: Duration,
    capacity: usize,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RecommendationCache {
    pub fn new(ttl_secs: u64, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(FxHashMap::default()),
            ttl: Duration::seconds(ttl_secs as i64),
            capacity: capacity.max(1),
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Fresh entry for the key, if any. Expired entries are dropped on
    /// the way out and count as misses.
    pub fn get(&self, entity_id: &str, vector_hash: u64) -> Option<MovementRecommendation> {
        let key = (entity_id.to_string(), vector_hash);
        let mut entries = self.entries.lock().unwrap();
        let now = self.clock.now();
        match entries.get(&key) {
            Some(entry) if now - entry.inserted_at <= self.ttl => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.recommendation.clone())
            }
            Some(_) => {
                entries.remove(&key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn insert(
        &self,
        entity_id: &str,
        vector_hash: u64,
        recommendation: MovementRecommendation,
    ) {
        let key = (entity_id.to_string(), vector_hash);
        let mut entries = self.entries.lock().unwrap();
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            // At capacity: evict the oldest entry.
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, e)| e.inserted_at)
                .map(|(k, _)| k.clone())
            {
                debug!(entity_id = %oldest.0, "evicting oldest cache entry");
                entries.remove(&oldest);
            }
        }
        entries.insert(
            key,
            CacheEntry {
                recommendation,
                inserted_at: self.clock.now(),
            },
        );
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.lock().unwrap().len(),
        }
    }
}
