//! In-memory resolution cache.
//!
//! Maps a normalized candidate string plus a coarse reference-location
//! bucket to the scored result a lookup produced, or to a definitive
//! "nothing found". Transport failures are never recorded.
//!
//! Key properties:
//! - Entries live for the process lifetime unless a TTL is configured
//! - Safe to share across concurrent resolutions (`RwLock` + atomics)
//! - A poisoned lock degrades to a miss rather than an error

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::types::{LatLng, ScoredResult};

/// Reference locations are bucketed to two decimal places (roughly 1 km).
const BUCKET_SCALE: f64 = 100.0;

static GLOBAL_CACHE: LazyLock<Arc<ResolutionCache>> =
    LazyLock::new(|| Arc::new(ResolutionCache::new()));

// ═══════════════════════════════════════════════════════════
// CacheKey
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    address: String,
    bucket: Option<(i32, i32)>,
}

impl CacheKey {
    /// Case and whitespace differences map to the same key. Punctuation is kept.
    pub fn new(candidate: &str, reference: Option<LatLng>) -> Self {
        let address = candidate
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        let bucket = reference.map(|r| {
            (
                (r.lat * BUCKET_SCALE).round() as i32,
                (r.lng * BUCKET_SCALE).round() as i32,
            )
        });
        Self { address, bucket }
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

// ═══════════════════════════════════════════════════════════
// CacheEntry
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum CacheEntry {
    Found(ScoredResult),
    /// The provider answered definitively with no results.
    NotFound,
}

#[derive(Debug, Clone)]
struct StoredEntry {
    entry: CacheEntry,
    inserted_at: DateTime<Utc>,
}

// ═══════════════════════════════════════════════════════════
// ResolutionCache
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug)]
pub struct ResolutionCache {
    entries: RwLock<HashMap<CacheKey, StoredEntry>>,
    ttl: Option<Duration>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResolutionCache {
    /// A cache whose entries never expire.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: None,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// A cache whose entries are ignored once older than `ttl`.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            ..Self::new()
        }
    }

    /// Process-wide instance shared by resolvers that do not bring their own.
    pub fn global() -> Arc<ResolutionCache> {
        Arc::clone(&GLOBAL_CACHE)
    }

    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let found = self.entries.read().ok().and_then(|entries| {
            entries
                .get(key)
                .filter(|stored| !self.is_expired(stored))
                .map(|stored| stored.entry.clone())
        });
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Insert or overwrite. Expired entries are pruned on the way.
    pub fn insert(&self, key: CacheKey, entry: CacheEntry) {
        if let Ok(mut entries) = self.entries.write() {
            if let Some(ttl) = self.ttl {
                let cutoff = Utc::now() - ttl;
                entries.retain(|_, stored| stored.inserted_at > cutoff);
            }
            entries.insert(
                key,
                StoredEntry {
                    entry,
                    inserted_at: Utc::now(),
                },
            );
        }
    }

    /// Drop all entries and reset counters.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn is_expired(&self, stored: &StoredEntry) -> bool {
        self.ttl
            .is_some_and(|ttl| Utc::now() - stored.inserted_at > ttl)
    }
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
