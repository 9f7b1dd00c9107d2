// SPDX-FileCopyrightText: 2026 Foreman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded, time-aware response cache.
//!
//! Entries are keyed by the SHA-256 of `provider:model:command`, expire after
//! a fixed TTL, and are evicted least-recently-used once the cache is full.
//! Uses `tokio::time::Instant` so TTL behavior follows the runtime clock
//! (including paused test clocks).

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use foreman_config::CacheConfig;
use foreman_core::TierResponse;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::time::Instant;
use tracing::{debug, warn};

/// Cache key for a command as asked of a given model and provider.
pub fn cache_key(command: &str, model: &str, provider_id: &str) -> String {
    let digest = Sha256::digest(format!("{provider_id}:{model}:{command}").as_bytes());
    hex::encode(digest)
}

#[derive(Debug, Clone)]
struct CacheEntry {
    response: TierResponse,
    stored_at: Instant,
    last_access: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    access_clock: u64,
}

impl CacheState {
    fn tick(&mut self) -> u64 {
        self.access_clock += 1;
        self.access_clock
    }
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub size: usize,
    pub hit_rate: f64,
}

/// LRU response cache with TTL expiry, safe for concurrent use.
///
/// The cache never fails a request. A poisoned lock is recovered with every
/// entry dropped; the call that finds it is a miss or a skipped write.
pub struct ResponseCache {
    state: Mutex<CacheState>,
    max_entries: usize,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl ResponseCache {
    /// Create a cache holding at most `max_entries` responses for `ttl` each.
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            max_entries: max_entries.max(1),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
        }
    }

    /// Create a cache from the `[cache]` config section.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_entries, Duration::from_secs(config.ttl_secs))
    }

    /// Look up a response. Hits come back with `from_cache = true`.
    pub fn get(&self, command: &str, model: &str, provider_id: &str) -> Option<TierResponse> {
        let key = cache_key(command, model, provider_id);

        let Ok(mut state) = self.lock_state() else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        let now = Instant::now();
        let expired = match state.entries.get(&key) {
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(key = %short(&key), "cache miss");
                return None;
            }
            Some(entry) => now.duration_since(entry.stored_at) >= self.ttl,
        };

        if expired {
            state.entries.remove(&key);
            self.expirations.fetch_add(1, Ordering::Relaxed);
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!(key = %short(&key), "cache entry expired");
            return None;
        }

        let tick = state.tick();
        let entry = state.entries.get_mut(&key)?;
        entry.last_access = tick;
        self.hits.fetch_add(1, Ordering::Relaxed);
        debug!(key = %short(&key), "cache hit");
        Some(entry.response.with_cache_flag(true))
    }

    /// Store a response, evicting the least recently used entries if full.
    pub fn put(&self, command: &str, model: &str, provider_id: &str, response: &TierResponse) {
        let key = cache_key(command, model, provider_id);

        let Ok(mut state) = self.lock_state() else {
            return;
        };

        let tick = state.tick();
        state.entries.insert(
            key,
            CacheEntry {
                response: response.with_cache_flag(false),
                stored_at: Instant::now(),
                last_access: tick,
            },
        );
        self.evict_over_capacity(&mut state);
    }

    /// `Err` holds the guard of a lock that was poisoned and has just been
    /// recovered empty.
    fn lock_state(&self) -> Result<MutexGuard<'_, CacheState>, MutexGuard<'_, CacheState>> {
        self.state.lock().map_err(|poisoned| {
            warn!("response cache lock poisoned, dropping all entries");
            let mut state = poisoned.into_inner();
            state.entries.clear();
            self.state.clear_poison();
            state
        })
    }

    fn evict_over_capacity(&self, state: &mut CacheState) {
        while state.entries.len() > self.max_entries {
            let before = state.entries.len();
            let lru = state
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(key, _)| key.clone());
            if let Some(key) = lru {
                state.entries.remove(&key);
            }

            if state.entries.len() >= before {
                warn!(
                    size = before,
                    max_entries = self.max_entries,
                    "cache eviction made no progress, clearing cache"
                );
                state.entries.clear();
                break;
            }
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Number of stored entries (expired ones included until touched).
    pub fn len(&self) -> usize {
        self.lock_state().unwrap_or_else(|state| state).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&self) {
        self.lock_state()
            .unwrap_or_else(|state| state)
            .entries
            .clear();
    }

    /// Snapshot of hit/miss/eviction counters.
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;
        CacheStats {
            hits,
            misses,
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            size: self.len(),
            hit_rate: if lookups == 0 {
                0.0
            } else {
                hits as f64 / lookups as f64
            },
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

fn short(key: &str) -> &str {
    key.get(..12).unwrap_or(key)
}
