//! TTL-bounded cache of probe results.
//!
//! Keyed by (provider, model, probe kind). Every entry carries an absolute
//! expiry and is never served at or past it, no matter how often it is read.
//! Reads and writes go through one `RwLock`, so a write is visible to every
//! later read of the same key.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::{CacheKey, ProbeResult};
use crate::ports::Clock;

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// Live entry; the result is marked `from_cache`.
    Hit(ProbeResult),
    Miss,
}

impl CacheLookup {
    pub const fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    result: ProbeResult,
    expires_at: DateTime<Utc>,
}

/// Process-lifetime probe result cache.
pub struct ResultCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl ResultCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    fn expiry_from(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        chrono::Duration::from_std(self.ttl)
            .ok()
            .and_then(|ttl| start.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Look up a key. Expired entries are evicted and reported as a miss.
    pub async fn get(&self, key: &CacheKey) -> CacheLookup {
        let now = self.clock.now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return CacheLookup::Miss,
                Some(entry) if now < entry.expires_at => {
                    let mut result = entry.result.clone();
                    result.from_cache = true;
                    return CacheLookup::Hit(result);
                }
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| now >= e.expires_at) {
            entries.remove(key);
            debug!(cache_key = %key, "Evicted expired cache entry");
        }
        CacheLookup::Miss
    }

    /// Store a result expiring one TTL from now.
    ///
    /// Only definitive outcomes are stored. Returns whether the result was cached.
    pub async fn set(&self, result: ProbeResult) -> bool {
        let expires_at = self.expiry_from(self.clock.now());
        self.set_with_expiry(result, expires_at).await
    }

    /// Store a result with an explicit absolute expiry.
    pub async fn set_with_expiry(&self, mut result: ProbeResult, expires_at: DateTime<Utc>) -> bool {
        if !result.outcome.is_cacheable() || result.retries_exhausted {
            return false;
        }
        result.from_cache = false;
        let key = result.cache_key();
        self.entries
            .write()
            .await
            .insert(key, CacheEntry { result, expires_at });
        true
    }

    /// Seed the cache from persisted results, expiring one TTL after each was recorded.
    ///
    /// The most recently recorded result per key decides: if it is not
    /// cacheable the key stays cold, even when an older result would be.
    /// Results already past their TTL are skipped. Returns the number of live
    /// entries seeded.
    pub async fn warm(&self, results: impl IntoIterator<Item = ProbeResult> + Send) -> usize {
        let now = self.clock.now();
        let mut latest: HashMap<CacheKey, ProbeResult> = HashMap::new();
        for result in results {
            let key = result.cache_key();
            match latest.get(&key) {
                Some(existing) if existing.recorded_at >= result.recorded_at => {}
                _ => {
                    latest.insert(key, result);
                }
            }
        }

        let mut seeded = 0;
        let mut entries = self.entries.write().await;
        for (key, mut result) in latest {
            if !result.outcome.is_cacheable() || result.retries_exhausted {
                continue;
            }
            let expires_at = self.expiry_from(result.recorded_at);
            if now >= expires_at {
                continue;
            }
            result.from_cache = false;
            entries.insert(key, CacheEntry { result, expires_at });
            seeded += 1;
        }
        seeded
    }

    /// Remove one key. Returns whether it was present.
    pub async fn invalidate(&self, key: &CacheKey) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    /// Remove every key for a provider. Returns how many were removed.
    pub async fn invalidate_provider(&self, provider_id: &str) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| key.provider_id != provider_id);
        before - entries.len()
    }

    /// Drop expired entries. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| now < entry.expires_at);
        before - entries.len()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Stored entries, including any not yet evicted after expiry.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ProbeKind, ProbeOutcome, TargetKey};
    use crate::ports::ManualClock;

    fn result(provider: &str, kind: ProbeKind, outcome: ProbeOutcome, at: DateTime<Utc>) -> ProbeResult {
        ProbeResult {
            target: TargetKey::new(provider, "m1"),
            kind,
            outcome,
            latency_ms: 120,
            time_to_first_chunk_ms: None,
            attempts: 1,
            retries_exhausted: false,
            reason: None,
            recorded_at: at,
            from_cache: false,
        }
    }

    fn cache_with_clock(ttl: Duration) -> (ResultCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        (ResultCache::new(ttl, clock.clone()), clock)
    }

    #[tokio::test]
    async fn hit_within_ttl_miss_after() {
        let (cache, clock) = cache_with_clock(Duration::from_secs(60));
        let r = result("alpha", ProbeKind::Existence, ProbeOutcome::Success, clock.now());
        let key = r.cache_key();
        assert!(cache.set(r).await);

        clock.advance(Duration::from_secs(59));
        match cache.get(&key).await {
            CacheLookup::Hit(hit) => assert!(hit.from_cache),
            CacheLookup::Miss => panic!("expected hit inside TTL"),
        }

        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get(&key).await, CacheLookup::Miss);
        assert!(cache.is_empty().await, "expired entry should be evicted on read");
    }

    #[tokio::test]
    async fn repeated_reads_do_not_extend_ttl() {
        let (cache, clock) = cache_with_clock(Duration::from_secs(10));
        let r = result("alpha", ProbeKind::Vision, ProbeOutcome::NotFound, clock.now());
        let key = r.cache_key();
        cache.set(r).await;

        for _ in 0..9 {
            clock.advance(Duration::from_secs(1));
            assert!(cache.get(&key).await.is_hit());
        }
        clock.advance(Duration::from_secs(1));
        assert!(!cache.get(&key).await.is_hit());
    }

    #[tokio::test]
    async fn retryable_and_exhausted_outcomes_are_not_cached() {
        let (cache, clock) = cache_with_clock(Duration::from_secs(60));
        assert!(!cache.set(result("alpha", ProbeKind::Existence, ProbeOutcome::Timeout, clock.now())).await);
        assert!(!cache.set(result("alpha", ProbeKind::Existence, ProbeOutcome::BreakerOpen, clock.now())).await);

        let mut exhausted = result("alpha", ProbeKind::Streaming, ProbeOutcome::Success, clock.now());
        exhausted.retries_exhausted = true;
        assert!(!cache.set(exhausted).await);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn invalidate_by_key_and_provider() {
        let (cache, clock) = cache_with_clock(Duration::from_secs(60));
        let now = clock.now();
        let a1 = result("alpha", ProbeKind::Existence, ProbeOutcome::Success, now);
        let a2 = result("alpha", ProbeKind::Streaming, ProbeOutcome::Success, now);
        let b1 = result("beta", ProbeKind::Existence, ProbeOutcome::Success, now);
        let a1_key = a1.cache_key();
        cache.set(a1).await;
        cache.set(a2).await;
        cache.set(b1).await;

        assert!(cache.invalidate(&a1_key).await);
        assert!(!cache.invalidate(&a1_key).await);
        assert_eq!(cache.invalidate_provider("alpha").await, 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn warm_uses_recorded_at_and_skips_stale() {
        let (cache, clock) = cache_with_clock(Duration::from_secs(3600));
        let now = clock.now();
        let fresh = result("alpha", ProbeKind::Existence, ProbeOutcome::Success, now - chrono::Duration::minutes(30));
        let stale = result("beta", ProbeKind::Existence, ProbeOutcome::Success, now - chrono::Duration::hours(2));
        let fresh_key = fresh.cache_key();

        assert_eq!(cache.warm(vec![fresh, stale]).await, 1);
        assert!(cache.get(&fresh_key).await.is_hit());

        // Expires one TTL after it was recorded, not after warming
        clock.advance(Duration::from_secs(30 * 60));
        assert!(!cache.get(&fresh_key).await.is_hit());
    }

    #[tokio::test]
    async fn warm_prefers_latest_record_per_key() {
        let (cache, clock) = cache_with_clock(Duration::from_secs(3600));
        let now = clock.now();
        let older = result("alpha", ProbeKind::Vision, ProbeOutcome::NotFound, now - chrono::Duration::minutes(20));
        let newer = result("alpha", ProbeKind::Vision, ProbeOutcome::Success, now - chrono::Duration::minutes(5));
        let key = newer.cache_key();

        cache.warm(vec![newer, older]).await;
        match cache.get(&key).await {
            CacheLookup::Hit(hit) => assert_eq!(hit.outcome, ProbeOutcome::Success),
            CacheLookup::Miss => panic!("expected warmed entry"),
        }
    }

    #[tokio::test]
    async fn warm_does_not_revive_success_superseded_by_failure() {
        let (cache, clock) = cache_with_clock(Duration::from_secs(24 * 3600));
        let now = clock.now();
        let success = result("alpha", ProbeKind::Vision, ProbeOutcome::Success, now - chrono::Duration::hours(10));
        let mut timeout = result("alpha", ProbeKind::Vision, ProbeOutcome::Timeout, now - chrono::Duration::hours(1));
        timeout.retries_exhausted = true;
        let key = success.cache_key();

        assert_eq!(cache.warm(vec![success, timeout]).await, 0);
        assert_eq!(cache.get(&key).await, CacheLookup::Miss);
    }

    #[tokio::test]
    async fn purge_expired_removes_only_dead_entries() {
        let (cache, clock) = cache_with_clock(Duration::from_secs(10));
        let old = result("alpha", ProbeKind::Existence, ProbeOutcome::Success, clock.now());
        cache.set(old).await;
        clock.advance(Duration::from_secs(5));
        let young = result("beta", ProbeKind::Existence, ProbeOutcome::Success, clock.now());
        cache.set(young).await;
        clock.advance(Duration::from_secs(6));

        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.len().await, 1);
    }
}
