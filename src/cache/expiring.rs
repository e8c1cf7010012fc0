//! The expiring cache: TTL semantics over the tiered store.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;

use crate::store::TieredStore;

const SOURCE: &str = "cache::expiring";

const METRIC_CACHE_HIT_TOTAL: &str = "brezza_cache_hit_total";
const METRIC_CACHE_MISS_TOTAL: &str = "brezza_cache_miss_total";

/// A cached value with its expiry stamp.
///
/// `get` returns the value iff `now < expires_at`; at exactly `expires_at`
/// the entry is expired. An expired entry may still be physically present
/// until the next `set` to the same key overwrites it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub value: T,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub written_at: OffsetDateTime,
}

/// Namespaced, TTL-bound caching layer over the tiered store.
///
/// Keys are fully qualified by the caller through [`crate::cache::keys`];
/// the cache itself is namespace-agnostic. Expired or malformed entries are
/// misses, never errors, matching the store's never-throws contract.
#[derive(Clone)]
pub struct ExpiringCache {
    store: Arc<TieredStore>,
    default_ttl: Duration,
}

impl ExpiringCache {
    pub fn new(store: Arc<TieredStore>, default_ttl: Duration) -> Self {
        Self { store, default_ttl }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Read a live value under `key`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let Some(entry) = self.store.get::<CacheEntry<T>>(key).await else {
            counter!(METRIC_CACHE_MISS_TOTAL, "reason" => "absent").increment(1);
            return None;
        };

        if OffsetDateTime::now_utc() < entry.expires_at {
            counter!(METRIC_CACHE_HIT_TOTAL).increment(1);
            Some(entry.value)
        } else {
            // Lazy GC: the dead entry stays until the next set overwrites it.
            debug!(target_module = SOURCE, key, "Expired entry ignored");
            counter!(METRIC_CACHE_MISS_TOTAL, "reason" => "expired").increment(1);
            None
        }
    }

    /// Store `value` under `key` with `ttl`, or the default TTL when `None`.
    ///
    /// Returns whether the underlying store accepted the write.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) -> bool {
        let now = OffsetDateTime::now_utc();
        let entry = CacheEntry {
            value,
            expires_at: now + ttl.unwrap_or(self.default_ttl),
            written_at: now,
        };
        self.store.set(key, &entry).await
    }

    /// Drop the entry under `key`.
    pub async fn remove(&self, key: &str) {
        self.store.remove(key).await;
    }

    /// Best-effort removal of every entry under `prefix`.
    ///
    /// Non-atomic: a concurrent reader may observe a partially-cleared
    /// namespace, which cache semantics already tolerate.
    pub async fn clear(&self, prefix: &str) {
        let keys = self.store.keys(prefix).await;
        debug!(
            target_module = SOURCE,
            prefix,
            count = keys.len(),
            "Clearing cache namespace"
        );
        for key in keys {
            self.store.remove(&key).await;
        }
    }
}
