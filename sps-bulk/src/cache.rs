use dashmap::DashMap;
use sps_core::models::{CurrencyCode, TierEntry};
use std::{hash::Hash, sync::Arc, time::Duration};
use time::OffsetDateTime;

#[derive(Debug)]
struct Entry<V> {
    value: V,
    expires_at: OffsetDateTime,
}

/// A concurrent map whose entries expire a fixed time after insertion.
///
/// Time is passed in explicitly rather than read from a clock, which keeps
/// expiry deterministic under test. Expired entries are evicted lazily on
/// lookup, or eagerly with [`invalidate_expired`](Self::invalidate_expired).
#[derive(Debug)]
pub struct TtlCache<K: Eq + Hash, V> {
    ttl: Duration,
    entries: DashMap<K, Entry<V>>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    /// An empty cache whose entries live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    /// The value for `key`, unless it is absent or expired at `now`
    pub fn get(&self, key: &K, now: OffsetDateTime) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) if now < entry.expires_at => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove_if(key, |_, entry| now >= entry.expires_at);
        }
        None
    }

    /// Store `value` under `key`, valid from `now` for the cache's lifetime
    pub fn insert(&self, key: K, value: V, now: OffsetDateTime) {
        let expires_at = now + self.ttl;
        self.entries.insert(key, Entry { value, expires_at });
    }

    /// Evict every entry expired at `now`, returning how many were removed
    pub fn invalidate_expired(&self, now: OffsetDateTime) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| now < entry.expires_at);
        before.saturating_sub(self.entries.len())
    }

    /// Evict everything
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// The number of entries, including any that expired but were not evicted yet
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The reference data cached across pricing runs.
///
/// Tier ladders are shared by every territory billed in the same currency, so
/// they are cached per currency and stay valid for every product.
#[derive(Debug)]
pub struct PricingCache {
    /// Tier ladders by billing currency
    pub tiers: TtlCache<CurrencyCode, Arc<[TierEntry]>>,
}

impl PricingCache {
    /// An empty cache whose entries live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            tiers: TtlCache::new(ttl),
        }
    }

    /// Evict every entry expired at `now`
    pub fn invalidate_expired(&self, now: OffsetDateTime) -> usize {
        self.tiers.invalidate_expired(now)
    }
}
