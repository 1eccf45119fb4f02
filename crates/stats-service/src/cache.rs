// =============================================================================
// TtlCache — short-lived cache for the dynamic stats view
// =============================================================================
//
// A hand-rolled timestamped cell rather than a caching crate: stats-service
// owns exactly one in-memory cache per running instance, guarding one JSON
// blob behind a 5-second staleness check, the same shape as a counter
// guarded by atomics elsewhere in this codebase — just holding a value
// instead of a number.
// =============================================================================

use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde_json::Value;

pub struct TtlCache {
    inner: RwLock<Option<(Instant, Value)>>,
    ttl: Duration,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: RwLock::new(None),
            ttl,
        }
    }

    /// Returns the cached value if it was stored within the last `ttl`.
    pub fn get(&self) -> Option<Value> {
        let guard = self.inner.read();
        guard
            .as_ref()
            .and_then(|(stored_at, value)| (stored_at.elapsed() < self.ttl).then(|| value.clone()))
    }

    pub fn set(&self, value: Value) {
        *self.inner.write() = Some((Instant::now(), value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cache_misses() {
        let cache = TtlCache::new(Duration::from_secs(5));
        assert!(cache.get().is_none());
    }

    #[test]
    fn fresh_value_hits() {
        let cache = TtlCache::new(Duration::from_secs(5));
        cache.set(serde_json::json!({"a": 1}));
        assert_eq!(cache.get(), Some(serde_json::json!({"a": 1})));
    }

    #[test]
    fn expired_value_misses() {
        let cache = TtlCache::new(Duration::from_millis(0));
        cache.set(serde_json::json!({"a": 1}));
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get().is_none());
    }
}
