use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use super::IntrospectionResult;

/// Default lifetime of a cached introspection result.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

struct CacheEntry {
    result: Arc<IntrospectionResult>,
    stored_at: Instant,
}

/// Process-wide introspection results keyed by endpoint URL.
///
/// One entry per endpoint, last write wins. Expiry is checked lazily on lookup.
pub struct IntrospectionCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl Default for IntrospectionCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl IntrospectionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Fresh entry for `endpoint`, evicting it if it has outlived the TTL.
    pub fn get(&self, endpoint: &str) -> Option<Arc<IntrospectionResult>> {
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match entries.get(endpoint) {
                None => return None,
                Some(entry) if entry.stored_at.elapsed() <= self.ttl => {
                    return Some(Arc::clone(&entry.result));
                }
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        // Another writer may have refreshed it between the two locks.
        if let Some(entry) = entries.get(endpoint) {
            if entry.stored_at.elapsed() <= self.ttl {
                return Some(Arc::clone(&entry.result));
            }
        }
        entries.remove(endpoint);
        tracing::debug!(endpoint, "introspection cache entry expired");
        None
    }

    pub fn insert(&self, result: Arc<IntrospectionResult>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            result.endpoint.clone(),
            CacheEntry {
                result,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop one endpoint's entry, or everything when `endpoint` is `None`.
    pub fn clear(&self, endpoint: Option<&str>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match endpoint {
            Some(endpoint) => {
                entries.remove(endpoint);
            }
            None => entries.clear(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn result_for(endpoint: &str) -> Arc<IntrospectionResult> {
        let schema = crate::parse_sdl("type Query { ok: Boolean }", "cache.graphql").unwrap();
        Arc::new(IntrospectionResult {
            sdl: schema.to_string(),
            schema: Arc::new(schema),
            endpoint: endpoint.to_string(),
            fetched_at: Utc::now(),
        })
    }

    #[test]
    fn hit_within_ttl() {
        let cache = IntrospectionCache::default();
        cache.insert(result_for("http://a/graphql"));
        assert!(cache.get("http://a/graphql").is_some());
        assert!(cache.get("http://b/graphql").is_none());
    }

    #[test]
    fn expired_entry_is_evicted() {
        let cache = IntrospectionCache::new(Duration::from_millis(20));
        cache.insert(result_for("http://a/graphql"));
        std::thread::sleep(Duration::from_millis(40));
        assert!(cache.get("http://a/graphql").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn last_write_wins() {
        let cache = IntrospectionCache::default();
        let first = result_for("http://a/graphql");
        let second = result_for("http://a/graphql");
        cache.insert(Arc::clone(&first));
        cache.insert(Arc::clone(&second));
        assert_eq!(cache.len(), 1);
        assert!(Arc::ptr_eq(&cache.get("http://a/graphql").unwrap(), &second));
    }

    #[test]
    fn clear_one_or_all() {
        let cache = IntrospectionCache::default();
        cache.insert(result_for("http://a/graphql"));
        cache.insert(result_for("http://b/graphql"));
        cache.clear(Some("http://a/graphql"));
        assert!(cache.get("http://a/graphql").is_none());
        assert!(cache.get("http://b/graphql").is_some());
        cache.clear(None);
        assert!(cache.is_empty());
    }
}
