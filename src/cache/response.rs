//! TTL response cache for read-mostly endpoints.
//!
//! [`ResponseCache`] holds decoded payloads for requests whose
//! [`Request::is_cacheable()`](crate::Request::is_cacheable) flag is set
//! (model list, user info, generation status). Chat, image and video
//! requests never touch it.
//!
//! # Expiry
//!
//! An entry is valid while `now - stored_at < ttl`. Expired entries are
//! never served; they are purged opportunistically once the cache grows
//! past [`CacheConfig::prune_threshold`] entries. There is no capacity
//! bound or recency-based eviction: only age removes an entry.
//!
//! # Keys
//!
//! Keys hash the HTTP method, the concrete path and a canonical rendering
//! of the JSON body with object keys sorted, so structurally equal bodies
//! share a key regardless of field insertion order.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use moka::future::Cache;
use serde_json::Value;
use tracing::debug;

use crate::telemetry;

/// Configuration for the response cache.
///
/// ```rust
/// # use straico_gateway::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .ttl(Duration::from_secs(60))
///     .prune_threshold(500);
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Time-to-live for cached entries. Default: 5 minutes.
    pub ttl: Duration,
    /// Entry count above which expired entries are purged. Default: 100.
    pub prune_threshold: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            prune_threshold: 100,
        }
    }
}

impl CacheConfig {
    /// Create a new config with the default TTL and prune threshold.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the time-to-live for cached entries.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the entry count that triggers a purge of expired entries.
    pub fn prune_threshold(mut self, n: u64) -> Self {
        self.prune_threshold = n;
        self
    }
}

/// Deterministic key for a `(method, path, body)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey(u64);

impl CacheKey {
    /// Derive the key for a request.
    ///
    /// Uses `DefaultHasher` (SipHash), which is stable within a process
    /// lifetime. That is all an in-memory cache needs.
    pub fn derive(method: &str, path: &str, body: Option<&Value>) -> Self {
        let mut hasher = DefaultHasher::new();
        method.hash(&mut hasher);
        path.hash(&mut hasher);
        if let Some(body) = body {
            let mut canonical = String::new();
            write_canonical(body, &mut canonical);
            canonical.hash(&mut hasher);
        }
        CacheKey(hasher.finish())
    }
}

/// Render JSON with object keys in sorted order.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            out.push('{');
            for (i, (key, value)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(value, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// A stored payload. Immutable once inserted; only replaced wholesale.
#[derive(Clone, Debug)]
struct CachedResponse {
    payload: Value,
    stored_at: Instant,
}

/// In-memory TTL cache of decoded response payloads.
///
/// Safe to share across concurrent calls: each key's entry is replaced
/// atomically, never mutated in place.
pub struct ResponseCache {
    cache: Cache<CacheKey, CachedResponse>,
    config: CacheConfig,
    // moka's entry_count lags until pending tasks run; this plus the last
    // synced count bounds the live entries from above.
    unsynced_inserts: AtomicU64,
}

impl ResponseCache {
    /// Create a new response cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let cache = Cache::builder().time_to_live(config.ttl).build();
        Self {
            cache,
            config: config.clone(),
            unsynced_inserts: AtomicU64::new(0),
        }
    }

    /// Look up a live entry.
    ///
    /// Returns `None` on a miss or when the entry has outlived the TTL.
    /// Emits cache hit/miss metrics labelled with `endpoint`.
    pub async fn get(&self, key: &CacheKey, endpoint: &'static str) -> Option<Value> {
        let live = match self.cache.get(key).await {
            Some(entry) if entry.stored_at.elapsed() < self.config.ttl => Some(entry),
            Some(_) => {
                self.cache.invalidate(key).await;
                None
            }
            None => None,
        };

        match live {
            Some(entry) => {
                metrics::counter!(telemetry::CACHE_HITS_TOTAL, "endpoint" => endpoint)
                    .increment(1);
                debug!(
                    endpoint,
                    age_ms = entry.stored_at.elapsed().as_millis() as u64,
                    "cache hit"
                );
                Some(entry.payload)
            }
            None => {
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "endpoint" => endpoint)
                    .increment(1);
                None
            }
        }
    }

    /// Store a payload, stamping it with the current time.
    ///
    /// Purges expired entries once the cache holds more than
    /// `prune_threshold` entries.
    pub async fn insert(&self, key: CacheKey, payload: Value) {
        self.cache
            .insert(
                key,
                CachedResponse {
                    payload,
                    stored_at: Instant::now(),
                },
            )
            .await;

        let unsynced = self.unsynced_inserts.fetch_add(1, Ordering::Relaxed) + 1;
        if self.cache.entry_count() + unsynced > self.config.prune_threshold {
            self.unsynced_inserts.store(0, Ordering::Relaxed);
            self.cache.run_pending_tasks().await;
            debug!(entries = self.cache.entry_count(), "pruned expired cache entries");
        }
    }

    /// Number of entries currently held (may include not-yet-purged expired ones).
    pub fn len(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        self.unsynced_inserts.store(0, Ordering::Relaxed);
    }

    /// The configuration this cache was built with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_deterministic() {
        let body = json!({ "a": 1 });
        let k1 = CacheKey::derive("GET", "/v1/models", Some(&body));
        let k2 = CacheKey::derive("GET", "/v1/models", Some(&body));
        assert_eq!(k1, k2);
    }

    #[test]
    fn key_differs_on_method_and_path() {
        let k1 = CacheKey::derive("GET", "/v1/models", None);
        let k2 = CacheKey::derive("POST", "/v1/models", None);
        let k3 = CacheKey::derive("GET", "/v1/user", None);
        assert_ne!(k1, k2);
        assert_ne!(k1, k3);
    }

    #[test]
    fn key_ignores_field_insertion_order() {
        let mut first = serde_json::Map::new();
        first.insert("model".into(), json!("m"));
        first.insert("nested".into(), json!({ "y": 2, "x": [1, { "b": 1, "a": 0 }] }));

        let mut second = serde_json::Map::new();
        second.insert("nested".into(), json!({ "x": [1, { "a": 0, "b": 1 }], "y": 2 }));
        second.insert("model".into(), json!("m"));

        let k1 = CacheKey::derive("POST", "/p", Some(&Value::Object(first)));
        let k2 = CacheKey::derive("POST", "/p", Some(&Value::Object(second)));
        assert_eq!(k1, k2);
    }

    #[test]
    fn key_differs_on_body() {
        let k1 = CacheKey::derive("POST", "/p", Some(&json!({ "a": 1 })));
        let k2 = CacheKey::derive("POST", "/p", Some(&json!({ "a": 2 })));
        let k3 = CacheKey::derive("POST", "/p", None);
        assert_ne!(k1, k2);
        assert_ne!(k1, k3);
    }

    #[test]
    fn array_order_matters() {
        let k1 = CacheKey::derive("POST", "/p", Some(&json!([1, 2])));
        let k2 = CacheKey::derive("POST", "/p", Some(&json!([2, 1])));
        assert_ne!(k1, k2);
    }

    #[test]
    fn canonical_rendering_sorts_and_escapes() {
        let mut out = String::new();
        write_canonical(&json!({ "b": "x\"y", "a": null }), &mut out);
        assert_eq!(out, r#"{"a":null,"b":"x\"y"}"#);
    }
}
