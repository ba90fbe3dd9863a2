use std::time::Duration;

use serde_json::json;
use straico_gateway::{CacheConfig, CacheKey, ResponseCache};

fn key(path: &str) -> CacheKey {
    CacheKey::derive("GET", path, None)
}

#[tokio::test]
async fn insert_then_get_returns_payload() {
    let cache = ResponseCache::new(&CacheConfig::default());
    cache.insert(key("/v1/models"), json!({"data": [1, 2]})).await;

    let hit = cache.get(&key("/v1/models"), "/v1/models").await;
    assert_eq!(hit, Some(json!({"data": [1, 2]})));
    assert!(cache.get(&key("/v1/user"), "/v1/user").await.is_none());
}

#[tokio::test]
async fn entries_expire_after_ttl() {
    let config = CacheConfig::new().ttl(Duration::from_millis(50));
    let cache = ResponseCache::new(&config);
    cache.insert(key("/v1/user"), json!({"data": {}})).await;

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(cache.get(&key("/v1/user"), "/v1/user").await.is_none());
}

#[tokio::test]
async fn keys_with_reordered_bodies_share_an_entry() {
    let cache = ResponseCache::new(&CacheConfig::default());
    let a = CacheKey::derive("POST", "/x", Some(&json!({"a": 1, "b": 2})));
    let b = CacheKey::derive("POST", "/x", Some(&json!({"b": 2, "a": 1})));
    cache.insert(a, json!("cached")).await;
    assert_eq!(cache.get(&b, "/x").await, Some(json!("cached")));
}

#[tokio::test]
async fn clear_drops_everything() {
    let cache = ResponseCache::new(&CacheConfig::default());
    for i in 0..5 {
        cache.insert(key(&format!("/generations/{i}")), json!(i)).await;
    }
    cache.clear().await;
    assert!(cache.is_empty());
    assert!(cache.get(&key("/generations/0"), "/generations/{id}").await.is_none());
}

#[tokio::test]
async fn pruning_past_threshold_keeps_live_entries() {
    let config = CacheConfig::new().prune_threshold(3);
    let cache = ResponseCache::new(&config);
    for i in 0..10 {
        cache.insert(key(&format!("/generations/{i}")), json!(i)).await;
    }
    for i in 0..10 {
        let hit = cache
            .get(&key(&format!("/generations/{i}")), "/generations/{id}")
            .await;
        assert_eq!(hit, Some(json!(i)));
    }
}

#[tokio::test]
async fn pruning_past_threshold_drops_expired_entries() {
    let config = CacheConfig::new()
        .ttl(Duration::from_millis(50))
        .prune_threshold(3);
    let cache = ResponseCache::new(&config);
    for i in 0..4 {
        cache.insert(key(&format!("/generations/{i}")), json!(i)).await;
    }
    assert_eq!(cache.len(), 4);

    tokio::time::sleep(Duration::from_millis(100)).await;
    cache.insert(key("/v1/models"), json!("fresh")).await;

    assert_eq!(cache.len(), 1);
    assert_eq!(
        cache.get(&key("/v1/models"), "/v1/models").await,
        Some(json!("fresh"))
    );
}
