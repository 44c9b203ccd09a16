//! Per-community cache lifecycle.

mod common;

use std::sync::Arc;

use common::{FakeClient, NoContent, submission};
use modsieve::cache::{
    CacheCategory, CacheOverrides, CacheSettings, CacheStore, CommunityCacheConfig, MemoryStore,
    Ttl, TtlOverrides,
};
use modsieve::{ActivityRef, ResourceCacheManager};

fn manager() -> ResourceCacheManager {
    ResourceCacheManager::new(CacheSettings::default()).content_fetcher(Arc::new(NoContent))
}

fn config(client: &Arc<FakeClient>) -> CommunityCacheConfig {
    CommunityCacheConfig::new(client.clone())
}

fn shorter_submission_ttl() -> CacheOverrides {
    CacheOverrides {
        max_entries: None,
        ttl: TtlOverrides {
            submission: Some(Ttl::secs(5)),
            ..Default::default()
        },
    }
}

#[tokio::test]
async fn unchanged_settings_reuse_cache_and_entries() {
    let client = FakeClient::new();
    client.add_activity(submission("s1", "alice", "Hello"));
    let manager = manager();

    let first = manager.set("rust", config(&client)).await.unwrap();
    first.get_activity(&ActivityRef::submission("s1")).await.unwrap();

    let second = manager
        .set("rust", config(&client).footer("new footer"))
        .await
        .unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.footer().as_deref(), Some("new footer"));
    assert_eq!(second.stats().total_requests, 0, "stats reset on re-set");

    second.get_activity(&ActivityRef::submission("s1")).await.unwrap();
    assert_eq!(client.activity_fetches(), 1, "entry survived re-set");
    assert_eq!(second.stats().category(CacheCategory::Submission).misses, 0);
}

#[tokio::test]
async fn changed_settings_build_new_cache_with_new_prefix() {
    let client = FakeClient::new();
    client.add_activity(submission("s1", "alice", "Hello"));
    let manager = manager();

    let first = manager.set("rust", config(&client)).await.unwrap();
    first.get_activity(&ActivityRef::submission("s1")).await.unwrap();
    let old_prefix = first.prefix().to_string();

    let second = manager
        .set("rust", config(&client).overrides(shorter_submission_ttl()))
        .await
        .unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert_ne!(second.prefix(), old_prefix);
    assert!(second.prefix().starts_with("modsieve:rust:"));
    assert!(second.store().keys(None).await.unwrap().is_empty());
    assert!(first.store().keys(None).await.unwrap().is_empty(), "old store reset");
    assert!(!first.is_pruning());

    second.get_activity(&ActivityRef::submission("s1")).await.unwrap();
    assert_eq!(client.activity_fetches(), 2);
}

#[tokio::test]
async fn shared_store_only_loses_the_replaced_prefix() {
    let client = FakeClient::new();
    client.add_activity(submission("s1", "alice", "Hello"));
    let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
    let manager = manager().shared_store(store.clone());

    let rust = manager.set("rust", config(&client)).await.unwrap();
    let golang = manager.set("golang", config(&client)).await.unwrap();
    rust.get_activity(&ActivityRef::submission("s1")).await.unwrap();
    golang.get_activity(&ActivityRef::submission("s1")).await.unwrap();
    assert_eq!(store.keys(None).await.unwrap().len(), 2);

    manager
        .set("rust", config(&client).overrides(shorter_submission_ttl()))
        .await
        .unwrap();

    let remaining = store.keys(None).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert!(remaining[0].starts_with(golang.prefix()));
}

#[tokio::test]
async fn remove_disposes_and_forgets() {
    let client = FakeClient::new();
    let manager = manager();

    let cache = manager.set("rust", config(&client)).await.unwrap();
    assert_eq!(manager.communities(), vec!["rust".to_string()]);

    assert!(manager.remove("rust").await.unwrap());
    assert!(manager.get("rust").is_none());
    assert!(!cache.is_pruning());
    assert!(!manager.remove("rust").await.unwrap());
}

#[tokio::test]
async fn prefix_embeds_community_and_settings_hash() {
    let client = FakeClient::new();
    let manager = manager().prefix("bot:");

    let cache = manager.set("rust", config(&client)).await.unwrap();
    let fragment = &cache.settings_hash()[..8];
    assert_eq!(cache.prefix(), format!("bot:rust:{fragment}:"));
}
