//! One [`ResourceCache`] per community.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use crate::client::{ContentFetcher, PlatformClient};
use crate::config::Settings;
use crate::Result;

use super::hash::stable_hash;
use super::resource::ResourceCache;
use super::settings::{CacheOverrides, CacheSettings};
use super::store::{CacheStore, MemoryStore};

/// Default key prefix shared by every community cache.
pub const DEFAULT_PREFIX: &str = "modsieve:";

/// Length of the settings-hash fragment embedded in each community prefix.
const HASH_FRAGMENT_LEN: usize = 8;

/// What a community asks of its cache.
pub struct CommunityCacheConfig {
    pub overrides: CacheOverrides,
    /// Not part of the cache identity; changing it never rebuilds the cache.
    pub footer: Option<String>,
    pub client: Arc<dyn PlatformClient>,
}

impl CommunityCacheConfig {
    pub fn new(client: Arc<dyn PlatformClient>) -> Self {
        Self {
            overrides: CacheOverrides::default(),
            footer: None,
            client,
        }
    }

    pub fn overrides(mut self, overrides: CacheOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }
}

/// Registry of per-community resource caches.
///
/// A community's cache is identified by the stable hash of its effective
/// settings (shared defaults overlaid with the community's overrides).
/// Re-applying identical settings keeps the cache and its entries;
/// anything else replaces it.
pub struct ResourceCacheManager {
    defaults: CacheSettings,
    prefix: String,
    shared_store: Option<Arc<dyn CacheStore>>,
    content: Option<Arc<dyn ContentFetcher>>,
    caches: RwLock<HashMap<String, Arc<ResourceCache>>>,
}

impl ResourceCacheManager {
    pub fn new(defaults: CacheSettings) -> Self {
        Self {
            defaults,
            prefix: DEFAULT_PREFIX.to_string(),
            shared_store: None,
            content: None,
            caches: RwLock::new(HashMap::new()),
        }
    }

    /// Manager configured from operator settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.cache_defaults()).prefix(settings.cache.prefix.clone())
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Put every community on one store instead of a store each.
    pub fn shared_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.shared_store = Some(store);
        self
    }

    pub fn content_fetcher(mut self, fetcher: Arc<dyn ContentFetcher>) -> Self {
        self.content = Some(fetcher);
        self
    }

    pub fn defaults(&self) -> &CacheSettings {
        &self.defaults
    }

    pub fn get(&self, community: &str) -> Option<Arc<ResourceCache>> {
        self.caches
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(community)
            .cloned()
    }

    /// Names of communities with a live cache, sorted.
    pub fn communities(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .caches
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Install or refresh the cache for `community`.
    pub async fn set(
        &self,
        community: &str,
        config: CommunityCacheConfig,
    ) -> Result<Arc<ResourceCache>> {
        let settings = config.overrides.apply(&self.defaults);
        let hash = stable_hash(&settings);

        if let Some(existing) = self.get(community) {
            if existing.settings_hash() == hash {
                debug!(community, "cache settings unchanged, reusing cache");
                existing.set_footer(config.footer);
                existing.reset_stats();
                return Ok(existing);
            }
            info!(community, "cache settings changed, rebuilding cache");
            existing.dispose().await?;
        }

        let prefix = format!(
            "{}{community}:{}:",
            self.prefix,
            &hash[..HASH_FRAGMENT_LEN.min(hash.len())]
        );
        let store: Arc<dyn CacheStore> = match &self.shared_store {
            Some(shared) => Arc::clone(shared),
            None => Arc::new(MemoryStore::with_max_entries(settings.max_entries)),
        };
        let mut builder = ResourceCache::builder(community, config.client)
            .settings(settings)
            .prefix(prefix)
            .footer(config.footer);
        builder = if self.shared_store.is_some() {
            builder.shared_store(store)
        } else {
            builder.store(store)
        };
        if let Some(fetcher) = &self.content {
            builder = builder.content_fetcher(Arc::clone(fetcher));
        }
        let cache = builder.build()?;

        self.caches
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(community.to_string(), Arc::clone(&cache));
        Ok(cache)
    }

    /// Dispose and forget the cache for `community`.
    pub async fn remove(&self, community: &str) -> Result<bool> {
        let removed = self
            .caches
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(community);
        match removed {
            Some(cache) => {
                cache.dispose().await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
