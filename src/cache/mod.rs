//! Caching subsystem.
//!
//! - [`ResourceCache`]: per-community memoization of platform lookups,
//!   content fetches and criteria results, with hit/miss accounting and
//!   background pruning. See [`resource`] for the key layout.
//!
//! - [`ResourceCacheManager`]: one resource cache per community, rebuilt
//!   only when the community's effective cache settings change.
//!
//! - [`CacheStore`]: the backing key/value store. [`MemoryStore`] (moka)
//!   is the in-process default.

pub mod content;
pub mod hash;
pub mod manager;
pub mod resource;
pub mod settings;
pub mod stats;
pub mod store;

pub use content::ContentReference;
pub use hash::stable_hash;
pub use manager::{CommunityCacheConfig, DEFAULT_PREFIX, ResourceCacheManager};
pub use resource::{ResourceCache, ResourceCacheBuilder};
pub use settings::{
    CacheCategory, CacheOverrides, CacheSettings, DEFAULT_MAX_ENTRIES, Ttl, TtlOverrides,
    TtlSettings,
};
pub use stats::{CacheStats, CacheStatsSnapshot, CategorySnapshot};
pub use store::{CacheStore, MemoryStore};
