//! modsieve - rule-driven content moderation core
//!
//! Operators describe **checks** per community: a tree of rule predicates
//! and the actions to take when it triggers. This crate turns a raw check
//! document into runnable checks and evaluates them against submissions
//! and comments:
//!
//! - [`config`] validates the document and inlines named rule and action
//!   references.
//! - [`rules`] builds and runs AND/OR rule trees.
//! - [`criteria`] evaluates `itemIs` / `authorIs` filters.
//! - [`cache`] memoizes platform lookups per community with per-category
//!   TTLs, usage statistics and background pruning.
//!
//! The platform API client is not part of this crate; implement
//! [`PlatformClient`] for it.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use modsieve::{Check, CommunityContext, ResourceCacheManager, Settings, parse_document};
//! use modsieve::cache::CommunityCacheConfig;
//!
//! # async fn run(client: Arc<dyn modsieve::PlatformClient>, activity: modsieve::Activity) -> modsieve::Result<()> {
//! let settings = Settings::load(None)?;
//! let manager = ResourceCacheManager::from_settings(&settings);
//! let cache = manager
//!     .set("rust", CommunityCacheConfig::new(client).overrides(settings.community_overrides("rust")))
//!     .await?;
//! let ctx = CommunityContext::new(cache);
//!
//! let config = parse_document(&std::fs::read_to_string("checks.json")?)?;
//! for check in Check::build_all(config.checks, &ctx)? {
//!     let outcome = check.run(&activity).await?;
//!     if outcome.triggered {
//!         println!("{} triggered: {:?}", check.name(), outcome.actions);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod check;
pub mod client;
pub mod config;
pub mod context;
pub mod criteria;
pub mod error;
pub mod rules;
pub mod telemetry;
pub mod types;
pub mod version;

pub use cache::{
    CacheCategory, CacheSettings, CacheStatsSnapshot, CacheStore, MemoryStore, ResourceCache,
    ResourceCacheManager, Ttl,
};
pub use check::{Check, CheckOutcome};
pub use client::{ContentFetcher, HttpContentFetcher, PlatformClient};
pub use config::{
    CheckDefinition, ModerationConfig, RuleDefinition, Settings, parse_document, resolve,
};
pub use context::CommunityContext;
pub use criteria::{AuthorCriteria, CriteriaMatcher, ItemCriteria, SubmissionLookup};
pub use error::{ModsieveError, Result};
pub use rules::{Rule, RuleResult, RuleSet, RuleSetResult};
pub use types::{Activity, ActivityKind, ActivityRef, Author, Comment, Submission};
pub use version::{PKG_VERSION, version_string};
