//! Per-community resource cache.
//!
//! [`ResourceCache`] memoizes the expensive, rate-limited lookups rule
//! evaluation depends on: activity fetches, author histories, wiki/URL
//! content and criteria test results. Every lookup belongs to a
//! [`CacheCategory`] with its own TTL and usage counters.
//!
//! # Keys
//!
//! Keys are plain strings under the cache's prefix:
//!
//! | category | key |
//! |---|---|
//! | submission / comment | `{kind}-{id}` |
//! | author activities | `{author}-{listing}-{hash(options)}` |
//! | content | `{community}-content-{reference}` |
//! | author criteria | `authorCrit-{author}-{hash(criteria)}` |
//! | item criteria | `itemCrit-{id}-{hash(criteria)}` |
//! | check result | `commentUserResult-{author}-{submission}-{fingerprint}` |
//!
//! Hashes come from [`stable_hash`], so option objects that differ only
//! in member order share an entry.
//!
//! # Pruning
//!
//! In-process stores only drop expired entries lazily. When any category has
//! a finite TTL, the cache runs a background task that prunes the store
//! every twice the smallest TTL. The task is aborted on
//! [`dispose`](ResourceCache::dispose) and on drop.

use std::future::Future;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::client::{ContentFetcher, HttpContentFetcher, PlatformClient};
use crate::criteria::{AuthorCriteria, CriteriaMatcher, ItemCriteria, SubmissionLookup};
use crate::types::{Activity, ActivityKind, ActivityRef, AuthorActivityOptions, Comment};
use crate::{ModsieveError, Result};

use super::content::ContentReference;
use super::hash::{combine, stable_hash};
use super::settings::{CacheCategory, CacheSettings};
use super::stats::{CacheStats, CacheStatsSnapshot};
use super::store::{self, CacheStore, MemoryStore};

/// Per-community memoization facade over a [`CacheStore`].
pub struct ResourceCache {
    community: String,
    prefix: String,
    settings: CacheSettings,
    settings_hash: String,
    store: Arc<dyn CacheStore>,
    shared_store: bool,
    client: Arc<dyn PlatformClient>,
    content: Arc<dyn ContentFetcher>,
    stats: CacheStats,
    footer: RwLock<Option<String>>,
    prune_task: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("community", &self.community)
            .field("prefix", &self.prefix)
            .field("store", &self.store.name())
            .field("settings_hash", &self.settings_hash)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ResourceCache`].
pub struct ResourceCacheBuilder {
    community: String,
    client: Arc<dyn PlatformClient>,
    settings: CacheSettings,
    prefix: String,
    store: Option<Arc<dyn CacheStore>>,
    shared_store: bool,
    content: Option<Arc<dyn ContentFetcher>>,
    footer: Option<String>,
}

impl ResourceCacheBuilder {
    pub fn settings(mut self, settings: CacheSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Prefix prepended to every key.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Use a store owned by this cache. Default: a fresh [`MemoryStore`].
    pub fn store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self.shared_store = false;
        self
    }

    /// Use a store that other caches also write to.
    ///
    /// Disposing the cache then deletes only its own prefix instead of
    /// resetting the store.
    pub fn shared_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self.shared_store = true;
        self
    }

    /// Fetcher for `url:` content. Default: [`HttpContentFetcher`].
    pub fn content_fetcher(mut self, fetcher: Arc<dyn ContentFetcher>) -> Self {
        self.content = Some(fetcher);
        self
    }

    pub fn footer(mut self, footer: Option<String>) -> Self {
        self.footer = footer;
        self
    }

    pub fn build(self) -> Result<Arc<ResourceCache>> {
        let store = match self.store {
            Some(store) => store,
            None => Arc::new(MemoryStore::with_max_entries(self.settings.max_entries)),
        };
        let content: Arc<dyn ContentFetcher> = match self.content {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpContentFetcher::new()?),
        };
        let prune_task = start_pruning(&store, &self.settings, &self.community);

        Ok(Arc::new(ResourceCache {
            settings_hash: stable_hash(&self.settings),
            community: self.community,
            prefix: self.prefix,
            settings: self.settings,
            store,
            shared_store: self.shared_store,
            client: self.client,
            content,
            stats: CacheStats::new(),
            footer: RwLock::new(self.footer),
            prune_task: Mutex::new(prune_task),
        }))
    }
}

/// Longest prune interval scheduled; entries living longer are left to
/// moka's own eviction.
const MAX_PRUNE_PERIOD: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Spawn the periodic prune task, if this store and these TTLs need one.
fn start_pruning(
    store: &Arc<dyn CacheStore>,
    settings: &CacheSettings,
    community: &str,
) -> Option<JoinHandle<()>> {
    if !store.is_in_memory() {
        return None;
    }
    let Some(period) = settings
        .ttl
        .min_finite()?
        .checked_mul(2)
        .filter(|p| *p <= MAX_PRUNE_PERIOD)
    else {
        warn!(community, "smallest cache ttl is too long to schedule, cache pruning disabled");
        return None;
    };
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        warn!(community, "no async runtime available, cache pruning disabled");
        return None;
    };

    let store = Arc::clone(store);
    let community = community.to_string();
    debug!(community = %community, ?period, "starting cache prune task");
    Some(runtime.spawn(async move {
        let mut interval = tokio::time::interval(period);
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            if let Err(e) = store.prune().await {
                warn!(community = %community, error = %e, "cache prune failed");
            }
        }
    }))
}

impl ResourceCache {
    /// Start building a cache for `community` on top of `client`.
    pub fn builder(
        community: impl Into<String>,
        client: Arc<dyn PlatformClient>,
    ) -> ResourceCacheBuilder {
        ResourceCacheBuilder {
            community: community.into(),
            client,
            settings: CacheSettings::default(),
            prefix: String::new(),
            store: None,
            shared_store: false,
            content: None,
            footer: None,
        }
    }

    pub fn community(&self) -> &str {
        &self.community
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// Stable hash of the effective cache settings.
    pub fn settings_hash(&self) -> &str {
        &self.settings_hash
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    pub fn footer(&self) -> Option<String> {
        self.footer.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn set_footer(&self, footer: Option<String>) {
        *self.footer.write().unwrap_or_else(|e| e.into_inner()) = footer;
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    /// Whether the background prune task is running.
    pub fn is_pruning(&self) -> bool {
        self.prune_task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Stop background pruning and drop this cache's entries.
    ///
    /// A private store is reset; on a shared store only keys under this
    /// cache's prefix are deleted.
    pub async fn dispose(&self) -> Result<()> {
        self.stop_pruning();
        if self.shared_store {
            let pattern = format!("{}*", self.prefix);
            for key in self.store.keys(Some(&pattern)).await? {
                self.store.delete(&key).await?;
            }
        } else {
            self.store.reset().await?;
        }
        info!(community = %self.community, prefix = %self.prefix, "disposed resource cache");
        Ok(())
    }

    fn stop_pruning(&self) {
        if let Some(task) = self
            .prune_task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            task.abort();
        }
    }

    fn key(&self, raw: &str) -> String {
        format!("{}{raw}", self.prefix)
    }

    /// Get-or-fetch through the store, recording a hit or a miss.
    async fn cached<T, F, Fut>(
        &self,
        category: CacheCategory,
        identifier: &str,
        key: &str,
        ttl: Option<Duration>,
        producer: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let (value, hit) = store::wrap(self.store.as_ref(), key, ttl, producer).await?;
        if hit {
            debug!(category = %category, key, "cache hit");
            self.stats.hit(category, identifier);
        } else {
            debug!(category = %category, key, "cache miss");
            self.stats.miss(category, identifier);
        }
        Ok(value)
    }

    /// Fetch a submission or comment, through the cache unless its
    /// category is disabled.
    pub async fn get_activity(&self, item: &ActivityRef) -> Result<Activity> {
        let category = match item.kind {
            ActivityKind::Submission => CacheCategory::Submission,
            ActivityKind::Comment => CacheCategory::Comment,
        };
        let ttl = self.settings.ttl.for_category(category);
        if !ttl.is_enabled() {
            return self.client.fetch_activity(item).await;
        }
        let key = self.key(&format!("{}-{}", item.kind, item.id));
        self.cached(category, &item.id, &key, ttl.store_ttl(), || {
            self.client.fetch_activity(item)
        })
        .await
    }

    /// List an author's recent activities.
    pub async fn get_author_activities(
        &self,
        author: &str,
        options: &AuthorActivityOptions,
    ) -> Result<Vec<Activity>> {
        let ttl = self
            .settings
            .ttl
            .for_category(CacheCategory::AuthorActivities);
        if !ttl.is_enabled() {
            return self.client.list_author_activities(author, options).await;
        }
        let options_hash = stable_hash(options);
        let hash = if options.community_scoped {
            combine(&[&options_hash, &self.community])
        } else {
            options_hash
        };
        let key = self.key(&format!("{author}-{}-{hash}", options.kind.as_str()));
        self.cached(
            CacheCategory::AuthorActivities,
            author,
            &key,
            ttl.store_ttl(),
            || self.client.list_author_activities(author, options),
        )
        .await
    }

    /// Resolve a content reference (`wiki:` page, `url:` address or
    /// literal text) to its text.
    pub async fn get_content(&self, reference: &str, community: &str) -> Result<String> {
        let parsed = ContentReference::parse(reference);
        if !parsed.is_remote() {
            return self.fetch_content(reference, &parsed, community).await;
        }
        let ttl = self.settings.ttl.for_category(CacheCategory::Content);
        if !ttl.is_enabled() {
            return self.fetch_content(reference, &parsed, community).await;
        }
        let key = self.key(&format!("{community}-content-{}", reference.trim()));
        self.cached(
            CacheCategory::Content,
            reference,
            &key,
            ttl.store_ttl(),
            || self.fetch_content(reference, &parsed, community),
        )
        .await
    }

    async fn fetch_content(
        &self,
        reference: &str,
        parsed: &ContentReference,
        community: &str,
    ) -> Result<String> {
        match parsed {
            ContentReference::Wiki {
                page,
                community: other,
            } => {
                let target = other.as_deref().unwrap_or(community);
                if other.is_some() && !target.eq_ignore_ascii_case(community) {
                    let found = self.client.fetch_community(target).await.map_err(|e| {
                        content_error(
                            reference,
                            &e,
                            format!("Could not fetch community r/{target}"),
                            "community not found",
                        )
                    })?;
                    if !found.wiki_enabled {
                        return Err(ModsieveError::ContentFetch {
                            reference: reference.to_string(),
                            status: None,
                            message: format!(
                                "Could not fetch wiki page '{page}' in r/{target}: wiki is disabled"
                            ),
                        });
                    }
                }
                self.client
                    .fetch_wiki_page(target, page)
                    .await
                    .map_err(|e| {
                        content_error(
                            reference,
                            &e,
                            format!("Could not fetch wiki page '{page}' in r/{target}"),
                            "page not found",
                        )
                    })
            }
            ContentReference::Url(url) => {
                self.content.fetch_url(url).await.map_err(|e| {
                    ModsieveError::ContentFetch {
                        reference: reference.to_string(),
                        status: e.status(),
                        message: format!("Error occurred while fetching content from {url}: {e}"),
                    }
                })
            }
            ContentReference::Literal(text) => Ok(text.clone()),
        }
    }

    /// Test an activity's author against author criteria, memoized.
    pub async fn test_author_criteria(
        &self,
        activity: &Activity,
        criteria: &[AuthorCriteria],
    ) -> Result<bool> {
        if criteria.is_empty() {
            return Ok(true);
        }
        let author = activity.author();
        let ttl = self.settings.ttl.for_category(CacheCategory::AuthorCriteria);
        if !ttl.is_enabled() {
            return Ok(CriteriaMatcher::test_author(author, criteria));
        }
        let key = self.key(&format!("authorCrit-{}-{}", author.name, stable_hash(criteria)));
        self.cached(
            CacheCategory::AuthorCriteria,
            &author.name,
            &key,
            ttl.store_ttl(),
            || async { Ok(CriteriaMatcher::test_author(author, criteria)) },
        )
        .await
    }

    /// Test an activity against item criteria, memoized.
    ///
    /// When the only criterion is a `submissionState` and the activity is
    /// a comment, the comment's submission is tested directly so the cached
    /// result is keyed to (and shared through) the submission.
    pub async fn test_item_criteria(
        &self,
        activity: &Activity,
        criteria: &[ItemCriteria],
    ) -> Result<bool> {
        if criteria.is_empty() {
            return Ok(true);
        }
        let (subject, criteria) = match (activity, criteria) {
            (Activity::Comment(comment), [only]) => match only.only_submission_state() {
                Some(nested) => (self.parent_submission(comment).await?, nested),
                None => (activity.clone(), criteria.to_vec()),
            },
            _ => (activity.clone(), criteria.to_vec()),
        };

        let matcher = CriteriaMatcher::new(self);
        let ttl = self.settings.ttl.for_category(CacheCategory::ItemCriteria);
        if !ttl.is_enabled() {
            return matcher.test_item(&subject, &criteria).await;
        }
        let key = self.key(&format!("itemCrit-{}-{}", subject.id(), stable_hash(&criteria)));
        self.cached(
            CacheCategory::ItemCriteria,
            subject.id(),
            &key,
            ttl.store_ttl(),
            || matcher.test_item(&subject, &criteria),
        )
        .await
    }

    fn check_result_key(&self, comment: &Comment, fingerprint: &str) -> String {
        self.key(&format!(
            "commentUserResult-{}-{}-{fingerprint}",
            comment.author.name, comment.submission_id
        ))
    }

    /// A previously stored check outcome for this comment's author on this
    /// submission, if one is still live.
    pub async fn get_comment_check_cache_result<T: DeserializeOwned>(
        &self,
        comment: &Comment,
        fingerprint: &str,
    ) -> Result<Option<T>> {
        let key = self.check_result_key(comment, fingerprint);
        let identifier = comment.author.name.as_str();
        match self.store.get(&key).await? {
            Some(value) => {
                self.stats.hit(CacheCategory::CheckResult, identifier);
                serde_json::from_value(value).map(Some).map_err(|e| {
                    ModsieveError::Store(format!("undecodable check result under {key}: {e}"))
                })
            }
            None => {
                self.stats.miss(CacheCategory::CheckResult, identifier);
                Ok(None)
            }
        }
    }

    /// Store a check outcome for this comment's author on this submission.
    pub async fn set_comment_check_cache_result<T: Serialize>(
        &self,
        comment: &Comment,
        fingerprint: &str,
        result: &T,
        ttl: Duration,
    ) -> Result<()> {
        let key = self.check_result_key(comment, fingerprint);
        let ttl = if ttl.is_zero() { None } else { Some(ttl) };
        self.store
            .set(&key, serde_json::to_value(result)?, ttl)
            .await
    }
}

#[async_trait]
impl SubmissionLookup for ResourceCache {
    async fn parent_submission(&self, comment: &Comment) -> Result<Activity> {
        self.get_activity(&ActivityRef::submission(comment.submission_id.clone()))
            .await
    }
}

impl Drop for ResourceCache {
    fn drop(&mut self) {
        self.stop_pruning();
    }
}

/// Wrap a platform failure with a status-aware explanation.
fn content_error(
    reference: &str,
    err: &ModsieveError,
    what: String,
    not_found: &str,
) -> ModsieveError {
    let status = err.status();
    let cause = match status {
        Some(404) => not_found.to_string(),
        Some(401) | Some(403) => {
            "permission error: the bot account may not have access to it".to_string()
        }
        _ => err.to_string(),
    };
    ModsieveError::ContentFetch {
        reference: reference.to_string(),
        status,
        message: format!("{what}: {cause}"),
    }
}
