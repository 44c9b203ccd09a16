//! Shared fakes for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;

use modsieve::cache::CacheSettings;
use modsieve::types::{AuthorActivityOptions, Community};
use modsieve::{
    Activity, ActivityRef, CommunityContext, ContentFetcher, ModsieveError, PlatformClient,
    ResourceCache, Result,
};

/// In-memory platform that counts every call it serves.
#[derive(Default)]
pub struct FakeClient {
    activities: Mutex<HashMap<String, Activity>>,
    histories: Mutex<HashMap<String, Vec<Activity>>>,
    wiki: Mutex<HashMap<(String, String), std::result::Result<String, u16>>>,
    communities: Mutex<HashMap<String, Community>>,
    pub activity_fetches: AtomicUsize,
    pub history_fetches: AtomicUsize,
    pub wiki_fetches: AtomicUsize,
    pub community_fetches: AtomicUsize,
}

impl FakeClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_activity(&self, activity: Activity) {
        let key = format!("{}-{}", activity.kind(), activity.id());
        self.activities.lock().unwrap().insert(key, activity);
    }

    pub fn set_history(&self, author: &str, activities: Vec<Activity>) {
        self.histories
            .lock()
            .unwrap()
            .insert(author.to_string(), activities);
    }

    pub fn add_wiki_page(&self, community: &str, page: &str, text: &str) {
        self.wiki
            .lock()
            .unwrap()
            .insert((community.into(), page.into()), Ok(text.into()));
    }

    pub fn fail_wiki_page(&self, community: &str, page: &str, status: u16) {
        self.wiki
            .lock()
            .unwrap()
            .insert((community.into(), page.into()), Err(status));
    }

    pub fn add_community(&self, name: &str) {
        self.insert_community(name, true);
    }

    pub fn add_community_without_wiki(&self, name: &str) {
        self.insert_community(name, false);
    }

    fn insert_community(&self, name: &str, wiki_enabled: bool) {
        self.communities.lock().unwrap().insert(
            name.to_string(),
            Community {
                name: name.to_string(),
                wiki_enabled,
            },
        );
    }

    pub fn activity_fetches(&self) -> usize {
        self.activity_fetches.load(Ordering::SeqCst)
    }

    pub fn history_fetches(&self) -> usize {
        self.history_fetches.load(Ordering::SeqCst)
    }

    pub fn wiki_fetches(&self) -> usize {
        self.wiki_fetches.load(Ordering::SeqCst)
    }

    pub fn community_fetches(&self) -> usize {
        self.community_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlatformClient for FakeClient {
    async fn fetch_activity(&self, item: &ActivityRef) -> Result<Activity> {
        self.activity_fetches.fetch_add(1, Ordering::SeqCst);
        let key = format!("{}-{}", item.kind, item.id);
        self.activities
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or(ModsieveError::Api {
                status: 404,
                message: format!("{key} not found"),
            })
    }

    async fn list_author_activities(
        &self,
        author: &str,
        _options: &AuthorActivityOptions,
    ) -> Result<Vec<Activity>> {
        self.history_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .histories
            .lock()
            .unwrap()
            .get(author)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_wiki_page(&self, community: &str, page: &str) -> Result<String> {
        self.wiki_fetches.fetch_add(1, Ordering::SeqCst);
        match self
            .wiki
            .lock()
            .unwrap()
            .get(&(community.to_string(), page.to_string()))
        {
            Some(Ok(text)) => Ok(text.clone()),
            Some(Err(status)) => Err(ModsieveError::Api {
                status: *status,
                message: "wiki request failed".into(),
            }),
            None => Err(ModsieveError::Api {
                status: 404,
                message: "no such page".into(),
            }),
        }
    }

    async fn fetch_community(&self, name: &str) -> Result<Community> {
        self.community_fetches.fetch_add(1, Ordering::SeqCst);
        self.communities
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| ModsieveError::NotFound(format!("r/{name}")))
    }
}

/// Content fetcher that must never be reached.
pub struct NoContent;

#[async_trait]
impl ContentFetcher for NoContent {
    async fn fetch_url(&self, url: &str) -> Result<String> {
        Err(ModsieveError::Http(format!("unexpected fetch of {url}")))
    }
}

pub fn submission(id: &str, author: &str, title: &str) -> Activity {
    serde_json::from_value(json!({
        "type": "submission",
        "id": id,
        "author": {"name": author},
        "community": "rust",
        "title": title,
        "body": "",
        "permalink": format!("/r/rust/comments/{id}"),
    }))
    .unwrap()
}

pub fn comment(id: &str, author: &str, submission_id: &str, body: &str) -> Activity {
    serde_json::from_value(json!({
        "type": "comment",
        "id": id,
        "author": {"name": author},
        "community": "rust",
        "body": body,
        "submissionId": submission_id,
        "permalink": format!("/r/rust/comments/{submission_id}/_/{id}"),
    }))
    .unwrap()
}

pub fn cache_with(client: Arc<FakeClient>, settings: CacheSettings) -> Arc<ResourceCache> {
    ResourceCache::builder("rust", client)
        .settings(settings)
        .prefix("test:")
        .content_fetcher(Arc::new(NoContent))
        .build()
        .unwrap()
}

pub fn context_with(client: Arc<FakeClient>, settings: CacheSettings) -> CommunityContext {
    CommunityContext::new(cache_with(client, settings))
}
