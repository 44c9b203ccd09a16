//! Capabilities consumed from the outside world.
//!
//! The platform API client itself lives outside this crate. The resource
//! cache reaches it only through [`PlatformClient`], a deliberately narrow
//! surface (fetch-by-id, author history, wiki pages, community lookup).
//! External URLs are fetched through [`ContentFetcher`]; [`HttpContentFetcher`]
//! is the reqwest-backed implementation.
//!
//! # Error conventions
//!
//! Implementations report platform failures as
//! [`ModsieveError::Api`](crate::ModsieveError::Api) with the HTTP status,
//! so callers can tell "not found" from "forbidden".

use std::time::Duration;

use async_trait::async_trait;

use crate::types::{Activity, ActivityRef, AuthorActivityOptions, Community};
use crate::{ModsieveError, Result};

/// Read-only access to the moderated platform.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Fetch a submission or comment by id.
    async fn fetch_activity(&self, item: &ActivityRef) -> Result<Activity>;

    /// List an author's recent activities, newest first.
    async fn list_author_activities(
        &self,
        author: &str,
        options: &AuthorActivityOptions,
    ) -> Result<Vec<Activity>>;

    /// Raw markdown of a community wiki page.
    async fn fetch_wiki_page(&self, community: &str, page: &str) -> Result<String>;

    async fn fetch_community(&self, name: &str) -> Result<Community>;
}

/// Fetches the body of an external URL.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch_url(&self, url: &str) -> Result<String>;
}

/// Default request timeout for URL content.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// [`ContentFetcher`] over plain HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpContentFetcher {
    http: reqwest::Client,
}

impl HttpContentFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("modsieve/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ModsieveError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl ContentFetcher for HttpContentFetcher {
    async fn fetch_url(&self, url: &str) -> Result<String> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ModsieveError::Api {
                status: status.as_u16(),
                message: format!("GET {url} returned HTTP {status}"),
            });
        }
        Ok(response.text().await?)
    }
}
