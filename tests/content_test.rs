//! Content resolution: literals, wiki pages and URLs.

mod common;

use std::sync::Arc;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::FakeClient;
use modsieve::cache::{CacheCategory, CacheSettings};
use modsieve::{HttpContentFetcher, ModsieveError, ResourceCache};

fn cache(client: Arc<FakeClient>) -> Arc<ResourceCache> {
    ResourceCache::builder("rust", client)
        .content_fetcher(Arc::new(HttpContentFetcher::new().unwrap()))
        .build()
        .unwrap()
}

fn fetch_failure(err: ModsieveError) -> (Option<u16>, String) {
    match err {
        ModsieveError::ContentFetch {
            status, message, ..
        } => (status, message),
        other => panic!("expected content fetch failure, got {other:?}"),
    }
}

#[tokio::test]
async fn literal_content_is_returned_uncached() {
    let client = FakeClient::new();
    let cache = cache(client);

    let text = cache.get_content("Please read the rules.", "rust").await.unwrap();
    assert_eq!(text, "Please read the rules.");
    assert_eq!(cache.stats().category(CacheCategory::Content).requests, 0);
}

#[tokio::test]
async fn wiki_page_is_fetched_once() {
    let client = FakeClient::new();
    client.add_wiki_page("rust", "removal", "Removed: off topic");
    let cache = cache(client.clone());

    let first = cache.get_content("wiki:removal", "rust").await.unwrap();
    let second = cache.get_content("wiki:removal", "rust").await.unwrap();

    assert_eq!(first, "Removed: off topic");
    assert_eq!(first, second);
    assert_eq!(client.wiki_fetches(), 1);
    assert_eq!(client.community_fetches(), 0);
}

#[tokio::test]
async fn wiki_page_in_other_community_looks_up_community_first() {
    let client = FakeClient::new();
    client.add_community("golang");
    client.add_wiki_page("golang", "faq", "See the FAQ");
    let cache = cache(client.clone());

    let text = cache.get_content("wiki:faq|r/golang", "rust").await.unwrap();
    assert_eq!(text, "See the FAQ");
    assert_eq!(client.community_fetches(), 1);
}

#[tokio::test]
async fn unknown_other_community_reports_community_not_found() {
    let client = FakeClient::new();
    let cache = cache(client.clone());

    let (status, message) =
        fetch_failure(cache.get_content("wiki:faq|golang", "rust").await.unwrap_err());
    assert_eq!(status, Some(404));
    assert!(message.contains("community not found"), "{message}");
    assert_eq!(client.wiki_fetches(), 0);
}

#[tokio::test]
async fn other_community_with_wiki_disabled_is_not_read() {
    let client = FakeClient::new();
    client.add_community_without_wiki("golang");
    client.add_wiki_page("golang", "faq", "See the FAQ");
    let cache = cache(client.clone());

    let (status, message) =
        fetch_failure(cache.get_content("wiki:faq|golang", "rust").await.unwrap_err());
    assert_eq!(status, None);
    assert!(message.contains("wiki is disabled"), "{message}");
    assert_eq!(client.wiki_fetches(), 0);
}

#[tokio::test]
async fn missing_wiki_page_reports_not_found() {
    let client = FakeClient::new();
    let cache = cache(client);

    let (status, message) = fetch_failure(cache.get_content("wiki:nope", "rust").await.unwrap_err());
    assert_eq!(status, Some(404));
    assert!(message.contains("page not found"), "{message}");
}

#[tokio::test]
async fn forbidden_wiki_page_reports_permission_error() {
    let client = FakeClient::new();
    client.fail_wiki_page("rust", "private", 403);
    let cache = cache(client);

    let (status, message) =
        fetch_failure(cache.get_content("wiki:private", "rust").await.unwrap_err());
    assert_eq!(status, Some(403));
    assert!(message.contains("permission error"), "{message}");
}

#[tokio::test]
async fn failed_content_is_not_cached() {
    let client = FakeClient::new();
    let cache = cache(client.clone());

    assert!(cache.get_content("wiki:later", "rust").await.is_err());
    client.add_wiki_page("rust", "later", "now it exists");
    assert_eq!(
        cache.get_content("wiki:later", "rust").await.unwrap(),
        "now it exists"
    );
    assert_eq!(client.wiki_fetches(), 2);
}

#[tokio::test]
async fn url_content_is_fetched_over_http_and_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/removal.md"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Removed by policy"))
        .expect(1)
        .mount(&server)
        .await;

    let cache = cache(FakeClient::new());
    let reference = format!("url:{}/removal.md", server.uri());

    assert_eq!(cache.get_content(&reference, "rust").await.unwrap(), "Removed by policy");
    assert_eq!(cache.get_content(&reference, "rust").await.unwrap(), "Removed by policy");
}

#[tokio::test]
async fn url_failure_carries_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone.md"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let cache = cache(FakeClient::new());
    let reference = format!("url:{}/gone.md", server.uri());

    let (status, message) = fetch_failure(cache.get_content(&reference, "rust").await.unwrap_err());
    assert_eq!(status, Some(500));
    assert!(message.contains("fetching content"), "{message}");
}

#[tokio::test]
async fn disabled_content_ttl_fetches_every_time() {
    let client = FakeClient::new();
    client.add_wiki_page("rust", "removal", "text");
    let cache = ResourceCache::builder("rust", client.clone())
        .settings(CacheSettings::default().content_ttl(modsieve::Ttl::Disabled))
        .content_fetcher(Arc::new(common::NoContent))
        .build()
        .unwrap();

    cache.get_content("wiki:removal", "rust").await.unwrap();
    cache.get_content("wiki:removal", "rust").await.unwrap();
    assert_eq!(client.wiki_fetches(), 2);
}
