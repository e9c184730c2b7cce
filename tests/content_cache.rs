use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use scrivo::application::content_cache::{CacheError, CachePayload, ContentCacheService};
use scrivo::application::provider::{ContentProvider, ProviderError};
use scrivo::application::repos::{CacheRepo, RepoError};
use scrivo::domain::entities::{CacheEntryRecord, ContentItem};
use scrivo::domain::types::Collection;
use scrivo::infra::memory::MemoryRepositories;

struct CountingProvider {
    posts: Vec<ContentItem>,
    calls: AtomicUsize,
    fail: bool,
}

impl CountingProvider {
    fn new(names: &[&str]) -> Self {
        Self {
            posts: names
                .iter()
                .map(|name| ContentItem::new(*name, format!("source/_posts/{name}.md")))
                .collect(),
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(&[])
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentProvider for CountingProvider {
    async fn get_posts(&self) -> Result<Vec<ContentItem>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::rejected("remote unavailable"));
        }
        Ok(self.posts.clone())
    }

    async fn get_pages(&self) -> Result<Vec<ContentItem>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![ContentItem::new("about", "source/about/index.md")])
    }

    async fn get_configs(&self) -> Result<Vec<ContentItem>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }
}

/// In-memory store that refuses to write search snapshots of `posts`.
struct FailingDerivedWrites {
    inner: MemoryRepositories,
}

#[async_trait]
impl CacheRepo for FailingDerivedWrites {
    async fn load_entry(&self, name: &str) -> Result<Option<CacheEntryRecord>, RepoError> {
        self.inner.load_entry(name).await
    }

    async fn upsert_entry(&self, entry: CacheEntryRecord) -> Result<(), RepoError> {
        if entry.name.starts_with("posts.") {
            return Err(RepoError::Timeout);
        }
        self.inner.upsert_entry(entry).await
    }

    async fn delete_entry(&self, name: &str) -> Result<bool, RepoError> {
        self.inner.delete_entry(name).await
    }

    async fn list_entry_names(&self) -> Result<Vec<String>, RepoError> {
        self.inner.list_entry_names().await
    }

    async fn purge_except(&self, keep: &str) -> Result<u64, RepoError> {
        self.inner.purge_except(keep).await
    }
}

fn setup() -> (ContentCacheService, Arc<MemoryRepositories>) {
    let repos = Arc::new(MemoryRepositories::new());
    (ContentCacheService::new(repos.clone()), repos)
}

fn names(items: &[ContentItem]) -> Vec<&str> {
    items.iter().map(|item| item.name.as_str()).collect()
}

#[tokio::test]
async fn miss_fetches_once_and_hit_reuses_snapshot() {
    let (cache, _) = setup();
    let provider = CountingProvider::new(&["hello", "world"]);

    let first = cache.posts(&provider, None).await.expect("first listing");
    assert_eq!(provider.calls(), 1);

    let second = cache.posts(&provider, None).await.expect("second listing");
    assert_eq!(provider.calls(), 1);
    assert_eq!(first, second);
    assert_eq!(names(&second), vec!["hello", "world"]);
}

#[tokio::test]
async fn search_creates_derived_entry_and_keeps_base() {
    let (cache, repos) = setup();
    let provider = CountingProvider::new(&["Foo Bar", "other", "food"]);

    let hits = cache
        .posts(&provider, Some("foo"))
        .await
        .expect("search listing");
    assert_eq!(names(&hits), vec!["Foo Bar", "food"]);
    assert_eq!(provider.calls(), 1);

    let entries = repos.list_entry_names().await.expect("entry names");
    assert_eq!(entries, vec!["posts".to_string(), "posts.foo".to_string()]);

    let base = cache.posts(&provider, None).await.expect("base listing");
    assert_eq!(base.len(), 3);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn search_on_cached_base_does_not_refetch() {
    let (cache, _) = setup();
    let provider = CountingProvider::new(&["alpha", "beta"]);

    cache.posts(&provider, None).await.expect("warm");
    let hits = cache.posts(&provider, Some("ALP")).await.expect("search");

    assert_eq!(names(&hits), vec!["alpha"]);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn unreadable_payload_triggers_refetch() {
    let (cache, repos) = setup();
    repos
        .upsert_entry(CacheEntryRecord {
            name: "posts".to_string(),
            payload: "{not json".to_string(),
        })
        .await
        .expect("seed");
    let provider = CountingProvider::new(&["fresh"]);

    let items = cache.posts(&provider, None).await.expect("listing");
    assert_eq!(names(&items), vec!["fresh"]);
    assert_eq!(provider.calls(), 1);

    let stored = cache.read_raw("posts").await.expect("read").expect("entry");
    let decoded: Vec<ContentItem> = serde_json::from_str(&stored).expect("rewritten payload");
    assert_eq!(decoded, items);
}

#[tokio::test]
async fn provider_failure_propagates_and_leaves_cache_empty() {
    let (cache, repos) = setup();
    let provider = CountingProvider::failing();

    let err = cache
        .posts(&provider, None)
        .await
        .expect_err("provider failure");
    assert!(matches!(err, CacheError::Provider(ProviderError::Rejected { .. })));
    assert!(repos.list_entry_names().await.expect("names").is_empty());
}

#[tokio::test]
async fn collections_are_cached_independently() {
    let (cache, repos) = setup();
    let provider = CountingProvider::new(&["hello"]);

    cache
        .collection(&provider, Collection::Pages, None)
        .await
        .expect("pages");
    cache.configs(&provider, None).await.expect("configs");
    cache.posts(&provider, None).await.expect("posts");
    assert_eq!(provider.calls(), 3);

    let pages = cache.pages(&provider, None).await.expect("pages again");
    assert_eq!(names(&pages), vec!["about"]);
    assert_eq!(provider.calls(), 3);
    assert_eq!(
        repos.list_entry_names().await.expect("names"),
        vec!["configs".to_string(), "pages".to_string(), "posts".to_string()]
    );
}

#[tokio::test]
async fn purge_leaves_only_update_entry() {
    let (cache, repos) = setup();
    let provider = CountingProvider::new(&["foo"]);
    cache.posts(&provider, Some("foo")).await.expect("search");
    cache
        .put("update", CachePayload::Raw("2.0.0".to_string()))
        .await
        .expect("update marker");

    let removed = cache.purge_all().await.expect("purge");
    assert_eq!(removed, 2);
    assert_eq!(
        repos.list_entry_names().await.expect("names"),
        vec!["update".to_string()]
    );
    assert_eq!(
        cache.read_raw("update").await.expect("read").as_deref(),
        Some("2.0.0")
    );
}

#[tokio::test]
async fn deleting_missing_entry_reports_false() {
    let (cache, _) = setup();
    assert!(!cache.delete("posts").await.expect("delete"));

    cache
        .put("posts", CachePayload::Json(serde_json::json!([])))
        .await
        .expect("put");
    assert!(cache.delete("posts").await.expect("delete"));
    assert!(cache.entry_names().await.expect("names").is_empty());
}

#[tokio::test]
async fn name_only_snapshot_is_served_without_refetch() {
    let (cache, _) = setup();
    let snapshot = r#"[{"name":"foobar"},{"name":"baz"}]"#;
    cache
        .put("posts", CachePayload::Raw(snapshot.to_string()))
        .await
        .expect("seed");
    let provider = CountingProvider::new(&["fresh"]);

    let hits = cache.posts(&provider, Some("foo")).await.expect("search");
    assert_eq!(names(&hits), vec!["foobar"]);
    let all = cache.posts(&provider, None).await.expect("listing");
    assert_eq!(names(&all), vec!["foobar", "baz"]);

    assert_eq!(provider.calls(), 0);
    assert_eq!(
        cache.read_raw("posts").await.expect("read").as_deref(),
        Some(snapshot)
    );
    assert_eq!(
        cache.read_raw("posts.foo").await.expect("read").as_deref(),
        Some(r#"[{"name":"foobar"}]"#)
    );
}

#[tokio::test]
async fn failed_snapshot_write_refetches_once_then_reports_storage_error() {
    let repos = Arc::new(FailingDerivedWrites {
        inner: MemoryRepositories::new(),
    });
    let cache = ContentCacheService::new(repos.clone());
    cache
        .put("posts", CachePayload::Json(serde_json::json!([{"name": "stale-foo"}])))
        .await
        .expect("seed");
    let provider = CountingProvider::new(&["fresh-foo", "bar"]);

    let err = cache
        .posts(&provider, Some("foo"))
        .await
        .expect_err("snapshot write fails again after refetch");
    assert!(matches!(err, CacheError::Repo(RepoError::Timeout)));
    assert_eq!(provider.calls(), 1);

    let base = cache.read_raw("posts").await.expect("read").expect("base entry");
    let base: Vec<ContentItem> = serde_json::from_str(&base).expect("decode");
    assert_eq!(names(&base), vec!["fresh-foo", "bar"]);
    assert_eq!(
        repos.list_entry_names().await.expect("names"),
        vec!["posts".to_string()]
    );
}
