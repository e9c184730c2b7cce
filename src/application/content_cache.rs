//! Cache-or-fetch policy for remote content listings.
//!
//! Each collection (`posts`, `pages`, `configs`) is cached as one JSON array
//! under its own name. Searches are answered from that base entry when it is
//! readable and written as independent snapshots under
//! `"{collection}.{term}"`; they are never refreshed when the base changes.
//!
//! Only cache-local failures (unreadable payloads, failed derived writes) are
//! treated as misses. Provider and storage failures on the refresh path reach
//! the caller.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::provider::{ContentProvider, ProviderError};
use crate::application::repos::{CacheRepo, RepoError};
use crate::domain::entities::{CacheEntryRecord, ContentItem, RESERVED_UPDATE_ENTRY};
use crate::domain::types::Collection;

const METRIC_HIT: &str = "scrivo_content_cache_hit_total";
const METRIC_MISS: &str = "scrivo_content_cache_miss_total";
const METRIC_REFRESH: &str = "scrivo_content_cache_refresh_total";
const METRIC_FETCH_MS: &str = "scrivo_content_cache_fetch_ms";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("failed to encode cache payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Content written by [`ContentCacheService::put`].
#[derive(Debug, Clone, PartialEq)]
pub enum CachePayload {
    Json(Value),
    Raw(String),
}

impl CachePayload {
    fn encode(self) -> Result<String, serde_json::Error> {
        match self {
            CachePayload::Json(value) => serde_json::to_string(&value),
            CachePayload::Raw(text) => Ok(text),
        }
    }
}

#[derive(Clone)]
pub struct ContentCacheService {
    repo: Arc<dyn CacheRepo>,
}

impl ContentCacheService {
    pub fn new(repo: Arc<dyn CacheRepo>) -> Self {
        Self { repo }
    }

    /// Return the listing for `collection`, reusing the cached snapshot when possible.
    ///
    /// An empty search term behaves like no search term.
    pub async fn get<F, Fut>(
        &self,
        collection: &str,
        fetch: F,
        search: Option<&str>,
    ) -> Result<Vec<ContentItem>, CacheError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<Vec<ContentItem>, ProviderError>> + Send,
    {
        let search = search.filter(|term| !term.is_empty());

        if let Some(entry) = self.repo.load_entry(collection).await? {
            match serde_json::from_str::<Vec<ContentItem>>(&entry.payload) {
                Ok(items) => match search {
                    None => {
                        counter!(METRIC_HIT, "collection" => collection.to_string()).increment(1);
                        debug!(collection, "serving cached listing");
                        return Ok(items);
                    }
                    Some(term) => match self.store_derived(collection, term, &items).await {
                        Ok(filtered) => {
                            counter!(METRIC_HIT, "collection" => collection.to_string())
                                .increment(1);
                            return Ok(filtered);
                        }
                        Err(err) => warn!(
                            collection,
                            search = term,
                            error = %err,
                            "derived cache write failed, refetching"
                        ),
                    },
                },
                Err(err) => warn!(
                    collection,
                    error = %err,
                    "cached listing is unreadable, refetching"
                ),
            }
        }

        counter!(METRIC_MISS, "collection" => collection.to_string()).increment(1);
        let started = Instant::now();
        let items = fetch().await?;
        histogram!(METRIC_FETCH_MS, "collection" => collection.to_string())
            .record(started.elapsed().as_secs_f64() * 1000.0);
        counter!(METRIC_REFRESH, "collection" => collection.to_string()).increment(1);
        self.put(collection, CachePayload::Json(serde_json::to_value(&items)?))
            .await?;

        match search {
            Some(term) => Ok(self.store_derived(collection, term, &items).await?),
            None => Ok(items),
        }
    }

    /// Listing of `collection` from `provider`.
    pub async fn collection(
        &self,
        provider: &dyn ContentProvider,
        collection: Collection,
        search: Option<&str>,
    ) -> Result<Vec<ContentItem>, CacheError> {
        self.get(collection.as_str(), || provider.list(collection), search)
            .await
    }

    pub async fn posts(
        &self,
        provider: &dyn ContentProvider,
        search: Option<&str>,
    ) -> Result<Vec<ContentItem>, CacheError> {
        self.get(Collection::Posts.as_str(), || provider.get_posts(), search)
            .await
    }

    pub async fn pages(
        &self,
        provider: &dyn ContentProvider,
        search: Option<&str>,
    ) -> Result<Vec<ContentItem>, CacheError> {
        self.get(Collection::Pages.as_str(), || provider.get_pages(), search)
            .await
    }

    pub async fn configs(
        &self,
        provider: &dyn ContentProvider,
        search: Option<&str>,
    ) -> Result<Vec<ContentItem>, CacheError> {
        self.get(Collection::Configs.as_str(), || provider.get_configs(), search)
            .await
    }

    /// Replace the entry `name` wholesale.
    pub async fn put(&self, name: &str, payload: CachePayload) -> Result<(), CacheError> {
        let payload = payload.encode()?;
        self.repo
            .upsert_entry(CacheEntryRecord {
                name: name.to_string(),
                payload,
            })
            .await?;
        info!(name, "cache entry rebuilt");
        Ok(())
    }

    /// Raw payload of `name`, if cached.
    pub async fn read_raw(&self, name: &str) -> Result<Option<String>, RepoError> {
        Ok(self.repo.load_entry(name).await?.map(|entry| entry.payload))
    }

    pub async fn delete(&self, name: &str) -> Result<bool, RepoError> {
        self.repo.delete_entry(name).await
    }

    pub async fn entry_names(&self) -> Result<Vec<String>, RepoError> {
        self.repo.list_entry_names().await
    }

    /// Remove every entry except the reserved `update` entry.
    pub async fn purge_all(&self) -> Result<u64, RepoError> {
        self.repo.purge_except(RESERVED_UPDATE_ENTRY).await
    }

    async fn store_derived(
        &self,
        collection: &str,
        term: &str,
        items: &[ContentItem],
    ) -> Result<Vec<ContentItem>, CacheError> {
        let filtered: Vec<ContentItem> = items
            .iter()
            .filter(|item| item.matches(term))
            .cloned()
            .collect();
        let name = CacheEntryRecord::derived_name(collection, term);
        self.put(&name, CachePayload::Json(serde_json::to_value(&filtered)?))
            .await?;
        Ok(filtered)
    }
}
