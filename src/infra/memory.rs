//! Process-local repositories used when no database is configured.
//!
//! State lives only as long as the process. Every write replaces whole
//! records under one lock acquisition, so concurrent callers never observe a
//! partially written entry.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tracing::warn;

use crate::{
    application::repos::{CacheRepo, PostIndexRepo, RepoError, SettingsRepo},
    domain::entities::{CacheEntryRecord, PostIndexRecord},
};

#[derive(Debug, Default)]
pub struct MemoryRepositories {
    cache: RwLock<BTreeMap<String, String>>,
    posts: RwLock<BTreeMap<String, PostIndexRecord>>,
    settings: RwLock<BTreeMap<String, String>>,
}

impl MemoryRepositories {
    pub fn new() -> Self {
        Self::default()
    }
}

fn read<'a, T>(lock: &'a RwLock<T>, store: &'static str) -> RwLockReadGuard<'a, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!(
                store,
                lock_kind = "rwlock.read",
                result = "poisoned_recovered",
                "Recovered from poisoned memory store lock"
            );
            poisoned.into_inner()
        }
    }
}

fn write<'a, T>(lock: &'a RwLock<T>, store: &'static str) -> RwLockWriteGuard<'a, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!(
                store,
                lock_kind = "rwlock.write",
                result = "poisoned_recovered",
                "Recovered from poisoned memory store lock"
            );
            poisoned.into_inner()
        }
    }
}

#[async_trait]
impl CacheRepo for MemoryRepositories {
    async fn load_entry(&self, name: &str) -> Result<Option<CacheEntryRecord>, RepoError> {
        Ok(read(&self.cache, "cache")
            .get(name)
            .map(|payload| CacheEntryRecord {
                name: name.to_string(),
                payload: payload.clone(),
            }))
    }

    async fn upsert_entry(&self, entry: CacheEntryRecord) -> Result<(), RepoError> {
        write(&self.cache, "cache").insert(entry.name, entry.payload);
        Ok(())
    }

    async fn delete_entry(&self, name: &str) -> Result<bool, RepoError> {
        Ok(write(&self.cache, "cache").remove(name).is_some())
    }

    async fn list_entry_names(&self) -> Result<Vec<String>, RepoError> {
        Ok(read(&self.cache, "cache").keys().cloned().collect())
    }

    async fn purge_except(&self, keep: &str) -> Result<u64, RepoError> {
        let mut entries = write(&self.cache, "cache");
        let before = entries.len();
        entries.retain(|name, _| name == keep);
        Ok((before - entries.len()) as u64)
    }
}

#[async_trait]
impl PostIndexRepo for MemoryRepositories {
    async fn upsert_by_path(&self, record: PostIndexRecord) -> Result<(), RepoError> {
        write(&self.posts, "post_index").insert(record.path.clone(), record);
        Ok(())
    }

    async fn find_by_path(&self, path: &str) -> Result<Option<PostIndexRecord>, RepoError> {
        Ok(read(&self.posts, "post_index").get(path).cloned())
    }

    async fn exists_by_path(&self, path: &str) -> Result<bool, RepoError> {
        Ok(read(&self.posts, "post_index").contains_key(path))
    }

    async fn delete_by_path(&self, path: &str) -> Result<bool, RepoError> {
        Ok(write(&self.posts, "post_index").remove(path).is_some())
    }

    async fn delete_all(&self) -> Result<u64, RepoError> {
        let mut rows = write(&self.posts, "post_index");
        let removed = rows.len() as u64;
        rows.clear();
        Ok(removed)
    }
}

#[async_trait]
impl SettingsRepo for MemoryRepositories {
    async fn get_setting(&self, name: &str) -> Result<Option<String>, RepoError> {
        Ok(read(&self.settings, "settings").get(name).cloned())
    }

    async fn save_setting(&self, name: &str, content: &str) -> Result<(), RepoError> {
        write(&self.settings, "settings").insert(name.to_string(), content.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn purge_keeps_only_named_entry() {
        let repos = MemoryRepositories::new();
        for name in ["posts", "posts.foo", "update", "pages"] {
            repos
                .upsert_entry(CacheEntryRecord {
                    name: name.to_string(),
                    payload: "[]".to_string(),
                })
                .await
                .expect("upsert");
        }

        assert_eq!(repos.purge_except("update").await.expect("purge"), 3);
        assert_eq!(
            repos.list_entry_names().await.expect("names"),
            vec!["update".to_string()]
        );
    }

    #[tokio::test]
    async fn upsert_replaces_existing_entry() {
        let repos = MemoryRepositories::new();
        for payload in ["[1]", "[2]"] {
            repos
                .upsert_entry(CacheEntryRecord {
                    name: "posts".to_string(),
                    payload: payload.to_string(),
                })
                .await
                .expect("upsert");
        }

        let entry = repos.load_entry("posts").await.expect("load").expect("entry");
        assert_eq!(entry.payload, "[2]");
        assert_eq!(repos.list_entry_names().await.expect("names").len(), 1);
    }
}
