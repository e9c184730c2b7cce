//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{CacheEntryRecord, PostIndexRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Key-value storage for serialized cache snapshots.
#[async_trait]
pub trait CacheRepo: Send + Sync {
    async fn load_entry(&self, name: &str) -> Result<Option<CacheEntryRecord>, RepoError>;

    /// Replace the entry named `entry.name` atomically.
    async fn upsert_entry(&self, entry: CacheEntryRecord) -> Result<(), RepoError>;

    /// Returns `true` when an entry was removed.
    async fn delete_entry(&self, name: &str) -> Result<bool, RepoError>;

    async fn list_entry_names(&self) -> Result<Vec<String>, RepoError>;

    /// Delete every entry except `keep`, returning the number removed.
    async fn purge_except(&self, keep: &str) -> Result<u64, RepoError>;
}

/// Row storage for the post index, keyed by document path.
#[async_trait]
pub trait PostIndexRepo: Send + Sync {
    async fn upsert_by_path(&self, record: PostIndexRecord) -> Result<(), RepoError>;

    async fn find_by_path(&self, path: &str) -> Result<Option<PostIndexRecord>, RepoError>;

    async fn exists_by_path(&self, path: &str) -> Result<bool, RepoError>;

    /// Returns `true` when a row was removed.
    async fn delete_by_path(&self, path: &str) -> Result<bool, RepoError>;

    async fn delete_all(&self) -> Result<u64, RepoError>;
}

/// Named string settings edited from the console.
#[async_trait]
pub trait SettingsRepo: Send + Sync {
    /// Missing settings read as `None`.
    async fn get_setting(&self, name: &str) -> Result<Option<String>, RepoError>;

    async fn save_setting(&self, name: &str, content: &str) -> Result<(), RepoError>;
}
