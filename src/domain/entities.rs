//! Domain entities mirrored from persistent storage.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::types::PostStatus;

/// Name of the cache entry that survives a full purge.
pub const RESERVED_UPDATE_ENTRY: &str = "update";

/// A named, wholesale-replaceable cache snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheEntryRecord {
    pub name: String,
    pub payload: String,
}

impl CacheEntryRecord {
    /// Key of the search-scoped snapshot derived from `collection`.
    pub fn derived_name(collection: &str, search: &str) -> String {
        format!("{collection}.{search}")
    }
}

/// Denormalized index row for one source document, unique by `path`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostIndexRecord {
    pub title: String,
    pub path: String,
    pub status: PostStatus,
    /// Front matter serialized as a JSON object.
    pub front_matter: String,
    /// Seconds since the unix epoch at the moment of marking.
    pub date: f64,
    pub filename: String,
}

/// One listing entry returned by a content provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Display name, the only attribute search filtering looks at.
    pub name: String,
    /// Source path when the provider knows one; snapshots may omit it.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContentItem {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            extra: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Case-insensitive substring match on the display name.
    pub fn matches(&self, search: &str) -> bool {
        self.name.to_uppercase().contains(&search.to_uppercase())
    }
}
