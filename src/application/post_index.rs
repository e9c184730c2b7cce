//! Denormalized index of parsed front matter per source document.

use std::sync::Arc;

use metrics::counter;
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::application::context::ConsoleContext;
use crate::application::i18n::LanguagePack;
use crate::application::repos::{PostIndexRepo, RepoError};
use crate::domain::entities::PostIndexRecord;
use crate::domain::front_matter::{self, FrontMatterRecord};
use crate::domain::types::PostStatus;

const METRIC_MARK: &str = "scrivo_post_index_mark_total";

#[derive(Clone)]
pub struct PostIndexService {
    repo: Arc<dyn PostIndexRepo>,
}

impl PostIndexService {
    pub fn new(repo: Arc<dyn PostIndexRepo>) -> Self {
        Self { repo }
    }

    /// Record `path` with its latest front matter, replacing any previous row.
    pub async fn mark(
        &self,
        language: &LanguagePack,
        path: &str,
        front_matter: &Map<String, Value>,
        status: PostStatus,
        filename: &str,
    ) -> Result<PostIndexRecord, RepoError> {
        let record = PostIndexRecord {
            title: index_title(front_matter, language),
            path: path.to_string(),
            status,
            front_matter: Value::Object(front_matter.clone()).to_string(),
            date: epoch_seconds(OffsetDateTime::now_utc()),
            filename: filename.to_string(),
        };

        self.repo.upsert_by_path(record.clone()).await?;
        counter!(METRIC_MARK).increment(1);
        Ok(record)
    }

    /// Parse a source document and index its front matter under `path`.
    ///
    /// Documents whose header cannot be parsed are indexed as untitled.
    pub async fn index_document(
        &self,
        context: &ConsoleContext,
        path: &str,
        text: &str,
        status: PostStatus,
        filename: &str,
    ) -> Result<(FrontMatterRecord, PostIndexRecord), RepoError> {
        let parsed = front_matter::parse(text, &context.parse_options(false));
        let record = self
            .mark(&context.language(), path, &parsed.fields, status, filename)
            .await?;
        Ok((parsed, record))
    }

    /// Remove the row for `path`; missing rows are not an error.
    pub async fn delete(&self, path: &str) -> Result<bool, RepoError> {
        self.repo.delete_by_path(path).await
    }

    pub async fn clear_all(&self) -> Result<u64, RepoError> {
        self.repo.delete_all().await
    }

    pub async fn exists(&self, path: &str) -> Result<bool, RepoError> {
        self.repo.exists_by_path(path).await
    }

    pub async fn find(&self, path: &str) -> Result<Option<PostIndexRecord>, RepoError> {
        self.repo.find_by_path(path).await
    }
}

/// Title shown for a document: its `title` field when truthy, else "untitled".
fn index_title(front_matter: &Map<String, Value>, language: &LanguagePack) -> String {
    match front_matter.get("title") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => language.untitled().to_string(),
        Some(Value::String(title)) if title.is_empty() => language.untitled().to_string(),
        Some(Value::Array(items)) if items.is_empty() => language.untitled().to_string(),
        Some(Value::Object(fields)) if fields.is_empty() => language.untitled().to_string(),
        Some(Value::Number(number)) if number.as_f64() == Some(0.0) => {
            language.untitled().to_string()
        }
        Some(Value::String(title)) => title.clone(),
        Some(other) => other.to_string(),
    }
}

fn epoch_seconds(instant: OffsetDateTime) -> f64 {
    instant.unix_timestamp_nanos() as f64 / 1_000_000_000.0
}
