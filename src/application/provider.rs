//! Provider capability: listings of remote site content.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::ContentItem;
use crate::domain::types::Collection;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("provider rejected the request: {message}")]
    Rejected { message: String },
    #[error("provider task failed: {message}")]
    Task { message: String },
}

impl ProviderError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    pub fn task(message: impl Into<String>) -> Self {
        Self::Task {
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait ContentProvider: Send + Sync {
    async fn get_posts(&self) -> Result<Vec<ContentItem>, ProviderError>;

    async fn get_pages(&self) -> Result<Vec<ContentItem>, ProviderError>;

    async fn get_configs(&self) -> Result<Vec<ContentItem>, ProviderError>;

    async fn list(&self, collection: Collection) -> Result<Vec<ContentItem>, ProviderError> {
        match collection {
            Collection::Posts => self.get_posts().await,
            Collection::Pages => self.get_pages().await,
            Collection::Configs => self.get_configs().await,
        }
    }
}
