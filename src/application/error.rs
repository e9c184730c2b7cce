use std::error::Error as StdError;

use thiserror::Error;

use crate::{
    application::{content_cache::CacheError, provider::ProviderError, repos::RepoError},
    config::LoadError,
    domain::{abbrlink::AbbrlinkError, error::DomainError},
    infra::error::InfraError,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Abbrlink(#[from] AbbrlinkError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("resource not found")]
    NotFound,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Every message in the source chain, outermost first.
    pub fn messages(&self) -> Vec<String> {
        let mut messages = vec![self.to_string()];
        let mut current = self.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        messages
    }
}

impl From<CacheError> for AppError {
    fn from(error: CacheError) -> Self {
        match error {
            CacheError::Repo(err) => AppError::Repo(err),
            CacheError::Provider(err) => AppError::Provider(err),
            CacheError::Encode(err) => AppError::unexpected(err.to_string()),
        }
    }
}
