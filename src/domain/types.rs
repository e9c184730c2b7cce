//! Shared domain enumerations aligned with persisted values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Publication state stored in the post index as a small integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }

    pub fn as_i16(self) -> i16 {
        match self {
            PostStatus::Draft => 0,
            PostStatus::Published => 1,
        }
    }
}

impl TryFrom<i16> for PostStatus {
    type Error = DomainError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PostStatus::Draft),
            1 => Ok(PostStatus::Published),
            other => Err(DomainError::unknown("post status code", other)),
        }
    }
}

impl FromStr for PostStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "draft" | "0" => Ok(PostStatus::Draft),
            "published" | "1" => Ok(PostStatus::Published),
            other => Err(DomainError::unknown("post status", other)),
        }
    }
}

/// Remote content collections mirrored by the content cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Posts,
    Pages,
    Configs,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Posts, Collection::Pages, Collection::Configs];

    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Posts => "posts",
            Collection::Pages => "pages",
            Collection::Configs => "configs",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|collection| collection.as_str() == value)
            .ok_or_else(|| DomainError::unknown("collection", value))
    }
}
