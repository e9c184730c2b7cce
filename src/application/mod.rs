//! Application services layer.

pub mod content_cache;
pub mod context;
pub mod error;
pub mod i18n;
pub mod post_index;
pub mod provider;
pub mod repos;
