//! Content provider backed by a local checkout of a Hexo-style site.
//!
//! Layout:
//! - posts: `*.md` under `source/_posts` (published) and `source/_drafts` (draft)
//! - pages: `index.md` anywhere under `source/` outside `_posts` and `_drafts`
//! - configs: `*.yml`/`*.yaml` at the root and under `source/_data`

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use walkdir::WalkDir;

use crate::{
    application::provider::{ContentProvider, ProviderError},
    domain::{entities::ContentItem, types::PostStatus},
};

const SOURCE_DIR: &str = "source";
const POSTS_DIR: &str = "_posts";
const DRAFTS_DIR: &str = "_drafts";
const DATA_DIR: &str = "_data";
const PAGE_FILE: &str = "index.md";

#[derive(Debug, Clone)]
pub struct LocalSiteProvider {
    root: PathBuf,
}

impl LocalSiteProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn scan<F>(
        &self,
        collection: &'static str,
        scan: F,
    ) -> Result<Vec<ContentItem>, ProviderError>
    where
        F: FnOnce(&Path) -> Result<Vec<ContentItem>, ProviderError> + Send + 'static,
    {
        let root = self.root.clone();
        let items = tokio::task::spawn_blocking(move || scan(&root))
            .await
            .map_err(|err| ProviderError::task(err.to_string()))??;
        debug!(collection, count = items.len(), "scanned local site");
        Ok(items)
    }
}

#[async_trait]
impl ContentProvider for LocalSiteProvider {
    async fn get_posts(&self) -> Result<Vec<ContentItem>, ProviderError> {
        self.scan("posts", scan_posts).await
    }

    async fn get_pages(&self) -> Result<Vec<ContentItem>, ProviderError> {
        self.scan("pages", scan_pages).await
    }

    async fn get_configs(&self) -> Result<Vec<ContentItem>, ProviderError> {
        self.scan("configs", scan_configs).await
    }
}

fn scan_posts(root: &Path) -> Result<Vec<ContentItem>, ProviderError> {
    let mut items = Vec::new();
    for (dir, status) in [
        (POSTS_DIR, PostStatus::Published),
        (DRAFTS_DIR, PostStatus::Draft),
    ] {
        let base = root.join(SOURCE_DIR).join(dir);
        for path in files_under(&base, None)? {
            if !has_extension(&path, &["md"]) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            items.push(
                describe(root, &path, stem)?
                    .with_attribute("fullname", file_name(&path))
                    .with_attribute("status", status.as_str()),
            );
        }
    }
    Ok(items)
}

fn scan_pages(root: &Path) -> Result<Vec<ContentItem>, ProviderError> {
    let source = root.join(SOURCE_DIR);
    let mut items = Vec::new();
    for path in files_under(&source, None)? {
        if file_name(&path) != PAGE_FILE {
            continue;
        }
        let Ok(relative) = path.strip_prefix(&source) else {
            continue;
        };
        let mut components = relative.components();
        let top = components
            .next()
            .map(|part| part.as_os_str().to_string_lossy().into_owned())
            .unwrap_or_default();
        if top == POSTS_DIR || top == DRAFTS_DIR {
            continue;
        }
        let name = relative
            .parent()
            .map(slash_path)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| PAGE_FILE.to_string());
        items.push(describe(root, &path, &name)?);
    }
    Ok(items)
}

fn scan_configs(root: &Path) -> Result<Vec<ContentItem>, ProviderError> {
    let mut items = Vec::new();
    let data = root.join(SOURCE_DIR).join(DATA_DIR);
    let mut paths = files_under(root, Some(1))?;
    paths.extend(files_under(&data, None)?);
    for path in paths {
        if !has_extension(&path, &["yml", "yaml"]) {
            continue;
        }
        let name = file_name(&path);
        items.push(describe(root, &path, &name)?);
    }
    Ok(items)
}

/// Regular files below `base`, sorted by path. Missing directories yield nothing.
fn files_under(base: &Path, max_depth: Option<usize>) -> Result<Vec<PathBuf>, ProviderError> {
    if !base.is_dir() {
        return Ok(Vec::new());
    }
    let mut walker = WalkDir::new(base).min_depth(1).sort_by_file_name();
    if let Some(depth) = max_depth {
        walker = walker.max_depth(depth);
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|err| match err.into_io_error() {
            Some(io) => ProviderError::Io(io),
            None => ProviderError::rejected("filesystem loop detected"),
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn describe(root: &Path, path: &Path, name: &str) -> Result<ContentItem, ProviderError> {
    let size = std::fs::metadata(path)?.len();
    let relative = path.strip_prefix(root).unwrap_or(path);
    Ok(ContentItem::new(name, slash_path(relative)).with_attribute("size", size))
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|candidate| ext.eq_ignore_ascii_case(candidate))
        })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|part| part.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
