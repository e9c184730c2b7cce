use std::collections::HashSet;
use std::sync::Arc;

use metrics_util::debugging::DebuggingRecorder;
use scrivo::application::content_cache::ContentCacheService;
use scrivo::application::post_index::PostIndexService;
use scrivo::application::i18n::LanguagePack;
use scrivo::domain::entities::ContentItem;
use scrivo::domain::types::PostStatus;
use scrivo::infra::memory::MemoryRepositories;
use serde_json::Map;

#[tokio::test]
async fn cache_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let repos = Arc::new(MemoryRepositories::new());
    let cache = ContentCacheService::new(repos.clone());

    for _ in 0..2 {
        cache
            .get(
                "posts",
                || async { Ok(vec![ContentItem::new("hello", "source/_posts/hello.md")]) },
                None,
            )
            .await
            .expect("listing");
    }

    PostIndexService::new(repos)
        .mark(
            &LanguagePack::default(),
            "source/_posts/hello.md",
            &Map::new(),
            PostStatus::Draft,
            "hello.md",
        )
        .await
        .expect("mark");

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "scrivo_content_cache_hit_total",
        "scrivo_content_cache_miss_total",
        "scrivo_content_cache_refresh_total",
        "scrivo_content_cache_fetch_ms",
        "scrivo_post_index_mark_total",
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
