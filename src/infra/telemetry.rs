use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install the global tracing subscriber and register metric descriptions.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "scrivo_content_cache_hit_total",
            Unit::Count,
            "Listings served from a cached snapshot."
        );
        describe_counter!(
            "scrivo_content_cache_miss_total",
            Unit::Count,
            "Listings that required a provider fetch."
        );
        describe_counter!(
            "scrivo_content_cache_refresh_total",
            Unit::Count,
            "Base cache entries rebuilt from a provider fetch."
        );
        describe_histogram!(
            "scrivo_content_cache_fetch_ms",
            Unit::Milliseconds,
            "Provider fetch latency in milliseconds."
        );
        describe_counter!(
            "scrivo_post_index_mark_total",
            Unit::Count,
            "Post index rows written."
        );
    });
}
