use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::application::listings::{
    METRIC_CACHE_FAULT, METRIC_CACHE_HIT, METRIC_CACHE_INVALIDATE_FAILED, METRIC_CACHE_MISS,
    METRIC_CACHE_PUT_FAILED,
};
use crate::cache::METRIC_CACHE_EVICT;
use crate::config::{LogFormat, LoggingSettings};
use crate::infra::http::METRIC_HTTP_REQUEST_MS;

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
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
            METRIC_CACHE_HIT,
            Unit::Count,
            "Listings served from the view cache."
        );
        describe_counter!(
            METRIC_CACHE_MISS,
            Unit::Count,
            "Listings rebuilt from the store because no cached view existed."
        );
        describe_counter!(
            METRIC_CACHE_FAULT,
            Unit::Count,
            "Cache reads that failed or returned a corrupt view."
        );
        describe_counter!(
            METRIC_CACHE_PUT_FAILED,
            Unit::Count,
            "Rebuilt listings that could not be written back to the cache."
        );
        describe_counter!(
            METRIC_CACHE_INVALIDATE_FAILED,
            Unit::Count,
            "Listing invalidations that failed after a committed write."
        );
        describe_counter!(
            METRIC_CACHE_EVICT,
            Unit::Count,
            "Cached listings evicted due to capacity."
        );
        describe_histogram!(
            METRIC_HTTP_REQUEST_MS,
            Unit::Milliseconds,
            "HTTP request latency in milliseconds."
        );
    });
}
