use std::sync::Once;

use metrics::{Unit, describe_counter};
use thiserror::Error;
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

static METRIC_DESCRIPTIONS: Once = Once::new();

#[derive(Debug, Error)]
#[error("telemetry initialization failed: {0}")]
pub struct TelemetryError(String);

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), TelemetryError> {
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
        .map_err(|err| TelemetryError(format!("failed to install tracing subscriber: {err}")))
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "brezza_store_fallback_total",
            Unit::Count,
            "Total number of storage operations that fell through a medium."
        );
        describe_counter!(
            "brezza_store_malformed_total",
            Unit::Count,
            "Total number of malformed storage records treated as absent."
        );
        describe_counter!(
            "brezza_cache_hit_total",
            Unit::Count,
            "Total number of expiring-cache hits."
        );
        describe_counter!(
            "brezza_cache_miss_total",
            Unit::Count,
            "Total number of expiring-cache misses, by reason."
        );
        describe_counter!(
            "brezza_render_memory_hit_total",
            Unit::Count,
            "Total number of resolutions served from the in-process cache."
        );
        describe_counter!(
            "brezza_render_generate_total",
            Unit::Count,
            "Total number of content generations, by tier."
        );
        describe_counter!(
            "brezza_render_fallback_total",
            Unit::Count,
            "Total number of adaptive static-to-dynamic fallbacks."
        );
        describe_counter!(
            "brezza_security_event_total",
            Unit::Count,
            "Total number of recorded security events, by kind."
        );
        describe_counter!(
            "brezza_security_persist_failure_total",
            Unit::Count,
            "Total number of security event persistence failures."
        );
        describe_counter!(
            "brezza_rate_limit_rejected_total",
            Unit::Count,
            "Total number of rate-limited requests."
        );
    });
}
