use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::cache::{
    METRIC_RENDER_CACHE_BYPASS, METRIC_RENDER_CACHE_HIT, METRIC_RENDER_CACHE_MISS,
    METRIC_RENDER_CACHE_STORE,
};
use crate::config::{LogFormat, LoggingSettings};
use crate::content::changes::METRIC_CHANGES_TRACKED;

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
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

/// Register metric descriptions with the installed recorder. Runs once.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_RENDER_CACHE_HIT,
            Unit::Count,
            "Renders served from the page cache."
        );
        describe_counter!(
            METRIC_RENDER_CACHE_MISS,
            Unit::Count,
            "Cacheable renders that were not in the page cache or not reusable."
        );
        describe_counter!(
            METRIC_RENDER_CACHE_STORE,
            Unit::Count,
            "Renders written to the page cache."
        );
        describe_counter!(
            METRIC_RENDER_CACHE_BYPASS,
            Unit::Count,
            "Renders that skipped the page cache because of the request or entity."
        );
        describe_counter!(
            METRIC_CHANGES_TRACKED,
            Unit::Count,
            "Entities newly added to the changes index."
        );
    });
}
