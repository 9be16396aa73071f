use std::{io, sync::Once};

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Where log lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSink {
    Stdout,
    /// Keeps stdout free for command output.
    Stderr,
}

/// Install a global tracing subscriber using the provided logging settings.
///
/// Fails if a global subscriber is already installed.
pub fn init(logging: &LoggingSettings, sink: LogSink) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer(logging.format, sink))
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn fmt_layer<S>(format: LogFormat, sink: LogSink) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'span> tracing_subscriber::registry::LookupSpan<'span>,
{
    match (format, sink) {
        (LogFormat::Json, LogSink::Stdout) => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        (LogFormat::Json, LogSink::Stderr) => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_writer(io::stderr)
            .boxed(),
        (LogFormat::Compact, LogSink::Stdout) => fmt::layer().compact().with_target(true).boxed(),
        (LogFormat::Compact, LogSink::Stderr) => fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(io::stderr)
            .boxed(),
    }
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "relaydoc_cache_hit_total",
            Unit::Count,
            "Total number of cache-aside reads served from the active tier."
        );
        describe_counter!(
            "relaydoc_cache_miss_total",
            Unit::Count,
            "Total number of cache-aside reads that invoked the loader."
        );
        describe_counter!(
            "relaydoc_cache_fallback_total",
            Unit::Count,
            "Total number of tier probes that fell back to the local cache."
        );
        describe_counter!(
            "relaydoc_upstream_attempt_total",
            Unit::Count,
            "Total number of outbound attempts, labelled by upstream and result."
        );
    });
}
