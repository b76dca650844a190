use std::backtrace::Backtrace;

use anyhow::Context;
use opentelemetry::{KeyValue, global, trace::TraceError};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource,
    propagation::TraceContextPropagator,
    runtime,
    trace::{RandomIdGenerator, Sampler, Tracer},
};
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};
use sales_config::{LogFormat, ObservabilityConfig};
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::Layered, layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::middleware::panics::panic_message;

type Filtered = Layered<EnvFilter, Registry>;

fn init_tracer(config: &ObservabilityConfig) -> Result<Tracer, TraceError> {
    info!(
        "Initializing OpenTelemetry tracer with endpoint: {}",
        config.otlp_endpoint
    );

    global::set_text_map_propagator(TraceContextPropagator::new());

    let resource = Resource::new(vec![
        KeyValue::new(SERVICE_NAME, env!("CARGO_PKG_NAME")),
        KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
        KeyValue::new(
            "environment",
            std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        ),
    ]);

    let otlp_exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(config.otlp_endpoint.clone());

    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(otlp_exporter)
        .with_trace_config(
            opentelemetry_sdk::trace::Config::default()
                .with_sampler(Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(
                    config.trace_probability,
                ))))
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(resource),
        )
        .install_batch(runtime::Tokio)
}

/// Default filter when `RUST_LOG` is unset.
pub fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{}=info,tower_http=warn", env!("CARGO_CRATE_NAME")))
    })
}

fn console_layer(format: LogFormat) -> Box<dyn Layer<Filtered> + Send + Sync> {
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_file(true)
            .with_line_number(true)
            .compact()
            .boxed(),
    }
}

/// Installs the global subscriber: console output in the configured format
/// and, when enabled, OTLP span export.
///
/// An unreachable collector is not fatal; logging continues console-only.
pub fn init_tracing(config: &ObservabilityConfig) -> anyhow::Result<()> {
    let tracer = if config.enabled {
        match init_tracer(config) {
            Ok(tracer) => Some(tracer),
            Err(e) => {
                eprintln!(
                    "⚠️  Failed to initialize OpenTelemetry: {}. Continuing without tracing...",
                    e
                );
                None
            }
        }
    } else {
        None
    };
    let exporting = tracer.is_some();

    tracing_subscriber::registry()
        .with(default_filter())
        .with(console_layer(config.log_format))
        .with(tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer)))
        .try_init()
        .context("installing tracing subscriber")?;

    if exporting {
        info!("Tracing initialized with OpenTelemetry export");
    } else {
        warn!("Tracing initialized without OpenTelemetry (console only)");
    }

    Ok(())
}

/// Flushes pending spans.
pub fn shutdown_tracer() {
    info!("Shutting down OpenTelemetry tracer...");
    global::shutdown_tracer_provider();
}

/// Logs every panic with its location and a captured backtrace.
///
/// The panics middleware recovers the request afterwards; this hook only
/// makes sure the stack is on record.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());

        error!(
            panic.message = %panic_message(info.payload()),
            panic.location = %location,
            panic.backtrace = %Backtrace::force_capture(),
            "panic"
        );
    }));
}
