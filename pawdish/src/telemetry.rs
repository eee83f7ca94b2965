//! Logging and optional OpenTelemetry trace export.
//!
//! Logs always go to stdout through `tracing-subscriber`, filtered by `RUST_LOG` (default
//! `info`). With `enable_otel_export: true`, spans are additionally exported over OTLP/HTTP,
//! configured by the standard variables:
//!
//! - `OTEL_SERVICE_NAME` (default `pawdish`)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT` (default `http://localhost:4318`)
//! - `OTEL_EXPORTER_OTLP_PROTOCOL`: `http/protobuf` (default) or `http/json`
//! - `OTEL_EXPORTER_OTLP_HEADERS`: comma-separated `key=value` pairs, `%20` for spaces
//!
//! ```bash
//! export OTEL_EXPORTER_OTLP_ENDPOINT="https://otlp-gateway.example.com/otlp"
//! export OTEL_EXPORTER_OTLP_HEADERS="Authorization=Basic%20<token>"
//! ```
//!
//! A broken exporter setup never stops the server; it falls back to stdout only.

use opentelemetry::KeyValue;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::{Protocol, WithExportConfig, WithHttpConfig};
use opentelemetry_sdk::trace::{SdkTracerProvider, Tracer};
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Kept so shutdown can flush spans still sitting in the batch exporter.
static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

#[derive(Debug, Clone, PartialEq)]
struct OtlpSettings {
    service_name: String,
    endpoint: String,
    protocol: Protocol,
    headers: HashMap<String, String>,
}

impl OtlpSettings {
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            service_name: lookup("OTEL_SERVICE_NAME").unwrap_or_else(|| "pawdish".to_string()),
            endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").unwrap_or_else(|| "http://localhost:4318".to_string()),
            protocol: match lookup("OTEL_EXPORTER_OTLP_PROTOCOL").as_deref() {
                Some("http/json") => Protocol::HttpJson,
                _ => Protocol::HttpBinary,
            },
            headers: lookup("OTEL_EXPORTER_OTLP_HEADERS")
                .map(|raw| parse_otlp_headers(&raw))
                .unwrap_or_default(),
        }
    }

    fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

/// Install the global subscriber. Fails only if one is already installed.
pub fn init_telemetry(enable_otel_export: bool) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let settings = enable_otel_export.then(OtlpSettings::from_env);
    let (tracer, export_error) = match settings.as_ref().map(create_otlp_tracer) {
        Some(Ok(tracer)) => (Some(tracer), None),
        Some(Err(e)) => (None, Some(e)),
        None => (None, None),
    };
    let otel_layer = tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(otel_layer)
        .try_init()?;

    match (settings, export_error) {
        (Some(_), Some(e)) => warn!("OTLP export requested but could not be set up, logging to stdout only: {e}"),
        (Some(settings), None) => info!(
            service = %settings.service_name,
            endpoint = %settings.endpoint,
            custom_headers = settings.headers.len(),
            "Telemetry initialized with OTLP export"
        ),
        (None, _) => info!("Telemetry initialized (OTLP export disabled)"),
    }

    Ok(())
}

fn create_otlp_tracer(settings: &OtlpSettings) -> anyhow::Result<Tracer> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(&settings.endpoint)
        .with_protocol(settings.protocol)
        .with_headers(settings.headers.clone())
        .build()?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(
            opentelemetry_sdk::Resource::builder()
                .with_attribute(KeyValue::new("service.name", settings.service_name.clone()))
                .build(),
        )
        .build();

    let tracer = provider.tracer(settings.service_name.clone());
    let _ = TRACER_PROVIDER.set(provider);

    Ok(tracer)
}

fn parse_otlp_headers(raw: &str) -> HashMap<String, String> {
    raw.replace("%20", " ")
        .split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Flush pending spans. Call once, after the server has stopped.
pub fn shutdown_telemetry() {
    if let Some(provider) = TRACER_PROVIDER.get()
        && let Err(e) = provider.shutdown()
    {
        tracing::error!("Failed to shutdown tracer provider: {}", e);
    }
}
