use anyhow::Context;
use cancel_stale_runs::domain::models::settings::Settings;
use cancel_stale_runs::infrastructures::adapters::primary::cli;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::env;
use tracing::info_span;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const OTLP_ENDPOINT_VAR: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let provider = init_tracing()?;

    let result = run().await;

    if let Some(provider) = provider {
        if let Err(e) = provider.shutdown() {
            tracing::warn!("Failed to flush traces: {}", e);
        }
    }

    result
}

/// Installs the stderr formatter, plus an OTLP exporter when an endpoint is configured.
fn init_tracing() -> anyhow::Result<Option<SdkTracerProvider>> {
    let provider = if env::var_os(OTLP_ENDPOINT_VAR).is_some() {
        let otlp_exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .build()
            .context("Failed to create OTLP exporter")?;
        Some(
            SdkTracerProvider::builder()
                .with_batch_exporter(otlp_exporter)
                .build(),
        )
    } else {
        None
    };

    let telemetry = provider
        .as_ref()
        .map(|provider| tracing_opentelemetry::layer().with_tracer(provider.tracer("cancel-stale-runs")));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(telemetry)
        .with(fmt_layer)
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    Ok(provider)
}

async fn run() -> anyhow::Result<()> {
    let settings = {
        let _span = info_span!("initialize").entered();
        Settings::from_env().context("Failed to read settings from the environment")?
    };

    cli::run(settings).await?;
    Ok(())
}
