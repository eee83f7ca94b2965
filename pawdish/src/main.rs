use clap::Parser;
use pawdish::{Application, Config, config::StorageBackendConfig, telemetry};

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let signal = tokio::select! {
        _ = ctrl_c => "Ctrl+C",
        _ = terminate => "SIGTERM",
    };
    tracing::info!("Received {signal}, finishing in-flight requests");
}

fn describe(config: &Config) -> String {
    let storage = match &config.storage.backend {
        StorageBackendConfig::Local { path, .. } => format!("local ({})", path.display()),
        StorageBackendConfig::S3 { bucket, .. } => format!("s3 ({bucket})"),
    };
    let enabled = |on: bool| if on { "enabled" } else { "disabled" };
    format!(
        "listen {}, storage {storage}, video {}, payments {}",
        config.bind_address(),
        enabled(config.video.is_some()),
        enabled(config.payment.is_some()),
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Before anything builds a TLS client
    pawdish::http::install_crypto_provider();

    let args = pawdish::config::Args::parse();
    let config = Config::load(&args)?;

    if args.validate {
        println!("Configuration is valid: {}", describe(&config));
        return Ok(());
    }

    telemetry::init_telemetry(config.enable_otel_export)?;
    tracing::info!(config_file = %args.config, "Starting pawdish: {}", describe(&config));

    Application::new(config).await?.serve(shutdown_signal()).await
}
