//! churn-ui - Telco customer churn dashboard
//!
//! Loads the pre-trained classifier and its label encoders, then serves the
//! Upload / Visualize / Predict / About pages and the JSON API.

use anyhow::{Context, Result};
use churn_common::config::{load_toml_config, ServiceConfig};
use churn_common::load_artifacts;
use churn_ui::cli::Args;
use churn_ui::{build_router, AppState};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // The log level comes from configuration, so configuration is read
    // before the subscriber exists; a load failure is reported after init.
    let toml = load_toml_config(args.config.as_deref());
    let config = ServiceConfig::resolve(args.overrides(), toml.as_ref().cloned().unwrap_or_default());

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("churn_ui={0},churn_common={0},tower_http={0}", config.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting churn-ui v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    toml.context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!("Model: {}", config.model_path.display());
    info!("Encoders: {}", config.encoders_path.display());

    // Artifact failures are fatal
    let artifacts = match load_artifacts(&config.model_path, &config.encoders_path) {
        Ok(artifacts) => artifacts,
        Err(e) => {
            error!("Failed to load artifacts: {}", e);
            return Err(e).context("Failed to load artifacts");
        }
    };
    info!(
        "✓ {} classifier ready (schema v{})",
        artifacts.classifier.kind(),
        artifacts.schema.version
    );

    let state = AppState::new(artifacts, &config);
    let app = build_router(state);

    let addr = config.listen_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
