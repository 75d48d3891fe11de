//! CLI entry point - the composition root.
//!
//! Loads configuration, builds the one `StreamService`, serves the HTTP API,
//! and translates OS signals into cancellation of the service token.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use streamgate_axum::{CorsConfig, ServerConfig, serve};
use streamgate_cli::{Cli, load_settings, load_streams, write_sample_config};
use streamgate_runtime::StreamService;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before parsing so env-backed flags see it
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.create_config {
        return write_sample_config(&cli.config);
    }

    let settings = load_settings(cli.settings.as_deref())?;
    let service = Arc::new(StreamService::new(settings).context("Invalid settings")?);

    for entry in load_streams(&cli.config) {
        let definition = entry.into_definition(service.settings());
        let name = definition.name.clone();
        if let Err(e) = service.add_definition(definition).await {
            error!(stream = %name, "Skipping stream: {}", e);
        }
    }
    for (name, result) in service.start_all().await {
        if let Err(e) = result {
            warn!(stream = %name, "Stream did not start: {}", e);
        }
    }
    service.start_monitoring().await;

    let token = service.cancel_token();
    let signal_token = token.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received");
        signal_token.cancel();
    });

    let served = if cli.no_http {
        token.cancelled().await;
        Ok(())
    } else {
        let config = ServerConfig {
            host: cli.http_host.clone(),
            port: cli.http_port,
            cors: CorsConfig::AllowAll,
        };
        serve(Arc::clone(&service), &config, token.clone()).await
    };

    // Monitor first, then every worker
    service.shutdown().await;
    served
}
