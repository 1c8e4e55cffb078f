//! HTTP server lifecycle

use anyhow::Result;
use tracing::{error, info};

use streamgate_core::{bootstrap::Services, Config};

/// Serve the HTTP API until SIGTERM or Ctrl+C, then drain in-flight requests
pub async fn run_http_server(config: &Config, services: Services) -> Result<()> {
    let http_addr = config.http_address();
    let router = streamgate_api::create_router(services, &config.server.cors_allowed_origins);

    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .map_err(|e| {
            error!("Failed to bind HTTP address {}: {}", http_addr, e);
            anyhow::anyhow!("Failed to bind {http_addr}: {e}")
        })?;

    info!("HTTP server listening on {}", http_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("HTTP server error: {}", e);
            anyhow::anyhow!("HTTP server error: {e}")
        })?;

    info!("HTTP server shut down gracefully");
    Ok(())
}

/// Wait for a shutdown signal (SIGTERM or SIGINT/Ctrl+C)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
        () = ctrl_c => { info!("Received Ctrl+C, shutting down"); }
        () = terminate => { info!("Received SIGTERM, shutting down"); }
    }
}
