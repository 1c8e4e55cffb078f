mod server;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};

use streamgate_core::{
    bootstrap::{init_database, init_services, load_config},
    logging,
    repository::{MemoryStreamStore, PgStreamStore, StreamStore},
};

#[derive(Parser, Debug)]
#[command(name = "streamgate")]
#[command(about = "Live-stream ingest control plane", long_about = None)]
struct Args {
    /// Config file (YAML or TOML)
    #[arg(long, short, env = "STREAMGATE_CONFIG_PATH")]
    config: Option<String>,

    /// Do not apply database migrations on startup
    #[arg(long, env = "STREAMGATE_SKIP_MIGRATIONS")]
    skip_migrations: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Load and validate configuration
    let config = load_config(args.config.as_deref())?;

    // 2. Initialize logging
    logging::init_logging(&config.logging)?;
    info!("streamgate starting...");
    info!("HTTP address: {}", config.http_address());

    // 3. Open the store
    let store: Arc<dyn StreamStore> = if config.database.is_memory() {
        warn!("Using the in-memory store; all state is lost on exit");
        Arc::new(MemoryStreamStore::new())
    } else {
        let pool = init_database(&config.database).await?;

        if args.skip_migrations {
            info!("Skipping database migrations");
        } else {
            info!("Running database migrations...");
            sqlx::migrate!("../migrations")
                .run(&pool)
                .await
                .map_err(|e| {
                    error!("Failed to run migrations: {}", e);
                    anyhow::anyhow!("Migration failed: {e}")
                })?;
            info!("Migrations completed");
        }

        Arc::new(PgStreamStore::new(pool))
    };

    // 4. Initialize services and serve
    let services = init_services(store, &config)?;
    server::run_http_server(&config, services).await?;

    info!("streamgate stopped");
    Ok(())
}
