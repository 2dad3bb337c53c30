mod config;
mod routes;
mod upload;

use config::ServerConfig;
use ephemera_core::{DiskMedium, Ephemera, ShareAddresses};
use routes::AppState;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ephemera_server=info,ephemera_core=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    let addr = format!("{}:{}", config.host, config.port);

    tokio::fs::create_dir_all(&config.upload_dir).await?;

    // The store is memory-resident and starts empty on every launch.
    let store_config = config.store_config();
    let service = Ephemera::new(
        &store_config,
        Arc::new(DiskMedium::new(&config.upload_dir)),
        ShareAddresses::new(&config.base_url),
    );
    let sweeper = service.sweeper().spawn(store_config.sweep_interval);

    let app = routes::router(AppState { service }, config.max_upload_bytes);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Ephemera listening on {}", addr);
    tracing::info!("   Public address: {}", config.base_url);
    tracing::info!("   Uploads: {}", config.upload_dir.display());
    tracing::info!("   Sweep interval: {}s", store_config.sweep_interval.as_secs());

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;

    sweeper.shutdown();
    Ok(())
}
