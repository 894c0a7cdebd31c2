use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::EnvFilter;

use salwatch::config::{Config, StoreConfig};
use salwatch::store::{PgStore, RestStore, RowStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Load config
    let config = Config::from_env().expect("Failed to load configuration");

    // Init tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(&config.log_level)
        }))
        .init();

    tracing::info!("Starting salwatch");

    let store: Arc<dyn RowStore> = match &config.store {
        StoreConfig::Rest { url, api_key } => {
            tracing::info!("Watchdog store: REST at {url}");
            Arc::new(RestStore::new(url, api_key.clone()))
        }
        StoreConfig::Postgres { database_url } => {
            let store = PgStore::connect(database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Watchdog store: Postgres");
            Arc::new(store)
        }
    };

    let addr = SocketAddr::new(config.host, config.port);
    let base_url = config.base_url.clone();
    let app = salwatch::build_app(config, store);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {addr} ({base_url})");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
