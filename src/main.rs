// src/main.rs
use std::sync::Arc;

use axum_server::Handle;
use dotenvy::dotenv;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use poll_service::config::Config;
use poll_service::db::{create_pool, MemoryPollMap, PgPollMap, PollMap};
use poll_service::ids::RandomIds;
use poll_service::routes::{self, AppState};
use poll_service::PollStore;

async fn open_map(config: &Config) -> Result<Arc<dyn PollMap>, Box<dyn std::error::Error>> {
    match &config.database_url {
        Some(url) => {
            let pool = create_pool(url, config.max_connections).await?;
            let map = PgPollMap::new(pool);
            map.ensure_schema().await?;
            info!("using PostgreSQL poll storage");
            Ok(Arc::new(map))
        }
        None => {
            warn!("DATABASE_URL not set, polls are kept in memory only");
            Ok(Arc::new(MemoryPollMap::new()))
        }
    }
}

async fn shutdown_on_ctrl_c(handle: Handle) {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
        handle.graceful_shutdown(None);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok(); // Load environment variables from .env file

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("poll_service=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    let map = open_map(&config).await?;
    let store = PollStore::new(map, Arc::new(RandomIds));
    let app = routes::app(AppState::new(store), config.cors_allow_origin.as_deref());

    let addr = config.bind_addr();
    let handle = Handle::new();
    tokio::spawn(shutdown_on_ctrl_c(handle.clone()));

    info!("listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}
