mod cache;
mod core;
mod env;
mod http;
mod scheduler;
mod views;

use std::sync::Arc;
use std::time::Duration;

use aurora_bus::StreamBus;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::cache::TtlCache;
use crate::env::EnvSettings;
use crate::http::AppState;

const DYNAMIC_CACHE_TTL: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = EnvSettings::load();
    info!(bind_addr = %settings.bind_addr, "stats-service starting");

    let pool = aurora_store::connect(&settings.database_url, settings.max_db_connections).await?;
    let bus = StreamBus::connect(&settings.redis_url).await?;

    tokio::spawn(scheduler::run(pool.clone()));

    let state = Arc::new(AppState {
        pool,
        bus,
        dynamic_cache: TtlCache::new(DYNAMIC_CACHE_TTL),
    });
    let app = http::router(state);
    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    info!(addr = %settings.bind_addr, "stats-service listening");

    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(e) = result {
                error!(error = %e, "http server exited");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    info!("stats-service stopped");
    Ok(())
}
