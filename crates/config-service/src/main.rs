mod env;
mod http;
mod merge;

use std::sync::Arc;

use aurora_bus::ConfigNotifier;
use aurora_domain::ConfigProfile;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::env::EnvSettings;
use crate::http::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = EnvSettings::load();
    info!(bind_addr = %settings.bind_addr, "config-service starting");

    let pool = aurora_store::connect(&settings.database_url, settings.max_db_connections).await?;
    let notifier = ConfigNotifier::connect(&settings.redis_url).await?;

    bootstrap(&pool).await?;

    let state = Arc::new(AppState { pool, notifier });
    let app = http::router(state);
    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    info!(addr = %settings.bind_addr, "config-service listening");

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

    info!("config-service stopped");
    Ok(())
}

/// If no profile exists yet, insert the version-1 bootstrap profile built
/// from defaults and record an `INITIALIZE` audit entry. This is the
/// canonical bootstrap variant — the service never waits for the first
/// operator PUT to have a profile to serve.
async fn bootstrap(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    if aurora_store::config::latest_version(pool).await?.is_some() {
        return Ok(());
    }

    let profile = ConfigProfile::bootstrap();
    let inserted = aurora_store::config::insert_profile(pool, &profile).await?;
    aurora_store::config::insert_audit_log(
        pool,
        inserted.version,
        "system",
        "INITIALIZE",
        serde_json::to_value(&inserted)?,
    )
    .await?;
    info!(version = inserted.version, "bootstrapped initial config profile");
    Ok(())
}
