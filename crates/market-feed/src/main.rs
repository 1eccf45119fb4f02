mod env;
mod http;
mod state;
mod venue_a;
mod venue_b;

use std::sync::Arc;
use std::time::Duration;

use aurora_bus::StreamBus;
use aurora_domain::Venue;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::env::EnvSettings;
use crate::state::FeedState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = EnvSettings::load();
    info!(bind_addr = %settings.bind_addr, interval = settings.scan_interval_seconds, "market-feed starting");

    let bus = StreamBus::connect(&settings.redis_url).await?;
    let state = Arc::new(FeedState::new());
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.http_timeout_secs))
        .build()?;

    tokio::spawn(poll_loop(client, bus, state.clone(), settings.clone()));

    let app = http::router(state);
    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    info!(addr = %settings.bind_addr, "market-feed listening");

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

    info!("market-feed stopped");
    Ok(())
}

async fn poll_loop(client: reqwest::Client, bus: StreamBus, state: Arc<FeedState>, settings: EnvSettings) {
    let interval = Duration::from_secs_f64(settings.scan_interval_seconds.max(1.0));
    loop {
        if let Err(e) = refresh(&client, &bus, &state, &settings).await {
            error!(error = %e, "funding refresh cycle failed");
        }
        tokio::time::sleep(interval).await;
    }
}

async fn refresh(
    client: &reqwest::Client,
    bus: &StreamBus,
    state: &FeedState,
    settings: &EnvSettings,
) -> anyhow::Result<()> {
    let venue_a = venue_a::fetch(client).await.unwrap_or_else(|e| {
        warn!(error = %e, "venue_a fetch failed");
        Vec::new()
    });
    let venue_b = venue_b::fetch(client, settings.bitget_concurrency).await.unwrap_or_else(|e| {
        warn!(error = %e, "venue_b fetch failed");
        Vec::new()
    });

    if !venue_a.is_empty() {
        info!(count = venue_a.len(), "fetched venue_a funding entries");
        state.replace(Venue::VenueA, venue_a.clone());
        publish_all(bus, &venue_a).await;
    }
    if !venue_b.is_empty() {
        state.replace(Venue::VenueB, venue_b.clone());
        publish_all(bus, &venue_b).await;
    }
    Ok(())
}

async fn publish_all(bus: &StreamBus, snapshots: &[aurora_domain::FundingSnapshot]) {
    for snapshot in snapshots {
        if let Err(e) = bus.publish_snapshot(snapshot, aurora_bus::DEFAULT_STREAM_MAXLEN).await {
            warn!(symbol = %snapshot.symbol, venue = %snapshot.venue, error = %e, "publish funding snapshot failed");
        }
    }
}
