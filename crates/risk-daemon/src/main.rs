mod config_listener;
mod decision;
mod env;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use aurora_bus::StreamBus;
use aurora_domain::{EventType, FundingSnapshot, PositionGroup, PositionLeg, RuntimeConfigCell, Side, Venue};
use chrono::Utc;
use sqlx::PgPool;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::decision::{decide_close, CloseDecision};
use crate::env::EnvSettings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = EnvSettings::load();
    info!("risk-daemon starting");

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.http_timeout_secs))
        .build()?;
    let initial_state = config_listener::bootstrap(&client, &settings.config_service_url).await;
    let config_cell = Arc::new(RuntimeConfigCell::new(initial_state));
    tokio::spawn(config_listener::run(config_cell.clone(), settings.redis_url.clone()));

    let pool = aurora_store::connect(&settings.database_url, settings.max_db_connections).await?;
    let bus = StreamBus::connect(&settings.redis_url).await?;

    let tick_task = tokio::spawn(tick_loop(bus, pool, config_cell));

    tokio::select! {
        result = tick_task => {
            if let Err(e) = result {
                error!(error = %e, "tick task panicked");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    info!("risk-daemon stopped");
    Ok(())
}

async fn tick_loop(bus: StreamBus, pool: PgPool, config_cell: Arc<RuntimeConfigCell>) {
    loop {
        let interval_secs = config_cell.get().close_interval_seconds.max(1.0);
        if let Err(e) = run_tick(&bus, &pool, &config_cell).await {
            error!(error = %e, "risk tick failed");
        }
        tokio::time::sleep(Duration::from_secs_f64(interval_secs)).await;
    }
}

async fn run_tick(bus: &StreamBus, pool: &PgPool, config_cell: &RuntimeConfigCell) -> anyhow::Result<()> {
    let config = config_cell.get();
    if !config.global_enable {
        return Ok(());
    }

    let groups = aurora_store::positions::get_open_groups_with_legs(pool).await?;
    if groups.is_empty() {
        return Ok(());
    }

    let snapshots = bus.scan_recent_snapshots(500).await?;
    let latest = newest_wins_by_venue_symbol(snapshots);

    for (group, legs) in groups {
        if let Err(e) = evaluate_group(pool, &group, &legs, &latest, &config.thresholds).await {
            error!(group_id = %group.group_id, error = %e, "evaluate group failed");
        }
    }
    Ok(())
}

/// `scan_recent_snapshots` returns newest-first; keep only the first (i.e.
/// newest) entry seen for each `(venue, symbol)` pair.
fn newest_wins_by_venue_symbol(snapshots: Vec<FundingSnapshot>) -> HashMap<(Venue, String), FundingSnapshot> {
    let mut map = HashMap::new();
    for snapshot in snapshots {
        map.entry((snapshot.venue, snapshot.symbol.clone())).or_insert(snapshot);
    }
    map
}

/// `mark_price` when present, else `index_price`.
fn mark_of(snapshot: &FundingSnapshot) -> Option<f64> {
    snapshot.mark_price.or(snapshot.index_price)
}

async fn evaluate_group(
    pool: &PgPool,
    group: &PositionGroup,
    legs: &[PositionLeg],
    latest: &HashMap<(Venue, String), FundingSnapshot>,
    thresholds: &aurora_domain::Thresholds,
) -> anyhow::Result<()> {
    let Some(long_leg) = legs.iter().find(|l| l.side == Side::Long) else {
        warn!(group_id = %group.group_id, "group missing long leg, skip");
        return Ok(());
    };
    let Some(short_leg) = legs.iter().find(|l| l.side == Side::Short) else {
        warn!(group_id = %group.group_id, "group missing short leg, skip");
        return Ok(());
    };

    let Some(long_snapshot) = latest.get(&(group.long_exchange, group.symbol.clone())) else {
        return Ok(());
    };
    let Some(short_snapshot) = latest.get(&(group.short_exchange, group.symbol.clone())) else {
        return Ok(());
    };
    let Some(long_mark) = mark_of(long_snapshot) else {
        return Ok(());
    };
    let Some(short_mark) = mark_of(short_snapshot) else {
        return Ok(());
    };

    let current_diff = long_snapshot.rate8h() - short_snapshot.rate8h();
    let countdown_minutes =
        long_snapshot.settle_countdown_secs().min(short_snapshot.settle_countdown_secs()) as f64 / 60.0;

    let Some(decision) = decide_close(
        group.funding_diff,
        long_leg.entry_price,
        long_mark,
        short_leg.entry_price,
        short_mark,
        current_diff,
        countdown_minutes,
        thresholds,
    ) else {
        return Ok(());
    };

    close_group(pool, group, long_leg, short_leg, long_mark, short_mark, decision).await
}

async fn close_group(
    pool: &PgPool,
    group: &PositionGroup,
    long_leg: &PositionLeg,
    short_leg: &PositionLeg,
    long_mark: f64,
    short_mark: f64,
    decision: CloseDecision,
) -> anyhow::Result<()> {
    let long_pnl = decision.long_return * long_leg.notional;
    let short_pnl = decision.short_return * short_leg.notional;
    let realized_pnl = long_pnl + short_pnl;
    let expected_rate8h = realized_pnl / (group.notional_per_leg * 2.0);
    let closed_at = Utc::now();

    let mut tx = pool.begin().await?;
    aurora_store::positions::close_group(
        &mut tx,
        &group.group_id,
        closed_at,
        decision.reason,
        decision.current_diff,
        expected_rate8h,
        realized_pnl,
        long_mark,
        long_pnl,
        short_mark,
        short_pnl,
    )
    .await?;

    aurora_store::events::insert_event(
        &mut tx,
        &group.group_id,
        &group.symbol,
        EventType::Close,
        Some(decision.reason),
        Some(realized_pnl),
        serde_json::json!({
            "close_prices": {"long": long_mark, "short": short_mark},
            "returns": {
                "long": decision.long_return,
                "short": decision.short_return,
                "total": decision.total_return,
                "worst": decision.worst_return,
            },
            "notional_per_leg": group.notional_per_leg,
        }),
    )
    .await?;
    tx.commit().await?;

    info!(
        group_id = %group.group_id,
        symbol = %group.symbol,
        reason = %decision.reason,
        realized_pnl,
        "closed simulated group"
    );
    Ok(())
}
