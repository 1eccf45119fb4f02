mod config_listener;
mod env;

use std::sync::Arc;
use std::time::Duration;

use aurora_bus::StreamBus;
use aurora_domain::{
    EventType, FundingSnapshot, Opportunity, PositionGroup, PositionLeg, RuntimeConfigCell, Side, Status, Venue,
};
use chrono::Utc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::env::EnvSettings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = EnvSettings::load();
    info!("execution-gateway starting");

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.http_timeout_secs))
        .build()?;
    let initial_state = config_listener::bootstrap(&client, &settings.config_service_url).await;
    let config_cell = Arc::new(RuntimeConfigCell::new(initial_state));
    tokio::spawn(config_listener::run(config_cell.clone(), settings.redis_url.clone()));

    let pool = aurora_store::connect(&settings.database_url, settings.max_db_connections).await?;
    let bus = StreamBus::connect(&settings.redis_url).await?;
    bus.ensure_consumer_group().await?;

    let consumer_name = format!("executor-{}", std::process::id());
    let consumer = tokio::spawn(consume_loop(bus, pool, config_cell, consumer_name));

    tokio::select! {
        result = consumer => {
            if let Err(e) = result {
                error!(error = %e, "consumer task panicked");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    info!("execution-gateway stopped");
    Ok(())
}

async fn consume_loop(
    bus: StreamBus,
    pool: sqlx::PgPool,
    config_cell: Arc<RuntimeConfigCell>,
    consumer_name: String,
) {
    info!(consumer = %consumer_name, "execution consumer started");
    loop {
        let entries = match bus.read_opportunities(&consumer_name, 20, 5000).await {
            Ok(entries) => entries,
            Err(e) => {
                error!(error = %e, "read opportunities failed");
                tokio::time::sleep(Duration::from_secs(5)).await;
                continue;
            }
        };

        for (entry_id, opportunity) in entries {
            match handle_opportunity(&bus, &pool, &config_cell, &opportunity).await {
                Ok(true) => {
                    if let Err(e) = bus.ack_opportunity(&entry_id).await {
                        error!(error = %e, entry_id = %entry_id, "ack opportunity failed");
                    }
                }
                Ok(false) => info!(entry_id = %entry_id, group_id = %opportunity.group_id, "deferring opportunity"),
                Err(e) => error!(error = %e, entry_id = %entry_id, "handle opportunity failed"),
            }
        }
    }
}

/// Returns `Ok(true)` when the entry should be ack'd (handled, idempotent
/// no-op, or deliberately skipped) and `Ok(false)` when it should be left
/// unacked so the consumer group redelivers it once capacity frees up.
async fn handle_opportunity(
    bus: &StreamBus,
    pool: &sqlx::PgPool,
    config_cell: &RuntimeConfigCell,
    opportunity: &Opportunity,
) -> anyhow::Result<bool> {
    let config = config_cell.get();
    if !config.global_enable {
        info!(group_id = %opportunity.group_id, "global switch off, skip");
        return Ok(true);
    }

    let long_snapshot = latest_snapshot(bus, opportunity.long_venue, &opportunity.symbol).await?;
    let short_snapshot = latest_snapshot(bus, opportunity.short_venue, &opportunity.symbol).await?;
    let entry_price_long = entry_price(long_snapshot.as_ref());
    let entry_price_short = entry_price(short_snapshot.as_ref());

    if aurora_store::positions::group_exists(pool, &opportunity.group_id).await? {
        info!(group_id = %opportunity.group_id, "group already exists, ack");
        return Ok(true);
    }

    let open_groups = aurora_store::positions::count_open_groups(pool).await?;
    if open_groups as u32 >= config.risk_limits.group_max {
        warn!(group_max = config.risk_limits.group_max, "group_max reached");
        return Ok(false);
    }

    let symbol_open = aurora_store::positions::count_open_groups_for_symbol(pool, &opportunity.symbol).await?;
    if symbol_open as u32 >= config.risk_limits.duplicate_max {
        warn!(symbol = %opportunity.symbol, duplicate_max = config.risk_limits.duplicate_max, "duplicate_max reached");
        return Ok(false);
    }

    let leverage = config.risk_limits.leverage_max;
    let margin = config.risk_limits.margin_per_leg;
    let notional = margin * leverage;
    let now = Utc::now();

    let group = PositionGroup {
        group_id: opportunity.group_id.clone(),
        symbol: opportunity.symbol.clone(),
        long_exchange: opportunity.long_venue,
        short_exchange: opportunity.short_venue,
        leverage,
        margin_per_leg: margin,
        notional_per_leg: notional,
        funding_diff: opportunity.funding_diff,
        expected_rate8h: opportunity.expected_rate8h,
        realized_pnl: 0.0,
        status: Status::Open,
        simulated: true,
        opened_at: now,
        closed_at: None,
        close_reason: None,
        created_at: now,
        updated_at: now,
    };

    let legs = vec![
        PositionLeg {
            id: 0,
            group_id: group.group_id.clone(),
            exchange: opportunity.long_venue,
            side: Side::Long,
            quantity: notional,
            entry_price: entry_price_long,
            exit_price: None,
            margin,
            notional,
            fee_rate: 0.0,
            status: Status::Open,
            opened_at: now,
            closed_at: None,
            pnl: Some(0.0),
        },
        PositionLeg {
            id: 0,
            group_id: group.group_id.clone(),
            exchange: opportunity.short_venue,
            side: Side::Short,
            quantity: notional,
            entry_price: entry_price_short,
            exit_price: None,
            margin,
            notional,
            fee_rate: 0.0,
            status: Status::Open,
            opened_at: now,
            closed_at: None,
            pnl: Some(0.0),
        },
    ];

    let mut tx = pool.begin().await?;
    match aurora_store::positions::insert_group_with_legs(&mut tx, &group, &legs).await {
        Ok(()) => {}
        Err(aurora_store::StoreError::AlreadyExists) => {
            tx.rollback().await.ok();
            info!(group_id = %group.group_id, "group created concurrently, ack");
            return Ok(true);
        }
        Err(e) => return Err(e.into()),
    }

    aurora_store::events::insert_event(
        &mut tx,
        &group.group_id,
        &group.symbol,
        EventType::Open,
        None,
        Some(0.0),
        serde_json::json!({
            "entry_price_long": entry_price_long,
            "entry_price_short": entry_price_short,
            "notional_per_leg": notional,
            "leverage": leverage,
        }),
    )
    .await?;
    tx.commit().await?;

    info!(
        group_id = %group.group_id,
        symbol = %group.symbol,
        long = %opportunity.long_venue,
        short = %opportunity.short_venue,
        entry_long = entry_price_long,
        entry_short = entry_price_short,
        "opened simulated group"
    );
    Ok(true)
}

async fn latest_snapshot(bus: &StreamBus, venue: Venue, symbol: &str) -> anyhow::Result<Option<FundingSnapshot>> {
    let snapshots = bus.scan_recent_snapshots(200).await?;
    Ok(snapshots.into_iter().find(|s| s.venue == venue && s.symbol == symbol))
}

/// `mark_price` when present, else `index_price`, else `1.0`.
fn entry_price(snapshot: Option<&FundingSnapshot>) -> f64 {
    snapshot
        .and_then(|s| s.mark_price.or(s.index_price))
        .unwrap_or(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_price_prefers_mark_over_index() {
        let snap = FundingSnapshot::from_venue_a("BTCUSDT", 0.0001, 8.0, 0, Some(100.0), Some(99.0));
        assert_eq!(entry_price(Some(&snap)), 100.0);
    }

    #[test]
    fn entry_price_falls_back_to_index_then_one() {
        let snap = FundingSnapshot::from_venue_a("BTCUSDT", 0.0001, 8.0, 0, None, Some(99.0));
        assert_eq!(entry_price(Some(&snap)), 99.0);
        assert_eq!(entry_price(None), 1.0);
    }
}
