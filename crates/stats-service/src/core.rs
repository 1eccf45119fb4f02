// =============================================================================
// Stats core — dynamic aggregation, open-position views, and the midnight
// archiver, shared between the HTTP handlers and the scheduler task.
// =============================================================================

use std::collections::HashMap;

use aurora_bus::StreamBus;
use aurora_domain::{totals_from_events, StatsSnapshot, Venue};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use crate::views::{build_group_view, PositionGroupView};

/// Everything `get_dynamic_stats` computes: the shared open/close totals
/// plus the live-position headline figures only the dynamic view carries.
pub async fn compute_dynamic_stats(pool: &PgPool) -> anyhow::Result<serde_json::Value> {
    let open_groups = aurora_store::positions::get_open_groups_with_legs(pool).await?;
    let active_notional: f64 = open_groups.iter().map(|(g, _)| g.margin_per_leg * 2.0).sum();
    let active_group_count = open_groups.len();

    let events = aurora_store::events::all_events(pool).await?;
    let totals = totals_from_events(&events);

    let mut payload = serde_json::to_value(totals)?;
    if let serde_json::Value::Object(map) = &mut payload {
        map.insert("active_notional".to_string(), serde_json::json!(active_notional));
        map.insert("active_group_count".to_string(), serde_json::json!(active_group_count));
        map.insert("updated_at".to_string(), serde_json::json!(Utc::now().to_rfc3339()));
    }
    Ok(payload)
}

/// Build the live view for every OPEN group, pairing each leg with the
/// newest snapshot for its `(venue, symbol)`.
pub async fn compute_open_positions(pool: &PgPool, bus: &StreamBus) -> anyhow::Result<Vec<PositionGroupView>> {
    let open_groups = aurora_store::positions::get_open_groups_with_legs(pool).await?;
    if open_groups.is_empty() {
        return Ok(Vec::new());
    }

    let snapshots = bus.scan_recent_snapshots(500).await?;
    let mut latest: HashMap<(Venue, String), aurora_domain::FundingSnapshot> = HashMap::new();
    for snapshot in snapshots {
        latest.entry((snapshot.venue, snapshot.symbol.clone())).or_insert(snapshot);
    }

    let mut views = Vec::with_capacity(open_groups.len());
    for (group, legs) in &open_groups {
        let long_snapshot = latest.get(&(group.long_exchange, group.symbol.clone()));
        let short_snapshot = latest.get(&(group.short_exchange, group.symbol.clone()));
        if let Some(view) = build_group_view(group, legs, long_snapshot, short_snapshot) {
            views.push(view);
        }
    }
    Ok(views)
}

/// Aggregate every `PositionEvent` in `[start, end)` into a `StatsSnapshot`
/// for `date`. Safe to call more than once for the same date; the store
/// upserts on `snapshot_date`.
pub async fn archive_snapshot(pool: &PgPool, date: NaiveDate) -> anyhow::Result<StatsSnapshot> {
    let start: DateTime<Utc> = date.and_hms_opt(0, 0, 0).expect("midnight always valid").and_utc();
    let end = start + chrono::Duration::days(1);

    let events = aurora_store::events::events_in_range(pool, start, end).await?;
    let totals = totals_from_events(&events);

    let snapshot = StatsSnapshot {
        snapshot_date: date,
        total_open: totals.total_open,
        total_close: totals.total_close,
        logic1_amount: totals.logic1_amount,
        logic2_amount: totals.logic2_amount,
        logic3_amount: totals.logic3_amount,
        logic4_amount: totals.logic4_amount,
        logic5_amount: totals.logic5_amount,
        net_profit: totals.net_profit,
        raw_stats: serde_json::json!({"event_count": totals.event_count}),
        created_at: Utc::now(),
    };

    Ok(aurora_store::stats::upsert_snapshot(pool, &snapshot).await?)
}
