// =============================================================================
// stats_snapshots repository
// =============================================================================

use aurora_domain::StatsSnapshot;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgPool;
use sqlx::FromRow;

use crate::error::StoreError;

#[derive(FromRow)]
struct SnapshotRow {
    snapshot_date: NaiveDate,
    total_open: f64,
    total_close: f64,
    logic1_amount: f64,
    logic2_amount: f64,
    logic3_amount: f64,
    logic4_amount: f64,
    logic5_amount: f64,
    net_profit: f64,
    raw_stats: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl From<SnapshotRow> for StatsSnapshot {
    fn from(row: SnapshotRow) -> Self {
        StatsSnapshot {
            snapshot_date: row.snapshot_date,
            total_open: row.total_open,
            total_close: row.total_close,
            logic1_amount: row.logic1_amount,
            logic2_amount: row.logic2_amount,
            logic3_amount: row.logic3_amount,
            logic4_amount: row.logic4_amount,
            logic5_amount: row.logic5_amount,
            net_profit: row.net_profit,
            raw_stats: row.raw_stats,
            created_at: row.created_at,
        }
    }
}

const COLUMNS: &str = "snapshot_date, total_open, total_close, logic1_amount, logic2_amount, \
    logic3_amount, logic4_amount, logic5_amount, net_profit, raw_stats, created_at";

pub async fn get_snapshot(pool: &PgPool, date: NaiveDate) -> Result<Option<StatsSnapshot>, StoreError> {
    let row: Option<SnapshotRow> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM stats_snapshots WHERE snapshot_date = $1"
    ))
    .bind(date)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(StatsSnapshot::from))
}

pub async fn get_snapshots(pool: &PgPool, limit: i64) -> Result<Vec<StatsSnapshot>, StoreError> {
    let rows: Vec<SnapshotRow> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM stats_snapshots ORDER BY snapshot_date DESC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(StatsSnapshot::from).collect())
}

/// Insert today's row, or overwrite it if the archiver already ran once for
/// this date — `archive_snapshot` is safe to call more than once per day.
pub async fn upsert_snapshot(pool: &PgPool, snapshot: &StatsSnapshot) -> Result<StatsSnapshot, StoreError> {
    let row: SnapshotRow = sqlx::query_as(&format!(
        "INSERT INTO stats_snapshots \
            (snapshot_date, total_open, total_close, logic1_amount, logic2_amount, \
             logic3_amount, logic4_amount, logic5_amount, net_profit, raw_stats) \
         VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10) \
         ON CONFLICT (snapshot_date) DO UPDATE SET \
            total_open = EXCLUDED.total_open, \
            total_close = EXCLUDED.total_close, \
            logic1_amount = EXCLUDED.logic1_amount, \
            logic2_amount = EXCLUDED.logic2_amount, \
            logic3_amount = EXCLUDED.logic3_amount, \
            logic4_amount = EXCLUDED.logic4_amount, \
            logic5_amount = EXCLUDED.logic5_amount, \
            net_profit = EXCLUDED.net_profit, \
            raw_stats = EXCLUDED.raw_stats \
         RETURNING {COLUMNS}"
    ))
    .bind(snapshot.snapshot_date)
    .bind(snapshot.total_open)
    .bind(snapshot.total_close)
    .bind(snapshot.logic1_amount)
    .bind(snapshot.logic2_amount)
    .bind(snapshot.logic3_amount)
    .bind(snapshot.logic4_amount)
    .bind(snapshot.logic5_amount)
    .bind(snapshot.net_profit)
    .bind(&snapshot.raw_stats)
    .fetch_one(pool)
    .await?;
    Ok(row.into())
}
