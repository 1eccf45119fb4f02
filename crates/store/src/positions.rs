// =============================================================================
// position_groups / position_legs repository
// =============================================================================

use aurora_domain::{LogicReason, PositionGroup, PositionLeg, Side, Status, Venue};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use sqlx::postgres::{PgPool, Postgres};
use sqlx::{FromRow, Transaction};

use crate::error::StoreError;

fn parse_enum<T: DeserializeOwned>(s: &str) -> Result<T, StoreError> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| StoreError::Decode(format!("'{s}': {e}")))
}

#[derive(FromRow)]
struct GroupRow {
    group_id: String,
    symbol: String,
    long_exchange: String,
    short_exchange: String,
    leverage: f64,
    margin_per_leg: f64,
    notional_per_leg: f64,
    funding_diff: f64,
    expected_rate8h: f64,
    realized_pnl: f64,
    status: String,
    simulated: bool,
    opened_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    close_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<GroupRow> for PositionGroup {
    type Error = StoreError;

    fn try_from(row: GroupRow) -> Result<Self, Self::Error> {
        let close_reason = row
            .close_reason
            .as_deref()
            .map(parse_enum::<LogicReason>)
            .transpose()?;
        Ok(PositionGroup {
            group_id: row.group_id,
            symbol: row.symbol,
            long_exchange: Venue::parse(&row.long_exchange).map_err(|e| StoreError::Decode(e.to_string()))?,
            short_exchange: Venue::parse(&row.short_exchange).map_err(|e| StoreError::Decode(e.to_string()))?,
            leverage: row.leverage,
            margin_per_leg: row.margin_per_leg,
            notional_per_leg: row.notional_per_leg,
            funding_diff: row.funding_diff,
            expected_rate8h: row.expected_rate8h,
            realized_pnl: row.realized_pnl,
            status: parse_enum(&row.status)?,
            simulated: row.simulated,
            opened_at: row.opened_at,
            closed_at: row.closed_at,
            close_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct LegRow {
    id: i64,
    group_id: String,
    exchange: String,
    side: String,
    quantity: f64,
    entry_price: f64,
    exit_price: Option<f64>,
    margin: f64,
    notional: f64,
    fee_rate: f64,
    status: String,
    opened_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    pnl: Option<f64>,
}

impl TryFrom<LegRow> for PositionLeg {
    type Error = StoreError;

    fn try_from(row: LegRow) -> Result<Self, Self::Error> {
        Ok(PositionLeg {
            id: row.id,
            group_id: row.group_id,
            exchange: Venue::parse(&row.exchange).map_err(|e| StoreError::Decode(e.to_string()))?,
            side: parse_enum(&row.side)?,
            quantity: row.quantity,
            entry_price: row.entry_price,
            exit_price: row.exit_price,
            margin: row.margin,
            notional: row.notional,
            fee_rate: row.fee_rate,
            status: parse_enum(&row.status)?,
            opened_at: row.opened_at,
            closed_at: row.closed_at,
            pnl: row.pnl,
        })
    }
}

const GROUP_COLUMNS: &str = "group_id, symbol, long_exchange, short_exchange, leverage, \
    margin_per_leg, notional_per_leg, funding_diff, expected_rate8h, realized_pnl, status, \
    simulated, opened_at, closed_at, close_reason, created_at, updated_at";
const LEG_COLUMNS: &str = "id, group_id, exchange, side, quantity, entry_price, exit_price, \
    margin, notional, fee_rate, status, opened_at, closed_at, pnl";

/// Whether a group with this idempotency key already exists. Checked before
/// attempting the insert so a redelivered opportunity can be ack'd as a
/// no-op rather than retried against the unique-constraint error path.
pub async fn group_exists(pool: &PgPool, group_id: &str) -> Result<bool, StoreError> {
    let row: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM position_groups WHERE group_id = $1")
        .bind(group_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

pub async fn count_open_groups(pool: &PgPool) -> Result<i64, StoreError> {
    let (count,): (i64,) = sqlx::query_as("SELECT count(*) FROM position_groups WHERE status = 'OPEN'")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn count_open_groups_for_symbol(pool: &PgPool, symbol: &str) -> Result<i64, StoreError> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT count(*) FROM position_groups WHERE status = 'OPEN' AND symbol = $1",
    )
    .bind(symbol)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Insert a new group and its two legs in one transaction — either both
/// rows land or neither does. The caller appends the OPEN audit event
/// separately, inside the same transaction, via `events::insert_event`.
pub async fn insert_group_with_legs(
    tx: &mut Transaction<'_, Postgres>,
    group: &PositionGroup,
    legs: &[PositionLeg],
) -> Result<(), StoreError> {
    sqlx::query(&format!(
        "INSERT INTO position_groups ({GROUP_COLUMNS}) \
         VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17)"
    ))
    .bind(&group.group_id)
    .bind(&group.symbol)
    .bind(group.long_exchange.as_str())
    .bind(group.short_exchange.as_str())
    .bind(group.leverage)
    .bind(group.margin_per_leg)
    .bind(group.notional_per_leg)
    .bind(group.funding_diff)
    .bind(group.expected_rate8h)
    .bind(group.realized_pnl)
    .bind(group.status.to_string())
    .bind(group.simulated)
    .bind(group.opened_at)
    .bind(group.closed_at)
    .bind(group.close_reason.map(|r| r.to_string()))
    .bind(group.created_at)
    .bind(group.updated_at)
    .execute(&mut **tx)
    .await
    .map_err(StoreError::from_insert)?;

    for leg in legs {
        sqlx::query(
            "INSERT INTO position_legs \
                (group_id, exchange, side, quantity, entry_price, exit_price, margin, \
                 notional, fee_rate, status, opened_at, closed_at, pnl) \
             VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13)",
        )
        .bind(&leg.group_id)
        .bind(leg.exchange.as_str())
        .bind(leg.side.to_string())
        .bind(leg.quantity)
        .bind(leg.entry_price)
        .bind(leg.exit_price)
        .bind(leg.margin)
        .bind(leg.notional)
        .bind(leg.fee_rate)
        .bind(leg.status.to_string())
        .bind(leg.opened_at)
        .bind(leg.closed_at)
        .bind(leg.pnl)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

/// Mark a group closed: stamp `status`, `closed_at`, `close_reason`,
/// `funding_diff`, `expected_rate8h`, `realized_pnl`, and `updated_at`, then
/// stamp each leg's `exit_price`/`pnl`/`status`/`closed_at`. The caller
/// inserts the matching CLOSE event separately inside the same transaction.
#[allow(clippy::too_many_arguments)]
pub async fn close_group(
    tx: &mut Transaction<'_, Postgres>,
    group_id: &str,
    closed_at: DateTime<Utc>,
    close_reason: LogicReason,
    funding_diff: f64,
    expected_rate8h: f64,
    realized_pnl: f64,
    long_exit_price: f64,
    long_pnl: f64,
    short_exit_price: f64,
    short_pnl: f64,
) -> Result<(), StoreError> {
    let result = sqlx::query(
        "UPDATE position_groups SET status = 'CLOSED', closed_at = $2, close_reason = $3, \
            funding_diff = $4, expected_rate8h = $5, realized_pnl = $6, updated_at = $2 \
         WHERE group_id = $1",
    )
    .bind(group_id)
    .bind(closed_at)
    .bind(close_reason.to_string())
    .bind(funding_diff)
    .bind(expected_rate8h)
    .bind(realized_pnl)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }

    for (side, exit_price, pnl) in [
        (Side::Long, long_exit_price, long_pnl),
        (Side::Short, short_exit_price, short_pnl),
    ] {
        sqlx::query(
            "UPDATE position_legs SET exit_price = $3, pnl = $4, status = 'CLOSED', closed_at = $5 \
             WHERE group_id = $1 AND side = $2",
        )
        .bind(group_id)
        .bind(side.to_string())
        .bind(exit_price)
        .bind(pnl)
        .bind(closed_at)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

/// Every currently-open group together with its two legs, for the stats
/// service's open-positions view and the risk daemon's closure sweep.
pub async fn get_open_groups_with_legs(
    pool: &PgPool,
) -> Result<Vec<(PositionGroup, Vec<PositionLeg>)>, StoreError> {
    let group_rows: Vec<GroupRow> = sqlx::query_as(&format!(
        "SELECT {GROUP_COLUMNS} FROM position_groups WHERE status = 'OPEN' ORDER BY opened_at"
    ))
    .fetch_all(pool)
    .await?;

    let mut out = Vec::with_capacity(group_rows.len());
    for row in group_rows {
        let leg_rows: Vec<LegRow> = sqlx::query_as(&format!(
            "SELECT {LEG_COLUMNS} FROM position_legs WHERE group_id = $1"
        ))
        .bind(&row.group_id)
        .fetch_all(pool)
        .await?;

        let group = PositionGroup::try_from(row)?;
        let legs = leg_rows
            .into_iter()
            .map(PositionLeg::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        out.push((group, legs));
    }
    Ok(out)
}
