// =============================================================================
// position_events repository
// =============================================================================

use aurora_domain::{EventType, LogicReason, PositionEvent};
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
struct EventRow {
    id: i64,
    group_id: String,
    symbol: String,
    event_type: String,
    logic_reason: Option<String>,
    realized_pnl: Option<f64>,
    data: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for PositionEvent {
    type Error = StoreError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let logic_reason = row.logic_reason.as_deref().map(parse_enum::<LogicReason>).transpose()?;
        Ok(PositionEvent {
            id: row.id,
            group_id: row.group_id,
            symbol: row.symbol,
            event_type: parse_enum::<EventType>(&row.event_type)?,
            logic_reason,
            realized_pnl: row.realized_pnl,
            data: row.data,
            created_at: row.created_at,
        })
    }
}

const EVENT_COLUMNS: &str =
    "id, group_id, symbol, event_type, logic_reason, realized_pnl, data, created_at";

/// Append one audit event inside the caller's transaction.
#[allow(clippy::too_many_arguments)]
pub async fn insert_event(
    tx: &mut Transaction<'_, Postgres>,
    group_id: &str,
    symbol: &str,
    event_type: EventType,
    logic_reason: Option<LogicReason>,
    realized_pnl: Option<f64>,
    data: serde_json::Value,
) -> Result<PositionEvent, StoreError> {
    let row: EventRow = sqlx::query_as(&format!(
        "INSERT INTO position_events (group_id, symbol, event_type, logic_reason, realized_pnl, data) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING {EVENT_COLUMNS}"
    ))
    .bind(group_id)
    .bind(symbol)
    .bind(event_type.to_string())
    .bind(logic_reason.map(|r| r.to_string()))
    .bind(realized_pnl)
    .bind(data)
    .fetch_one(&mut **tx)
    .await?;
    PositionEvent::try_from(row)
}

pub async fn recent_events(pool: &PgPool, limit: i64) -> Result<Vec<PositionEvent>, StoreError> {
    let rows: Vec<EventRow> = sqlx::query_as(&format!(
        "SELECT {EVENT_COLUMNS} FROM position_events ORDER BY created_at DESC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(PositionEvent::try_from).collect()
}

/// Every event ever recorded — backs the dynamic (all-time) stats totals.
pub async fn all_events(pool: &PgPool) -> Result<Vec<PositionEvent>, StoreError> {
    let rows: Vec<EventRow> =
        sqlx::query_as(&format!("SELECT {EVENT_COLUMNS} FROM position_events"))
            .fetch_all(pool)
            .await?;
    rows.into_iter().map(PositionEvent::try_from).collect()
}

/// Events within `[start, end)` — backs the midnight-UTC archiver.
pub async fn events_in_range(
    pool: &PgPool,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<PositionEvent>, StoreError> {
    let rows: Vec<EventRow> = sqlx::query_as(&format!(
        "SELECT {EVENT_COLUMNS} FROM position_events WHERE created_at >= $1 AND created_at < $2"
    ))
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(PositionEvent::try_from).collect()
}
