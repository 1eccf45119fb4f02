// =============================================================================
// Position model — a hedged long/short pair and its audit trail
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::venue::Venue;

/// Leg direction within a hedged pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "LONG")]
    Long,
    #[serde(rename = "SHORT")]
    Short,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Long => write!(f, "LONG"),
            Self::Short => write!(f, "SHORT"),
        }
    }
}

/// Lifecycle status of a position group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "OPEN")]
    Open,
    #[serde(rename = "CLOSED")]
    Closed,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Closed => write!(f, "CLOSED"),
        }
    }
}

/// A hedged pair of legs opened against one [`crate::Opportunity`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionGroup {
    pub group_id: String,
    pub symbol: String,
    pub long_exchange: Venue,
    pub short_exchange: Venue,
    pub leverage: f64,
    pub margin_per_leg: f64,
    pub notional_per_leg: f64,

    /// Funding differential observed at open; overwritten with the latest
    /// observed differential at close.
    pub funding_diff: f64,

    /// Expected combined 8h funding income at open; overwritten with the
    /// realized return on close (`realized_pnl / (notional_per_leg * 2)`).
    pub expected_rate8h: f64,

    /// Sum of both legs' `pnl`. Zero while the group is OPEN.
    pub realized_pnl: f64,

    pub status: Status,

    /// Always `true` — no real order ever reaches an exchange in this design.
    pub simulated: bool,

    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub close_reason: Option<LogicReason>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One leg (long or short) of a [`PositionGroup`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionLeg {
    pub id: i64,
    pub group_id: String,
    pub exchange: Venue,
    pub side: Side,
    pub quantity: f64,
    pub entry_price: f64,
    pub exit_price: Option<f64>,
    pub margin: f64,
    pub notional: f64,
    pub fee_rate: f64,
    pub status: Status,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub pnl: Option<f64>,
}

/// Why the risk daemon decided to close a group — mirrors the five-rule
/// decision table's priority labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicReason {
    #[serde(rename = "logic1")]
    Logic1,
    #[serde(rename = "logic2")]
    Logic2,
    #[serde(rename = "logic3")]
    Logic3,
    #[serde(rename = "logic4")]
    Logic4,
    #[serde(rename = "logic5")]
    Logic5,
}

impl std::fmt::Display for LogicReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Logic1 => "logic1",
            Self::Logic2 => "logic2",
            Self::Logic3 => "logic3",
            Self::Logic4 => "logic4",
            Self::Logic5 => "logic5",
        };
        write!(f, "{s}")
    }
}

/// Event kind recorded in a group's audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "OPEN")]
    Open,
    #[serde(rename = "CLOSE")]
    Close,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Close => write!(f, "CLOSE"),
        }
    }
}

/// An immutable audit record appended whenever a group opens or closes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionEvent {
    pub id: i64,
    pub group_id: String,
    pub symbol: String,
    pub event_type: EventType,
    pub logic_reason: Option<LogicReason>,
    pub realized_pnl: Option<f64>,

    /// Free-form payload: entry/exit prices, notional, and per-leg returns.
    pub data: serde_json::Value,

    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_display_matches_wire_form() {
        assert_eq!(Side::Long.to_string(), "LONG");
        assert_eq!(Side::Short.to_string(), "SHORT");
    }

    #[test]
    fn logic_reason_serializes_lowercase() {
        let json = serde_json::to_string(&LogicReason::Logic3).unwrap();
        assert_eq!(json, "\"logic3\"");
    }
}
