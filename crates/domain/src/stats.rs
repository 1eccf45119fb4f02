// =============================================================================
// StatsSnapshot — one day's archived aggregate statistics
// =============================================================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub snapshot_date: NaiveDate,
    pub total_open: f64,
    pub total_close: f64,
    pub logic1_amount: f64,
    pub logic2_amount: f64,
    pub logic3_amount: f64,
    pub logic4_amount: f64,
    pub logic5_amount: f64,
    pub net_profit: f64,

    /// Supplementary counters not surfaced in the headline fields, e.g.
    /// `{"event_count": N}`.
    #[serde(default)]
    pub raw_stats: serde_json::Value,

    pub created_at: DateTime<Utc>,
}
