// =============================================================================
// ConfigProfile — versioned, hot-swappable engine configuration
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn d_aa() -> f64 {
    0.0005
}
fn d_bb() -> f64 {
    0.0002
}
fn d_cc() -> f64 {
    0.0001
}
fn d_dd() -> f64 {
    5.0
}
fn d_ee() -> f64 {
    0.0002
}
fn d_ff() -> f64 {
    0.0010
}
fn d_gg() -> f64 {
    0.0020
}
fn d_hh() -> f64 {
    0.001
}

/// Thresholds consumed by the risk daemon's five-rule closure decision.
///
/// Field names are the short codes the decision table uses; see the risk
/// daemon crate for what each one gates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default = "d_aa")]
    pub aa: f64,
    #[serde(default = "d_bb")]
    pub bb: f64,
    #[serde(default = "d_cc")]
    pub cc: f64,
    #[serde(default = "d_dd")]
    pub dd: f64,
    #[serde(default = "d_ee")]
    pub ee: f64,
    #[serde(default = "d_ff")]
    pub ff: f64,
    #[serde(default = "d_gg")]
    pub gg: f64,
    #[serde(default = "d_hh")]
    pub hh: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            aa: d_aa(),
            bb: d_bb(),
            cc: d_cc(),
            dd: d_dd(),
            ee: d_ee(),
            ff: d_ff(),
            gg: d_gg(),
            hh: d_hh(),
        }
    }
}

fn d_group_max() -> u32 {
    20
}
fn d_duplicate_max() -> u32 {
    2
}
fn d_leverage_max() -> f64 {
    10.0
}
fn d_margin_per_leg() -> f64 {
    100.0
}
fn d_taker_fee() -> f64 {
    0.0006
}
fn d_maker_fee() -> f64 {
    0.0002
}
fn d_trade_fee() -> f64 {
    0.0006
}

/// Admission-control and sizing limits consulted by the execution gateway.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskLimits {
    /// Maximum number of simultaneously open position groups.
    #[serde(default = "d_group_max")]
    pub group_max: u32,

    /// Maximum number of open groups already active on the same symbol.
    #[serde(default = "d_duplicate_max")]
    pub duplicate_max: u32,

    #[serde(default = "d_leverage_max")]
    pub leverage_max: f64,

    #[serde(default = "d_margin_per_leg")]
    pub margin_per_leg: f64,

    #[serde(default = "d_taker_fee")]
    pub taker_fee: f64,

    #[serde(default = "d_maker_fee")]
    pub maker_fee: f64,

    #[serde(default = "d_trade_fee")]
    pub trade_fee: f64,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            group_max: d_group_max(),
            duplicate_max: d_duplicate_max(),
            leverage_max: d_leverage_max(),
            margin_per_leg: d_margin_per_leg(),
            taker_fee: d_taker_fee(),
            maker_fee: d_maker_fee(),
            trade_fee: d_trade_fee(),
        }
    }
}

/// A single versioned, persisted configuration snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigProfile {
    pub id: i64,
    pub version: i32,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub risk_limits: RiskLimits,
    #[serde(default = "default_true")]
    pub global_enable: bool,
    #[serde(default = "default_scan_interval")]
    pub scan_interval_seconds: f64,
    #[serde(default = "default_close_interval")]
    pub close_interval_seconds: f64,
    #[serde(default = "default_open_interval")]
    pub open_interval_seconds: f64,
    #[serde(default = "default_operator")]
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}
fn default_scan_interval() -> f64 {
    10.0
}
fn default_close_interval() -> f64 {
    10.0
}
fn default_open_interval() -> f64 {
    5.0
}
fn default_operator() -> String {
    "system".to_string()
}

impl ConfigProfile {
    /// Build the bootstrap profile (version 1, all-default thresholds and
    /// limits) written by the config service the first time it starts
    /// against an empty database.
    pub fn bootstrap() -> Self {
        Self {
            id: 0,
            version: 1,
            thresholds: Thresholds::default(),
            risk_limits: RiskLimits::default(),
            global_enable: true,
            scan_interval_seconds: default_scan_interval(),
            close_interval_seconds: default_close_interval(),
            open_interval_seconds: default_open_interval(),
            created_by: default_operator(),
            created_at: Utc::now(),
        }
    }
}

/// An append-only audit record of a configuration change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigAuditLog {
    pub id: i64,
    pub version: i32,
    pub operator: String,
    pub action: String,
    pub detail: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_default_values_match_original_constants() {
        let t = Thresholds::default();
        assert_eq!(t.aa, 0.0005);
        assert_eq!(t.bb, 0.0002);
        assert_eq!(t.cc, 0.0001);
        assert_eq!(t.dd, 5.0);
        assert_eq!(t.hh, 0.001);
    }

    #[test]
    fn risk_limits_default_values_match_original_constants() {
        let r = RiskLimits::default();
        assert_eq!(r.group_max, 20);
        assert_eq!(r.duplicate_max, 2);
        assert_eq!(r.leverage_max, 10.0);
        assert_eq!(r.margin_per_leg, 100.0);
    }

    #[test]
    fn empty_json_thresholds_fill_defaults() {
        let t: Thresholds = serde_json::from_str("{}").unwrap();
        assert_eq!(t, Thresholds::default());
    }

    #[test]
    fn bootstrap_profile_is_version_one_and_enabled() {
        let p = ConfigProfile::bootstrap();
        assert_eq!(p.version, 1);
        assert!(p.global_enable);
        assert_eq!(p.created_by, "system");
    }
}
