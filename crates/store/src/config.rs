// =============================================================================
// config_profiles / config_audit_logs repository
// =============================================================================

use aurora_domain::{ConfigAuditLog, ConfigProfile, RiskLimits, Thresholds};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::FromRow;

use crate::error::StoreError;

#[derive(FromRow)]
struct ConfigProfileRow {
    id: i64,
    version: i32,
    thresholds: serde_json::Value,
    risk_limits: serde_json::Value,
    global_enable: bool,
    scan_interval_seconds: f64,
    close_interval_seconds: f64,
    open_interval_seconds: f64,
    created_by: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ConfigProfileRow> for ConfigProfile {
    type Error = StoreError;

    fn try_from(row: ConfigProfileRow) -> Result<Self, Self::Error> {
        let thresholds: Thresholds = serde_json::from_value(row.thresholds)
            .map_err(|e| StoreError::Decode(format!("thresholds: {e}")))?;
        let risk_limits: RiskLimits = serde_json::from_value(row.risk_limits)
            .map_err(|e| StoreError::Decode(format!("risk_limits: {e}")))?;
        Ok(ConfigProfile {
            id: row.id,
            version: row.version,
            thresholds,
            risk_limits,
            global_enable: row.global_enable,
            scan_interval_seconds: row.scan_interval_seconds,
            close_interval_seconds: row.close_interval_seconds,
            open_interval_seconds: row.open_interval_seconds,
            created_by: row.created_by,
            created_at: row.created_at,
        })
    }
}

const SELECT_COLUMNS: &str = "id, version, thresholds, risk_limits, global_enable, \
     scan_interval_seconds, close_interval_seconds, open_interval_seconds, created_by, created_at";

/// The highest profile version currently stored, or `None` on a fresh
/// database — the signal the config service uses to decide whether to run
/// its bootstrap insert.
pub async fn latest_version(pool: &PgPool) -> Result<Option<i32>, StoreError> {
    let row: Option<(Option<i32>,)> = sqlx::query_as("SELECT max(version) FROM config_profiles")
        .fetch_optional(pool)
        .await?;
    Ok(row.and_then(|(v,)| v))
}

/// The active profile: the one with the highest version number.
pub async fn get_current(pool: &PgPool) -> Result<Option<ConfigProfile>, StoreError> {
    let row: Option<ConfigProfileRow> = sqlx::query_as(&format!(
        "SELECT {SELECT_COLUMNS} FROM config_profiles ORDER BY version DESC LIMIT 1"
    ))
    .fetch_optional(pool)
    .await?;
    row.map(ConfigProfile::try_from).transpose()
}

/// Insert a brand-new profile version. Fails with
/// [`StoreError::AlreadyExists`] if the version number is already taken.
pub async fn insert_profile(pool: &PgPool, profile: &ConfigProfile) -> Result<ConfigProfile, StoreError> {
    let thresholds = serde_json::to_value(profile.thresholds).expect("Thresholds always serialises");
    let risk_limits = serde_json::to_value(profile.risk_limits).expect("RiskLimits always serialises");

    let row: ConfigProfileRow = sqlx::query_as(&format!(
        "INSERT INTO config_profiles \
            (version, thresholds, risk_limits, global_enable, scan_interval_seconds, \
             close_interval_seconds, open_interval_seconds, created_by, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING {SELECT_COLUMNS}"
    ))
    .bind(profile.version)
    .bind(thresholds)
    .bind(risk_limits)
    .bind(profile.global_enable)
    .bind(profile.scan_interval_seconds)
    .bind(profile.close_interval_seconds)
    .bind(profile.open_interval_seconds)
    .bind(&profile.created_by)
    .bind(profile.created_at)
    .fetch_one(pool)
    .await
    .map_err(StoreError::from_insert)?;

    ConfigProfile::try_from(row)
}

#[derive(FromRow)]
struct AuditRow {
    id: i64,
    version: i32,
    operator: String,
    action: String,
    detail: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl From<AuditRow> for ConfigAuditLog {
    fn from(row: AuditRow) -> Self {
        ConfigAuditLog {
            id: row.id,
            version: row.version,
            operator: row.operator,
            action: row.action,
            detail: row.detail,
            created_at: row.created_at,
        }
    }
}

pub async fn insert_audit_log(
    pool: &PgPool,
    version: i32,
    operator: &str,
    action: &str,
    detail: serde_json::Value,
) -> Result<ConfigAuditLog, StoreError> {
    let row: AuditRow = sqlx::query_as(
        "INSERT INTO config_audit_logs (version, operator, action, detail) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, version, operator, action, detail, created_at",
    )
    .bind(version)
    .bind(operator)
    .bind(action)
    .bind(detail)
    .fetch_one(pool)
    .await?;
    Ok(row.into())
}
