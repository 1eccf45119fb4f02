// =============================================================================
// HTTP surface — GET/PUT /config/current
// =============================================================================

use std::sync::Arc;

use aurora_bus::ConfigNotifier;
use aurora_domain::{ConfigProfile, RuntimeConfigState};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::merge::{merge_risk_limits, merge_thresholds};

pub struct AppState {
    pub pool: PgPool,
    pub notifier: ConfigNotifier,
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    Router::new()
        .route("/config/current", get(get_current).put(put_current))
        .layer(cors)
        .with_state(state)
}

async fn get_current(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match aurora_store::config::get_current(&state.pool).await {
        Ok(Some(profile)) => Json(profile).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"detail": "no config profile exists"})),
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "get_current failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"detail": "database error"})),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct PutConfigRequest {
    pub thresholds: Option<serde_json::Value>,
    pub risk_limits: Option<serde_json::Value>,
    pub global_enable: Option<bool>,
    pub scan_interval_seconds: Option<f64>,
    pub close_interval_seconds: Option<f64>,
    pub open_interval_seconds: Option<f64>,
    pub operator: Option<String>,
}

async fn put_current(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PutConfigRequest>,
) -> impl IntoResponse {
    match apply_update(&state, body).await {
        Ok(profile) => Json(profile).into_response(),
        Err(e) => {
            warn!(error = %e, "put_current failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"detail": "database error"})),
            )
                .into_response()
        }
    }
}

/// Build and persist the next config version: any field the request omits
/// is filled from the previous active profile, and `thresholds`/`risk_limits`
/// are merged field-by-field rather than replaced wholesale.
async fn apply_update(state: &AppState, body: PutConfigRequest) -> anyhow::Result<ConfigProfile> {
    let previous = aurora_store::config::get_current(&state.pool).await?;
    let previous = previous.unwrap_or_else(ConfigProfile::bootstrap);
    let next_version = aurora_store::config::latest_version(&state.pool).await?.map(|v| v + 1).unwrap_or(1);

    let operator = body.operator.clone().unwrap_or_else(|| "console".to_string());
    let profile = ConfigProfile {
        id: 0,
        version: next_version,
        thresholds: merge_thresholds(previous.thresholds, body.thresholds.clone()),
        risk_limits: merge_risk_limits(previous.risk_limits, body.risk_limits.clone()),
        global_enable: body.global_enable.unwrap_or(previous.global_enable),
        scan_interval_seconds: body.scan_interval_seconds.unwrap_or(previous.scan_interval_seconds),
        close_interval_seconds: body.close_interval_seconds.unwrap_or(previous.close_interval_seconds),
        open_interval_seconds: body.open_interval_seconds.unwrap_or(previous.open_interval_seconds),
        created_by: operator.clone(),
        created_at: Utc::now(),
    };

    let inserted = aurora_store::config::insert_profile(&state.pool, &profile).await?;
    let audit = aurora_store::config::insert_audit_log(
        &state.pool,
        inserted.version,
        &operator,
        "UPDATE",
        serde_json::to_value(&inserted)?,
    )
    .await?;

    state.notifier.publish_update(&RuntimeConfigState::from(&inserted)).await?;
    state.notifier.publish_audit(&audit).await?;

    info!(version = inserted.version, operator = %operator, "config profile updated");
    Ok(inserted)
}
