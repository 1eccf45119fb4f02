// =============================================================================
// HTTP surface — dynamic/static stats, recent events, open positions
// =============================================================================

use std::sync::Arc;

use aurora_bus::StreamBus;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::cache::TtlCache;
use crate::core;

pub struct AppState {
    pub pool: PgPool,
    pub bus: StreamBus,
    pub dynamic_cache: TtlCache,
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    Router::new()
        .route("/stats/dynamic", get(dynamic_stats))
        .route("/stats/static", get(static_snapshot))
        .route("/stats/static/list", get(static_snapshot_list))
        .route("/stats/snapshot", post(post_snapshot))
        .route("/events/recent", get(recent_events))
        .route("/positions/open", get(open_positions))
        .layer(cors)
        .with_state(state)
}

fn db_error(e: impl std::fmt::Display) -> (StatusCode, Json<serde_json::Value>) {
    warn!(error = %e, "stats-service database error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"detail": "database error"})),
    )
}

async fn dynamic_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if let Some(cached) = state.dynamic_cache.get() {
        return Json(cached).into_response();
    }
    match core::compute_dynamic_stats(&state.pool).await {
        Ok(payload) => {
            state.dynamic_cache.set(payload.clone());
            Json(payload).into_response()
        }
        Err(e) => db_error(e).into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct DateQuery {
    snapshot_date: Option<NaiveDate>,
}

async fn static_snapshot(State(state): State<Arc<AppState>>, Query(q): Query<DateQuery>) -> impl IntoResponse {
    let date = q.snapshot_date.unwrap_or_else(|| Utc::now().date_naive());
    match aurora_store::stats::get_snapshot(&state.pool, date).await {
        Ok(Some(snapshot)) => Json(snapshot).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"detail": "no snapshot for this date"})),
        )
            .into_response(),
        Err(e) => db_error(e).into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct LimitQuery {
    limit: Option<i64>,
}

async fn static_snapshot_list(State(state): State<Arc<AppState>>, Query(q): Query<LimitQuery>) -> impl IntoResponse {
    let limit = q.limit.unwrap_or(30).clamp(1, 365);
    match aurora_store::stats::get_snapshots(&state.pool, limit).await {
        Ok(snapshots) => Json(snapshots).into_response(),
        Err(e) => db_error(e).into_response(),
    }
}

async fn post_snapshot(State(state): State<Arc<AppState>>, Query(q): Query<DateQuery>) -> impl IntoResponse {
    let date = q.snapshot_date.unwrap_or_else(|| Utc::now().date_naive());
    match core::archive_snapshot(&state.pool, date).await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => db_error(e).into_response(),
    }
}

async fn recent_events(State(state): State<Arc<AppState>>, Query(q): Query<LimitQuery>) -> impl IntoResponse {
    let limit = q.limit.unwrap_or(50).clamp(1, 500);
    match aurora_store::events::recent_events(&state.pool, limit).await {
        Ok(events) => Json(events).into_response(),
        Err(e) => db_error(e).into_response(),
    }
}

async fn open_positions(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match core::compute_open_positions(&state.pool, &state.bus).await {
        Ok(views) => Json(views).into_response(),
        Err(e) => db_error(e).into_response(),
    }
}
