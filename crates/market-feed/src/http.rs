// =============================================================================
// HTTP surface — health check and per-venue funding snapshot listing
// =============================================================================

use std::sync::Arc;

use aurora_domain::Venue;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::state::FeedState;

pub fn router(state: Arc<FeedState>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    Router::new()
        .route("/healthz", get(healthz))
        .route("/funding/:venue", get(funding))
        .layer(cors)
        .with_state(state)
}

async fn healthz(State(state): State<Arc<FeedState>>) -> impl IntoResponse {
    match state.counts() {
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({"detail": "feed not ready"})),
        )
            .into_response(),
        Some((venue_a, venue_b)) => Json(serde_json::json!({
            "status": "ok",
            "venue_a": venue_a,
            "venue_b": venue_b,
        }))
        .into_response(),
    }
}

async fn funding(
    State(state): State<Arc<FeedState>>,
    Path(venue): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let venue = match venue.to_lowercase().as_str() {
        "venue_a" => Venue::VenueA,
        "venue_b" => Venue::VenueB,
        _ => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({"error": "unsupported venue"})),
            ))
        }
    };
    let snapshots = state.latest(venue);
    let body: Vec<serde_json::Value> = snapshots
        .iter()
        .map(|s| {
            serde_json::json!({
                "venue": s.venue.as_str(),
                "symbol": s.symbol,
                "funding_rate_raw": s.funding_rate_raw,
                "settle_interval_hours": s.settle_interval_hours,
                "next_funding_time_ms": s.next_funding_time_ms,
                "instrument": s.instrument,
                "mark_price": s.mark_price,
                "index_price": s.index_price,
                "captured_at_ms": s.captured_at_ms,
            })
        })
        .collect();
    Ok(Json(body))
}
