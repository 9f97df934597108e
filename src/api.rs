// src/api.rs
//! Read-only reporting routes over the history store.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;

use crate::history::HistoryStore;

pub const DEFAULT_WINDOW_HOURS: u32 = 24;
/// Upper bound for `?hours=`; 30 days.
pub const MAX_WINDOW_HOURS: u32 = 24 * 30;

#[derive(Clone, Debug)]
pub struct AppState {
    pub store: HistoryStore,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/recent", get(recent))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct RecentQuery {
    #[serde(default)]
    hours: Option<u32>,
}

async fn recent(State(state): State<AppState>, Query(q): Query<RecentQuery>) -> Response {
    let hours = q
        .hours
        .unwrap_or(DEFAULT_WINDOW_HOURS)
        .min(MAX_WINDOW_HOURS);
    match state.store.recent_records(hours) {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => {
            tracing::error!(target: "history", error = %e, "recent records query failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
