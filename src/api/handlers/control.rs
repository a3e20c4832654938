use std::sync::atomic::Ordering;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use super::ApiResponse;
use crate::AppState;

/// POST /api/control/pause: stop dispatching auto copies.
pub async fn pause(State(state): State<AppState>) -> Json<ApiResponse<Value>> {
    state.pause_flag.store(true, Ordering::Relaxed);
    tracing::warn!("Auto-copy PAUSED via control API");
    ApiResponse::ok(json!({ "status": "paused" }))
}

/// POST /api/control/resume
pub async fn resume(State(state): State<AppState>) -> Json<ApiResponse<Value>> {
    state.pause_flag.store(false, Ordering::Relaxed);
    tracing::info!("Auto-copy RESUMED via control API");
    ApiResponse::ok(json!({ "status": "running" }))
}

/// GET /api/control/status
pub async fn status(State(state): State<AppState>) -> Json<ApiResponse<Value>> {
    let paused = state.pause_flag.load(Ordering::Relaxed);
    ApiResponse::ok(json!({
        "paused": paused,
        "dispatcher": state.signal_tx.is_some(),
        "uniqueCopyPerSignal": state.config.unique_copy_per_signal,
        "signalRateLimit": state.config.signal_rate_limit,
        "signalRateWindowSecs": state.config.signal_rate_window_secs,
    }))
}
