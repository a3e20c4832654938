use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::{Extension, Json};
use uuid::Uuid;

use super::ApiResponse;
use crate::api::auth::AuthContext;
use crate::db::SignalRepository;
use crate::errors::AppError;
use crate::execution::{self, CopyMode, CopyOverrides, CopyRequest, PublishRequest};
use crate::models::{trade_status, CopyTradeView, Signal, SignalView};
use crate::services::signals;
use crate::AppState;

const OPEN_SIGNALS_LIMIT: i64 = 100;

/// POST /api/signals: publish a signal as the calling trader
pub async fn publish(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    body: Bytes,
) -> Result<Json<ApiResponse<SignalView>>, AppError> {
    // Decoded by hand so a malformed body still goes through the entitlement check
    let body: PublishRequest = match serde_json::from_slice(&body) {
        Ok(body) => body,
        Err(e) => {
            return Err(execution::reject_malformed(state.store.as_ref(), auth.user_id, e.to_string()).await);
        }
    };

    let view = execution::publish_signal(
        state.store.as_ref(),
        state.clock.as_ref(),
        state.rate_limit(),
        auth.user_id,
        &body,
    )
    .await?;

    if let Some(tx) = &state.signal_tx {
        if let Err(e) = tx.try_send(view.signal.clone()) {
            tracing::warn!(signal_id = %view.signal.id, error = %e, "Auto-copy queue unavailable");
        }
    }

    Ok(ApiResponse::ok(view))
}

/// GET /api/signals: open signals, newest first
pub async fn list(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<SignalView>>>, AppError> {
    let signals = state.store.list_open_signals(OPEN_SIGNALS_LIMIT).await?;
    Ok(ApiResponse::ok(signals))
}

/// POST /api/signals/:id/close
pub async fn close(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Signal>>, AppError> {
    let signal = signals::finish_signal(
        state.store.as_ref(),
        state.clock.as_ref(),
        auth.user_id,
        id,
        trade_status::CLOSED,
    )
    .await?;
    Ok(ApiResponse::ok(signal))
}

/// POST /api/signals/:id/cancel
pub async fn cancel(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Signal>>, AppError> {
    let signal = signals::finish_signal(
        state.store.as_ref(),
        state.clock.as_ref(),
        auth.user_id,
        id,
        trade_status::CANCELLED,
    )
    .await?;
    Ok(ApiResponse::ok(signal))
}

/// POST /api/signals/:id/copy: manual copy by the calling follower
pub async fn copy(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<ApiResponse<CopyTradeView>>, AppError> {
    let request = CopyRequest {
        signal_id: id,
        follower_id: auth.user_id,
        overrides: parse_overrides(&body)?,
        mode: CopyMode::Manual,
    };

    let view = execution::copy_signal(
        state.store.as_ref(),
        state.clock.as_ref(),
        &state.engine_config(),
        &request,
    )
    .await?;
    Ok(ApiResponse::ok(view))
}

/// An empty body means no overrides; anything else must decode.
fn parse_overrides(body: &[u8]) -> Result<CopyOverrides, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CopyOverrides::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::Validation(format!("invalid request body: {e}")))
}
