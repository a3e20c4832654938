use axum::extract::{Path, State};
use axum::{Extension, Json};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use super::ApiResponse;
use crate::api::auth::AuthContext;
use crate::db::CopyTradeRepository;
use crate::errors::AppError;
use crate::models::{CopyTrade, CopyTradeView};
use crate::services::copy_trades;
use crate::AppState;

#[derive(Deserialize)]
pub struct CloseRequest {
    pub pnl: Decimal,
}

/// GET /api/copy-trades: caller's copy trades, newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ApiResponse<Vec<CopyTradeView>>>, AppError> {
    let trades = state.store.list_copy_trade_views(auth.user_id).await?;
    Ok(ApiResponse::ok(trades))
}

/// POST /api/copy-trades/:id/close
pub async fn close(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(body): Json<CloseRequest>,
) -> Result<Json<ApiResponse<CopyTrade>>, AppError> {
    let trade =
        copy_trades::close_copy_trade(state.store.as_ref(), state.clock.as_ref(), auth.user_id, id, body.pnl)
            .await?;
    Ok(ApiResponse::ok(trade))
}
