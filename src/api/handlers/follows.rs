use axum::extract::{Path, State};
use axum::{Extension, Json};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use super::ApiResponse;
use crate::api::auth::AuthContext;
use crate::db::FollowRepository;
use crate::errors::AppError;
use crate::models::follow::FollowParams;
use crate::models::Follow;
use crate::services::follows;
use crate::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRequest {
    #[serde(alias = "trader_id")]
    pub trader_id: Uuid,
    pub multiplier: Option<Decimal>,
    #[serde(alias = "auto_copy")]
    pub auto_copy: Option<bool>,
    #[serde(alias = "max_size")]
    pub max_size: Option<Decimal>,
    #[serde(alias = "risk_pct")]
    pub risk_pct: Option<Decimal>,
}

/// GET /api/follows
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ApiResponse<Vec<Follow>>>, AppError> {
    let follows = state.store.list_follows(auth.user_id).await?;
    Ok(ApiResponse::ok(follows))
}

/// POST /api/follows: follow a trader, updating the pair if it exists
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(body): Json<FollowRequest>,
) -> Result<Json<ApiResponse<Follow>>, AppError> {
    let params = FollowParams {
        multiplier: body.multiplier,
        auto_copy: body.auto_copy,
        max_size: body.max_size,
        risk_pct: body.risk_pct,
    };

    let follow = follows::follow_trader(
        state.store.as_ref(),
        state.clock.as_ref(),
        state.config.default_copy_multiplier,
        auth.user_id,
        body.trader_id,
        &params,
    )
    .await?;
    Ok(ApiResponse::ok(follow))
}

/// PUT /api/follows/:trader_id
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(trader_id): Path<Uuid>,
    Json(params): Json<FollowParams>,
) -> Result<Json<ApiResponse<Follow>>, AppError> {
    let follow = follows::update_follow(
        state.store.as_ref(),
        state.clock.as_ref(),
        auth.user_id,
        trader_id,
        &params,
    )
    .await?;
    Ok(ApiResponse::ok(follow))
}

/// DELETE /api/follows/:trader_id
pub async fn remove(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(trader_id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    follows::unfollow(state.store.as_ref(), auth.user_id, trader_id).await?;
    Ok(ApiResponse::ok(()))
}
