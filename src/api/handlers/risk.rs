use axum::extract::State;
use axum::{Extension, Json};

use super::ApiResponse;
use crate::api::auth::AuthContext;
use crate::db::RiskSettingRepository;
use crate::errors::AppError;
use crate::models::RiskSetting;
use crate::services::risk_settings::{self, RiskSettingInput};
use crate::AppState;

/// GET /api/risk-settings
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ApiResponse<RiskSetting>>, AppError> {
    let setting = state
        .store
        .find_risk_setting(auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("risk settings".into()))?;
    Ok(ApiResponse::ok(setting))
}

/// PUT /api/risk-settings
pub async fn save(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(body): Json<RiskSettingInput>,
) -> Result<Json<ApiResponse<RiskSetting>>, AppError> {
    let setting =
        risk_settings::save_risk_setting(state.store.as_ref(), state.clock.as_ref(), auth.user_id, &body)
            .await?;
    Ok(ApiResponse::ok(setting))
}
