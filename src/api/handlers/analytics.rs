use axum::extract::State;
use axum::{Extension, Json};

use super::ApiResponse;
use crate::analytics::{self, TraderPerformance};
use crate::api::auth::AuthContext;
use crate::errors::AppError;
use crate::AppState;

/// GET /api/analytics/followers: per-trader copy performance for the caller
pub async fn followers(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ApiResponse<Vec<TraderPerformance>>>, AppError> {
    let summaries = analytics::follower_analytics(state.store.as_ref(), auth.user_id).await?;
    Ok(ApiResponse::ok(summaries))
}
