use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::execution::risk_manager::RiskViolation;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    /// The caller is identified but lacks the role or verification required.
    #[error("{0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid signal: {0}")]
    InvalidSignal(String),

    #[error("You must follow this trader before copying their signals")]
    NotFollowing,

    #[error("Rate limit exceeded: {limit} signals per {window_secs}s")]
    RateLimited { limit: i64, window_secs: i64 },

    #[error("Risk limit exceeded: {0}")]
    RiskLimitExceeded(#[from] RiskViolation),

    #[error("Signal has already been copied")]
    DuplicateCopy,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidSignal(_) => StatusCode::CONFLICT,
            AppError::NotFollowing => StatusCode::FORBIDDEN,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::RiskLimitExceeded(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DuplicateCopy => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable kind, used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::NotFound(_) => "not_found",
            AppError::InvalidSignal(_) => "invalid_signal",
            AppError::NotFollowing => "not_following",
            AppError::RateLimited { .. } => "rate_limited",
            AppError::RiskLimitExceeded(_) => "risk_limit",
            AppError::DuplicateCopy => "duplicate_copy",
            AppError::Internal(_) => "internal",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (
            status,
            Json(ErrorBody {
                success: false,
                error: message,
            }),
        )
            .into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Internal(e.into())
    }
}
