use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for follows table. Unique on (follower_id, trader_id).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    pub id: Uuid,
    pub follower_id: Uuid,
    pub trader_id: Uuid,
    /// Scales the signal size; zero pauses copying without unfollowing.
    pub multiplier: Decimal,
    pub auto_copy: bool,
    /// Upper bound on a single copy's amount.
    pub max_size: Option<Decimal>,
    /// Fraction of equity put at risk per copy, measured to the stop loss.
    pub risk_pct: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Follower-controlled copy parameters. `None` leaves a field unchanged on
/// update and falls back to the default on create.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowParams {
    pub multiplier: Option<Decimal>,
    #[serde(alias = "auto_copy")]
    pub auto_copy: Option<bool>,
    #[serde(alias = "max_size")]
    pub max_size: Option<Decimal>,
    #[serde(alias = "risk_pct")]
    pub risk_pct: Option<Decimal>,
}
