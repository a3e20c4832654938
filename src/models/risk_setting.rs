use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for risk_settings table. One row per follower.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RiskSetting {
    pub follower_id: Uuid,
    /// Drawdown fraction (0.20 = 20%) at which auto-copy halts.
    pub max_drawdown: Decimal,
    /// Max open notional as a multiple of equity.
    pub leverage_cap: Option<Decimal>,
    /// Max single copy notional as a fraction of equity.
    pub max_position_pct: Decimal,
    pub max_concurrent_trades: Option<i64>,
    /// Max cumulative copied amount per UTC day.
    pub max_daily_volume: Option<Decimal>,
    /// Global auto-copy switch. Manual copies are unaffected.
    pub auto_copy_enabled: bool,
    pub updated_at: DateTime<Utc>,
}
