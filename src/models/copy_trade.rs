use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::trade_status;

/// Database row for copy_trades table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CopyTrade {
    pub id: Uuid,
    pub follower_id: Uuid,
    pub signal_id: Uuid,
    pub trader_id: Uuid,
    pub amount: Decimal,
    pub executed_price: Decimal,
    /// Realized once closed; an open trade may carry an externally marked value.
    pub pnl: Option<Decimal>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CopyTrade {
    pub fn is_open(&self) -> bool {
        self.status == trade_status::OPEN
    }

    pub fn is_closed(&self) -> bool {
        self.status == trade_status::CLOSED
    }

    pub fn notional(&self) -> Decimal {
        self.amount * self.executed_price
    }
}

/// Fields of a copy trade about to be persisted.
#[derive(Debug, Clone)]
pub struct NewCopyTrade {
    pub follower_id: Uuid,
    pub signal_id: Uuid,
    pub trader_id: Uuid,
    pub amount: Decimal,
    pub executed_price: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Copy trade with display metadata from the copied signal.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyTradeView {
    #[serde(flatten)]
    pub copy_trade: CopyTrade,
    pub trader_name: String,
    pub symbol: String,
    pub side: String,
}
