pub mod copy_trade;
pub mod follow;
pub mod risk_setting;
pub mod signal;
pub mod trader;

pub use copy_trade::{CopyTrade, CopyTradeView};
pub use follow::Follow;
pub use risk_setting::RiskSetting;
pub use signal::{Signal, SignalView};
pub use trader::Trader;

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn from_api_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "buy" | "long" => Some(Side::Buy),
            "sell" | "short" => Some(Side::Sell),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle states shared by signals and copy trades. Transitions only go
/// from `open` to one of the terminal states.
pub mod trade_status {
    pub const OPEN: &str = "open";
    pub const CLOSED: &str = "closed";
    pub const CANCELLED: &str = "cancelled";

    pub fn is_terminal(status: &str) -> bool {
        status == CLOSED || status == CANCELLED
    }
}
