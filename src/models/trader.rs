use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for traders table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Trader {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub is_expert: bool,
    pub verified: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl Trader {
    /// Only verified experts may publish signals.
    pub fn can_publish(&self) -> bool {
        self.is_expert && self.verified
    }
}
