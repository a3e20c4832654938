use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::Trader;

use super::PgStore;

/// Read-only view of the user directory: trader verification flags and
/// follower equity as reported by the wallet-balance feed.
#[async_trait]
pub trait AccountRepository {
    async fn find_trader(&self, trader_id: Uuid) -> anyhow::Result<Option<Trader>>;

    /// Latest known account equity, `None` if the follower has no balance record.
    async fn follower_equity(&self, follower_id: Uuid) -> anyhow::Result<Option<Decimal>>;
}

#[async_trait]
impl AccountRepository for PgStore {
    async fn find_trader(&self, trader_id: Uuid) -> anyhow::Result<Option<Trader>> {
        let trader = sqlx::query_as::<_, Trader>("SELECT * FROM traders WHERE id = $1")
            .bind(trader_id)
            .fetch_optional(self.pool())
            .await?;

        Ok(trader)
    }

    async fn follower_equity(&self, follower_id: Uuid) -> anyhow::Result<Option<Decimal>> {
        let row: Option<(Decimal,)> =
            sqlx::query_as("SELECT equity FROM follower_accounts WHERE follower_id = $1")
                .bind(follower_id)
                .fetch_optional(self.pool())
                .await?;

        Ok(row.map(|r| r.0))
    }
}
