use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::copy_trade::NewCopyTrade;
use crate::models::{trade_status, CopyTrade, CopyTradeView};

use super::{map_unique_violation, PgStore};

#[async_trait]
pub trait CopyTradeRepository {
    /// Fails with [`super::DuplicateKey`] if a uniqueness constraint on
    /// (follower_id, signal_id) is in place and violated.
    async fn insert_copy_trade(&self, trade: NewCopyTrade) -> anyhow::Result<CopyTrade>;

    async fn find_copy_trade(&self, copy_trade_id: Uuid) -> anyhow::Result<Option<CopyTrade>>;

    async fn has_copied_signal(&self, follower_id: Uuid, signal_id: Uuid) -> anyhow::Result<bool>;

    async fn count_open_copy_trades(&self, follower_id: Uuid) -> anyhow::Result<i64>;

    /// Sum of `amount` over copy trades created at or after `since`.
    async fn copied_volume_since(&self, follower_id: Uuid, since: DateTime<Utc>) -> anyhow::Result<Decimal>;

    /// Sum of `amount * executed_price` over open copy trades.
    async fn open_notional(&self, follower_id: Uuid) -> anyhow::Result<Decimal>;

    /// All of the follower's copy trades, oldest first.
    async fn list_copy_trades(&self, follower_id: Uuid) -> anyhow::Result<Vec<CopyTrade>>;

    /// The follower's copy trades with signal and trader metadata, newest first.
    async fn list_copy_trade_views(&self, follower_id: Uuid) -> anyhow::Result<Vec<CopyTradeView>>;

    /// Attach the realized pnl and close. `None` if missing or not open.
    async fn close_copy_trade(
        &self,
        copy_trade_id: Uuid,
        pnl: Decimal,
        at: DateTime<Utc>,
    ) -> anyhow::Result<Option<CopyTrade>>;
}

#[derive(sqlx::FromRow)]
struct CopyTradeViewRow {
    #[sqlx(flatten)]
    copy_trade: CopyTrade,
    trader_name: String,
    symbol: String,
    side: String,
}

#[async_trait]
impl CopyTradeRepository for PgStore {
    async fn insert_copy_trade(&self, trade: NewCopyTrade) -> anyhow::Result<CopyTrade> {
        sqlx::query_as::<_, CopyTrade>(
            r#"
            INSERT INTO copy_trades (follower_id, signal_id, trader_id, amount, executed_price, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING *
            "#,
        )
        .bind(trade.follower_id)
        .bind(trade.signal_id)
        .bind(trade.trader_id)
        .bind(trade.amount)
        .bind(trade.executed_price)
        .bind(trade_status::OPEN)
        .bind(trade.created_at)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_unique_violation(e, "copy_trades(follower_id, signal_id)"))
    }

    async fn find_copy_trade(&self, copy_trade_id: Uuid) -> anyhow::Result<Option<CopyTrade>> {
        let trade = sqlx::query_as::<_, CopyTrade>("SELECT * FROM copy_trades WHERE id = $1")
            .bind(copy_trade_id)
            .fetch_optional(self.pool())
            .await?;

        Ok(trade)
    }

    async fn has_copied_signal(&self, follower_id: Uuid, signal_id: Uuid) -> anyhow::Result<bool> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM copy_trades WHERE follower_id = $1 AND signal_id = $2)",
        )
        .bind(follower_id)
        .bind(signal_id)
        .fetch_one(self.pool())
        .await?;

        Ok(row.0)
    }

    async fn count_open_copy_trades(&self, follower_id: Uuid) -> anyhow::Result<i64> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM copy_trades WHERE follower_id = $1 AND status = 'open'",
        )
        .bind(follower_id)
        .fetch_one(self.pool())
        .await?;

        Ok(row.0)
    }

    async fn copied_volume_since(&self, follower_id: Uuid, since: DateTime<Utc>) -> anyhow::Result<Decimal> {
        let row: (Option<Decimal>,) = sqlx::query_as(
            "SELECT COALESCE(SUM(amount), 0) FROM copy_trades WHERE follower_id = $1 AND created_at >= $2",
        )
        .bind(follower_id)
        .bind(since)
        .fetch_one(self.pool())
        .await?;

        Ok(row.0.unwrap_or(Decimal::ZERO))
    }

    async fn open_notional(&self, follower_id: Uuid) -> anyhow::Result<Decimal> {
        let row: (Option<Decimal>,) = sqlx::query_as(
            "SELECT COALESCE(SUM(amount * executed_price), 0) FROM copy_trades WHERE follower_id = $1 AND status = 'open'",
        )
        .bind(follower_id)
        .fetch_one(self.pool())
        .await?;

        Ok(row.0.unwrap_or(Decimal::ZERO))
    }

    async fn list_copy_trades(&self, follower_id: Uuid) -> anyhow::Result<Vec<CopyTrade>> {
        let trades = sqlx::query_as::<_, CopyTrade>(
            "SELECT * FROM copy_trades WHERE follower_id = $1 ORDER BY created_at ASC",
        )
        .bind(follower_id)
        .fetch_all(self.pool())
        .await?;

        Ok(trades)
    }

    async fn list_copy_trade_views(&self, follower_id: Uuid) -> anyhow::Result<Vec<CopyTradeView>> {
        let rows = sqlx::query_as::<_, CopyTradeViewRow>(
            r#"
            SELECT c.*,
                   COALESCE(t.display_name, '') AS trader_name,
                   COALESCE(s.symbol, '') AS symbol,
                   COALESCE(s.side, '') AS side
            FROM copy_trades c
            LEFT JOIN signals s ON s.id = c.signal_id
            LEFT JOIN traders t ON t.id = c.trader_id
            WHERE c.follower_id = $1
            ORDER BY c.created_at DESC
            "#,
        )
        .bind(follower_id)
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| CopyTradeView {
                copy_trade: r.copy_trade,
                trader_name: r.trader_name,
                symbol: r.symbol,
                side: r.side,
            })
            .collect())
    }

    async fn close_copy_trade(
        &self,
        copy_trade_id: Uuid,
        pnl: Decimal,
        at: DateTime<Utc>,
    ) -> anyhow::Result<Option<CopyTrade>> {
        let trade = sqlx::query_as::<_, CopyTrade>(
            r#"
            UPDATE copy_trades
            SET status = 'closed', pnl = $2, updated_at = $3
            WHERE id = $1 AND status = 'open'
            RETURNING *
            "#,
        )
        .bind(copy_trade_id)
        .bind(pnl)
        .bind(at)
        .fetch_optional(self.pool())
        .await?;

        Ok(trade)
    }
}
