use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::signal::NewSignal;
use crate::models::{trade_status, Signal, SignalView};

use super::PgStore;

#[async_trait]
pub trait SignalRepository {
    async fn insert_signal(&self, signal: NewSignal) -> anyhow::Result<Signal>;

    async fn find_signal(&self, signal_id: Uuid) -> anyhow::Result<Option<Signal>>;

    /// Signals created by `trader_id` at or after `since`.
    async fn count_signals_since(&self, trader_id: Uuid, since: DateTime<Utc>) -> anyhow::Result<i64>;

    async fn list_open_signals(&self, limit: i64) -> anyhow::Result<Vec<SignalView>>;

    /// Move an open signal to a terminal status. Returns `None` if the signal
    /// does not exist or is no longer open.
    async fn finish_signal(
        &self,
        signal_id: Uuid,
        status: &str,
        at: DateTime<Utc>,
    ) -> anyhow::Result<Option<Signal>>;
}

#[derive(sqlx::FromRow)]
struct SignalViewRow {
    #[sqlx(flatten)]
    signal: Signal,
    trader_name: String,
}

#[async_trait]
impl SignalRepository for PgStore {
    async fn insert_signal(&self, signal: NewSignal) -> anyhow::Result<Signal> {
        let row = sqlx::query_as::<_, Signal>(
            r#"
            INSERT INTO signals (trader_id, symbol, side, price, size, stop_loss, take_profit, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING *
            "#,
        )
        .bind(signal.trader_id)
        .bind(&signal.symbol)
        .bind(&signal.side)
        .bind(signal.price)
        .bind(signal.size)
        .bind(signal.stop_loss)
        .bind(signal.take_profit)
        .bind(trade_status::OPEN)
        .bind(signal.created_at)
        .fetch_one(self.pool())
        .await?;

        Ok(row)
    }

    async fn find_signal(&self, signal_id: Uuid) -> anyhow::Result<Option<Signal>> {
        let row = sqlx::query_as::<_, Signal>("SELECT * FROM signals WHERE id = $1")
            .bind(signal_id)
            .fetch_optional(self.pool())
            .await?;

        Ok(row)
    }

    async fn count_signals_since(&self, trader_id: Uuid, since: DateTime<Utc>) -> anyhow::Result<i64> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM signals WHERE trader_id = $1 AND created_at >= $2",
        )
        .bind(trader_id)
        .bind(since)
        .fetch_one(self.pool())
        .await?;

        Ok(row.0)
    }

    async fn list_open_signals(&self, limit: i64) -> anyhow::Result<Vec<SignalView>> {
        let rows = sqlx::query_as::<_, SignalViewRow>(
            r#"
            SELECT s.*, t.display_name AS trader_name
            FROM signals s
            JOIN traders t ON t.id = s.trader_id
            WHERE s.status = 'open'
            ORDER BY s.created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| SignalView {
                signal: r.signal,
                trader_name: r.trader_name,
            })
            .collect())
    }

    async fn finish_signal(
        &self,
        signal_id: Uuid,
        status: &str,
        at: DateTime<Utc>,
    ) -> anyhow::Result<Option<Signal>> {
        let row = sqlx::query_as::<_, Signal>(
            r#"
            UPDATE signals
            SET status = $2, updated_at = $3
            WHERE id = $1 AND status = 'open'
            RETURNING *
            "#,
        )
        .bind(signal_id)
        .bind(status)
        .bind(at)
        .fetch_optional(self.pool())
        .await?;

        Ok(row)
    }
}
