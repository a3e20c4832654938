use async_trait::async_trait;
use uuid::Uuid;

use crate::models::Follow;

use super::PgStore;

#[async_trait]
pub trait FollowRepository {
    async fn find_follow(&self, follower_id: Uuid, trader_id: Uuid) -> anyhow::Result<Option<Follow>>;

    /// Insert or overwrite the follow for `(follower_id, trader_id)`.
    async fn save_follow(&self, follow: &Follow) -> anyhow::Result<Follow>;

    /// Returns false if there was nothing to delete.
    async fn delete_follow(&self, follower_id: Uuid, trader_id: Uuid) -> anyhow::Result<bool>;

    async fn list_follows(&self, follower_id: Uuid) -> anyhow::Result<Vec<Follow>>;

    async fn list_auto_copy_follows(&self, trader_id: Uuid) -> anyhow::Result<Vec<Follow>>;
}

#[async_trait]
impl FollowRepository for PgStore {
    async fn find_follow(&self, follower_id: Uuid, trader_id: Uuid) -> anyhow::Result<Option<Follow>> {
        let follow = sqlx::query_as::<_, Follow>(
            "SELECT * FROM follows WHERE follower_id = $1 AND trader_id = $2",
        )
        .bind(follower_id)
        .bind(trader_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(follow)
    }

    async fn save_follow(&self, follow: &Follow) -> anyhow::Result<Follow> {
        let saved = sqlx::query_as::<_, Follow>(
            r#"
            INSERT INTO follows (id, follower_id, trader_id, multiplier, auto_copy, max_size, risk_pct, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (follower_id, trader_id) DO UPDATE
                SET multiplier = $4, auto_copy = $5, max_size = $6, risk_pct = $7, updated_at = $9
            RETURNING *
            "#,
        )
        .bind(follow.id)
        .bind(follow.follower_id)
        .bind(follow.trader_id)
        .bind(follow.multiplier)
        .bind(follow.auto_copy)
        .bind(follow.max_size)
        .bind(follow.risk_pct)
        .bind(follow.created_at)
        .bind(follow.updated_at)
        .fetch_one(self.pool())
        .await?;

        Ok(saved)
    }

    async fn delete_follow(&self, follower_id: Uuid, trader_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND trader_id = $2")
            .bind(follower_id)
            .bind(trader_id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_follows(&self, follower_id: Uuid) -> anyhow::Result<Vec<Follow>> {
        let follows = sqlx::query_as::<_, Follow>(
            "SELECT * FROM follows WHERE follower_id = $1 ORDER BY created_at ASC",
        )
        .bind(follower_id)
        .fetch_all(self.pool())
        .await?;

        Ok(follows)
    }

    async fn list_auto_copy_follows(&self, trader_id: Uuid) -> anyhow::Result<Vec<Follow>> {
        let follows = sqlx::query_as::<_, Follow>(
            "SELECT * FROM follows WHERE trader_id = $1 AND auto_copy = true ORDER BY created_at ASC",
        )
        .bind(trader_id)
        .fetch_all(self.pool())
        .await?;

        Ok(follows)
    }
}
