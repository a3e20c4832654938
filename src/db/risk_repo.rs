use async_trait::async_trait;
use uuid::Uuid;

use crate::models::RiskSetting;

use super::PgStore;

#[async_trait]
pub trait RiskSettingRepository {
    async fn find_risk_setting(&self, follower_id: Uuid) -> anyhow::Result<Option<RiskSetting>>;

    /// Upsert keyed on follower id; settings are overwritten, never deleted.
    async fn save_risk_setting(&self, setting: &RiskSetting) -> anyhow::Result<RiskSetting>;
}

#[async_trait]
impl RiskSettingRepository for PgStore {
    async fn find_risk_setting(&self, follower_id: Uuid) -> anyhow::Result<Option<RiskSetting>> {
        let setting = sqlx::query_as::<_, RiskSetting>(
            "SELECT * FROM risk_settings WHERE follower_id = $1",
        )
        .bind(follower_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(setting)
    }

    async fn save_risk_setting(&self, setting: &RiskSetting) -> anyhow::Result<RiskSetting> {
        let saved = sqlx::query_as::<_, RiskSetting>(
            r#"
            INSERT INTO risk_settings
                (follower_id, max_drawdown, leverage_cap, max_position_pct,
                 max_concurrent_trades, max_daily_volume, auto_copy_enabled, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (follower_id) DO UPDATE
                SET max_drawdown = $2, leverage_cap = $3, max_position_pct = $4,
                    max_concurrent_trades = $5, max_daily_volume = $6,
                    auto_copy_enabled = $7, updated_at = $8
            RETURNING *
            "#,
        )
        .bind(setting.follower_id)
        .bind(setting.max_drawdown)
        .bind(setting.leverage_cap)
        .bind(setting.max_position_pct)
        .bind(setting.max_concurrent_trades)
        .bind(setting.max_daily_volume)
        .bind(setting.auto_copy_enabled)
        .bind(setting.updated_at)
        .fetch_one(self.pool())
        .await?;

        Ok(saved)
    }
}
