use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::clock::Clock;
use crate::db::Store;
use crate::errors::AppError;
use crate::models::RiskSetting;

/// Body of a risk-settings save. Absent optional caps mean "no limit".
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskSettingInput {
    #[serde(alias = "max_drawdown")]
    pub max_drawdown: Decimal,
    #[serde(default, alias = "leverage_cap")]
    pub leverage_cap: Option<Decimal>,
    #[serde(alias = "max_position_pct")]
    pub max_position_pct: Decimal,
    #[serde(default, alias = "max_concurrent_trades")]
    pub max_concurrent_trades: Option<i64>,
    #[serde(default, alias = "max_daily_volume")]
    pub max_daily_volume: Option<Decimal>,
    #[serde(default = "default_true", alias = "auto_copy_enabled")]
    pub auto_copy_enabled: bool,
}

fn default_true() -> bool {
    true
}

impl RiskSettingInput {
    fn validate(&self) -> Result<(), AppError> {
        let fraction = |v: Decimal| v > Decimal::ZERO && v <= Decimal::ONE;

        if !fraction(self.max_drawdown) {
            return Err(AppError::Validation("maxDrawdown must be in (0, 1]".into()));
        }
        if !fraction(self.max_position_pct) {
            return Err(AppError::Validation("maxPositionPct must be in (0, 1]".into()));
        }
        if matches!(self.leverage_cap, Some(v) if v <= Decimal::ZERO) {
            return Err(AppError::Validation("leverageCap must be positive".into()));
        }
        if matches!(self.max_concurrent_trades, Some(v) if v <= 0) {
            return Err(AppError::Validation("maxConcurrentTrades must be positive".into()));
        }
        if matches!(self.max_daily_volume, Some(v) if v <= Decimal::ZERO) {
            return Err(AppError::Validation("maxDailyVolume must be positive".into()));
        }
        Ok(())
    }
}

/// Create or overwrite the follower's risk settings.
pub async fn save_risk_setting<S: Store + ?Sized>(
    store: &S,
    clock: &dyn Clock,
    follower_id: Uuid,
    input: &RiskSettingInput,
) -> Result<RiskSetting, AppError> {
    input.validate()?;

    let saved = store
        .save_risk_setting(&RiskSetting {
            follower_id,
            max_drawdown: input.max_drawdown,
            leverage_cap: input.leverage_cap,
            max_position_pct: input.max_position_pct,
            max_concurrent_trades: input.max_concurrent_trades,
            max_daily_volume: input.max_daily_volume,
            auto_copy_enabled: input.auto_copy_enabled,
            updated_at: clock.now(),
        })
        .await?;

    tracing::info!(
        follower_id = %follower_id,
        max_position_pct = %saved.max_position_pct,
        auto_copy_enabled = saved.auto_copy_enabled,
        "Risk settings saved"
    );
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::clock::SystemClock;
    use crate::db::{MemoryStore, RiskSettingRepository};

    fn input() -> RiskSettingInput {
        RiskSettingInput {
            max_drawdown: Decimal::new(20, 2),
            leverage_cap: None,
            max_position_pct: Decimal::new(10, 2),
            max_concurrent_trades: Some(3),
            max_daily_volume: None,
            auto_copy_enabled: true,
        }
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let store = MemoryStore::new();
        let follower = Uuid::new_v4();

        save_risk_setting(&store, &SystemClock, follower, &input()).await.unwrap();
        let updated = RiskSettingInput {
            max_concurrent_trades: None,
            auto_copy_enabled: false,
            ..input()
        };
        save_risk_setting(&store, &SystemClock, follower, &updated).await.unwrap();

        let stored = store.find_risk_setting(follower).await.unwrap().unwrap();
        assert_eq!(stored.max_concurrent_trades, None);
        assert!(!stored.auto_copy_enabled);
    }

    #[tokio::test]
    async fn test_fractions_are_validated() {
        let store = MemoryStore::new();
        let bad = RiskSettingInput {
            max_position_pct: Decimal::new(15, 1),
            ..input()
        };
        let err = save_risk_setting(&store, &SystemClock, Uuid::new_v4(), &bad)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_input_accepts_camel_case() {
        let parsed: RiskSettingInput = serde_json::from_str(
            r#"{"maxDrawdown":"0.2","maxPositionPct":"0.1","maxConcurrentTrades":2}"#,
        )
        .unwrap();
        assert_eq!(parsed.max_concurrent_trades, Some(2));
        assert!(parsed.auto_copy_enabled);
        assert!(parsed.leverage_cap.is_none());
    }
}
