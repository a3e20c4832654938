use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{CopyTrade, RiskSetting};

use super::CopyMode;

/// The follower's current exposure, gathered before a copy is committed.
#[derive(Debug, Clone)]
pub struct PortfolioSnapshot {
    /// `None` when the wallet-balance feed has no record for the follower.
    pub equity: Option<Decimal>,
    pub open_trades: i64,
    /// Sum of `amount * executed_price` over open copy trades.
    pub open_notional: Decimal,
    /// Amount already copied since UTC midnight.
    pub daily_volume: Decimal,
    /// Current drawdown from the running equity peak, as a fraction.
    pub drawdown: Decimal,
}

/// Risk check violation. The message names the limit that was hit.
#[derive(Debug, Error)]
pub enum RiskViolation {
    #[error("auto-copy is disabled")]
    AutoCopyDisabled,

    #[error("max concurrent trades reached: {current}/{max}")]
    TooManyOpenTrades { current: i64, max: i64 },

    #[error("position size {notional} exceeds max {max} ({pct}% of equity)")]
    PositionTooLarge {
        notional: Decimal,
        max: Decimal,
        pct: Decimal,
    },

    #[error("position size cannot be checked: account equity unknown")]
    EquityUnknown,

    #[error("leverage {leverage}x would exceed cap {max}x")]
    LeverageExceeded { leverage: Decimal, max: Decimal },

    #[error("daily volume {volume} + {amount} exceeds max {max}")]
    DailyVolumeExceeded {
        volume: Decimal,
        amount: Decimal,
        max: Decimal,
    },

    #[error("drawdown {drawdown}% at or above max {max}%, auto-copy halted")]
    DrawdownExceeded { drawdown: Decimal, max: Decimal },
}

/// A copy about to be committed.
#[derive(Debug, Clone)]
pub struct PendingCopy {
    pub amount: Decimal,
    pub price: Decimal,
    pub mode: CopyMode,
}

impl PendingCopy {
    pub fn notional(&self) -> Decimal {
        self.amount * self.price
    }
}

/// Run every configured check against a pending copy. Returns Ok(()) if all pass.
pub fn check_risk(
    copy: &PendingCopy,
    portfolio: &PortfolioSnapshot,
    limits: &RiskSetting,
) -> Result<(), RiskViolation> {
    // 1. Global auto-copy switch (manual copies are the follower's own confirmation)
    if copy.mode == CopyMode::Auto && !limits.auto_copy_enabled {
        return Err(RiskViolation::AutoCopyDisabled);
    }

    // 2. Concurrent open trades
    if let Some(max) = limits.max_concurrent_trades {
        if portfolio.open_trades >= max {
            return Err(RiskViolation::TooManyOpenTrades {
                current: portfolio.open_trades,
                max,
            });
        }
    }

    // 3. Single position size against equity
    let equity = portfolio.equity.ok_or(RiskViolation::EquityUnknown)?;
    let notional = copy.notional();
    let max_notional = equity * limits.max_position_pct;
    if notional > max_notional {
        return Err(RiskViolation::PositionTooLarge {
            notional,
            max: max_notional,
            pct: limits.max_position_pct * Decimal::ONE_HUNDRED,
        });
    }

    // 4. Total open exposure against the leverage cap
    if let Some(cap) = limits.leverage_cap {
        let exposure = portfolio.open_notional + notional;
        if equity <= Decimal::ZERO || exposure > equity * cap {
            let leverage = if equity > Decimal::ZERO {
                (exposure / equity).round_dp(2)
            } else {
                exposure
            };
            return Err(RiskViolation::LeverageExceeded { leverage, max: cap });
        }
    }

    // 5. Daily copied volume
    if let Some(max) = limits.max_daily_volume {
        if portfolio.daily_volume + copy.amount > max {
            return Err(RiskViolation::DailyVolumeExceeded {
                volume: portfolio.daily_volume,
                amount: copy.amount,
                max,
            });
        }
    }

    // 6. Drawdown halts auto-copy only
    if copy.mode == CopyMode::Auto && portfolio.drawdown >= limits.max_drawdown {
        return Err(RiskViolation::DrawdownExceeded {
            drawdown: (portfolio.drawdown * Decimal::ONE_HUNDRED).round_dp(2),
            max: limits.max_drawdown * Decimal::ONE_HUNDRED,
        });
    }

    Ok(())
}

/// Current drawdown of the follower's equity curve.
///
/// The curve starts at `equity - Σpnl` and steps by each known pnl (closed
/// trades are realized, open trades may carry a mark), in creation order.
/// Drawdown is `(peak - last) / peak`; zero when the peak is not positive.
pub fn current_drawdown(equity: Decimal, trades: &[CopyTrade]) -> Decimal {
    let pnls: Vec<Decimal> = trades.iter().filter_map(|t| t.pnl).collect();
    let total: Decimal = pnls.iter().copied().sum();

    let mut value = equity - total;
    let mut peak = value;
    for pnl in pnls {
        value += pnl;
        peak = peak.max(value);
    }

    if peak <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    ((peak - value) / peak).max(Decimal::ZERO)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use crate::models::trade_status;

    fn limits() -> RiskSetting {
        RiskSetting {
            follower_id: Uuid::new_v4(),
            max_drawdown: Decimal::new(20, 2),     // 0.20
            leverage_cap: None,
            max_position_pct: Decimal::new(50, 2), // 0.50
            max_concurrent_trades: Some(2),
            max_daily_volume: None,
            auto_copy_enabled: true,
            updated_at: Utc::now(),
        }
    }

    fn portfolio() -> PortfolioSnapshot {
        PortfolioSnapshot {
            equity: Some(Decimal::from(10_000)),
            open_trades: 0,
            open_notional: Decimal::ZERO,
            daily_volume: Decimal::ZERO,
            drawdown: Decimal::ZERO,
        }
    }

    fn copy(amount: i64, price: i64, mode: CopyMode) -> PendingCopy {
        PendingCopy {
            amount: Decimal::from(amount),
            price: Decimal::from(price),
            mode,
        }
    }

    fn closed_trade(pnl: i64, minutes: i64) -> CopyTrade {
        let at = Utc::now() + Duration::minutes(minutes);
        CopyTrade {
            id: Uuid::new_v4(),
            follower_id: Uuid::new_v4(),
            signal_id: Uuid::new_v4(),
            trader_id: Uuid::new_v4(),
            amount: Decimal::ONE,
            executed_price: Decimal::ONE,
            pnl: Some(Decimal::from(pnl)),
            status: trade_status::CLOSED.into(),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_risk_check_passes() {
        let result = check_risk(&copy(10, 100, CopyMode::Manual), &portfolio(), &limits());
        assert!(result.is_ok());
    }

    #[test]
    fn test_too_many_open_trades() {
        let snapshot = PortfolioSnapshot {
            open_trades: 2,
            ..portfolio()
        };
        let result = check_risk(&copy(1, 100, CopyMode::Manual), &snapshot, &limits());
        assert!(matches!(
            result,
            Err(RiskViolation::TooManyOpenTrades { current: 2, max: 2 })
        ));
    }

    #[test]
    fn test_position_too_large() {
        // 60 × 100 = 6000 > 50% of 10k
        let result = check_risk(&copy(60, 100, CopyMode::Manual), &portfolio(), &limits());
        assert!(matches!(result, Err(RiskViolation::PositionTooLarge { .. })));
    }

    #[test]
    fn test_unknown_equity_rejects() {
        let snapshot = PortfolioSnapshot {
            equity: None,
            ..portfolio()
        };
        let result = check_risk(&copy(1, 1, CopyMode::Manual), &snapshot, &limits());
        assert!(matches!(result, Err(RiskViolation::EquityUnknown)));
    }

    #[test]
    fn test_leverage_cap_counts_open_exposure() {
        let limits = RiskSetting {
            leverage_cap: Some(Decimal::ONE),
            ..limits()
        };
        let snapshot = PortfolioSnapshot {
            open_notional: Decimal::from(8_000),
            ..portfolio()
        };
        // 8000 open + 3000 new > 1× 10k
        let result = check_risk(&copy(30, 100, CopyMode::Manual), &snapshot, &limits);
        assert!(matches!(result, Err(RiskViolation::LeverageExceeded { .. })));
    }

    #[test]
    fn test_daily_volume_cap() {
        let limits = RiskSetting {
            max_daily_volume: Some(Decimal::from(100)),
            ..limits()
        };
        let snapshot = PortfolioSnapshot {
            daily_volume: Decimal::from(95),
            ..portfolio()
        };
        let result = check_risk(&copy(10, 1, CopyMode::Manual), &snapshot, &limits);
        assert!(matches!(result, Err(RiskViolation::DailyVolumeExceeded { .. })));

        let result = check_risk(&copy(5, 1, CopyMode::Manual), &snapshot, &limits);
        assert!(result.is_ok());
    }

    #[test]
    fn test_auto_copy_switch_only_blocks_auto_mode() {
        let limits = RiskSetting {
            auto_copy_enabled: false,
            ..limits()
        };
        let auto = check_risk(&copy(1, 100, CopyMode::Auto), &portfolio(), &limits);
        assert!(matches!(auto, Err(RiskViolation::AutoCopyDisabled)));

        let manual = check_risk(&copy(1, 100, CopyMode::Manual), &portfolio(), &limits);
        assert!(manual.is_ok());
    }

    #[test]
    fn test_drawdown_halts_auto_copy_only() {
        let snapshot = PortfolioSnapshot {
            drawdown: Decimal::new(25, 2),
            ..portfolio()
        };
        let auto = check_risk(&copy(1, 100, CopyMode::Auto), &snapshot, &limits());
        assert!(matches!(auto, Err(RiskViolation::DrawdownExceeded { .. })));

        let manual = check_risk(&copy(1, 100, CopyMode::Manual), &snapshot, &limits());
        assert!(manual.is_ok());
    }

    #[test]
    fn test_current_drawdown_from_peak() {
        // baseline 1000 - (200 - 300) = 1100 → 1300 → 1000; peak 1300
        let trades = vec![closed_trade(200, 0), closed_trade(-300, 1)];
        let dd = current_drawdown(Decimal::from(1_000), &trades);
        assert_eq!(dd.round_dp(4), Decimal::new(2308, 4));
    }

    #[test]
    fn test_current_drawdown_guards_non_positive_peak() {
        assert_eq!(current_drawdown(Decimal::ZERO, &[]), Decimal::ZERO);
        // baseline -50 → -100; the peak never goes positive
        let trades = vec![closed_trade(-50, 0)];
        assert_eq!(current_drawdown(Decimal::from(-100), &trades), Decimal::ZERO);
    }
}
