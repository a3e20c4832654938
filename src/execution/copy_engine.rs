use std::time::Instant;

use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::clock::Clock;
use crate::db::{DuplicateKey, Store};
use crate::errors::AppError;
use crate::models::copy_trade::NewCopyTrade;
use crate::models::{CopyTrade, CopyTradeView, Follow, Signal};

use super::position_sizer::{self, SizingInputs};
use super::risk_manager::{self, PendingCopy, PortfolioSnapshot, RiskViolation};
use super::CopyMode;

/// Configuration for the copy engine.
#[derive(Debug, Clone, Default)]
pub struct CopyEngineConfig {
    /// Refuse a second copy of the same signal by the same follower.
    pub unique_per_signal: bool,
}

/// Call-time overrides supplied by the follower.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyOverrides {
    pub multiplier: Option<Decimal>,
    #[serde(alias = "risk_pct")]
    pub risk_pct: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct CopyRequest {
    pub signal_id: Uuid,
    pub follower_id: Uuid,
    pub overrides: CopyOverrides,
    pub mode: CopyMode,
}

/// Decide whether `request.follower_id` copies the signal, and at what size.
///
/// On approval exactly one copy trade is written; every rejection leaves the
/// store untouched. Repeated calls are not deduplicated unless
/// `unique_per_signal` is set.
pub async fn copy_signal<S: Store + ?Sized>(
    store: &S,
    clock: &dyn Clock,
    config: &CopyEngineConfig,
    request: &CopyRequest,
) -> Result<CopyTradeView, AppError> {
    let start = Instant::now();
    let result = decide_and_commit(store, clock, config, request).await;
    histogram!("copy_decision_seconds").record(start.elapsed().as_secs_f64());

    match &result {
        Ok(view) => {
            counter!("copy_trades_created", "mode" => request.mode.as_str()).increment(1);
            tracing::info!(
                follower_id = %request.follower_id,
                signal_id = %request.signal_id,
                copy_trade_id = %view.copy_trade.id,
                amount = %view.copy_trade.amount,
                executed_price = %view.copy_trade.executed_price,
                mode = request.mode.as_str(),
                "Copy trade created"
            );
        }
        Err(e) => {
            counter!("copy_trades_rejected", "kind" => e.kind()).increment(1);
            tracing::warn!(
                follower_id = %request.follower_id,
                signal_id = %request.signal_id,
                mode = request.mode.as_str(),
                error = %e,
                "Copy rejected"
            );
        }
    }

    result
}

async fn decide_and_commit<S: Store + ?Sized>(
    store: &S,
    clock: &dyn Clock,
    config: &CopyEngineConfig,
    request: &CopyRequest,
) -> Result<CopyTradeView, AppError> {
    // 1. Signal must exist and still be open
    let signal = store
        .find_signal(request.signal_id)
        .await?
        .ok_or_else(|| AppError::InvalidSignal("signal not found".into()))?;
    if !signal.is_open() {
        return Err(AppError::InvalidSignal(format!("signal is {}", signal.status)));
    }

    // 2. Follower must follow the signal's trader
    let follow = store
        .find_follow(request.follower_id, signal.trader_id)
        .await?
        .ok_or(AppError::NotFollowing)?;

    if request.mode == CopyMode::Auto && !follow.auto_copy {
        return Err(RiskViolation::AutoCopyDisabled.into());
    }

    if config.unique_per_signal && store.has_copied_signal(request.follower_id, signal.id).await? {
        return Err(AppError::DuplicateCopy);
    }

    // 3. Size
    validate_overrides(&request.overrides)?;
    let risk_settings = store.find_risk_setting(request.follower_id).await?;
    let risk_pct = request.overrides.risk_pct.or(follow.risk_pct);
    let equity = if risk_settings.is_some() || risk_pct.is_some() {
        store.follower_equity(request.follower_id).await?
    } else {
        None
    };

    let amount = position_sizer::calculate_size(&SizingInputs {
        signal_size: signal.size,
        price: signal.price,
        stop_loss: signal.stop_loss,
        multiplier: resolve_multiplier(&request.overrides, &follow),
        max_size: follow.max_size,
        risk_pct,
        equity,
    });
    if amount <= Decimal::ZERO {
        return Err(AppError::Validation("computed copy size is zero".into()));
    }

    // 4. Risk gating, only when the follower has saved risk settings
    let now = clock.now();
    if let Some(limits) = &risk_settings {
        let portfolio = snapshot(store, request.follower_id, equity, now).await?;
        let pending = PendingCopy {
            amount,
            price: signal.price,
            mode: request.mode,
        };
        risk_manager::check_risk(&pending, &portfolio, limits)?;
    }

    // Last read before the write, so a failure here leaves nothing behind
    let trader_name = store
        .find_trader(signal.trader_id)
        .await?
        .map(|t| t.display_name)
        .unwrap_or_default();

    // 5. Commit at the signal's price
    let copy_trade = store
        .insert_copy_trade(NewCopyTrade {
            follower_id: request.follower_id,
            signal_id: signal.id,
            trader_id: signal.trader_id,
            amount,
            executed_price: signal.price,
            created_at: now,
        })
        .await
        .map_err(|e| {
            if e.downcast_ref::<DuplicateKey>().is_some() {
                AppError::DuplicateCopy
            } else {
                AppError::Internal(e)
            }
        })?;

    Ok(view(copy_trade, &signal, trader_name))
}

/// A call-time override wins over the follow row. Follows always carry a
/// multiplier; the configured default is applied when they are created.
fn resolve_multiplier(overrides: &CopyOverrides, follow: &Follow) -> Decimal {
    overrides.multiplier.unwrap_or(follow.multiplier)
}

fn validate_overrides(overrides: &CopyOverrides) -> Result<(), AppError> {
    if matches!(overrides.multiplier, Some(m) if m < Decimal::ZERO) {
        return Err(AppError::Validation("multiplier must not be negative".into()));
    }
    if matches!(overrides.risk_pct, Some(r) if r <= Decimal::ZERO || r > Decimal::ONE) {
        return Err(AppError::Validation("riskPct must be in (0, 1]".into()));
    }
    Ok(())
}

async fn snapshot<S: Store + ?Sized>(
    store: &S,
    follower_id: Uuid,
    equity: Option<Decimal>,
    now: DateTime<Utc>,
) -> anyhow::Result<PortfolioSnapshot> {
    let open_trades = store.count_open_copy_trades(follower_id).await?;
    let open_notional = store.open_notional(follower_id).await?;
    let daily_volume = store.copied_volume_since(follower_id, start_of_utc_day(now)).await?;
    let drawdown = match equity {
        Some(equity) => {
            let history = store.list_copy_trades(follower_id).await?;
            risk_manager::current_drawdown(equity, &history)
        }
        None => Decimal::ZERO,
    };

    Ok(PortfolioSnapshot {
        equity,
        open_trades,
        open_notional,
        daily_volume,
        drawdown,
    })
}

fn start_of_utc_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or(now)
}

fn view(copy_trade: CopyTrade, signal: &Signal, trader_name: String) -> CopyTradeView {
    CopyTradeView {
        copy_trade,
        trader_name,
        symbol: signal.symbol.clone(),
        side: signal.side.clone(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
