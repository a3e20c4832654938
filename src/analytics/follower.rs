use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::db::Store;
use crate::models::{CopyTrade, Follow};

/// A follower's copy record against one followed trader.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraderPerformance {
    pub trader_id: Uuid,
    pub trader_name: String,
    pub multiplier: Decimal,
    pub auto_copy: bool,
    pub total_trades: usize,
    pub open_trades: usize,
    pub closed_trades: usize,
    pub cumulative_pnl: Decimal,
    /// Percentage of closed trades with positive pnl.
    pub success_rate: Decimal,
    pub avg_trade_time_hours: Decimal,
    /// Percentage drawdown after each closed trade. See [`drawdown_history`].
    pub drawdown_history: Vec<Decimal>,
}

/// Summaries for every trader the follower follows.
pub async fn follower_analytics<S: Store + ?Sized>(
    store: &S,
    follower_id: Uuid,
) -> anyhow::Result<Vec<TraderPerformance>> {
    let follows = store.list_follows(follower_id).await?;
    let trades = store.list_copy_trades(follower_id).await?;

    let mut out = Vec::with_capacity(follows.len());
    for follow in &follows {
        let trader_name = store
            .find_trader(follow.trader_id)
            .await?
            .map(|t| t.display_name)
            .unwrap_or_default();
        let with_trader: Vec<&CopyTrade> = trades
            .iter()
            .filter(|t| t.trader_id == follow.trader_id)
            .collect();
        out.push(summarize_follow(follow, trader_name, &with_trader));
    }

    Ok(out)
}

pub fn summarize_follow(follow: &Follow, trader_name: String, trades: &[&CopyTrade]) -> TraderPerformance {
    let mut closed: Vec<&CopyTrade> = trades
        .iter()
        .copied()
        .filter(|t| t.is_closed() && t.pnl.is_some())
        .collect();
    closed.sort_by_key(|t| t.updated_at);

    let pnls: Vec<Decimal> = closed.iter().filter_map(|t| t.pnl).collect();
    let cumulative_pnl: Decimal = pnls.iter().copied().sum();

    let success_rate = if closed.is_empty() {
        Decimal::ZERO
    } else {
        let wins = pnls.iter().filter(|p| **p > Decimal::ZERO).count();
        Decimal::from(wins as i64) * Decimal::ONE_HUNDRED / Decimal::from(closed.len() as i64)
    };

    let avg_trade_time_hours = if closed.is_empty() {
        Decimal::ZERO
    } else {
        let total_secs: i64 = closed
            .iter()
            .map(|t| (t.updated_at - t.created_at).num_seconds())
            .sum();
        (Decimal::from(total_secs) / Decimal::from(3_600) / Decimal::from(closed.len() as i64)).round_dp(4)
    };

    TraderPerformance {
        trader_id: follow.trader_id,
        trader_name,
        multiplier: follow.multiplier,
        auto_copy: follow.auto_copy,
        total_trades: trades.len(),
        open_trades: trades.iter().filter(|t| t.is_open()).count(),
        closed_trades: closed.len(),
        cumulative_pnl,
        success_rate,
        avg_trade_time_hours,
        drawdown_history: drawdown_history(&pnls),
    }
}

/// Running peak-to-trough drawdown of cumulative pnl, one point per trade.
///
/// This is a point-in-time approximation over closed trades, not a true
/// equity curve. Points where the running peak is not positive are 0.
pub fn drawdown_history(pnls: &[Decimal]) -> Vec<Decimal> {
    let mut cumulative = Decimal::ZERO;
    let mut peak: Option<Decimal> = None;

    pnls.iter()
        .map(|pnl| {
            cumulative += *pnl;
            let p = peak.map_or(cumulative, |p| p.max(cumulative));
            peak = Some(p);
            if p <= Decimal::ZERO {
                Decimal::ZERO
            } else {
                ((p - cumulative) / p * Decimal::ONE_HUNDRED).round_dp(4)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    use crate::models::trade_status;

    fn follow() -> Follow {
        let now = Utc::now();
        Follow {
            id: Uuid::new_v4(),
            follower_id: Uuid::new_v4(),
            trader_id: Uuid::new_v4(),
            multiplier: Decimal::ONE,
            auto_copy: false,
            max_size: None,
            risk_pct: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn trade(status: &str, pnl: Option<i64>, opened_hour: u32, held_hours: i64) -> CopyTrade {
        let created_at = Utc.with_ymd_and_hms(2024, 1, 1, opened_hour, 0, 0).unwrap();
        CopyTrade {
            id: Uuid::new_v4(),
            follower_id: Uuid::new_v4(),
            signal_id: Uuid::new_v4(),
            trader_id: Uuid::new_v4(),
            amount: Decimal::ONE,
            executed_price: Decimal::from(100),
            pnl: pnl.map(Decimal::from),
            status: status.into(),
            created_at,
            updated_at: created_at + Duration::hours(held_hours),
        }
    }

    #[test]
    fn test_success_rate_and_cumulative_pnl() {
        let trades = vec![
            trade(trade_status::CLOSED, Some(10), 0, 1),
            trade(trade_status::CLOSED, Some(-5), 1, 1),
            trade(trade_status::CLOSED, Some(3), 2, 1),
            trade(trade_status::CLOSED, Some(-2), 3, 1),
            trade(trade_status::OPEN, None, 4, 0),
        ];
        let refs: Vec<&CopyTrade> = trades.iter().collect();

        let perf = summarize_follow(&follow(), "T".into(), &refs);

        assert_eq!(perf.success_rate, Decimal::from(50));
        assert_eq!(perf.cumulative_pnl, Decimal::from(6));
        assert_eq!(perf.closed_trades, 4);
        assert_eq!(perf.open_trades, 1);
        assert_eq!(perf.total_trades, 5);
        assert_eq!(perf.avg_trade_time_hours, Decimal::ONE);
    }

    #[test]
    fn test_no_closed_trades_is_all_zero() {
        let trades = vec![trade(trade_status::OPEN, None, 0, 0)];
        let refs: Vec<&CopyTrade> = trades.iter().collect();

        let perf = summarize_follow(&follow(), "T".into(), &refs);

        assert_eq!(perf.success_rate, Decimal::ZERO);
        assert_eq!(perf.avg_trade_time_hours, Decimal::ZERO);
        assert_eq!(perf.cumulative_pnl, Decimal::ZERO);
        assert!(perf.drawdown_history.is_empty());
    }

    #[test]
    fn test_closed_without_pnl_is_ignored() {
        let trades = vec![
            trade(trade_status::CLOSED, None, 0, 2),
            trade(trade_status::CANCELLED, Some(100), 1, 2),
            trade(trade_status::CLOSED, Some(4), 2, 3),
        ];
        let refs: Vec<&CopyTrade> = trades.iter().collect();

        let perf = summarize_follow(&follow(), "T".into(), &refs);

        assert_eq!(perf.closed_trades, 1);
        assert_eq!(perf.cumulative_pnl, Decimal::from(4));
        assert_eq!(perf.success_rate, Decimal::from(100));
        assert_eq!(perf.avg_trade_time_hours, Decimal::from(3));
    }

    #[test]
    fn test_drawdown_history() {
        // cumulative 10, 5, 8, 6 → peak 10 throughout
        let dd = drawdown_history(&[10, -5, 3, -2].map(Decimal::from));
        assert_eq!(
            dd,
            vec![
                Decimal::ZERO,
                Decimal::from(50),
                Decimal::from(20),
                Decimal::from(40),
            ]
        );
    }

    #[test]
    fn test_drawdown_history_guards_non_positive_peak() {
        let dd = drawdown_history(&[-5, -3, 10].map(Decimal::from));
        assert_eq!(dd, vec![Decimal::ZERO, Decimal::ZERO, Decimal::ZERO]);
    }
}
