use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::copy_trade::NewCopyTrade;
use crate::models::signal::NewSignal;
use crate::models::{
    trade_status, CopyTrade, CopyTradeView, Follow, RiskSetting, Signal, SignalView, Trader,
};

use super::{
    AccountRepository, CopyTradeRepository, DuplicateKey, FollowRepository,
    RiskSettingRepository, SignalRepository,
};

/// In-process store with the same semantics as the Postgres schema.
///
/// Used by the test suite and for local runs with `STORE=memory`. State is
/// per-process, so the signal rate limit is only shared across clones.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    traders: HashMap<Uuid, Trader>,
    equity: HashMap<Uuid, Decimal>,
    signals: Vec<Signal>,
    follows: Vec<Follow>,
    risk_settings: HashMap<Uuid, RiskSetting>,
    copy_trades: Vec<CopyTrade>,
    /// Mirrors the optional unique index on copy_trades(follower_id, signal_id).
    unique_copies: bool,
    /// Simulates the trader directory being unreachable.
    trader_lookups_fail: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Behave as if the unique index on (follower_id, signal_id) exists.
    pub async fn enforce_unique_copies(&self) {
        self.inner.lock().await.unique_copies = true;
    }

    /// Make every `find_trader` call fail, as if the directory were down.
    pub async fn fail_trader_lookups(&self) {
        self.inner.lock().await.trader_lookups_fail = true;
    }

    pub async fn insert_trader(&self, trader: Trader) {
        self.inner.lock().await.traders.insert(trader.id, trader);
    }

    pub async fn set_equity(&self, follower_id: Uuid, equity: Decimal) {
        self.inner.lock().await.equity.insert(follower_id, equity);
    }

    /// Seed a historical copy trade as-is.
    pub async fn insert_copy_trade_row(&self, trade: CopyTrade) {
        self.inner.lock().await.copy_trades.push(trade);
    }

    pub async fn copy_trade_count(&self) -> usize {
        self.inner.lock().await.copy_trades.len()
    }

    pub async fn signal_count(&self) -> usize {
        self.inner.lock().await.signals.len()
    }
}

impl MemoryInner {
    fn trader_name(&self, trader_id: Uuid) -> String {
        self.traders
            .get(&trader_id)
            .map(|t| t.display_name.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn find_trader(&self, trader_id: Uuid) -> anyhow::Result<Option<Trader>> {
        let inner = self.inner.lock().await;
        if inner.trader_lookups_fail {
            anyhow::bail!("trader directory unavailable");
        }
        Ok(inner.traders.get(&trader_id).cloned())
    }

    async fn follower_equity(&self, follower_id: Uuid) -> anyhow::Result<Option<Decimal>> {
        Ok(self.inner.lock().await.equity.get(&follower_id).copied())
    }
}

#[async_trait]
impl SignalRepository for MemoryStore {
    async fn insert_signal(&self, signal: NewSignal) -> anyhow::Result<Signal> {
        let row = Signal {
            id: Uuid::new_v4(),
            trader_id: signal.trader_id,
            symbol: signal.symbol,
            side: signal.side,
            price: signal.price,
            size: signal.size,
            stop_loss: signal.stop_loss,
            take_profit: signal.take_profit,
            status: trade_status::OPEN.to_string(),
            created_at: signal.created_at,
            updated_at: signal.created_at,
        };
        self.inner.lock().await.signals.push(row.clone());
        Ok(row)
    }

    async fn find_signal(&self, signal_id: Uuid) -> anyhow::Result<Option<Signal>> {
        let inner = self.inner.lock().await;
        Ok(inner.signals.iter().find(|s| s.id == signal_id).cloned())
    }

    async fn count_signals_since(&self, trader_id: Uuid, since: DateTime<Utc>) -> anyhow::Result<i64> {
        let inner = self.inner.lock().await;
        let count = inner
            .signals
            .iter()
            .filter(|s| s.trader_id == trader_id && s.created_at >= since)
            .count();
        Ok(count as i64)
    }

    async fn list_open_signals(&self, limit: i64) -> anyhow::Result<Vec<SignalView>> {
        let inner = self.inner.lock().await;
        let mut open: Vec<&Signal> = inner.signals.iter().filter(|s| s.is_open()).collect();
        open.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(open
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|s| SignalView {
                signal: s.clone(),
                trader_name: inner.trader_name(s.trader_id),
            })
            .collect())
    }

    async fn finish_signal(
        &self,
        signal_id: Uuid,
        status: &str,
        at: DateTime<Utc>,
    ) -> anyhow::Result<Option<Signal>> {
        let mut inner = self.inner.lock().await;
        let Some(signal) = inner
            .signals
            .iter_mut()
            .find(|s| s.id == signal_id && s.is_open())
        else {
            return Ok(None);
        };
        signal.status = status.to_string();
        signal.updated_at = at;
        Ok(Some(signal.clone()))
    }
}

#[async_trait]
impl FollowRepository for MemoryStore {
    async fn find_follow(&self, follower_id: Uuid, trader_id: Uuid) -> anyhow::Result<Option<Follow>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .follows
            .iter()
            .find(|f| f.follower_id == follower_id && f.trader_id == trader_id)
            .cloned())
    }

    async fn save_follow(&self, follow: &Follow) -> anyhow::Result<Follow> {
        let mut inner = self.inner.lock().await;
        match inner
            .follows
            .iter_mut()
            .find(|f| f.follower_id == follow.follower_id && f.trader_id == follow.trader_id)
        {
            Some(existing) => {
                existing.multiplier = follow.multiplier;
                existing.auto_copy = follow.auto_copy;
                existing.max_size = follow.max_size;
                existing.risk_pct = follow.risk_pct;
                existing.updated_at = follow.updated_at;
                Ok(existing.clone())
            }
            None => {
                inner.follows.push(follow.clone());
                Ok(follow.clone())
            }
        }
    }

    async fn delete_follow(&self, follower_id: Uuid, trader_id: Uuid) -> anyhow::Result<bool> {
        let mut inner = self.inner.lock().await;
        let before = inner.follows.len();
        inner
            .follows
            .retain(|f| !(f.follower_id == follower_id && f.trader_id == trader_id));
        Ok(inner.follows.len() < before)
    }

    async fn list_follows(&self, follower_id: Uuid) -> anyhow::Result<Vec<Follow>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .follows
            .iter()
            .filter(|f| f.follower_id == follower_id)
            .cloned()
            .collect())
    }

    async fn list_auto_copy_follows(&self, trader_id: Uuid) -> anyhow::Result<Vec<Follow>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .follows
            .iter()
            .filter(|f| f.trader_id == trader_id && f.auto_copy)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RiskSettingRepository for MemoryStore {
    async fn find_risk_setting(&self, follower_id: Uuid) -> anyhow::Result<Option<RiskSetting>> {
        Ok(self.inner.lock().await.risk_settings.get(&follower_id).cloned())
    }

    async fn save_risk_setting(&self, setting: &RiskSetting) -> anyhow::Result<RiskSetting> {
        self.inner
            .lock()
            .await
            .risk_settings
            .insert(setting.follower_id, setting.clone());
        Ok(setting.clone())
    }
}

#[async_trait]
impl CopyTradeRepository for MemoryStore {
    async fn insert_copy_trade(&self, trade: NewCopyTrade) -> anyhow::Result<CopyTrade> {
        let mut inner = self.inner.lock().await;
        if inner.unique_copies
            && inner
                .copy_trades
                .iter()
                .any(|c| c.follower_id == trade.follower_id && c.signal_id == trade.signal_id)
        {
            return Err(DuplicateKey("copy_trades(follower_id, signal_id)".into()).into());
        }

        let row = CopyTrade {
            id: Uuid::new_v4(),
            follower_id: trade.follower_id,
            signal_id: trade.signal_id,
            trader_id: trade.trader_id,
            amount: trade.amount,
            executed_price: trade.executed_price,
            pnl: None,
            status: trade_status::OPEN.to_string(),
            created_at: trade.created_at,
            updated_at: trade.created_at,
        };
        inner.copy_trades.push(row.clone());
        Ok(row)
    }

    async fn find_copy_trade(&self, copy_trade_id: Uuid) -> anyhow::Result<Option<CopyTrade>> {
        let inner = self.inner.lock().await;
        Ok(inner.copy_trades.iter().find(|c| c.id == copy_trade_id).cloned())
    }

    async fn has_copied_signal(&self, follower_id: Uuid, signal_id: Uuid) -> anyhow::Result<bool> {
        let inner = self.inner.lock().await;
        Ok(inner
            .copy_trades
            .iter()
            .any(|c| c.follower_id == follower_id && c.signal_id == signal_id))
    }

    async fn count_open_copy_trades(&self, follower_id: Uuid) -> anyhow::Result<i64> {
        let inner = self.inner.lock().await;
        let count = inner
            .copy_trades
            .iter()
            .filter(|c| c.follower_id == follower_id && c.is_open())
            .count();
        Ok(count as i64)
    }

    async fn copied_volume_since(&self, follower_id: Uuid, since: DateTime<Utc>) -> anyhow::Result<Decimal> {
        let inner = self.inner.lock().await;
        Ok(inner
            .copy_trades
            .iter()
            .filter(|c| c.follower_id == follower_id && c.created_at >= since)
            .map(|c| c.amount)
            .sum())
    }

    async fn open_notional(&self, follower_id: Uuid) -> anyhow::Result<Decimal> {
        let inner = self.inner.lock().await;
        Ok(inner
            .copy_trades
            .iter()
            .filter(|c| c.follower_id == follower_id && c.is_open())
            .map(|c| c.notional())
            .sum())
    }

    async fn list_copy_trades(&self, follower_id: Uuid) -> anyhow::Result<Vec<CopyTrade>> {
        let inner = self.inner.lock().await;
        let mut trades: Vec<CopyTrade> = inner
            .copy_trades
            .iter()
            .filter(|c| c.follower_id == follower_id)
            .cloned()
            .collect();
        trades.sort_by_key(|c| c.created_at);
        Ok(trades)
    }

    async fn list_copy_trade_views(&self, follower_id: Uuid) -> anyhow::Result<Vec<CopyTradeView>> {
        let inner = self.inner.lock().await;
        let mut views: Vec<CopyTradeView> = inner
            .copy_trades
            .iter()
            .filter(|c| c.follower_id == follower_id)
            .map(|c| {
                let signal = inner.signals.iter().find(|s| s.id == c.signal_id);
                CopyTradeView {
                    copy_trade: c.clone(),
                    trader_name: inner.trader_name(c.trader_id),
                    symbol: signal.map(|s| s.symbol.clone()).unwrap_or_default(),
                    side: signal.map(|s| s.side.clone()).unwrap_or_default(),
                }
            })
            .collect();
        views.sort_by(|a, b| b.copy_trade.created_at.cmp(&a.copy_trade.created_at));
        Ok(views)
    }

    async fn close_copy_trade(
        &self,
        copy_trade_id: Uuid,
        pnl: Decimal,
        at: DateTime<Utc>,
    ) -> anyhow::Result<Option<CopyTrade>> {
        let mut inner = self.inner.lock().await;
        let Some(trade) = inner
            .copy_trades
            .iter_mut()
            .find(|c| c.id == copy_trade_id && c.is_open())
        else {
            return Ok(None);
        };
        trade.status = trade_status::CLOSED.to_string();
        trade.pnl = Some(pnl);
        trade.updated_at = at;
        Ok(Some(trade.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_copy(follower_id: Uuid, signal_id: Uuid, at: DateTime<Utc>) -> NewCopyTrade {
        NewCopyTrade {
            follower_id,
            signal_id,
            trader_id: Uuid::new_v4(),
            amount: Decimal::from(2),
            executed_price: Decimal::from(100),
            created_at: at,
        }
    }

    #[tokio::test]
    async fn test_unique_copies_reports_duplicate_key() {
        let store = MemoryStore::new();
        store.enforce_unique_copies().await;
        let (follower, signal) = (Uuid::new_v4(), Uuid::new_v4());

        store.insert_copy_trade(new_copy(follower, signal, Utc::now())).await.unwrap();
        let err = store
            .insert_copy_trade(new_copy(follower, signal, Utc::now()))
            .await
            .unwrap_err();

        assert!(err.downcast_ref::<DuplicateKey>().is_some());
        assert_eq!(store.copy_trade_count().await, 1);
    }

    #[tokio::test]
    async fn test_close_only_transitions_open_trades() {
        let store = MemoryStore::new();
        let follower = Uuid::new_v4();
        let trade = store
            .insert_copy_trade(new_copy(follower, Uuid::new_v4(), Utc::now()))
            .await
            .unwrap();

        let closed = store
            .close_copy_trade(trade.id, Decimal::from(5), Utc::now())
            .await
            .unwrap()
            .expect("open trade should close");
        assert!(closed.is_closed());
        assert_eq!(closed.pnl, Some(Decimal::from(5)));

        let again = store
            .close_copy_trade(trade.id, Decimal::from(7), Utc::now())
            .await
            .unwrap();
        assert!(again.is_none());
        assert_eq!(store.count_open_copy_trades(follower).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_volume_and_notional_aggregates() {
        let store = MemoryStore::new();
        let follower = Uuid::new_v4();
        let now = Utc::now();

        store
            .insert_copy_trade(new_copy(follower, Uuid::new_v4(), now - Duration::days(2)))
            .await
            .unwrap();
        store
            .insert_copy_trade(new_copy(follower, Uuid::new_v4(), now))
            .await
            .unwrap();

        let since = now - Duration::hours(1);
        assert_eq!(store.copied_volume_since(follower, since).await.unwrap(), Decimal::from(2));
        assert_eq!(store.open_notional(follower).await.unwrap(), Decimal::from(400));
    }
}
