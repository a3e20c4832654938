use chrono::Duration;
use metrics::counter;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::clock::Clock;
use crate::db::Store;
use crate::errors::AppError;
use crate::models::signal::NewSignal;
use crate::models::{Side, SignalView, Trader};

/// Per-trader publish limit over a sliding window ending at "now".
#[derive(Debug, Clone, Copy)]
pub struct RateLimit {
    pub max_signals: i64,
    pub window: Duration,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            max_signals: 10,
            window: Duration::seconds(60),
        }
    }
}

/// Publish request body. Every field is optional at the wire level so a
/// missing field surfaces as a validation error rather than a decode error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub symbol: Option<String>,
    pub side: Option<String>,
    pub price: Option<Decimal>,
    pub size: Option<Decimal>,
    #[serde(alias = "stop_loss")]
    pub stop_loss: Option<Decimal>,
    #[serde(alias = "take_profit")]
    pub take_profit: Option<Decimal>,
}

/// Validated signal fields.
#[derive(Debug, Clone)]
struct SignalFields {
    symbol: String,
    side: Side,
    price: Decimal,
    size: Decimal,
    stop_loss: Option<Decimal>,
    take_profit: Option<Decimal>,
}

impl PublishRequest {
    fn validate(&self) -> Result<SignalFields, AppError> {
        let symbol = self
            .symbol
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Validation("symbol is required".into()))?;

        let side_raw = self
            .side
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::Validation("side is required".into()))?;
        let side = Side::from_api_str(side_raw)
            .ok_or_else(|| AppError::Validation(format!("side must be buy or sell, got {side_raw}")))?;

        let price = positive(self.price, "price")?;
        let size = positive(self.size, "size")?;

        for (name, value) in [("stopLoss", self.stop_loss), ("takeProfit", self.take_profit)] {
            if matches!(value, Some(v) if v <= Decimal::ZERO) {
                return Err(AppError::Validation(format!("{name} must be positive")));
            }
        }

        Ok(SignalFields {
            symbol: symbol.to_uppercase(),
            side,
            price,
            size,
            stop_loss: self.stop_loss,
            take_profit: self.take_profit,
        })
    }
}

fn positive(value: Option<Decimal>, name: &str) -> Result<Decimal, AppError> {
    match value {
        Some(v) if v > Decimal::ZERO => Ok(v),
        Some(_) => Err(AppError::Validation(format!("{name} must be positive"))),
        None => Err(AppError::Validation(format!("{name} is required"))),
    }
}

/// Accept or reject a trader's signal.
///
/// Checks run in order: trader entitlement, field validation, rate limit.
/// Only an accepted request writes anything. The window count and the insert
/// are not isolated from each other, so concurrent publishes from one trader
/// can overshoot the limit slightly.
pub async fn publish_signal<S: Store + ?Sized>(
    store: &S,
    clock: &dyn Clock,
    limit: RateLimit,
    trader_id: Uuid,
    request: &PublishRequest,
) -> Result<SignalView, AppError> {
    let result = try_publish(store, clock, limit, trader_id, request).await;

    match &result {
        Ok(view) => {
            counter!("signals_published").increment(1);
            tracing::info!(
                trader_id = %trader_id,
                signal_id = %view.signal.id,
                symbol = %view.signal.symbol,
                side = %view.signal.side,
                price = %view.signal.price,
                size = %view.signal.size,
                "Signal published"
            );
        }
        Err(e) => {
            counter!("signals_rejected", "kind" => e.kind()).increment(1);
            tracing::warn!(trader_id = %trader_id, error = %e, "Signal rejected");
        }
    }

    result
}

/// Reject a publish whose body could not be decoded.
///
/// Entitlement is still checked first, so a caller who may not publish gets
/// `Unauthorized` no matter what they sent.
pub async fn reject_malformed<S: Store + ?Sized>(store: &S, trader_id: Uuid, detail: String) -> AppError {
    let err = match authorize_publisher(store, trader_id).await {
        Ok(_) => AppError::Validation(format!("invalid request body: {detail}")),
        Err(e) => e,
    };

    counter!("signals_rejected", "kind" => err.kind()).increment(1);
    tracing::warn!(trader_id = %trader_id, error = %err, "Signal rejected");
    err
}

async fn authorize_publisher<S: Store + ?Sized>(store: &S, trader_id: Uuid) -> Result<Trader, AppError> {
    store
        .find_trader(trader_id)
        .await?
        .filter(|t| t.can_publish())
        .ok_or_else(|| AppError::Unauthorized("Only verified expert traders can publish signals".into()))
}

async fn try_publish<S: Store + ?Sized>(
    store: &S,
    clock: &dyn Clock,
    limit: RateLimit,
    trader_id: Uuid,
    request: &PublishRequest,
) -> Result<SignalView, AppError> {
    // 1. Entitlement
    let trader = authorize_publisher(store, trader_id).await?;

    // 2. Required fields
    let fields = request.validate()?;

    // 3. Sliding-window rate limit
    let now = clock.now();
    let recent = store.count_signals_since(trader_id, now - limit.window).await?;
    if recent >= limit.max_signals {
        return Err(AppError::RateLimited {
            limit: limit.max_signals,
            window_secs: limit.window.num_seconds(),
        });
    }

    // 4. Persist
    let signal = store
        .insert_signal(NewSignal {
            trader_id,
            symbol: fields.symbol,
            side: fields.side.to_string(),
            price: fields.price,
            size: fields.size,
            stop_loss: fields.stop_loss,
            take_profit: fields.take_profit,
            created_at: now,
        })
        .await?;

    Ok(SignalView {
        signal,
        trader_name: trader.display_name,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
