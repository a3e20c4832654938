use rust_decimal::Decimal;
use uuid::Uuid;

use crate::clock::Clock;
use crate::db::Store;
use crate::errors::AppError;
use crate::models::CopyTrade;

/// Attach an externally computed pnl to the follower's open copy trade and close it.
pub async fn close_copy_trade<S: Store + ?Sized>(
    store: &S,
    clock: &dyn Clock,
    follower_id: Uuid,
    copy_trade_id: Uuid,
    pnl: Decimal,
) -> Result<CopyTrade, AppError> {
    let trade = store
        .find_copy_trade(copy_trade_id)
        .await?
        .filter(|t| t.follower_id == follower_id)
        .ok_or_else(|| AppError::NotFound(format!("copy trade {copy_trade_id}")))?;

    if !trade.is_open() {
        return Err(AppError::Validation(format!("copy trade is already {}", trade.status)));
    }

    let closed = store
        .close_copy_trade(copy_trade_id, pnl, clock.now())
        .await?
        .ok_or_else(|| AppError::Validation("copy trade is no longer open".into()))?;

    tracing::info!(copy_trade_id = %copy_trade_id, pnl = %pnl, "Copy trade closed");
    Ok(closed)
}
