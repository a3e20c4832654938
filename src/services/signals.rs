use uuid::Uuid;

use crate::clock::Clock;
use crate::db::Store;
use crate::errors::AppError;
use crate::models::{trade_status, Signal};

/// Move the trader's own open signal to `closed` or `cancelled`.
pub async fn finish_signal<S: Store + ?Sized>(
    store: &S,
    clock: &dyn Clock,
    trader_id: Uuid,
    signal_id: Uuid,
    status: &'static str,
) -> Result<Signal, AppError> {
    debug_assert!(trade_status::is_terminal(status));

    let signal = store
        .find_signal(signal_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("signal {signal_id}")))?;

    if signal.trader_id != trader_id {
        return Err(AppError::Unauthorized("Only the publishing trader can change a signal".into()));
    }
    if !signal.is_open() {
        return Err(AppError::InvalidSignal(format!("signal is already {}", signal.status)));
    }

    // The conditional update loses if another request finished it first
    let finished = store
        .finish_signal(signal_id, status, clock.now())
        .await?
        .ok_or_else(|| AppError::InvalidSignal("signal is no longer open".into()))?;

    tracing::info!(signal_id = %signal_id, status, "Signal finished");
    Ok(finished)
}
