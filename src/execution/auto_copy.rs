use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use metrics::counter;
use tokio::sync::mpsc;

use crate::clock::Clock;
use crate::db::Store;
use crate::models::Signal;

use super::copy_engine::{self, CopyEngineConfig, CopyOverrides, CopyRequest};
use super::CopyMode;

/// Outcome of fanning one signal out to its auto-copy followers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub candidates: usize,
    pub copied: usize,
    pub rejected: usize,
}

/// Run the auto-copy loop. Receives newly published signals and copies them
/// for every follower with auto-copy on.
pub async fn run_auto_copy(
    mut rx: mpsc::Receiver<Signal>,
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    config: CopyEngineConfig,
    pause_flag: Arc<AtomicBool>,
) {
    tracing::info!(unique_per_signal = config.unique_per_signal, "Auto-copy dispatcher started");

    while let Some(signal) = rx.recv().await {
        if pause_flag.load(Ordering::Relaxed) {
            tracing::info!(
                signal_id = %signal.id,
                trader_id = %signal.trader_id,
                "Auto-copy paused, skipping signal"
            );
            continue;
        }

        match dispatch_signal(store.as_ref(), clock.as_ref(), &config, &signal).await {
            Ok(summary) => tracing::info!(
                signal_id = %signal.id,
                candidates = summary.candidates,
                copied = summary.copied,
                rejected = summary.rejected,
                "Auto-copy dispatch finished"
            ),
            Err(e) => tracing::error!(
                error = %e,
                signal_id = %signal.id,
                "Auto-copy dispatch failed"
            ),
        }
    }

    tracing::warn!("Auto-copy channel closed, shutting down");
}

/// Run the decision engine in auto mode for each auto-copy follower of the
/// signal's trader. Per-follower rejections are counted, not propagated.
pub async fn dispatch_signal<S: Store + ?Sized>(
    store: &S,
    clock: &dyn Clock,
    config: &CopyEngineConfig,
    signal: &Signal,
) -> anyhow::Result<DispatchSummary> {
    let follows = store.list_auto_copy_follows(signal.trader_id).await?;
    let mut summary = DispatchSummary {
        candidates: follows.len(),
        ..Default::default()
    };

    for follow in follows {
        let request = CopyRequest {
            signal_id: signal.id,
            follower_id: follow.follower_id,
            overrides: CopyOverrides::default(),
            mode: CopyMode::Auto,
        };

        match copy_engine::copy_signal(store, clock, config, &request).await {
            Ok(_) => summary.copied += 1,
            Err(e) => {
                tracing::debug!(follower_id = %follow.follower_id, error = %e, "Auto-copy skipped follower");
                summary.rejected += 1;
            }
        }
    }

    counter!("auto_copy_dispatched").increment(1);
    Ok(summary)
}
