pub mod analytics;
pub mod api;
pub mod clock;
pub mod config;
pub mod db;
pub mod errors;
pub mod execution;
pub mod metrics;
pub mod models;
pub mod services;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::clock::Clock;
use crate::config::AppConfig;
use crate::db::Store;
use crate::execution::{CopyEngineConfig, RateLimit};
use crate::models::Signal;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    /// Set when running against Postgres; the health check pings it.
    pub db: Option<sqlx::PgPool>,
    pub clock: Arc<dyn Clock>,
    pub config: AppConfig,
    /// Feeds accepted signals to the auto-copy dispatcher.
    pub signal_tx: Option<mpsc::Sender<Signal>>,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
    pub pause_flag: Arc<AtomicBool>,
}

impl AppState {
    pub fn rate_limit(&self) -> RateLimit {
        RateLimit {
            max_signals: self.config.signal_rate_limit,
            window: chrono::Duration::seconds(self.config.signal_rate_window_secs),
        }
    }

    pub fn engine_config(&self) -> CopyEngineConfig {
        CopyEngineConfig {
            unique_per_signal: self.config.unique_copy_per_signal,
        }
    }
}
