use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use copydesk::api::router::create_router;
use copydesk::clock::{Clock, SystemClock};
use copydesk::config::{AppConfig, StoreBackend};
use copydesk::db::{self, MemoryStore, PgStore, Store};
use copydesk::execution::auto_copy::run_auto_copy;
use copydesk::execution::CopyEngineConfig;
use copydesk::models::Signal;
use copydesk::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    init_tracing(config.log_json);
    let addr = format!("{}:{}", config.host, config.port);

    let (store, pool): (Arc<dyn Store>, Option<sqlx::PgPool>) = match config.store {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;
            tracing::info!("Connecting to database...");
            let pool = db::init_pool(url).await?;
            tracing::info!("Database connected");
            (Arc::new(PgStore::new(pool.clone())), Some(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("STORE=memory, state will not survive a restart");
            (Arc::new(MemoryStore::new()), None)
        }
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let metrics_handle = copydesk::metrics::init_metrics();

    // --- Auto-copy dispatcher ---
    let (signal_tx, signal_rx) = tokio::sync::mpsc::channel::<Signal>(500);
    let pause_flag = Arc::new(AtomicBool::new(!config.auto_copy_enabled));

    let engine_config = CopyEngineConfig {
        unique_per_signal: config.unique_copy_per_signal,
    };
    tokio::spawn(run_auto_copy(
        signal_rx,
        Arc::clone(&store),
        Arc::clone(&clock),
        engine_config,
        Arc::clone(&pause_flag),
    ));

    if config.auto_copy_enabled {
        tracing::info!("Auto-copy dispatcher spawned");
    } else {
        tracing::info!("Auto-copy dispatcher spawned paused (AUTO_COPY_ENABLED=false)");
    }

    let state = AppState {
        store,
        db: pool,
        clock,
        config,
        signal_tx: Some(signal_tx),
        metrics_handle,
        pause_flag,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing(json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let registry = tracing_subscriber::registry().with(EnvFilter::from_default_env());
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
