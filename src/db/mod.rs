pub mod account_repo;
pub mod copy_trade_repo;
pub mod follow_repo;
pub mod memory;
pub mod risk_repo;
pub mod signal_repo;

pub use account_repo::AccountRepository;
pub use copy_trade_repo::CopyTradeRepository;
pub use follow_repo::FollowRepository;
pub use memory::MemoryStore;
pub use risk_repo::RiskSettingRepository;
pub use signal_repo::SignalRepository;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Everything the publication gate and copy engine read or write.
pub trait Store:
    AccountRepository
    + SignalRepository
    + FollowRepository
    + RiskSettingRepository
    + CopyTradeRepository
    + Send
    + Sync
{
}

impl<T> Store for T where
    T: AccountRepository
        + SignalRepository
        + FollowRepository
        + RiskSettingRepository
        + CopyTradeRepository
        + Send
        + Sync
{
}

/// Returned (inside `anyhow::Error`) when an insert hits a unique key.
#[derive(Debug, thiserror::Error)]
#[error("duplicate key: {0}")]
pub struct DuplicateKey(pub String);

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

pub async fn init_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    // Verify connectivity
    sqlx::query("SELECT 1").execute(&pool).await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

pub(crate) fn map_unique_violation(e: sqlx::Error, what: &str) -> anyhow::Error {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => DuplicateKey(what.to_string()).into(),
        _ => e.into(),
    }
}
