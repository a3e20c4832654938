use rust_decimal::Decimal;
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub store: StoreBackend,
    pub host: String,
    pub port: u16,

    // Identity: HS256 secret shared with the session service that issues tokens
    pub jwt_secret: String,

    // Publication gate
    pub signal_rate_limit: i64,
    pub signal_rate_window_secs: i64,

    // Copy engine
    pub default_copy_multiplier: Decimal,
    pub auto_copy_enabled: bool,
    pub unique_copy_per_signal: bool,

    pub log_json: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let store = match env::var("STORE").unwrap_or_default().to_lowercase().as_str() {
            "memory" => StoreBackend::Memory,
            _ => StoreBackend::Postgres,
        };

        let database_url = env::var("DATABASE_URL").ok();
        if store == StoreBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set");
        }

        Ok(Self {
            database_url,
            store,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,

            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?,

            signal_rate_limit: env::var("SIGNAL_RATE_LIMIT")
                .unwrap_or_else(|_| "10".into())
                .parse()
                .unwrap_or(10),
            signal_rate_window_secs: env::var("SIGNAL_RATE_WINDOW_SECS")
                .unwrap_or_else(|_| "60".into())
                .parse()
                .unwrap_or(60),

            default_copy_multiplier: env::var("DEFAULT_COPY_MULTIPLIER")
                .unwrap_or_else(|_| "1".into())
                .parse()
                .unwrap_or(Decimal::ONE),
            auto_copy_enabled: env::var("AUTO_COPY_ENABLED")
                .unwrap_or_else(|_| "true".into())
                .parse()
                .unwrap_or(true),
            unique_copy_per_signal: env::var("UNIQUE_COPY_PER_SIGNAL")
                .unwrap_or_else(|_| "false".into())
                .parse()
                .unwrap_or(false),

            log_json: env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        })
    }

    /// Config suitable for tests and local runs against the in-memory store.
    pub fn for_memory_store(jwt_secret: impl Into<String>) -> Self {
        Self {
            database_url: None,
            store: StoreBackend::Memory,
            host: "127.0.0.1".into(),
            port: 0,
            jwt_secret: jwt_secret.into(),
            signal_rate_limit: 10,
            signal_rate_window_secs: 60,
            default_copy_multiplier: Decimal::ONE,
            auto_copy_enabled: true,
            unique_copy_per_signal: false,
            log_json: false,
        }
    }
}
