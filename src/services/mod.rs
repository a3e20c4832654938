pub mod copy_trades;
pub mod follows;
pub mod risk_settings;
pub mod signals;
