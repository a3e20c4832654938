pub mod auto_copy;
pub mod copy_engine;
pub mod position_sizer;
pub mod publication_gate;
pub mod risk_manager;

pub use copy_engine::{copy_signal, CopyEngineConfig, CopyOverrides, CopyRequest};
pub use publication_gate::{publish_signal, reject_malformed, PublishRequest, RateLimit};

/// How a copy was triggered. A manual copy is the follower's own
/// confirmation; auto copies are subject to the follower's auto-copy switches
/// and the drawdown halt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyMode {
    Manual,
    Auto,
}

impl CopyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CopyMode::Manual => "manual",
            CopyMode::Auto => "auto",
        }
    }
}
