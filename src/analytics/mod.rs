pub mod follower;

pub use follower::{follower_analytics, summarize_follow, TraderPerformance};
