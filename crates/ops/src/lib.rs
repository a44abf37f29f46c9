//! Workshop operations entry point: wires the allocation services and replays
//! an inventory/order event feed through them.

pub mod config;
pub mod feed;

pub use config::AppConfig;
pub use feed::{FeedEvent, FeedOutcome, Replay, ReplaySummary};
