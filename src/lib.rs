//! # Clutch Stats
//!
//! CS2 match statistics aggregation and weekly clan leaderboards.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (matches, summaries, aim events, trends, leaderboards)
//! - **storage**: Filesystem data lake operations (JSONL) and store contracts
//! - **calculate**: Statistics reductions, role complexion and trend comparison
//! - **cache**: TTL cache for computed aggregates
//! - **stats**: Period resolution and cached per-player reports
//! - **leaderboard**: Clan ranking calculator and weekly scheduler
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod cache;
pub mod calculate;
pub mod config;
pub mod leaderboard;
pub mod models;
pub mod stats;
pub mod storage;

#[cfg(test)]
mod testing;

pub use models::*;

use std::time::Duration;

/// Parse a human-friendly duration string (e.g., "7d", "6h", "30m", "90s").
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('d') {
        (n, 86400)
    } else if let Some(n) = s.strip_suffix('h') {
        (n, 3600)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1)
    } else {
        // Default to seconds
        (s, 1)
    };

    let num: u64 = num_str.parse().ok()?;
    Some(Duration::from_secs(num * multiplier))
}
