use std::sync::Arc;

use crate::leaderboard::LeaderboardCalculator;
use crate::stats::StatsService;

#[derive(Clone)]
pub struct AppState {
    pub stats: Arc<StatsService>,
    pub leaderboards: Arc<LeaderboardCalculator>,
    /// Window size for requests that do not set `past_match_count`
    pub default_past_match_count: usize,
}
