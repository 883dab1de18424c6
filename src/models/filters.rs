//! Statistics filters.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{short_hash, GameMatch, GameType};

/// Number of matches in each comparison window when not specified.
pub const DEFAULT_PAST_MATCH_COUNT: usize = 10;

/// Filters applied to a player's match history. All set fields must match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsFilters {
    /// Inclusive lower bound on the match date
    #[serde(default)]
    pub date_from: Option<NaiveDate>,

    /// Inclusive upper bound on the match date
    #[serde(default)]
    pub date_to: Option<NaiveDate>,

    #[serde(default)]
    pub game_type: Option<GameType>,

    /// Exact map name
    #[serde(default)]
    pub map: Option<String>,

    /// Matches per comparison window
    #[serde(default = "default_past_match_count")]
    pub past_match_count: usize,
}

fn default_past_match_count() -> usize {
    DEFAULT_PAST_MATCH_COUNT
}

impl Default for StatsFilters {
    fn default() -> Self {
        Self {
            date_from: None,
            date_to: None,
            game_type: None,
            map: None,
            past_match_count: DEFAULT_PAST_MATCH_COUNT,
        }
    }
}

impl StatsFilters {
    pub fn with_map(mut self, map: impl Into<String>) -> Self {
        self.map = Some(map.into());
        self
    }

    pub fn with_game_type(mut self, game_type: GameType) -> Self {
        self.game_type = Some(game_type);
        self
    }

    pub fn with_dates(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    pub fn with_past_match_count(mut self, count: usize) -> Self {
        self.past_match_count = count;
        self
    }

    /// Window size, with 0 treated as the default.
    pub fn window_size(&self) -> usize {
        if self.past_match_count == 0 {
            DEFAULT_PAST_MATCH_COUNT
        } else {
            self.past_match_count
        }
    }

    /// Whether a match satisfies every set filter.
    pub fn matches(&self, game: &GameMatch) -> bool {
        let date = game.created_at.date_naive();
        if let Some(from) = self.date_from {
            if date < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if date > to {
                return false;
            }
        }
        if let Some(game_type) = self.game_type {
            if game.game_type != game_type {
                return false;
            }
        }
        if let Some(map) = &self.map {
            if &game.map != map {
                return false;
            }
        }
        true
    }

    /// Stable hash of the filter values, used in cache keys.
    pub fn cache_hash(&self) -> String {
        let date_from = self.date_from.map(|d| d.to_string()).unwrap_or_default();
        let date_to = self.date_to.map(|d| d.to_string()).unwrap_or_default();
        let game_type = self.game_type.map(|g| g.to_string()).unwrap_or_default();
        let map = self.map.clone().unwrap_or_default();
        let count = self.window_size().to_string();
        short_hash(&[&date_from, &date_to, &game_type, &map, &count])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn game(map: &str, game_type: GameType, y: i32, m: u32, d: u32) -> GameMatch {
        GameMatch {
            id: "m".into(),
            map: map.to_string(),
            game_type,
            created_at: Utc.with_ymd_and_hms(y, m, d, 23, 59, 0).unwrap(),
            winning_team: None,
            total_rounds: 24,
        }
    }

    #[test]
    fn test_default_matches_everything() {
        let filters = StatsFilters::default();
        assert!(filters.matches(&game("de_inferno", GameType::Casual, 2026, 1, 1)));
        assert_eq!(filters.window_size(), 10);
    }

    #[test]
    fn test_date_bounds_are_inclusive() {
        let filters = StatsFilters::default().with_dates(
            NaiveDate::from_ymd_opt(2026, 3, 1),
            NaiveDate::from_ymd_opt(2026, 3, 31),
        );
        assert!(filters.matches(&game("de_mirage", GameType::Premier, 2026, 3, 1)));
        assert!(filters.matches(&game("de_mirage", GameType::Premier, 2026, 3, 31)));
        assert!(!filters.matches(&game("de_mirage", GameType::Premier, 2026, 4, 1)));
        assert!(!filters.matches(&game("de_mirage", GameType::Premier, 2026, 2, 28)));
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let filters = StatsFilters::default()
            .with_map("de_nuke")
            .with_game_type(GameType::Premier);
        assert!(filters.matches(&game("de_nuke", GameType::Premier, 2026, 1, 1)));
        assert!(!filters.matches(&game("de_nuke", GameType::Wingman, 2026, 1, 1)));
        assert!(!filters.matches(&game("de_anubis", GameType::Premier, 2026, 1, 1)));
    }

    #[test]
    fn test_map_is_exact_match() {
        let filters = StatsFilters::default().with_map("de_nuke");
        assert!(!filters.matches(&game("DE_NUKE", GameType::Premier, 2026, 1, 1)));
    }

    #[test]
    fn test_zero_window_uses_default() {
        let filters = StatsFilters::default().with_past_match_count(0);
        assert_eq!(filters.window_size(), DEFAULT_PAST_MATCH_COUNT);
        assert_eq!(filters.cache_hash(), StatsFilters::default().cache_hash());
    }

    #[test]
    fn test_cache_hash_stable_and_distinct() {
        let a = StatsFilters::default().with_map("de_nuke");
        let b = StatsFilters::default().with_map("de_nuke");
        let c = StatsFilters::default().with_map("de_dust2");
        assert_eq!(a.cache_hash(), b.cache_hash());
        assert_ne!(a.cache_hash(), c.cache_hash());
        assert_eq!(a.cache_hash().len(), 16);
    }

    #[test]
    fn test_deserialize_defaults() {
        let filters: StatsFilters = serde_json::from_str(r#"{"map":"de_ancient"}"#).unwrap();
        assert_eq!(filters.map.as_deref(), Some("de_ancient"));
        assert_eq!(filters.past_match_count, DEFAULT_PAST_MATCH_COUNT);
    }
}
