//! Player statistics service.
//!
//! Resolves the comparison windows for a user, aggregates both, builds the
//! trend report and caches the result per (namespace, user, filters).

pub mod period;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::cache::{self, StatsCache, DEFAULT_TTL};
use crate::calculate::complexion::score_or_skip;
use crate::calculate::trend::{build_report, MetricPair};
use crate::calculate::{
    aggregate_aim, aggregate_clutches, aggregate_maps, aggregate_overview, build_trend,
    raw_map_rates, ComplexionScorer, MatchOutcomes, RawAim, RawClutchRates, RawOverview,
};
use crate::models::{
    AimEvent, AimStats, ClutchStats, GameMatch, MapStats, MatchId, OverviewStats,
    PlayerMatchSummary, StatsFilters, SteamId, TrendReport, User, UserId,
};
use crate::storage::{ClanDirectory, EventStore, StorageError};

pub use period::{ComparisonWindows, PeriodResolver};

pub const AIM_NAMESPACE: &str = "aim";
pub const OVERVIEW_NAMESPACE: &str = "overview";
pub const CLUTCH_NAMESPACE: &str = "clutch";
pub const MAPS_NAMESPACE: &str = "maps";

const NAMESPACES: [&str; 4] = [
    AIM_NAMESPACE,
    OVERVIEW_NAMESPACE,
    CLUTCH_NAMESPACE,
    MAPS_NAMESPACE,
];

/// Errors surfaced by the statistics service.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Unknown user: {0}")]
    UnknownUser(UserId),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// A statistics block for the current window with trends against the previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsReport<T> {
    pub user_id: UserId,
    pub matches_analysed: usize,
    pub previous_matches_analysed: usize,
    pub stats: T,
    pub trends: TrendReport,
}

pub type AimReport = StatsReport<AimStats>;
pub type OverviewReport = StatsReport<OverviewStats>;
pub type ClutchReport = StatsReport<ClutchStats>;
pub type MapReport = StatsReport<Vec<MapStats>>;

/// Statistics service.
pub struct StatsService {
    events: Arc<dyn EventStore>,
    directory: Arc<dyn ClanDirectory>,
    scorer: Arc<dyn ComplexionScorer>,
    cache: Arc<dyn StatsCache>,
    ttl: Duration,
}

impl StatsService {
    pub fn new(
        events: Arc<dyn EventStore>,
        directory: Arc<dyn ClanDirectory>,
        scorer: Arc<dyn ComplexionScorer>,
        cache: Arc<dyn StatsCache>,
    ) -> Self {
        Self {
            events,
            directory,
            scorer,
            cache,
            ttl: DEFAULT_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Aim statistics with trends.
    pub async fn aim_report(
        &self,
        user_id: &UserId,
        filters: &StatsFilters,
    ) -> Result<AimReport, StatsError> {
        self.cached(AIM_NAMESPACE, user_id, filters, || async move {
            let (user, windows) = self.windows(user_id, filters).await?;
            let current_events = self.aim_events(&user, &windows.current).await?;
            let current = RawAim::from_events(&current_events);
            let previous = RawAim::from_events(&self.aim_events(&user, &windows.previous).await?);

            let trends = build_report(&[
                MetricPair::higher("aim_rating", current.aim_rating, previous.aim_rating),
                MetricPair::higher("accuracy", current.accuracy, previous.accuracy),
                MetricPair::higher(
                    "headshot_percentage",
                    current.headshot_percentage,
                    previous.headshot_percentage,
                ),
                MetricPair::higher(
                    "spray_accuracy",
                    current.spray_accuracy,
                    previous.spray_accuracy,
                ),
                MetricPair::lower(
                    "crosshair_placement",
                    current.crosshair_placement,
                    previous.crosshair_placement,
                ),
                MetricPair::lower(
                    "average_time_to_damage",
                    current.average_time_to_damage,
                    previous.average_time_to_damage,
                )
                .with_decimals(0),
            ]);

            let stats = aggregate_aim(&current_events);
            Ok(report(user_id, &windows, stats, trends))
        })
        .await
    }

    /// Overview statistics with trends.
    pub async fn overview_report(
        &self,
        user_id: &UserId,
        filters: &StatsFilters,
    ) -> Result<OverviewReport, StatsError> {
        self.cached(OVERVIEW_NAMESPACE, user_id, filters, || async move {
            let (user, windows) = self.windows(user_id, filters).await?;
            let current_summaries = self.summaries(&user, &windows.current).await?;
            let current_outcomes = MatchOutcomes::from_matches(&windows.current);
            let current = RawOverview::from_summaries(&current_summaries, &current_outcomes);
            let previous = RawOverview::from_summaries(
                &self.summaries(&user, &windows.previous).await?,
                &MatchOutcomes::from_matches(&windows.previous),
            );

            let trends = build_report(&[
                MetricPair::higher("win_rate", current.win_rate, previous.win_rate),
                MetricPair::higher(
                    "kills_per_match",
                    current.kills_per_match,
                    previous.kills_per_match,
                ),
                MetricPair::lower(
                    "deaths_per_match",
                    current.deaths_per_match,
                    previous.deaths_per_match,
                ),
                MetricPair::higher(
                    "assists_per_match",
                    current.assists_per_match,
                    previous.assists_per_match,
                ),
                MetricPair::higher("kd_ratio", current.kd_ratio, previous.kd_ratio)
                    .with_decimals(2),
                MetricPair::higher("adr", current.adr, previous.adr),
                MetricPair::higher(
                    "headshot_kill_percentage",
                    current.headshot_kill_percentage,
                    previous.headshot_kill_percentage,
                ),
                MetricPair::higher(
                    "impact_rating",
                    current.impact_rating,
                    previous.impact_rating,
                )
                .with_decimals(2),
            ]);

            let stats = aggregate_overview(&current_summaries, &current_outcomes);
            Ok(report(user_id, &windows, stats, trends))
        })
        .await
    }

    /// Clutch rates with trends.
    pub async fn clutch_report(
        &self,
        user_id: &UserId,
        filters: &StatsFilters,
    ) -> Result<ClutchReport, StatsError> {
        self.cached(CLUTCH_NAMESPACE, user_id, filters, || async move {
            let (user, windows) = self.windows(user_id, filters).await?;
            let current_summaries = self.summaries(&user, &windows.current).await?;
            let current = RawClutchRates::from_summaries(&current_summaries);
            let previous =
                RawClutchRates::from_summaries(&self.summaries(&user, &windows.previous).await?);

            let mut trends = TrendReport::new();
            trends.insert(
                "clutch_success_rate",
                build_trend(current.overall, previous.overall, false, 1),
            );
            let scenarios = current.scenarios.iter().zip(&previous.scenarios);
            for ((scenario, now), (_, before)) in scenarios {
                trends.insert(
                    format!("{}_success_rate", scenario),
                    build_trend(*now, *before, false, 1),
                );
            }

            let stats = aggregate_clutches(&current_summaries);
            Ok(report(user_id, &windows, stats, trends))
        })
        .await
    }

    /// Per-map statistics. Trends compare each map's win rate and ADR with
    /// the same map in the previous window.
    pub async fn map_report(
        &self,
        user_id: &UserId,
        filters: &StatsFilters,
    ) -> Result<MapReport, StatsError> {
        self.cached(MAPS_NAMESPACE, user_id, filters, || async move {
            let (user, windows) = self.windows(user_id, filters).await?;

            let current_summaries = self.summaries(&user, &windows.current).await?;
            let mut complexions = HashMap::new();
            if let Some(steam_id) = &user.steam_id {
                for summary in &current_summaries {
                    let outcome =
                        score_or_skip(self.scorer.as_ref(), steam_id, &summary.match_id).await;
                    complexions.insert(summary.match_id.clone(), outcome);
                }
            }
            let current_outcomes = MatchOutcomes::from_matches(&windows.current);
            let current = raw_map_rates(&current_summaries, &current_outcomes);
            let previous = raw_map_rates(
                &self.summaries(&user, &windows.previous).await?,
                &MatchOutcomes::from_matches(&windows.previous),
            );

            let mut trends = TrendReport::new();
            for (map, now) in &current {
                let before = previous.get(map).copied().unwrap_or_default();
                trends.insert(
                    format!("{}.win_rate", map),
                    build_trend(now.win_rate, before.win_rate, false, 1),
                );
                trends.insert(
                    format!("{}.average_adr", map),
                    build_trend(now.average_adr, before.average_adr, false, 1),
                );
            }

            let stats = aggregate_maps(&current_summaries, &current_outcomes, &complexions);
            Ok(report(user_id, &windows, stats, trends))
        })
        .await
    }

    /// Drop every cached aggregate for a user.
    pub async fn invalidate_user(&self, user_id: &UserId) -> usize {
        let mut removed = 0;
        for namespace in NAMESPACES {
            removed += self
                .cache
                .invalidate_prefix(&cache::user_prefix(namespace, user_id))
                .await;
        }
        info!("Invalidated {} cached aggregates for {}", removed, user_id);
        removed
    }

    async fn cached<T, F, Fut>(
        &self,
        namespace: &str,
        user_id: &UserId,
        filters: &StatsFilters,
        compute: F,
    ) -> Result<T, StatsError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, StatsError>>,
    {
        let key = cache::cache_key(namespace, user_id, filters);
        if let Some(hit) = cache::get_typed::<T>(self.cache.as_ref(), &key).await {
            return Ok(hit);
        }

        let value = compute().await?;
        cache::set_typed(self.cache.as_ref(), &key, &value, self.ttl).await;
        debug!("Computed and cached {}", key);
        Ok(value)
    }

    async fn windows(
        &self,
        user_id: &UserId,
        filters: &StatsFilters,
    ) -> Result<(User, ComparisonWindows), StatsError> {
        let user = self
            .directory
            .find_user(user_id)
            .await?
            .ok_or_else(|| StatsError::UnknownUser(user_id.clone()))?;
        let windows = PeriodResolver::new(self.events.as_ref())
            .resolve(&user, filters)
            .await?;
        Ok((user, windows))
    }

    async fn aim_events(
        &self,
        user: &User,
        matches: &[GameMatch],
    ) -> Result<Vec<AimEvent>, StorageError> {
        match linked(user, matches) {
            Some((steam_id, ids)) => self.events.aim_events(steam_id, &ids).await,
            None => Ok(Vec::new()),
        }
    }

    async fn summaries(
        &self,
        user: &User,
        matches: &[GameMatch],
    ) -> Result<Vec<PlayerMatchSummary>, StorageError> {
        match linked(user, matches) {
            Some((steam_id, ids)) => self.events.player_summaries(steam_id, &ids).await,
            None => Ok(Vec::new()),
        }
    }
}

/// Steam id and match ids, or None when there is nothing to query.
fn linked<'u>(user: &'u User, matches: &[GameMatch]) -> Option<(&'u SteamId, Vec<MatchId>)> {
    let steam_id = user.steam_id.as_ref()?;
    if matches.is_empty() {
        return None;
    }
    Some((steam_id, matches.iter().map(|m| m.id.clone()).collect()))
}

fn report<T>(
    user_id: &UserId,
    windows: &ComparisonWindows,
    stats: T,
    trends: TrendReport,
) -> StatsReport<T> {
    StatsReport {
        user_id: user_id.clone(),
        matches_analysed: windows.current.len(),
        previous_matches_analysed: windows.previous.len(),
        stats,
        trends,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::calculate::SummaryComplexionScorer;
    use crate::models::{ClutchScenario, GameType, TrendDirection};
    use crate::testing::{aim_event, game, summary, Fixture};
    use pretty_assertions::assert_eq;

    fn service(fx: &Fixture) -> (StatsService, Arc<MemoryCache>) {
        let store = Arc::new(fx.store());
        let cache = Arc::new(MemoryCache::new());
        let service = StatsService::new(
            store.clone(),
            store.clone(),
            Arc::new(SummaryComplexionScorer::new(store)),
            cache.clone(),
        );
        (service, cache)
    }

    /// Two windows of two matches: previous at 20% accuracy, current at 40%.
    fn seed_aim(fx: &Fixture) {
        fx.add_user("u1", "alice", Some("s1"));
        for (day, hits) in [(1, 20), (2, 20), (3, 40), (4, 40)] {
            let id = format!("m{}", day);
            fx.add_match_played(&id, "de_mirage", GameType::Premier, day, "s1");
            fx.add_aim(&aim_event(&id, "s1", "ak47", 100, hits));
        }
    }

    #[tokio::test]
    async fn test_aim_report_trends() {
        let fx = Fixture::new();
        seed_aim(&fx);
        let (service, _) = service(&fx);
        let filters = StatsFilters::default().with_past_match_count(2);

        let report = service.aim_report(&"u1".into(), &filters).await.unwrap();

        assert_eq!(report.matches_analysed, 2);
        assert_eq!(report.previous_matches_analysed, 2);
        assert_eq!(report.stats.accuracy, 40.0);
        let accuracy = report.trends.get("accuracy").unwrap();
        assert_eq!(accuracy.value, 40.0);
        assert_eq!(accuracy.change, 100.0);
        assert_eq!(accuracy.trend, TrendDirection::Up);
        let placement = report.trends.get("crosshair_placement").unwrap();
        assert_eq!(placement.trend, TrendDirection::Neutral);
    }

    #[tokio::test]
    async fn test_trend_change_uses_unrounded_aggregates() {
        let fx = Fixture::new();
        fx.add_user("u1", "alice", Some("s1"));
        fx.add_match_played("m1", "de_mirage", GameType::Premier, 1, "s1");
        fx.add_aim(&aim_event("m1", "s1", "ak47", 30, 1));
        fx.add_match_played("m2", "de_mirage", GameType::Premier, 2, "s1");
        fx.add_aim(&aim_event("m2", "s1", "ak47", 30, 10));
        let (service, _) = service(&fx);
        let filters = StatsFilters::default().with_past_match_count(1);

        let report = service.aim_report(&"u1".into(), &filters).await.unwrap();

        // 3.3 -> 33.3 would read as 909.1
        assert_eq!(report.stats.accuracy, 33.3);
        let accuracy = report.trends.get("accuracy").unwrap();
        assert_eq!(accuracy.value, 33.3);
        assert_eq!(accuracy.change, 900.0);
        assert_eq!(accuracy.trend, TrendDirection::Up);
    }

    #[tokio::test]
    async fn test_clutch_trend_uses_unrounded_rates() {
        let fx = Fixture::new();
        fx.add_user("u1", "alice", Some("s1"));
        fx.add_match(&game("m1", "de_nuke", GameType::Premier, 1));
        fx.add_match(&game("m2", "de_nuke", GameType::Premier, 2));
        let mut older = summary("m1", "s1");
        older.clutches.v1 = ClutchScenario {
            attempted: 3,
            won: 1,
        };
        let mut newer = summary("m2", "s1");
        newer.clutches.v1 = ClutchScenario {
            attempted: 3,
            won: 2,
        };
        fx.add_summary(&older);
        fx.add_summary(&newer);
        let (service, _) = service(&fx);
        let filters = StatsFilters::default().with_past_match_count(1);

        let report = service.clutch_report(&"u1".into(), &filters).await.unwrap();

        // 33.3 -> 66.7 would read as 100.3
        let trend = report.trends.get("clutch_success_rate").unwrap();
        assert_eq!(trend.value, 66.7);
        assert_eq!(trend.change, 100.0);
        assert_eq!(report.trends.get("1v1_success_rate").unwrap().change, 100.0);
    }

    #[tokio::test]
    async fn test_unknown_user_is_an_error() {
        let fx = Fixture::new();
        let (service, _) = service(&fx);
        let result = service
            .aim_report(&"ghost".into(), &StatsFilters::default())
            .await;
        assert!(matches!(result, Err(StatsError::UnknownUser(_))));
    }

    #[tokio::test]
    async fn test_unlinked_user_gets_zeroed_neutral_report() {
        let fx = Fixture::new();
        fx.add_user("u2", "bob", None);
        fx.add_match_played("m1", "de_mirage", GameType::Premier, 1, "s1");
        let (service, _) = service(&fx);

        let report = service
            .overview_report(&"u2".into(), &StatsFilters::default())
            .await
            .unwrap();
        assert_eq!(report.matches_analysed, 0);
        assert_eq!(report.stats, OverviewStats::default());
        assert!(report
            .trends
            .iter()
            .all(|(_, t)| t.trend == TrendDirection::Neutral && t.change == 0.0));
    }

    #[tokio::test]
    async fn test_results_are_cached_until_invalidated() {
        let fx = Fixture::new();
        seed_aim(&fx);
        let (service, cache) = service(&fx);
        let filters = StatsFilters::default().with_past_match_count(2);
        let user: UserId = "u1".into();

        let first = service.aim_report(&user, &filters).await.unwrap();
        assert_eq!(cache.len().await, 1);

        // A new match is not visible while the cached entry lives.
        fx.add_match_played("m5", "de_mirage", GameType::Premier, 5, "s1");
        fx.add_aim(&aim_event("m5", "s1", "ak47", 100, 90));
        let cached = service.aim_report(&user, &filters).await.unwrap();
        assert_eq!(cached, first);

        assert_eq!(service.invalidate_user(&user).await, 1);
        let fresh = service.aim_report(&user, &filters).await.unwrap();
        assert_eq!(fresh.stats.accuracy, 65.0);
    }

    #[tokio::test]
    async fn test_clutch_report_overall_rate() {
        let fx = Fixture::new();
        fx.add_user("u1", "alice", Some("s1"));
        fx.add_match(&game("m1", "de_nuke", GameType::Premier, 1));
        fx.add_match(&game("m2", "de_nuke", GameType::Premier, 2));
        let mut a = summary("m1", "s1");
        a.clutches.v1 = ClutchScenario {
            attempted: 4,
            won: 2,
        };
        let mut b = summary("m2", "s1");
        b.clutches.v2 = ClutchScenario {
            attempted: 2,
            won: 0,
        };
        fx.add_summary(&a);
        fx.add_summary(&b);
        let (service, _) = service(&fx);

        let report = service
            .clutch_report(&"u1".into(), &StatsFilters::default())
            .await
            .unwrap();
        assert_eq!(report.stats.overall.rate, 33.3);
        let trend = report.trends.get("clutch_success_rate").unwrap();
        assert_eq!(trend.change, 100.0);
        assert_eq!(trend.trend, TrendDirection::Up);
        assert!(report.trends.get("1v1_success_rate").is_some());
    }

    #[tokio::test]
    async fn test_map_report_groups_and_scores_complexion() {
        let fx = Fixture::new();
        fx.add_user("u1", "alice", Some("s1"));
        fx.add_match_played("m1", "de_nuke", GameType::Premier, 1, "s1");
        fx.add_match_played("m2", "de_nuke", GameType::Premier, 2, "s1");
        fx.add_match_played("m3", "de_mirage", GameType::Premier, 3, "s1");
        let (service, _) = service(&fx);

        let report = service
            .map_report(&"u1".into(), &StatsFilters::default())
            .await
            .unwrap();

        assert_eq!(report.stats.len(), 2);
        assert_eq!(report.stats[0].map, "de_nuke");
        assert_eq!(report.stats[0].matches, 2);
        assert_eq!(report.stats[0].complexion_skipped, 0);
        assert!(report.stats[0].complexion.fragger > 0.0);
        let nuke = report.trends.get("de_nuke.win_rate").unwrap();
        assert_eq!(nuke.change, 100.0);
    }
}
