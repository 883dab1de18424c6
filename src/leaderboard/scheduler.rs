//! Recalculates every clan leaderboard for the last completed week.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use tokio::time::interval;
use tracing::{error, info, warn};

use super::{LeaderboardCalculator, LeaderboardError};
use crate::models::{LeaderboardKind, LeaderboardPeriod};
use crate::storage::ClanDirectory;

/// Default time between scheduled runs.
pub const DEFAULT_SCHEDULE_INTERVAL: Duration = Duration::from_secs(7 * 24 * 3600);

/// Totals of one scheduled pass.
#[derive(Debug, Clone, Default)]
pub struct ScheduleResult {
    pub period: Option<LeaderboardPeriod>,
    pub runs: usize,
    pub entries_written: usize,
    pub errors: Vec<String>,
    pub duration: Duration,
}

/// Runs the calculator for every (clan, kind).
pub struct LeaderboardScheduler {
    calculator: Arc<LeaderboardCalculator>,
    directory: Arc<dyn ClanDirectory>,
    interval: Duration,
    cancel_token: Arc<RwLock<bool>>,
}

impl LeaderboardScheduler {
    pub fn new(calculator: Arc<LeaderboardCalculator>, directory: Arc<dyn ClanDirectory>) -> Self {
        Self {
            calculator,
            directory,
            interval: DEFAULT_SCHEDULE_INTERVAL,
            cancel_token: Arc::new(RwLock::new(false)),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Stop a running `run_periodic` loop after its current pass.
    pub async fn cancel(&self) {
        *self.cancel_token.write().await = true;
    }

    /// Calculate every leaderboard for the week that ended before `today`.
    ///
    /// A failing (clan, kind) is recorded and the pass continues.
    pub async fn run_once(&self, today: NaiveDate) -> Result<ScheduleResult, LeaderboardError> {
        let period = LeaderboardPeriod::last_completed_week(today);
        let clans = self.directory.clans().await?;
        let start = std::time::Instant::now();

        info!(
            "Calculating leaderboards for {} clans over {}",
            clans.len(),
            period
        );

        let mut result = ScheduleResult {
            period: Some(period),
            ..Default::default()
        };
        for clan in &clans {
            for kind in LeaderboardKind::ALL {
                match self.calculator.calculate(&clan.id, kind, period).await {
                    Ok(run) => {
                        result.runs += 1;
                        result.entries_written += run.entries_written;
                    }
                    Err(e) => {
                        warn!("Leaderboard {} {} failed: {}", clan.id, kind, e);
                        result.errors.push(format!("{} {}: {}", clan.id, kind, e));
                    }
                }
            }
        }
        result.duration = start.elapsed();

        info!(
            "Leaderboard pass completed: {} runs, {} entries, {} errors in {:?}",
            result.runs,
            result.entries_written,
            result.errors.len(),
            result.duration
        );
        Ok(result)
    }

    /// Run passes on the configured interval until cancelled.
    pub async fn run_periodic(self: Arc<Self>) {
        let mut ticker = interval(self.interval);

        info!("Starting leaderboard schedule every {:?}", self.interval);

        loop {
            ticker.tick().await;

            if *self.cancel_token.read().await {
                info!("Leaderboard schedule stopped");
                break;
            }

            if let Err(e) = self.run_once(Utc::now().date_naive()).await {
                error!("Scheduled leaderboard pass failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculate::SummaryComplexionScorer;
    use crate::models::{Clan, GameType};
    use crate::storage::{JsonlLeaderboardStore, LeaderboardStore};
    use crate::testing::{day_date, Fixture};

    fn scheduler(fx: &Fixture) -> (LeaderboardScheduler, Arc<JsonlLeaderboardStore>) {
        let events = Arc::new(fx.store());
        let store = Arc::new(JsonlLeaderboardStore::new(fx.storage.clone()));
        let calculator = Arc::new(LeaderboardCalculator::new(
            events.clone(),
            events.clone(),
            store.clone(),
            Arc::new(SummaryComplexionScorer::new(events.clone())),
        ));
        (LeaderboardScheduler::new(calculator, events), store)
    }

    #[tokio::test]
    async fn test_run_once_covers_every_kind() {
        let fx = Fixture::new();
        fx.add_user("u1", "alice", Some("s1"));
        fx.add_user("u2", "bob", Some("s2"));
        fx.add_clan(&Clan::new("c1", "Clutch Kings").with_member("u1").with_member("u2"));
        fx.add_match_played("m1", "de_nuke", GameType::Premier, 6, "s1");
        fx.add_match_played("m2", "de_nuke", GameType::Premier, 7, "s2");
        let (scheduler, store) = scheduler(&fx);

        // Day 14 is 2026-10-14; the last completed week is 10-05..10-11.
        let result = scheduler.run_once(day_date(14)).await.unwrap();

        let period = LeaderboardPeriod::week_containing(day_date(5));
        assert_eq!(result.period, Some(period));
        assert_eq!(result.runs, LeaderboardKind::ALL.len());
        assert!(result.errors.is_empty());

        let impact = store
            .query(&"c1".into(), LeaderboardKind::Impact, period)
            .await
            .unwrap();
        assert_eq!(impact.len(), 2);
        // No aim events and no clutch attempts in the fixture.
        let aim = store
            .query(&"c1".into(), LeaderboardKind::Aim, period)
            .await
            .unwrap();
        assert!(aim.is_empty());
    }

    #[tokio::test]
    async fn test_run_once_without_clans() {
        let fx = Fixture::new();
        let (scheduler, _) = scheduler(&fx);
        let result = scheduler.run_once(day_date(14)).await.unwrap();
        assert_eq!(result.runs, 0);
        assert_eq!(result.entries_written, 0);
    }

    #[tokio::test]
    async fn test_cancelled_periodic_run_stops() {
        let fx = Fixture::new();
        let (scheduler, _) = scheduler(&fx);
        let scheduler = Arc::new(scheduler.with_interval(Duration::from_millis(10)));
        scheduler.cancel().await;

        // The first tick fires immediately and sees the cancel flag.
        tokio::time::timeout(Duration::from_secs(1), scheduler.clone().run_periodic())
            .await
            .unwrap();
    }
}
