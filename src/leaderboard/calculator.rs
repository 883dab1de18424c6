//! Ranks clan members for one (clan, kind, period).

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::LeaderboardError;
use crate::calculate::aim::raw_aim_rating;
use crate::calculate::clutch::raw_clutch_rate;
use crate::calculate::complexion::score_or_skip;
use crate::calculate::overview::raw_impact;
use crate::calculate::{round_to, ComplexionScorer, MatchOutcomes};
use crate::models::{
    ClanId, GameMatch, LeaderboardEntry, LeaderboardKind, LeaderboardPeriod, MatchId,
    PlayerComplexion, PlayerMatchSummary, SteamId, User, UserId,
};
use crate::storage::{ClanDirectory, EventStore, LeaderboardStore, StorageError};

/// Linked members a clan needs before it gets a leaderboard.
pub const DEFAULT_MIN_LINKED_MEMBERS: usize = 2;

/// Phase of a calculation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CalculationPhase {
    #[default]
    Idle,
    Computing,
    Persisted,
}

/// One calculation of one leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationRun {
    pub id: Uuid,
    pub clan_id: ClanId,
    pub kind: LeaderboardKind,
    pub period: LeaderboardPeriod,
    pub phase: CalculationPhase,
    pub entries_written: usize,
    /// Linked members left out because their value could not be computed
    pub excluded_members: Vec<UserId>,
}

impl CalculationRun {
    fn new(clan_id: ClanId, kind: LeaderboardKind, period: LeaderboardPeriod) -> Self {
        Self {
            id: Uuid::new_v4(),
            clan_id,
            kind,
            period,
            phase: CalculationPhase::Idle,
            entries_written: 0,
            excluded_members: Vec::new(),
        }
    }

    fn advance(&mut self, phase: CalculationPhase) {
        debug!("Run {} {:?} -> {:?}", self.id, self.phase, phase);
        self.phase = phase;
    }
}

/// A linked member and their rows in the window.
struct MemberWindow {
    user_id: UserId,
    steam_id: SteamId,
    summaries: Vec<PlayerMatchSummary>,
}

impl MemberWindow {
    fn match_ids(&self) -> Vec<MatchId> {
        self.summaries.iter().map(|s| s.match_id.clone()).collect()
    }
}

/// Leaderboard calculator.
pub struct LeaderboardCalculator {
    events: Arc<dyn EventStore>,
    directory: Arc<dyn ClanDirectory>,
    store: Arc<dyn LeaderboardStore>,
    scorer: Arc<dyn ComplexionScorer>,
    min_linked_members: usize,
}

impl LeaderboardCalculator {
    pub fn new(
        events: Arc<dyn EventStore>,
        directory: Arc<dyn ClanDirectory>,
        store: Arc<dyn LeaderboardStore>,
        scorer: Arc<dyn ComplexionScorer>,
    ) -> Self {
        Self {
            events,
            directory,
            store,
            scorer,
            min_linked_members: DEFAULT_MIN_LINKED_MEMBERS,
        }
    }

    pub fn with_min_linked_members(mut self, min: usize) -> Self {
        self.min_linked_members = min;
        self
    }

    /// Compute and persist one leaderboard.
    ///
    /// A clan with too few linked members or no matches in the period ends
    /// with zero entries written. A member whose value cannot be computed is
    /// excluded from the ranking.
    pub async fn calculate(
        &self,
        clan_id: &ClanId,
        kind: LeaderboardKind,
        period: LeaderboardPeriod,
    ) -> Result<CalculationRun, LeaderboardError> {
        let clan = self
            .directory
            .find_clan(clan_id)
            .await?
            .ok_or_else(|| LeaderboardError::UnknownClan(clan_id.clone()))?;

        let mut run = CalculationRun::new(clan.id.clone(), kind, period);
        run.advance(CalculationPhase::Computing);

        let linked: Vec<User> = self
            .directory
            .clan_members(&clan)
            .await?
            .into_iter()
            .filter(User::is_linked)
            .collect();

        if linked.len() < self.min_linked_members {
            info!(
                "Clan {} has {} linked members, skipping {} leaderboard",
                clan.id,
                linked.len(),
                kind
            );
            run.advance(CalculationPhase::Persisted);
            return Ok(run);
        }

        let window = self.events.matches_between(period.start, period.end).await?;
        let window_ids: Vec<MatchId> = window.iter().map(|m| m.id.clone()).collect();

        let mut members = Vec::with_capacity(linked.len());
        for user in linked {
            let Some(steam_id) = user.steam_id else {
                continue;
            };
            match self.events.player_summaries(&steam_id, &window_ids).await {
                Ok(summaries) => members.push(MemberWindow {
                    user_id: user.id,
                    steam_id,
                    summaries,
                }),
                Err(e) => {
                    warn!("Excluding {} from {} leaderboard: {}", user.id, kind, e);
                    run.excluded_members.push(user.id);
                }
            }
        }

        let clan_matches: BTreeSet<&MatchId> = members
            .iter()
            .flat_map(|m| m.summaries.iter().map(|s| &s.match_id))
            .collect();
        if clan_matches.is_empty() {
            info!("Clan {} has no matches in {}, nothing to rank", clan.id, period);
            run.advance(CalculationPhase::Persisted);
            return Ok(run);
        }
        let clan_games: Vec<GameMatch> = window
            .into_iter()
            .filter(|m| clan_matches.contains(&m.id))
            .collect();
        let outcomes = MatchOutcomes::from_matches(&clan_games);

        let mut ranked: Vec<(UserId, f64)> = Vec::new();
        for member in members {
            match self.member_value(kind, &member, &outcomes).await {
                Ok(Some(value)) => ranked.push((member.user_id, value)),
                Ok(None) => debug!("{} has no {} value in {}", member.user_id, kind, period),
                Err(e) => {
                    warn!("Excluding {} from {} leaderboard: {}", member.user_id, kind, e);
                    run.excluded_members.push(member.user_id);
                }
            }
        }

        // Stable: equal values keep membership order.
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let entries: Vec<LeaderboardEntry> = ranked
            .into_iter()
            .enumerate()
            .map(|(index, (user_id, value))| {
                LeaderboardEntry::new(
                    clan.id.clone(),
                    kind,
                    period,
                    user_id,
                    index as u32 + 1,
                    round_to(value, decimals(kind)),
                    run.id,
                )
            })
            .collect();
        let count = entries.len();
        // The whole ranking lands in one write, so a failure leaves the previous run visible.
        self.store.upsert_many(entries).await?;
        run.entries_written = count;

        run.advance(CalculationPhase::Persisted);
        info!(
            "Leaderboard {} {} {}: {} entries, {} excluded",
            clan.id,
            kind,
            period,
            run.entries_written,
            run.excluded_members.len()
        );
        Ok(run)
    }

    /// The persisted ranking of one leaderboard.
    pub async fn standings(
        &self,
        clan_id: &ClanId,
        kind: LeaderboardKind,
        period: LeaderboardPeriod,
    ) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        if self.directory.find_clan(clan_id).await?.is_none() {
            return Err(LeaderboardError::UnknownClan(clan_id.clone()));
        }
        Ok(self.store.query(clan_id, kind, period).await?)
    }

    /// A member's unrounded value, None when they have nothing to rank on.
    async fn member_value(
        &self,
        kind: LeaderboardKind,
        member: &MemberWindow,
        outcomes: &MatchOutcomes,
    ) -> Result<Option<f64>, StorageError> {
        if member.summaries.is_empty() {
            return Ok(None);
        }

        let value = match kind {
            LeaderboardKind::Aim => {
                let events = self
                    .events
                    .aim_events(&member.steam_id, &member.match_ids())
                    .await?;
                raw_aim_rating(&events)
            }
            LeaderboardKind::Impact => raw_impact(&member.summaries, outcomes),
            LeaderboardKind::Clutch => raw_clutch_rate(&member.summaries),
            LeaderboardKind::Opener
            | LeaderboardKind::Closer
            | LeaderboardKind::Support
            | LeaderboardKind::Fragger => {
                let mut scored = Vec::new();
                for summary in &member.summaries {
                    let outcome =
                        score_or_skip(self.scorer.as_ref(), &member.steam_id, &summary.match_id)
                            .await;
                    scored.extend(outcome.scored());
                }
                match kind.role() {
                    Some(role) if !scored.is_empty() => {
                        Some(PlayerComplexion::mean(&scored).score(role))
                    }
                    _ => None,
                }
            }
        };
        Ok(value)
    }
}

fn decimals(kind: LeaderboardKind) -> u32 {
    match kind {
        LeaderboardKind::Impact => 2,
        _ => 1,
    }
}
