//! Role complexion scoring.
//!
//! A scorer rates one player in one match on four roles. Aggregations never
//! fail because of a single match: a scorer error becomes
//! `ComplexionOutcome::Skipped` and the match is left out of the average.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use super::{clamp_score, percentage, ratio};
use crate::models::{MatchId, PlayerComplexion, PlayerMatchSummary, SteamId};
use crate::storage::{EventStore, StorageError};

/// Errors from a complexion scorer.
#[derive(Debug, Error)]
pub enum ComplexionError {
    #[error("Match not found: {0}")]
    MissingMatch(MatchId),

    #[error("No summary for player {steam_id} in match {match_id}")]
    MissingSummary { steam_id: SteamId, match_id: MatchId },

    #[error("Match {0} has no rounds")]
    NoRounds(MatchId),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result of scoring one (player, match) pair.
#[derive(Debug, Clone, PartialEq)]
pub enum ComplexionOutcome {
    Scored(PlayerComplexion),
    Skipped { match_id: MatchId, reason: String },
}

impl ComplexionOutcome {
    pub fn scored(&self) -> Option<PlayerComplexion> {
        match self {
            ComplexionOutcome::Scored(c) => Some(*c),
            ComplexionOutcome::Skipped { .. } => None,
        }
    }
}

/// Rates a player's role fit in a match.
#[async_trait]
pub trait ComplexionScorer: Send + Sync {
    async fn score(
        &self,
        steam_id: &SteamId,
        match_id: &MatchId,
    ) -> Result<PlayerComplexion, ComplexionError>;
}

/// Score a match, converting any scorer failure into a skip.
pub async fn score_or_skip(
    scorer: &dyn ComplexionScorer,
    steam_id: &SteamId,
    match_id: &MatchId,
) -> ComplexionOutcome {
    match scorer.score(steam_id, match_id).await {
        Ok(complexion) => ComplexionOutcome::Scored(complexion),
        Err(e) => {
            debug!("Skipping complexion for {} in {}: {}", steam_id, match_id, e);
            ComplexionOutcome::Skipped {
                match_id: match_id.clone(),
                reason: e.to_string(),
            }
        }
    }
}

/// Scores roles from the player's match summary.
pub struct SummaryComplexionScorer {
    events: Arc<dyn EventStore>,
}

impl SummaryComplexionScorer {
    pub fn new(events: Arc<dyn EventStore>) -> Self {
        Self { events }
    }
}

#[async_trait]
impl ComplexionScorer for SummaryComplexionScorer {
    async fn score(
        &self,
        steam_id: &SteamId,
        match_id: &MatchId,
    ) -> Result<PlayerComplexion, ComplexionError> {
        let ids = [match_id.clone()];
        let game = self
            .events
            .matches_by_ids(&ids)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ComplexionError::MissingMatch(match_id.clone()))?;

        let summary = self
            .events
            .player_summaries(steam_id, &ids)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ComplexionError::MissingSummary {
                steam_id: steam_id.clone(),
                match_id: match_id.clone(),
            })?;

        complexion_from_summary(&summary, game.total_rounds)
            .ok_or_else(|| ComplexionError::NoRounds(match_id.clone()))
    }
}

/// Scale a per-round rate against the rate that earns a full score.
fn per_round_score(count: u32, rounds: f64, full_at: f64) -> f64 {
    clamp_score(ratio(count as f64, rounds) / full_at * 100.0)
}

/// Weighted role scores from one match summary. None for a zero-round match.
pub fn complexion_from_summary(
    summary: &PlayerMatchSummary,
    total_rounds: u32,
) -> Option<PlayerComplexion> {
    if total_rounds == 0 {
        return None;
    }
    let rounds = total_rounds as f64;

    let duels = summary.first_kills + summary.first_deaths;
    let opener = if duels == 0 {
        0.0
    } else {
        0.6 * per_round_score(summary.first_kills, rounds, 0.15)
            + 0.4 * percentage(summary.first_kills, duels)
    };

    let clutch = summary.clutches.total();
    let closer = 0.4 * per_round_score(clutch.attempted, rounds, 0.10)
        + 0.3 * percentage(clutch.won, clutch.attempted)
        + 0.3 * per_round_score(summary.rounds_survived, rounds, 0.50);

    let support = 0.35 * per_round_score(summary.flash_assists, rounds, 0.10)
        + 0.25 * per_round_score(summary.enemies_flashed, rounds, 0.80)
        + 0.20 * per_round_score(summary.utility_damage, rounds, 15.0)
        + 0.20 * per_round_score(summary.trade_kills, rounds, 0.10);

    let fragger = 0.4 * per_round_score(summary.kills, rounds, 1.0)
        + 0.3 * per_round_score(summary.damage, rounds, 100.0)
        + 0.3 * per_round_score(summary.multi_kill_rounds, rounds, 0.25);

    Some(PlayerComplexion {
        opener: clamp_score(opener),
        closer: clamp_score(closer),
        support: clamp_score(support),
        fragger: clamp_score(fragger),
    })
}
