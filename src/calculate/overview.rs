//! General performance overview and impact rating.

use super::{mean, percentage, ratio, round_to, MatchOutcomes};
use crate::models::{OverviewStats, PlayerMatchSummary};

/// Per-match impact: `2.13 * kills/round + 0.42 * assists/round - 0.41`,
/// floored at 0. None for a zero-round match.
pub fn impact_rating(summary: &PlayerMatchSummary, rounds: u32) -> Option<f64> {
    if rounds == 0 {
        return None;
    }
    let rounds = rounds as f64;
    let kpr = summary.kills as f64 / rounds;
    let apr = summary.assists as f64 / rounds;
    Some((2.13 * kpr + 0.42 * apr - 0.41).max(0.0))
}

/// Unrounded mean impact across matches, None when no match has rounds.
pub fn raw_impact(summaries: &[PlayerMatchSummary], outcomes: &MatchOutcomes) -> Option<f64> {
    let impacts: Vec<f64> = summaries
        .iter()
        .filter_map(|s| impact_rating(s, outcomes.rounds(&s.match_id)))
        .collect();
    (!impacts.is_empty()).then(|| mean(&impacts))
}

fn total(summaries: &[PlayerMatchSummary], field: impl Fn(&PlayerMatchSummary) -> u32) -> u32 {
    summaries
        .iter()
        .fold(0u32, |acc, s| acc.saturating_add(field(s)))
}

/// Unrounded overview metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawOverview {
    pub matches_played: u32,
    pub wins: u32,
    pub win_rate: f64,
    pub kills_per_match: f64,
    pub deaths_per_match: f64,
    pub assists_per_match: f64,
    pub kd_ratio: f64,
    pub adr: f64,
    pub headshot_kill_percentage: f64,
    pub impact_rating: f64,
}

impl RawOverview {
    pub fn from_summaries(summaries: &[PlayerMatchSummary], outcomes: &MatchOutcomes) -> Self {
        if summaries.is_empty() {
            return Self::default();
        }

        let matches = u32::try_from(summaries.len()).unwrap_or(u32::MAX);
        let wins = total(summaries, |s| u32::from(outcomes.won(s)));
        let kills = total(summaries, |s| s.kills);
        let deaths = total(summaries, |s| s.deaths);
        let assists = total(summaries, |s| s.assists);
        let headshot_kills = total(summaries, |s| s.headshot_kills);
        let damage = total(summaries, |s| s.damage);
        let rounds = total(summaries, |s| outcomes.rounds(&s.match_id));

        Self {
            matches_played: matches,
            wins,
            win_rate: percentage(wins, matches),
            kills_per_match: ratio(kills as f64, matches as f64),
            deaths_per_match: ratio(deaths as f64, matches as f64),
            assists_per_match: ratio(assists as f64, matches as f64),
            kd_ratio: ratio(kills as f64, deaths as f64),
            adr: ratio(damage as f64, rounds as f64),
            headshot_kill_percentage: percentage(headshot_kills, kills),
            impact_rating: raw_impact(summaries, outcomes).unwrap_or(0.0),
        }
    }
}

/// Summarise a player's matches.
pub fn aggregate_overview(
    summaries: &[PlayerMatchSummary],
    outcomes: &MatchOutcomes,
) -> OverviewStats {
    let raw = RawOverview::from_summaries(summaries, outcomes);
    OverviewStats {
        matches_played: raw.matches_played,
        wins: raw.wins,
        win_rate: round_to(raw.win_rate, 1),
        kills_per_match: round_to(raw.kills_per_match, 1),
        deaths_per_match: round_to(raw.deaths_per_match, 1),
        assists_per_match: round_to(raw.assists_per_match, 1),
        kd_ratio: round_to(raw.kd_ratio, 2),
        adr: round_to(raw.adr, 1),
        headshot_kill_percentage: round_to(raw.headshot_kill_percentage, 1),
        impact_rating: round_to(raw.impact_rating, 2),
    }
}
