//! Per-map aggregation.

use std::collections::{BTreeMap, HashMap};

use super::{mean, percentage, ratio, round_to, ComplexionOutcome};
use crate::models::{GameMatch, MapStats, MatchId, PlayerComplexion, PlayerMatchSummary, Team};

#[derive(Debug, Clone)]
struct Outcome {
    map: String,
    winner: Option<Team>,
    rounds: u32,
}

/// Match facts needed to judge a summary: map, winner and round count.
///
/// Built for one aggregation call from the matches it covers, then dropped.
#[derive(Debug, Clone, Default)]
pub struct MatchOutcomes {
    by_match: HashMap<MatchId, Outcome>,
}

impl MatchOutcomes {
    pub fn from_matches(matches: &[GameMatch]) -> Self {
        let by_match = matches
            .iter()
            .map(|m| {
                (
                    m.id.clone(),
                    Outcome {
                        map: m.map.clone(),
                        winner: m.winning_team,
                        rounds: m.total_rounds,
                    },
                )
            })
            .collect();
        Self { by_match }
    }

    /// Whether the summary's team won its match. Draws and unknown matches are not wins.
    pub fn won(&self, summary: &PlayerMatchSummary) -> bool {
        self.by_match
            .get(&summary.match_id)
            .and_then(|o| o.winner)
            .is_some_and(|winner| winner == summary.team)
    }

    pub fn map(&self, match_id: &MatchId) -> Option<&str> {
        self.by_match.get(match_id).map(|o| o.map.as_str())
    }

    pub fn rounds(&self, match_id: &MatchId) -> u32 {
        self.by_match.get(match_id).map(|o| o.rounds).unwrap_or(0)
    }

    /// Average damage per round for one summary.
    pub fn adr(&self, summary: &PlayerMatchSummary) -> f64 {
        ratio(summary.damage as f64, self.rounds(&summary.match_id) as f64)
    }
}

/// Unrounded win rate and ADR for one map.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawMapRates {
    pub win_rate: f64,
    pub average_adr: f64,
}

impl RawMapRates {
    fn from_group(group: &[&PlayerMatchSummary], outcomes: &MatchOutcomes) -> Self {
        let matches = group.len() as u32;
        let wins = group.iter().filter(|s| outcomes.won(s)).count() as u32;
        let adrs: Vec<f64> = group.iter().map(|s| outcomes.adr(s)).collect();
        Self {
            win_rate: percentage(wins, matches),
            average_adr: mean(&adrs),
        }
    }
}

/// Summaries for matches present in `outcomes`, grouped by map name.
fn group_by_map<'a>(
    summaries: &'a [PlayerMatchSummary],
    outcomes: &'a MatchOutcomes,
) -> BTreeMap<&'a str, Vec<&'a PlayerMatchSummary>> {
    let mut groups: BTreeMap<&str, Vec<&PlayerMatchSummary>> = BTreeMap::new();
    for summary in summaries {
        if let Some(map) = outcomes.map(&summary.match_id) {
            groups.entry(map).or_default().push(summary);
        }
    }
    groups
}

/// Unrounded per-map rates keyed by map name.
pub fn raw_map_rates(
    summaries: &[PlayerMatchSummary],
    outcomes: &MatchOutcomes,
) -> BTreeMap<String, RawMapRates> {
    group_by_map(summaries, outcomes)
        .into_iter()
        .map(|(map, group)| (map.to_string(), RawMapRates::from_group(&group, outcomes)))
        .collect()
}

/// Group summaries by map and summarise each group.
///
/// `complexions` holds the scoring outcome per match; matches missing from
/// it or skipped are left out of the complexion average. Summaries for
/// matches not present in `outcomes` are ignored. Maps are ordered by match
/// count, then name.
pub fn aggregate_maps(
    summaries: &[PlayerMatchSummary],
    outcomes: &MatchOutcomes,
    complexions: &HashMap<MatchId, ComplexionOutcome>,
) -> Vec<MapStats> {
    let mut stats: Vec<MapStats> = group_by_map(summaries, outcomes)
        .into_iter()
        .map(|(map, group)| summarise_map(map, &group, outcomes, complexions))
        .collect();
    stats.sort_by(|a, b| b.matches.cmp(&a.matches));
    stats
}

fn summarise_map(
    map: &str,
    group: &[&PlayerMatchSummary],
    outcomes: &MatchOutcomes,
    complexions: &HashMap<MatchId, ComplexionOutcome>,
) -> MapStats {
    let matches = group.len() as u32;
    let wins = group.iter().filter(|s| outcomes.won(s)).count() as u32;
    let rates = RawMapRates::from_group(group, outcomes);

    let per_match = |f: fn(&PlayerMatchSummary) -> u32| -> f64 {
        let values: Vec<f64> = group.iter().map(|s| f(s) as f64).collect();
        mean(&values)
    };

    let scored: Vec<PlayerComplexion> = group
        .iter()
        .filter_map(|s| complexions.get(&s.match_id).and_then(|c| c.scored()))
        .collect();
    let complexion = PlayerComplexion::mean(&scored);

    MapStats {
        map: map.to_string(),
        matches,
        wins,
        win_rate: round_to(rates.win_rate, 1),
        average_kills: round_to(per_match(|s| s.kills), 1),
        average_assists: round_to(per_match(|s| s.assists), 1),
        average_deaths: round_to(per_match(|s| s.deaths), 1),
        average_adr: round_to(rates.average_adr, 1),
        average_opening_kills: round_to(per_match(|s| s.first_kills), 2),
        average_opening_deaths: round_to(per_match(|s| s.first_deaths), 2),
        complexion: PlayerComplexion {
            opener: round_to(complexion.opener, 1),
            closer: round_to(complexion.closer, 1),
            support: round_to(complexion.support, 1),
            fragger: round_to(complexion.fragger, 1),
        },
        complexion_skipped: matches - scored.len() as u32,
    }
}
