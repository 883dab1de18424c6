//! Clutch success rates.

use super::{percentage, round_to};
use crate::models::{ClutchCounts, ClutchRate, ClutchScenario, ClutchStats, PlayerMatchSummary};

fn label(opponents: u8) -> String {
    format!("1v{}", opponents)
}

fn rate(scenario: String, counters: ClutchScenario) -> ClutchRate {
    ClutchRate {
        scenario,
        attempted: counters.attempted,
        successful: counters.won,
        rate: round_to(percentage(counters.won, counters.attempted), 1),
    }
}

/// Sum clutch counters across matches.
pub fn sum_clutches(summaries: &[PlayerMatchSummary]) -> ClutchCounts {
    summaries
        .iter()
        .fold(ClutchCounts::default(), |mut acc, s| {
            acc += s.clutches;
            acc
        })
}

/// Unrounded overall clutch rate, None when nothing was attempted.
pub fn raw_clutch_rate(summaries: &[PlayerMatchSummary]) -> Option<f64> {
    let total = sum_clutches(summaries).total();
    (total.attempted > 0).then(|| percentage(total.won, total.attempted))
}

/// Unrounded clutch rates, labelled as in `ClutchStats`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawClutchRates {
    pub overall: f64,
    pub scenarios: Vec<(String, f64)>,
}

impl RawClutchRates {
    pub fn from_summaries(summaries: &[PlayerMatchSummary]) -> Self {
        let counts = sum_clutches(summaries);
        let total = counts.total();
        Self {
            overall: percentage(total.won, total.attempted),
            scenarios: counts
                .scenarios()
                .iter()
                .map(|(opponents, c)| (label(*opponents), percentage(c.won, c.attempted)))
                .collect(),
        }
    }
}

/// Per-scenario and overall clutch rates.
///
/// The overall rate divides summed wins by summed attempts; it is not the
/// mean of the per-scenario rates.
pub fn aggregate_clutches(summaries: &[PlayerMatchSummary]) -> ClutchStats {
    let counts = sum_clutches(summaries);
    let scenarios = counts
        .scenarios()
        .iter()
        .map(|(opponents, counters)| rate(label(*opponents), *counters))
        .collect();

    ClutchStats {
        scenarios,
        overall: rate("overall".to_string(), counts.total()),
    }
}
