//! Aim aggregation.

use std::collections::BTreeMap;

use super::{clamp_score, mean, percentage, round_to};
use crate::models::{AimEvent, AimStats, WeaponAimStats};

/// Accuracy (percent) that earns a full accuracy score.
pub const ACCURACY_TARGET: f64 = 30.0;

/// Headshot percentage that earns a full headshot score.
pub const HEADSHOT_TARGET: f64 = 50.0;

/// Spray accuracy (percent) that earns a full spray score.
pub const SPRAY_TARGET: f64 = 35.0;

/// Crosshair offset (degrees) at which the placement score reaches 0.
pub const PLACEMENT_CEILING: f64 = 20.0;

const ACCURACY_WEIGHT: f64 = 0.30;
const HEADSHOT_WEIGHT: f64 = 0.25;
const SPRAY_WEIGHT: f64 = 0.20;
const PLACEMENT_WEIGHT: f64 = 0.25;

#[derive(Debug, Default)]
struct Counters {
    shots_fired: u32,
    shots_hit: u32,
    head_hits: u32,
    total_body_hits: u32,
    spraying_shots_fired: u32,
    spraying_shots_hit: u32,
}

impl Counters {
    fn add(&mut self, event: &AimEvent) {
        self.shots_fired = self.shots_fired.saturating_add(event.shots_fired);
        self.shots_hit = self.shots_hit.saturating_add(event.shots_hit);
        self.head_hits = self.head_hits.saturating_add(event.head_hits);
        self.total_body_hits = self.total_body_hits.saturating_add(event.total_body_hits);
        self.spraying_shots_fired = self
            .spraying_shots_fired
            .saturating_add(event.spraying_shots_fired);
        self.spraying_shots_hit = self
            .spraying_shots_hit
            .saturating_add(event.spraying_shots_hit);
    }

    fn accuracy(&self) -> f64 {
        percentage(self.shots_hit, self.shots_fired)
    }

    fn headshot_percentage(&self) -> f64 {
        percentage(self.head_hits, self.total_body_hits)
    }

    fn spray_accuracy(&self) -> f64 {
        percentage(self.spraying_shots_hit, self.spraying_shots_fired)
    }
}

/// Euclidean norm of the independently averaged x/y crosshair offsets.
pub fn crosshair_placement(events: &[AimEvent]) -> f64 {
    if events.is_empty() {
        return 0.0;
    }
    let xs: Vec<f64> = events.iter().map(|e| e.crosshair_x).collect();
    let ys: Vec<f64> = events.iter().map(|e| e.crosshair_y).collect();
    let avg_x = mean(&xs);
    let avg_y = mean(&ys);
    (avg_x * avg_x + avg_y * avg_y).sqrt()
}

/// Composite 0-100 aim rating.
///
/// When no spraying shots were recorded the spray component is left out
/// and the remaining weights are rescaled.
pub fn aim_rating(
    accuracy: f64,
    headshot_percentage: f64,
    spray_accuracy: Option<f64>,
    placement: f64,
) -> f64 {
    let accuracy_score = clamp_score(accuracy / ACCURACY_TARGET * 100.0);
    let headshot_score = clamp_score(headshot_percentage / HEADSHOT_TARGET * 100.0);
    let placement_score = clamp_score(100.0 - placement / PLACEMENT_CEILING * 100.0);

    let mut weighted = accuracy_score * ACCURACY_WEIGHT
        + headshot_score * HEADSHOT_WEIGHT
        + placement_score * PLACEMENT_WEIGHT;
    let mut total_weight = ACCURACY_WEIGHT + HEADSHOT_WEIGHT + PLACEMENT_WEIGHT;

    if let Some(spray) = spray_accuracy {
        weighted += clamp_score(spray / SPRAY_TARGET * 100.0) * SPRAY_WEIGHT;
        total_weight += SPRAY_WEIGHT;
    }

    clamp_score(weighted / total_weight)
}

/// Unrounded aim metrics, the inputs to both `AimStats` and its trends.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawAim {
    pub aim_rating: f64,
    pub accuracy: f64,
    pub headshot_percentage: f64,
    pub spray_accuracy: f64,
    pub crosshair_placement: f64,
    pub average_time_to_damage: f64,
}

impl RawAim {
    pub fn from_events(events: &[AimEvent]) -> Self {
        if events.is_empty() {
            return Self::default();
        }
        let mut counters = Counters::default();
        events.iter().for_each(|e| counters.add(e));

        let placement = crosshair_placement(events);
        let spray = (counters.spraying_shots_fired > 0).then(|| counters.spray_accuracy());
        let ttd: Vec<f64> = events.iter().filter_map(|e| e.time_to_damage_ms).collect();

        Self {
            aim_rating: aim_rating(
                counters.accuracy(),
                counters.headshot_percentage(),
                spray,
                placement,
            ),
            accuracy: counters.accuracy(),
            headshot_percentage: counters.headshot_percentage(),
            spray_accuracy: counters.spray_accuracy(),
            crosshair_placement: placement,
            average_time_to_damage: mean(&ttd),
        }
    }
}

/// Unrounded aim rating for a set of events, None when there are none.
pub fn raw_aim_rating(events: &[AimEvent]) -> Option<f64> {
    (!events.is_empty()).then(|| RawAim::from_events(events).aim_rating)
}

/// Reduce a player's aim events into an `AimStats` block.
pub fn aggregate_aim(events: &[AimEvent]) -> AimStats {
    if events.is_empty() {
        return AimStats::default();
    }
    let raw = RawAim::from_events(events);

    let mut counters = Counters::default();
    let mut by_weapon: BTreeMap<&str, Counters> = BTreeMap::new();
    for event in events {
        counters.add(event);
        by_weapon.entry(&event.weapon).or_default().add(event);
    }

    let mut weapon_breakdown: Vec<WeaponAimStats> = by_weapon
        .into_iter()
        .map(|(weapon, c)| WeaponAimStats {
            weapon: weapon.to_string(),
            shots_fired: c.shots_fired,
            shots_hit: c.shots_hit,
            accuracy: round_to(c.accuracy(), 1),
            headshot_percentage: round_to(c.headshot_percentage(), 1),
        })
        .collect();
    // BTreeMap order gives the name tiebreak; the sort is stable.
    weapon_breakdown.sort_by(|a, b| b.shots_fired.cmp(&a.shots_fired));

    AimStats {
        aim_rating: round_to(raw.aim_rating, 1),
        accuracy: round_to(raw.accuracy, 1),
        headshot_percentage: round_to(raw.headshot_percentage, 1),
        spray_accuracy: round_to(raw.spray_accuracy, 1),
        crosshair_placement: round_to(raw.crosshair_placement, 1),
        average_time_to_damage: round_to(raw.average_time_to_damage, 0),
        shots_fired: counters.shots_fired,
        shots_hit: counters.shots_hit,
        rounds_analysed: events.len() as u32,
        weapon_breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::aim_event;

    #[test]
    fn test_accuracy_example() {
        let stats = aggregate_aim(&[aim_event("m1", "s1", "ak47", 100, 25)]);
        assert_eq!(stats.accuracy, 25.0);
        assert_eq!(stats.shots_fired, 100);
        assert_eq!(stats.shots_hit, 25);
    }

    #[test]
    fn test_zero_shots_guards() {
        let mut event = aim_event("m1", "s1", "ak47", 0, 0);
        event.total_body_hits = 0;
        let stats = aggregate_aim(&[event]);
        assert_eq!(stats.accuracy, 0.0);
        assert_eq!(stats.headshot_percentage, 0.0);
        assert_eq!(stats.spray_accuracy, 0.0);
    }

    #[test]
    fn test_empty_is_default() {
        assert_eq!(aggregate_aim(&[]), AimStats::default());
        assert_eq!(raw_aim_rating(&[]), None);
        assert_eq!(RawAim::from_events(&[]), RawAim::default());
    }

    #[test]
    fn test_raw_values_are_unrounded() {
        let events = vec![aim_event("m1", "s1", "ak47", 30, 1)];
        let raw = RawAim::from_events(&events);
        assert!((raw.accuracy - 100.0 / 30.0).abs() < 1e-12);
        assert_eq!(aggregate_aim(&events).accuracy, 3.3);
    }

    #[test]
    fn test_counters_saturate() {
        let events = vec![
            aim_event("m1", "s1", "ak47", u32::MAX, 10),
            aim_event("m2", "s1", "ak47", 5, 5),
        ];
        let stats = aggregate_aim(&events);
        assert_eq!(stats.shots_fired, u32::MAX);
        assert_eq!(stats.shots_hit, 15);
    }

    #[test]
    fn test_headshot_percentage_uses_body_hits() {
        let mut event = aim_event("m1", "s1", "ak47", 100, 40);
        event.head_hits = 9;
        event.total_body_hits = 36;
        let stats = aggregate_aim(&[event]);
        assert_eq!(stats.headshot_percentage, 25.0);
    }

    #[test]
    fn test_crosshair_placement_example() {
        let mut a = aim_event("m1", "s1", "ak47", 10, 2);
        a.crosshair_x = 4.0;
        a.crosshair_y = 10.0;
        let mut b = aim_event("m1", "s1", "ak47", 10, 2);
        b.crosshair_x = 8.0;
        b.crosshair_y = 6.0;

        // avg_x = 6, avg_y = 8
        let stats = aggregate_aim(&[a, b]);
        assert_eq!(stats.crosshair_placement, 10.0);
    }

    #[test]
    fn test_crosshair_averages_before_norm() {
        let mut a = aim_event("m1", "s1", "ak47", 10, 2);
        a.crosshair_x = 5.0;
        a.crosshair_y = 0.0;
        let mut b = aim_event("m1", "s1", "ak47", 10, 2);
        b.crosshair_x = -5.0;
        b.crosshair_y = 0.0;
        assert_eq!(crosshair_placement(&[a, b]), 0.0);
    }

    #[test]
    fn test_perfect_aim_rating() {
        let mut event = aim_event("m1", "s1", "ak47", 100, 30);
        event.head_hits = 15;
        event.total_body_hits = 30;
        event.spraying_shots_fired = 20;
        event.spraying_shots_hit = 7;
        event.crosshair_x = 0.0;
        event.crosshair_y = 0.0;

        let stats = aggregate_aim(&[event]);
        assert_eq!(stats.aim_rating, 100.0);
        assert_eq!(stats.spray_accuracy, 35.0);
    }

    #[test]
    fn test_aim_rating_without_spray_rescales() {
        // 15% accuracy = 50, 25% hs = 50, 10 degrees = 50
        assert!((aim_rating(15.0, 25.0, None, 10.0) - 50.0).abs() < 1e-9);
        // Spray at 0 drags it down when present
        assert!(aim_rating(15.0, 25.0, Some(0.0), 10.0) < 50.0);
    }

    #[test]
    fn test_time_to_damage_mean_ignores_missing() {
        let mut a = aim_event("m1", "s1", "ak47", 10, 2);
        a.time_to_damage_ms = Some(400.0);
        let mut b = aim_event("m1", "s1", "ak47", 10, 2);
        b.time_to_damage_ms = Some(600.0);
        let c = aim_event("m1", "s1", "ak47", 10, 2);

        let stats = aggregate_aim(&[a, b, c]);
        assert_eq!(stats.average_time_to_damage, 500.0);
        assert_eq!(stats.rounds_analysed, 3);
    }

    #[test]
    fn test_weapon_breakdown_sorted_by_shots() {
        let events = vec![
            aim_event("m1", "s1", "awp", 10, 6),
            aim_event("m1", "s1", "ak47", 50, 10),
            aim_event("m2", "s1", "ak47", 30, 10),
            aim_event("m2", "s1", "deagle", 10, 5),
        ];
        let stats = aggregate_aim(&events);

        let weapons: Vec<_> = stats
            .weapon_breakdown
            .iter()
            .map(|w| w.weapon.as_str())
            .collect();
        assert_eq!(weapons, vec!["ak47", "awp", "deagle"]);
        assert_eq!(stats.weapon_breakdown[0].shots_fired, 80);
        assert_eq!(stats.weapon_breakdown[0].accuracy, 25.0);
        assert_eq!(stats.weapon_breakdown[1].accuracy, 60.0);
    }
}
