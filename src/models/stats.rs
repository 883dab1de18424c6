//! Aggregated statistics payloads.

use serde::{Deserialize, Serialize};

use super::PlayerComplexion;

/// Aim summary over a set of aim events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AimStats {
    /// Composite 0-100 rating
    pub aim_rating: f64,

    /// Shots hit / shots fired, percent
    pub accuracy: f64,

    /// Head hits / body hits, percent
    pub headshot_percentage: f64,

    /// Spraying hits / spraying shots, percent
    pub spray_accuracy: f64,

    /// Distance of the mean crosshair offset from the head, degrees
    pub crosshair_placement: f64,

    /// Mean milliseconds to first damage
    pub average_time_to_damage: f64,

    pub shots_fired: u32,
    pub shots_hit: u32,

    /// Rounds contributing aim data
    pub rounds_analysed: u32,

    pub weapon_breakdown: Vec<WeaponAimStats>,
}

/// Aim summary for one weapon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponAimStats {
    pub weapon: String,
    pub shots_fired: u32,
    pub shots_hit: u32,
    pub accuracy: f64,
    pub headshot_percentage: f64,
}

/// Clutch success for one scenario (or all scenarios combined).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClutchRate {
    /// "1v1".."1v5", or "overall"
    pub scenario: String,
    pub attempted: u32,
    pub successful: u32,
    pub rate: f64,
}

/// Clutch summary across a set of matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClutchStats {
    pub scenarios: Vec<ClutchRate>,
    pub overall: ClutchRate,
}

/// Per-map summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapStats {
    pub map: String,
    pub matches: u32,
    pub wins: u32,
    pub win_rate: f64,
    pub average_kills: f64,
    pub average_assists: f64,
    pub average_deaths: f64,
    pub average_adr: f64,
    pub average_opening_kills: f64,
    pub average_opening_deaths: f64,

    /// Mean complexion over matches where it could be computed
    pub complexion: PlayerComplexion,

    /// Matches whose complexion was skipped
    pub complexion_skipped: u32,
}

/// General performance summary over a set of matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverviewStats {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aim_stats_default_is_zeroed() {
        let stats = AimStats::default();
        assert_eq!(stats.aim_rating, 0.0);
        assert!(stats.weapon_breakdown.is_empty());
    }

    #[test]
    fn test_aim_stats_field_names() {
        let json = serde_json::to_value(AimStats::default()).unwrap();
        for field in [
            "aim_rating",
            "headshot_percentage",
            "crosshair_placement",
            "weapon_breakdown",
        ] {
            assert!(json.get(field).is_some(), "missing {}", field);
        }
    }
}
