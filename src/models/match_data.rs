//! Match facts produced by the demo parser.
//!
//! These rows are immutable: written once per parsed demo and only ever
//! removed together with their match.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MatchId, SteamId};

/// Matchmaking mode of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    Competitive,
    Premier,
    Wingman,
    Casual,
    Deathmatch,
}

impl std::fmt::Display for GameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GameType::Competitive => "competitive",
            GameType::Premier => "premier",
            GameType::Wingman => "wingman",
            GameType::Casual => "casual",
            GameType::Deathmatch => "deathmatch",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for GameType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "competitive" => Ok(GameType::Competitive),
            "premier" => Ok(GameType::Premier),
            "wingman" => Ok(GameType::Wingman),
            "casual" => Ok(GameType::Casual),
            "deathmatch" => Ok(GameType::Deathmatch),
            other => Err(format!("unknown game type: {}", other)),
        }
    }
}

/// Side of the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Ct,
    T,
}

/// A parsed match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMatch {
    pub id: MatchId,

    /// Map name, e.g. "de_mirage"
    pub map: String,

    pub game_type: GameType,

    /// When the match was recorded; matches are ordered by this, newest first
    pub created_at: DateTime<Utc>,

    /// None for a draw or an abandoned match
    #[serde(default)]
    pub winning_team: Option<Team>,

    pub total_rounds: u32,
}

/// Attempts and wins for one clutch scenario.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClutchScenario {
    pub attempted: u32,
    pub won: u32,
}

/// Clutch counters per 1vN scenario.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClutchCounts {
    #[serde(rename = "1v1", default)]
    pub v1: ClutchScenario,
    #[serde(rename = "1v2", default)]
    pub v2: ClutchScenario,
    #[serde(rename = "1v3", default)]
    pub v3: ClutchScenario,
    #[serde(rename = "1v4", default)]
    pub v4: ClutchScenario,
    #[serde(rename = "1v5", default)]
    pub v5: ClutchScenario,
}

impl ClutchCounts {
    /// Scenarios as (opponents, counters), 1v1 first.
    pub fn scenarios(&self) -> [(u8, ClutchScenario); 5] {
        [
            (1, self.v1),
            (2, self.v2),
            (3, self.v3),
            (4, self.v4),
            (5, self.v5),
        ]
    }

    pub fn total(&self) -> ClutchScenario {
        self.scenarios()
            .iter()
            .fold(ClutchScenario::default(), |acc, (_, s)| ClutchScenario {
                attempted: acc.attempted.saturating_add(s.attempted),
                won: acc.won.saturating_add(s.won),
            })
    }
}

impl std::ops::AddAssign for ClutchCounts {
    fn add_assign(&mut self, rhs: Self) {
        for (dst, src) in [
            (&mut self.v1, rhs.v1),
            (&mut self.v2, rhs.v2),
            (&mut self.v3, rhs.v3),
            (&mut self.v4, rhs.v4),
            (&mut self.v5, rhs.v5),
        ] {
            dst.attempted = dst.attempted.saturating_add(src.attempted);
            dst.won = dst.won.saturating_add(src.won);
        }
    }
}

/// One player's totals for one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMatchSummary {
    pub match_id: MatchId,
    pub steam_id: SteamId,
    pub team: Team,

    pub kills: u32,
    pub assists: u32,
    pub deaths: u32,

    /// Total damage dealt to enemies
    pub damage: u32,

    #[serde(default)]
    pub headshot_kills: u32,

    /// Opening duels won
    #[serde(default)]
    pub first_kills: u32,

    /// Opening duels lost
    #[serde(default)]
    pub first_deaths: u32,

    #[serde(default)]
    pub trade_kills: u32,

    /// Rounds with two or more kills
    #[serde(default)]
    pub multi_kill_rounds: u32,

    #[serde(default)]
    pub flashes_thrown: u32,

    #[serde(default)]
    pub enemies_flashed: u32,

    #[serde(default)]
    pub flash_assists: u32,

    #[serde(default)]
    pub utility_damage: u32,

    #[serde(default)]
    pub rounds_survived: u32,

    #[serde(default)]
    pub clutches: ClutchCounts,
}

/// One player's aim counters for one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AimEvent {
    pub match_id: MatchId,
    pub steam_id: SteamId,
    pub round_number: u32,

    /// Weapon with the most shots this round
    pub weapon: String,

    pub shots_fired: u32,
    pub shots_hit: u32,

    pub head_hits: u32,

    /// Hits with a hit-group breakdown (head + chest + stomach + limbs)
    pub total_body_hits: u32,

    #[serde(default)]
    pub spraying_shots_fired: u32,

    #[serde(default)]
    pub spraying_shots_hit: u32,

    /// Mean horizontal crosshair offset from the enemy head, degrees
    pub crosshair_x: f64,

    /// Mean vertical crosshair offset from the enemy head, degrees
    pub crosshair_y: f64,

    /// Milliseconds from enemy first visible to first damage
    #[serde(default)]
    pub time_to_damage_ms: Option<f64>,
}
