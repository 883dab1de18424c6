//! Clan leaderboard snapshots.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ClanId, EntityId, LeaderboardEntryId, Role, UserId};

/// Days in a leaderboard window.
pub const LEADERBOARD_WINDOW_DAYS: i64 = 7;

/// Metric a leaderboard ranks by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardKind {
    Aim,
    Impact,
    Clutch,
    Opener,
    Closer,
    Support,
    Fragger,
}

impl LeaderboardKind {
    pub const ALL: [LeaderboardKind; 7] = [
        LeaderboardKind::Aim,
        LeaderboardKind::Impact,
        LeaderboardKind::Clutch,
        LeaderboardKind::Opener,
        LeaderboardKind::Closer,
        LeaderboardKind::Support,
        LeaderboardKind::Fragger,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeaderboardKind::Aim => "aim",
            LeaderboardKind::Impact => "impact",
            LeaderboardKind::Clutch => "clutch",
            LeaderboardKind::Opener => "opener",
            LeaderboardKind::Closer => "closer",
            LeaderboardKind::Support => "support",
            LeaderboardKind::Fragger => "fragger",
        }
    }

    /// Complexion role this leaderboard ranks, if it is a role board.
    pub fn role(&self) -> Option<Role> {
        match self {
            LeaderboardKind::Opener => Some(Role::Opener),
            LeaderboardKind::Closer => Some(Role::Closer),
            LeaderboardKind::Support => Some(Role::Support),
            LeaderboardKind::Fragger => Some(Role::Fragger),
            _ => None,
        }
    }
}

impl std::fmt::Display for LeaderboardKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LeaderboardKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LeaderboardKind::ALL
            .iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| format!("unknown leaderboard type: {}", s))
    }
}

/// A fixed seven-day window, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeaderboardPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl LeaderboardPeriod {
    /// The Monday-Sunday week containing `date`.
    pub fn week_containing(date: NaiveDate) -> Self {
        let offset = date.weekday().num_days_from_monday() as i64;
        let start = date - Duration::days(offset);
        Self {
            start,
            end: start + Duration::days(LEADERBOARD_WINDOW_DAYS - 1),
        }
    }

    /// The most recent Monday-Sunday week that has fully ended before `today`.
    pub fn last_completed_week(today: NaiveDate) -> Self {
        Self::week_containing(today - Duration::days(LEADERBOARD_WINDOW_DAYS))
    }
}

impl std::fmt::Display for LeaderboardPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// One ranked member in a persisted leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Hash of (clan, kind, start, end, user)
    pub id: LeaderboardEntryId,
    pub clan_id: ClanId,
    pub kind: LeaderboardKind,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub user_id: UserId,

    /// Dense 1-based rank
    pub position: u32,
    pub value: f64,

    /// Calculation run that last wrote this row
    pub run_id: Uuid,
    pub calculated_at: DateTime<Utc>,
}

impl LeaderboardEntry {
    pub fn new(
        clan_id: ClanId,
        kind: LeaderboardKind,
        period: LeaderboardPeriod,
        user_id: UserId,
        position: u32,
        value: f64,
        run_id: Uuid,
    ) -> Self {
        let id = Self::key(&clan_id, kind, period, &user_id);
        Self {
            id,
            clan_id,
            kind,
            period_start: period.start,
            period_end: period.end,
            user_id,
            position,
            value,
            run_id,
            calculated_at: Utc::now(),
        }
    }

    /// Unique key of an entry.
    pub fn key(
        clan_id: &ClanId,
        kind: LeaderboardKind,
        period: LeaderboardPeriod,
        user_id: &UserId,
    ) -> LeaderboardEntryId {
        EntityId::generate(&[
            clan_id.as_str(),
            kind.as_str(),
            &period.start.to_string(),
            &period.end.to_string(),
            user_id.as_str(),
        ])
    }

    pub fn period(&self) -> LeaderboardPeriod {
        LeaderboardPeriod {
            start: self.period_start,
            end: self.period_end,
        }
    }
}
