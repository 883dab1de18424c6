//! Weekly clan leaderboards.
//!
//! The calculator ranks the linked members of one clan for one metric over
//! one week and persists the ranking. The scheduler runs it for every clan
//! and metric, either once or on an interval.

pub mod calculator;
pub mod scheduler;

use thiserror::Error;

use crate::models::ClanId;
use crate::storage::StorageError;

pub use calculator::{
    CalculationPhase, CalculationRun, LeaderboardCalculator, DEFAULT_MIN_LINKED_MEMBERS,
};
pub use scheduler::{LeaderboardScheduler, ScheduleResult};

/// Errors from leaderboard calculation.
#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("Unknown clan: {0}")]
    UnknownClan(ClanId),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
