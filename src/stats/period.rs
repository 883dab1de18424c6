//! Current and previous comparison windows.

use tracing::debug;

use crate::models::{GameMatch, StatsFilters, User};
use crate::storage::{EventStore, StorageError};

/// The N most recent matching matches and the N before them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonWindows {
    /// Newest first
    pub current: Vec<GameMatch>,
    /// Newest first, all older than `current`
    pub previous: Vec<GameMatch>,
}

/// Resolves comparison windows for a user.
///
/// The previous window is the same query offset by N, so it shifts whenever
/// the filters change between calls.
pub struct PeriodResolver<'a> {
    events: &'a dyn EventStore,
}

impl<'a> PeriodResolver<'a> {
    pub fn new(events: &'a dyn EventStore) -> Self {
        Self { events }
    }

    /// Both windows are empty for a user without a linked Steam account.
    pub async fn resolve(
        &self,
        user: &User,
        filters: &StatsFilters,
    ) -> Result<ComparisonWindows, StorageError> {
        let Some(steam_id) = &user.steam_id else {
            debug!("User {} has no linked Steam account", user.id);
            return Ok(ComparisonWindows::default());
        };

        let n = filters.window_size();
        let current = self
            .events
            .find_matches_for_player(steam_id, filters, 0, n)
            .await?;
        let previous = self
            .events
            .find_matches_for_player(steam_id, filters, n, n)
            .await?;

        debug!(
            "Resolved windows for {}: {} current, {} previous",
            user.id,
            current.len(),
            previous.len()
        );
        Ok(ComparisonWindows { current, previous })
    }
}
