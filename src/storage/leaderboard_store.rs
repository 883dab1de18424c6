//! Persisted leaderboard snapshots.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::{EntityType, JsonlReader, JsonlWriter, StorageConfig, StorageError};
use crate::models::{ClanId, LeaderboardEntry, LeaderboardKind, LeaderboardPeriod};

/// Storage for ranked leaderboard rows.
#[async_trait]
pub trait LeaderboardStore: Send + Sync {
    /// Insert or overwrite every entry by its (clan, kind, period, user) key
    /// in one write. Either all rows land or none do.
    async fn upsert_many(&self, entries: Vec<LeaderboardEntry>) -> Result<(), StorageError>;

    /// Single-row [`upsert_many`](LeaderboardStore::upsert_many).
    async fn upsert(&self, entry: LeaderboardEntry) -> Result<(), StorageError> {
        self.upsert_many(vec![entry]).await
    }

    /// Rows of the most recent calculation for the key, ordered by position.
    async fn query(
        &self,
        clan_id: &ClanId,
        kind: LeaderboardKind,
        period: LeaderboardPeriod,
    ) -> Result<Vec<LeaderboardEntry>, StorageError>;
}

/// Leaderboard rows in `derived/leaderboard_entries.jsonl`.
///
/// Upserts rewrite the whole file under an async mutex so concurrent
/// writers in this process cannot interleave. The rewrite goes through a
/// temp file and rename, so readers see a run's rows all at once. Across
/// processes the last writer wins.
pub struct JsonlLeaderboardStore {
    storage: StorageConfig,
    write_lock: Mutex<()>,
}

impl JsonlLeaderboardStore {
    pub fn new(storage: StorageConfig) -> Self {
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    fn read_all(&self) -> Result<Vec<LeaderboardEntry>, StorageError> {
        JsonlReader::<LeaderboardEntry>::for_entity(&self.storage, EntityType::LeaderboardEntry)
            .read_all()
    }
}

#[async_trait]
impl LeaderboardStore for JsonlLeaderboardStore {
    async fn upsert_many(&self, entries: Vec<LeaderboardEntry>) -> Result<(), StorageError> {
        if entries.is_empty() {
            return Ok(());
        }
        let _guard = self.write_lock.lock().await;

        let mut rows = self.read_all()?;
        for entry in entries {
            match rows.iter_mut().find(|e| e.id == entry.id) {
                Some(existing) => *existing = entry,
                None => rows.push(entry),
            }
        }

        JsonlWriter::for_entity(&self.storage, EntityType::LeaderboardEntry).write_all(&rows)?;
        Ok(())
    }

    async fn query(
        &self,
        clan_id: &ClanId,
        kind: LeaderboardKind,
        period: LeaderboardPeriod,
    ) -> Result<Vec<LeaderboardEntry>, StorageError> {
        let mut rows: Vec<LeaderboardEntry> = self
            .read_all()?
            .into_iter()
            .filter(|e| &e.clan_id == clan_id && e.kind == kind && e.period() == period)
            .collect();

        // Rows for members who dropped out of a later run are superseded, not deleted.
        let latest_run = rows
            .iter()
            .max_by_key(|e| e.calculated_at)
            .map(|e| e.run_id);
        if let Some(run_id) = latest_run {
            rows.retain(|e| e.run_id == run_id);
        }

        rows.sort_by_key(|e| e.position);
        debug!(
            "Leaderboard {} {} {}: {} rows",
            clan_id,
            kind,
            period,
            rows.len()
        );
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn period() -> LeaderboardPeriod {
        LeaderboardPeriod::week_containing(NaiveDate::from_ymd_opt(2026, 10, 14).unwrap())
    }

    fn entry(user: &str, position: u32, value: f64, run_id: Uuid) -> LeaderboardEntry {
        LeaderboardEntry::new(
            "c1".into(),
            LeaderboardKind::Aim,
            period(),
            user.into(),
            position,
            value,
            run_id,
        )
    }

    #[tokio::test]
    async fn test_upsert_inserts_and_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonlLeaderboardStore::new(StorageConfig::new(tmp.path().to_path_buf()));
        let run = Uuid::new_v4();

        store.upsert(entry("u1", 1, 70.0, run)).await.unwrap();
        store.upsert(entry("u2", 2, 50.0, run)).await.unwrap();
        store.upsert(entry("u1", 2, 40.0, run)).await.unwrap();
        store.upsert(entry("u2", 1, 55.0, run)).await.unwrap();

        let rows = store
            .query(&"c1".into(), LeaderboardKind::Aim, period())
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].user_id.as_str(), "u2");
        assert_eq!(rows[0].value, 55.0);
        assert_eq!(rows[1].user_id.as_str(), "u1");
        assert_eq!(rows[1].position, 2);
    }

    #[tokio::test]
    async fn test_query_scopes_by_key() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonlLeaderboardStore::new(StorageConfig::new(tmp.path().to_path_buf()));
        let run = Uuid::new_v4();

        store.upsert(entry("u1", 1, 70.0, run)).await.unwrap();
        let mut other_kind = entry("u1", 1, 3.0, run);
        other_kind.kind = LeaderboardKind::Impact;
        other_kind.id = LeaderboardEntry::key(
            &other_kind.clan_id,
            LeaderboardKind::Impact,
            period(),
            &other_kind.user_id,
        );
        store.upsert(other_kind).await.unwrap();

        let aim = store
            .query(&"c1".into(), LeaderboardKind::Aim, period())
            .await
            .unwrap();
        assert_eq!(aim.len(), 1);
        assert_eq!(aim[0].value, 70.0);

        let none = store
            .query(&"c2".into(), LeaderboardKind::Aim, period())
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_query_hides_superseded_rows() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonlLeaderboardStore::new(StorageConfig::new(tmp.path().to_path_buf()));

        let first = Uuid::new_v4();
        store.upsert(entry("u1", 1, 70.0, first)).await.unwrap();
        store.upsert(entry("u2", 2, 50.0, first)).await.unwrap();

        // u2 no longer qualifies in the second run
        let second = Uuid::new_v4();
        let mut rerun = entry("u1", 1, 72.0, second);
        rerun.calculated_at = rerun.calculated_at + chrono::Duration::seconds(1);
        store.upsert(rerun).await.unwrap();

        let rows = store
            .query(&"c1".into(), LeaderboardKind::Aim, period())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, 72.0);

        let raw = store.read_all().unwrap();
        assert_eq!(raw.len(), 2);
    }

    #[tokio::test]
    async fn test_upsert_many_writes_one_run() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonlLeaderboardStore::new(StorageConfig::new(tmp.path().to_path_buf()));
        let run = Uuid::new_v4();

        store
            .upsert_many(vec![
                entry("u1", 1, 70.0, run),
                entry("u2", 2, 50.0, run),
                entry("u3", 3, 20.0, run),
            ])
            .await
            .unwrap();
        store.upsert_many(Vec::new()).await.unwrap();

        let rows = store
            .query(&"c1".into(), LeaderboardKind::Aim, period())
            .await
            .unwrap();
        let users: Vec<&str> = rows.iter().map(|e| e.user_id.as_str()).collect();
        assert_eq!(users, vec!["u1", "u2", "u3"]);
    }
}
