//! Read-only access to match facts and identities.
//!
//! Joins are explicit: a player is linked to a match through a
//! `PlayerMatchSummary` carrying their Steam id, and a clan reaches matches
//! only through its members' Steam ids.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::debug;

use super::{EntityType, JsonlReader, StorageConfig, StorageError};
use crate::models::{
    AimEvent, Clan, ClanId, GameMatch, MatchId, PlayerMatchSummary, StatsFilters, SteamId, User,
    UserId,
};

/// Query interface over parsed match data.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Matches the player appears in that satisfy `filters`, newest first,
    /// skipping `offset` and returning at most `limit`.
    async fn find_matches_for_player(
        &self,
        steam_id: &SteamId,
        filters: &StatsFilters,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<GameMatch>, StorageError>;

    /// Matches whose date falls in `[from, to]`, newest first.
    async fn matches_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<GameMatch>, StorageError>;

    /// Matches with the given ids, newest first.
    async fn matches_by_ids(&self, ids: &[MatchId]) -> Result<Vec<GameMatch>, StorageError>;

    /// The player's aim rows within the given matches.
    async fn aim_events(
        &self,
        steam_id: &SteamId,
        match_ids: &[MatchId],
    ) -> Result<Vec<AimEvent>, StorageError>;

    /// The player's match summaries within the given matches.
    async fn player_summaries(
        &self,
        steam_id: &SteamId,
        match_ids: &[MatchId],
    ) -> Result<Vec<PlayerMatchSummary>, StorageError>;
}

/// Users and clan membership.
#[async_trait]
pub trait ClanDirectory: Send + Sync {
    async fn find_user(&self, id: &UserId) -> Result<Option<User>, StorageError>;

    async fn find_clan(&self, id: &ClanId) -> Result<Option<Clan>, StorageError>;

    async fn clans(&self) -> Result<Vec<Clan>, StorageError>;

    /// Members of a clan in membership order. Unknown user ids are skipped.
    async fn clan_members(&self, clan: &Clan) -> Result<Vec<User>, StorageError>;
}

/// Event store and directory backed by the normalized JSONL files.
#[derive(Debug, Clone)]
pub struct JsonlEventStore {
    storage: StorageConfig,
}

impl JsonlEventStore {
    pub fn new(storage: StorageConfig) -> Self {
        Self { storage }
    }

    /// The normalized directory must exist; a missing one means the
    /// ingestion pipeline never ran against this data dir.
    fn ensure_available(&self) -> Result<(), StorageError> {
        let dir = self.storage.normalized_dir();
        if !dir.exists() {
            return Err(StorageError::PathNotFound(dir));
        }
        Ok(())
    }

    fn read_matches(&self) -> Result<Vec<GameMatch>, StorageError> {
        self.ensure_available()?;
        JsonlReader::<GameMatch>::for_entity(&self.storage, EntityType::Match).read_all()
    }

    fn participated_in(&self, steam_id: &SteamId) -> Result<HashSet<MatchId>, StorageError> {
        self.ensure_available()?;
        let summaries = JsonlReader::<PlayerMatchSummary>::for_entity(
            &self.storage,
            EntityType::PlayerMatchSummary,
        )
        .read_where(|s| &s.steam_id == steam_id)?;
        Ok(summaries.into_iter().map(|s| s.match_id).collect())
    }
}

/// Newest first; ties broken by id so paging is deterministic.
fn sort_newest_first(matches: &mut [GameMatch]) {
    matches.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[async_trait]
impl EventStore for JsonlEventStore {
    async fn find_matches_for_player(
        &self,
        steam_id: &SteamId,
        filters: &StatsFilters,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<GameMatch>, StorageError> {
        let played = self.participated_in(steam_id)?;
        let mut matches: Vec<GameMatch> = self
            .read_matches()?
            .into_iter()
            .filter(|m| played.contains(&m.id) && filters.matches(m))
            .collect();
        sort_newest_first(&mut matches);

        let page: Vec<GameMatch> = matches.into_iter().skip(offset).take(limit).collect();
        debug!(
            "Found {} matches for {} (offset {}, limit {})",
            page.len(),
            steam_id,
            offset,
            limit
        );
        Ok(page)
    }

    async fn matches_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<GameMatch>, StorageError> {
        let mut matches: Vec<GameMatch> = self
            .read_matches()?
            .into_iter()
            .filter(|m| {
                let date = m.created_at.date_naive();
                date >= from && date <= to
            })
            .collect();
        sort_newest_first(&mut matches);
        Ok(matches)
    }

    async fn matches_by_ids(&self, ids: &[MatchId]) -> Result<Vec<GameMatch>, StorageError> {
        let wanted: HashSet<&MatchId> = ids.iter().collect();
        let mut matches: Vec<GameMatch> = self
            .read_matches()?
            .into_iter()
            .filter(|m| wanted.contains(&m.id))
            .collect();
        sort_newest_first(&mut matches);
        Ok(matches)
    }

    async fn aim_events(
        &self,
        steam_id: &SteamId,
        match_ids: &[MatchId],
    ) -> Result<Vec<AimEvent>, StorageError> {
        if match_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.ensure_available()?;
        let wanted: HashSet<&MatchId> = match_ids.iter().collect();
        JsonlReader::<AimEvent>::for_entity(&self.storage, EntityType::AimEvent)
            .read_where(|e| &e.steam_id == steam_id && wanted.contains(&e.match_id))
    }

    async fn player_summaries(
        &self,
        steam_id: &SteamId,
        match_ids: &[MatchId],
    ) -> Result<Vec<PlayerMatchSummary>, StorageError> {
        if match_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.ensure_available()?;
        let wanted: HashSet<&MatchId> = match_ids.iter().collect();
        JsonlReader::<PlayerMatchSummary>::for_entity(
            &self.storage,
            EntityType::PlayerMatchSummary,
        )
        .read_where(|s| &s.steam_id == steam_id && wanted.contains(&s.match_id))
    }
}

#[async_trait]
impl ClanDirectory for JsonlEventStore {
    async fn find_user(&self, id: &UserId) -> Result<Option<User>, StorageError> {
        self.ensure_available()?;
        let users = JsonlReader::<User>::for_entity(&self.storage, EntityType::User)
            .read_where(|u| &u.id == id)?;
        Ok(users.into_iter().next())
    }

    async fn find_clan(&self, id: &ClanId) -> Result<Option<Clan>, StorageError> {
        self.ensure_available()?;
        let clans = JsonlReader::<Clan>::for_entity(&self.storage, EntityType::Clan)
            .read_where(|c| &c.id == id)?;
        Ok(clans.into_iter().next())
    }

    async fn clans(&self) -> Result<Vec<Clan>, StorageError> {
        self.ensure_available()?;
        JsonlReader::<Clan>::for_entity(&self.storage, EntityType::Clan).read_all()
    }

    async fn clan_members(&self, clan: &Clan) -> Result<Vec<User>, StorageError> {
        self.ensure_available()?;
        let users = JsonlReader::<User>::for_entity(&self.storage, EntityType::User).read_all()?;
        Ok(clan
            .members
            .iter()
            .filter_map(|member| users.iter().find(|u| u.id == member.user_id).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GameType;
    use crate::testing::Fixture;

    #[tokio::test]
    async fn test_missing_data_dir_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonlEventStore::new(StorageConfig::new(tmp.path().join("nope")));
        let result = store
            .find_matches_for_player(&"s1".into(), &StatsFilters::default(), 0, 10)
            .await;
        assert!(matches!(result, Err(StorageError::PathNotFound(_))));
    }

    #[tokio::test]
    async fn test_find_matches_orders_newest_first_and_pages() {
        let fx = Fixture::new();
        for day in 1..=5 {
            fx.add_match_played(&format!("m{}", day), "de_mirage", GameType::Premier, day, "s1");
        }
        fx.add_match_played("other", "de_mirage", GameType::Premier, 6, "s2");
        let store = fx.store();

        let page = store
            .find_matches_for_player(&"s1".into(), &StatsFilters::default(), 0, 2)
            .await
            .unwrap();
        let ids: Vec<_> = page.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m5", "m4"]);

        let page = store
            .find_matches_for_player(&"s1".into(), &StatsFilters::default(), 2, 10)
            .await
            .unwrap();
        let ids: Vec<_> = page.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m3", "m2", "m1"]);
    }

    #[tokio::test]
    async fn test_find_matches_applies_filters() {
        let fx = Fixture::new();
        fx.add_match_played("m1", "de_nuke", GameType::Premier, 1, "s1");
        fx.add_match_played("m2", "de_mirage", GameType::Premier, 2, "s1");
        fx.add_match_played("m3", "de_nuke", GameType::Wingman, 3, "s1");
        let store = fx.store();

        let filters = StatsFilters::default()
            .with_map("de_nuke")
            .with_game_type(GameType::Premier);
        let page = store
            .find_matches_for_player(&"s1".into(), &filters, 0, 10)
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id.as_str(), "m1");
    }

    #[tokio::test]
    async fn test_matches_between_inclusive() {
        let fx = Fixture::new();
        for day in 1..=9 {
            fx.add_match_played(&format!("m{}", day), "de_inferno", GameType::Premier, day, "s1");
        }
        let store = fx.store();

        let matches = store
            .matches_between(fx.date(3), fx.date(5))
            .await
            .unwrap();
        assert_eq!(matches.len(), 3);
        assert_eq!(matches[0].id.as_str(), "m5");
    }

    #[tokio::test]
    async fn test_clan_members_in_membership_order() {
        let fx = Fixture::new();
        fx.add_user("u1", "alice", Some("s1"));
        fx.add_user("u2", "bob", None);
        let clan = Clan::new("c1", "Five Stack")
            .with_member("u2")
            .with_member("ghost")
            .with_member("u1");
        fx.add_clan(&clan);
        let store = fx.store();

        let members = store.clan_members(&clan).await.unwrap();
        let names: Vec<_> = members.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["bob", "alice"]);

        assert!(store.find_clan(&"c1".into()).await.unwrap().is_some());
        assert!(store.find_user(&"u3".into()).await.unwrap().is_none());
    }
}
