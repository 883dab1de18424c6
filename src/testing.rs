//! Test fixtures: a temporary data dir populated with JSONL rows.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use tempfile::TempDir;

use crate::models::{
    AimEvent, Clan, ClutchCounts, GameMatch, GameType, PlayerMatchSummary, Team, User,
};
use crate::storage::{EntityType, JsonlEventStore, JsonlWriter, StorageConfig};

pub struct Fixture {
    pub dir: TempDir,
    pub storage: StorageConfig,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageConfig::new(dir.path().to_path_buf());
        std::fs::create_dir_all(storage.normalized_dir()).unwrap();
        Self { dir, storage }
    }

    pub fn store(&self) -> JsonlEventStore {
        JsonlEventStore::new(self.storage.clone())
    }

    /// Day 1 is 2026-10-01.
    pub fn date(&self, day: u32) -> NaiveDate {
        day_date(day)
    }

    fn append<T: Serialize>(&self, entity: EntityType, rows: &[T]) {
        JsonlWriter::for_entity(&self.storage, entity)
            .append_batch(rows)
            .unwrap();
    }

    pub fn add_user(&self, id: &str, name: &str, steam_id: Option<&str>) {
        let mut user = User::new(id, name);
        if let Some(steam_id) = steam_id {
            user = user.with_steam_id(steam_id);
        }
        self.append(EntityType::User, &[user]);
    }

    pub fn add_clan(&self, clan: &Clan) {
        self.append(EntityType::Clan, &[clan]);
    }

    pub fn add_match(&self, game: &GameMatch) {
        self.append(EntityType::Match, &[game]);
    }

    pub fn add_summary(&self, summary: &PlayerMatchSummary) {
        self.append(EntityType::PlayerMatchSummary, &[summary]);
    }

    pub fn add_aim(&self, event: &AimEvent) {
        self.append(EntityType::AimEvent, &[event]);
    }

    /// A CT-won match on `day` with a default summary for `steam_id`.
    pub fn add_match_played(
        &self,
        id: &str,
        map: &str,
        game_type: GameType,
        day: u32,
        steam_id: &str,
    ) {
        self.add_match(&game(id, map, game_type, day));
        self.add_summary(&summary(id, steam_id));
    }
}

pub fn day_date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 1).unwrap() + Duration::days(day as i64 - 1)
}

pub fn day_time(day: u32) -> DateTime<Utc> {
    let date = day_date(day);
    Utc.from_utc_datetime(&date.and_hms_opt(12, 0, 0).unwrap())
}

pub fn game(id: &str, map: &str, game_type: GameType, day: u32) -> GameMatch {
    GameMatch {
        id: id.into(),
        map: map.to_string(),
        game_type,
        created_at: day_time(day),
        winning_team: Some(Team::Ct),
        total_rounds: 20,
    }
}

pub fn summary(match_id: &str, steam_id: &str) -> PlayerMatchSummary {
    PlayerMatchSummary {
        match_id: match_id.into(),
        steam_id: steam_id.into(),
        team: Team::Ct,
        kills: 20,
        assists: 4,
        deaths: 15,
        damage: 1600,
        headshot_kills: 10,
        first_kills: 3,
        first_deaths: 2,
        trade_kills: 2,
        multi_kill_rounds: 4,
        flashes_thrown: 10,
        enemies_flashed: 8,
        flash_assists: 2,
        utility_damage: 100,
        rounds_survived: 6,
        clutches: ClutchCounts::default(),
    }
}

pub fn aim_event(match_id: &str, steam_id: &str, weapon: &str, fired: u32, hit: u32) -> AimEvent {
    AimEvent {
        match_id: match_id.into(),
        steam_id: steam_id.into(),
        round_number: 1,
        weapon: weapon.to_string(),
        shots_fired: fired,
        shots_hit: hit,
        head_hits: hit / 2,
        total_body_hits: hit,
        spraying_shots_fired: 0,
        spraying_shots_hit: 0,
        crosshair_x: 3.0,
        crosshair_y: 4.0,
        time_to_damage_ms: None,
    }
}
