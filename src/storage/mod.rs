//! Filesystem data store.
//!
//! Match facts and identities are read from normalized JSONL files produced
//! by the demo parsing pipeline; leaderboard snapshots are written to the
//! derived directory.

pub mod event_store;
pub mod jsonl;
pub mod leaderboard_store;

use std::path::PathBuf;
use thiserror::Error;

pub use event_store::{ClanDirectory, EventStore, JsonlEventStore};
pub use jsonl::{EntityType, JsonlReader, JsonlWriter};
pub use leaderboard_store::{JsonlLeaderboardStore, LeaderboardStore};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn normalized_dir(&self) -> PathBuf {
        self.data_dir.join("normalized")
    }

    pub fn derived_dir(&self) -> PathBuf {
        self.data_dir.join("derived")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}
