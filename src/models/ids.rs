//! Identifiers and deterministic key hashing.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A string identifier. Derived keys are content hashes, external ids
/// (users, clans, matches, Steam accounts) are stored verbatim.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: String) -> Self {
        Self(id)
    }

    /// Derive an id from key fields.
    /// Uses SHA256 over the `|`-joined fields and keeps the first 16 hex characters.
    pub fn generate(fields: &[&str]) -> Self {
        Self(short_hash(fields))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// SHA256 of `|`-joined fields, truncated to 16 hex characters.
pub fn short_hash(fields: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            hasher.update(b"|");
        }
        hasher.update(field.as_bytes());
    }
    let hash = hex::encode(hasher.finalize());
    hash[..16].to_string()
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Application user id
pub type UserId = EntityId;

/// Clan id
pub type ClanId = EntityId;

/// Parsed demo / match id
pub type MatchId = EntityId;

/// SteamID64 of a linked Steam account
pub type SteamId = EntityId;

/// Leaderboard entry id (hash of the entry's unique key)
pub type LeaderboardEntryId = EntityId;
