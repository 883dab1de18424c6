//! Users, clans and clan membership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ClanId, SteamId, UserId};

/// An application user, optionally linked to a Steam account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,

    /// Display name
    pub name: String,

    /// Linked Steam account (None = no linked identity)
    #[serde(default)]
    pub steam_id: Option<SteamId>,
}

impl User {
    pub fn new(id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            steam_id: None,
        }
    }

    pub fn with_steam_id(mut self, steam_id: impl Into<SteamId>) -> Self {
        self.steam_id = Some(steam_id.into());
        self
    }

    /// Whether the user has a linked external identity.
    pub fn is_linked(&self) -> bool {
        self.steam_id.is_some()
    }
}

/// Membership of a user in a clan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClanMember {
    pub user_id: UserId,
    pub joined_at: DateTime<Utc>,
}

/// A clan. Member order is the insertion order used to break leaderboard ties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clan {
    pub id: ClanId,
    pub name: String,
    #[serde(default)]
    pub members: Vec<ClanMember>,
}

impl Clan {
    pub fn new(id: impl Into<ClanId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn with_member(mut self, user_id: impl Into<UserId>) -> Self {
        self.members.push(ClanMember {
            user_id: user_id.into(),
            joined_at: Utc::now(),
        });
        self
    }
}
