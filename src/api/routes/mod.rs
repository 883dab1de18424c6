pub mod health;
pub mod leaderboards;
pub mod stats;
