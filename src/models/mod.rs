//! Core data models.

mod clan;
mod complexion;
mod filters;
mod ids;
mod leaderboard;
mod match_data;
mod stats;
mod trend;

pub use clan::*;
pub use complexion::*;
pub use filters::*;
pub use ids::*;
pub use leaderboard::*;
pub use match_data::*;
pub use stats::*;
pub use trend::*;
