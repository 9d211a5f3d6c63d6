//! Core data models for match ingestion and statistics.

mod ids;
mod match_index;
mod payload;
mod player;
mod row;
mod views;

pub use ids::*;
pub use match_index::*;
pub use payload::*;
pub use player::*;
pub use row::*;
pub use views::*;
