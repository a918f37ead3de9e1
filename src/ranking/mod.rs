//! Contributor ranking: periodic per-course winner selection
//!
//! Pure selection logic lives in [`select`]; the engine applies it to
//! the store, one transaction per course, when the cycle is triggered.

pub mod engine;
pub mod select;

pub use engine::{CycleReport, RankingEngine};
pub use select::{select_winner, Candidate, RankingWeights, Selection};
