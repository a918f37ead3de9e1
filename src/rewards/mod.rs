//! Reward engine
//!
//! Applies deterministic coin deltas to user balances in response to forum
//! activity, and gates costly actions (meme board, shop purchases) behind
//! balance checks. Every read-then-write runs inside a single MongoDB
//! transaction so concurrent actions from the same user cannot lose updates
//! or drive a balance negative.

pub mod engine;
pub mod policy;

pub use engine::{RewardEngine, ToggleOutcome};
pub use policy::{milestone_bonus, RewardPolicy};
