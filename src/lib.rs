//! ClassCafe - course social backend
//!
//! Students enroll in courses, post to a per-course forum, earn coins for
//! engagement, spend them in the avatar shop and on the weekly meme board,
//! and compete for a rotating "top contributor" crown per course.
//!
//! ## Services
//!
//! - **Forum**: per-course posts, threaded replies, like toggles
//! - **Rewards**: transactional coin accounting for forum activity
//! - **Ranking**: cron-triggered top-contributor rotation per course
//! - **Bulletin**: meme/notice board gated by coins and contributor status
//! - **Avatar**: coin-priced item shop and avatar configuration

pub mod auth;
pub mod config;
pub mod db;
pub mod ranking;
pub mod rewards;
pub mod routes;
pub mod server;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{CafeError, Result};
