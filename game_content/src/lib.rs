//! # Game Content
//!
//! The "World Bible" crate - all static content for Lumen (scenario levels,
//! decision trees, cards, bosses), the player save model, and the player
//! store. This crate is the single source of truth for what the game *is*
//! and what a player *has*; it carries no orchestration logic.

pub mod boss;
pub mod card;
pub mod config;
pub mod level;
pub mod player;
pub mod storage;
pub mod tree;

pub use boss::*;
pub use card::*;
pub use config::*;
pub use level::*;
pub use player::*;
pub use storage::*;
pub use tree::*;
