//! # Trajectory Core
//!
//! The "spine" of the Lumen session loop. This crate interfaces with
//! `game_content`, composes its read-only catalogs into a per-session state
//! machine, and reacts to the player's accumulated behavior with cards and
//! bosses.
//!
//! ## Core Components
//!
//! - **scenario**: ordered level lookup per district and task validation
//! - **trees**: decision tree traversal - the branching heart of a session
//! - **cards**: the card economy - unlock, equip, activate
//! - **bosses**: spawn/defeat evaluation for narrative obstacles
//! - **engine**: the orchestrator tying a session together step by step
//! - **session**: session lifecycle - cooldown gate, completion, unlocks
//! - **city**: district visual state, the consumer of reported fog deltas
//!
//! ## Design Philosophy
//!
//! - **State-Driven**: every decision reads the player's accumulated state;
//!   content is immutable once loaded
//! - **Recoverable**: operations return structured errors, never panic
//! - **Single-Writer**: one active trajectory per player, persisted after
//!   every transition

pub mod bosses;
pub mod cards;
pub mod city;
pub mod engine;
pub mod error;
pub mod scenario;
pub mod session;
pub mod trees;

pub use bosses::*;
pub use cards::*;
pub use city::*;
pub use engine::*;
pub use error::*;
pub use scenario::*;
pub use session::*;
pub use trees::*;
