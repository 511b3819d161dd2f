//! Player save model - the single mutable state every core operation reads
//! and writes.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::boss::BossId;
use crate::card::CardId;
use crate::level::{DistrictId, LevelId, PathId};
use crate::tree::{NodeId, TreeId};

/// Unique identifier for players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Create a new random player ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a player ID from a specific UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Create a nil/empty player ID (useful for defaults).
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cursor of the single active trajectory session. At most one exists per
/// player; starting a new level overwrites it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrajectoryCursor {
    pub level_id: LevelId,
    pub district: DistrictId,
    #[serde(default)]
    pub tree_id: Option<TreeId>,
    pub node_id: NodeId,
    #[serde(default)]
    pub path_id: Option<PathId>,
}

/// Per-district progression and visual inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictProgress {
    #[serde(default)]
    pub level: u32,
    #[serde(default = "default_unlocked")]
    pub unlocked: bool,
    #[serde(default)]
    pub sessions_count: u32,
    /// Extra fog on top of the level-derived base, raised by bosses and
    /// cleared by card effects. Kept in `0.0..=1.0`.
    #[serde(default)]
    pub fog: f32,
}

fn default_unlocked() -> bool {
    true
}

impl Default for DistrictProgress {
    fn default() -> Self {
        Self {
            level: 0,
            unlocked: true,
            sessions_count: 0,
            fog: 0.0,
        }
    }
}

/// One session, kept in the capped history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub district: DistrictId,
    #[serde(default)]
    pub emotion: Option<String>,
    #[serde(default)]
    pub intensity: Option<u32>,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub points_earned: u64,
    #[serde(default)]
    pub level_id: Option<LevelId>,
    /// Narrative act the session belongs to.
    #[serde(default)]
    pub act: Option<u32>,
    /// Microsteps recorded during the session, feeding the effort payout.
    #[serde(default)]
    pub microsteps_count: u32,
}

/// Note logged through the conversational agent's memory side-channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryNote {
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Session history entries kept per player.
pub const SESSION_HISTORY_LIMIT: usize = 50;

/// Agent memory notes kept per player.
pub const AGENT_MEMORY_LIMIT: usize = 100;

/// The complete save state of one player. Missing fields fill from defaults
/// when an older save loads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerState {
    pub player_id: PlayerId,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub stability_points: u64,
    #[serde(default)]
    pub effort: u64,
    #[serde(default)]
    pub session_streak: u32,
    /// Owned card ids. Membership is set-like; duplicates are never stored.
    #[serde(default)]
    pub owned_cards: Vec<CardId>,
    #[serde(default)]
    pub equipped_card: Option<CardId>,
    #[serde(default)]
    pub equipped_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub relic_uses: HashMap<CardId, u32>,
    /// Bosses currently spawned; each appears at most once.
    #[serde(default)]
    pub active_bosses: Vec<BossId>,
    #[serde(default)]
    pub boss_penalties: HashMap<BossId, i64>,
    /// Blocked option ids attributed to the boss that imposed them.
    #[serde(default)]
    pub blocked_options: HashMap<BossId, Vec<String>>,
    #[serde(default)]
    pub completed_levels: HashSet<LevelId>,
    #[serde(default)]
    pub completed_contracts: HashSet<String>,
    /// Completed-session count per district - the canonical driver of level
    /// progression.
    #[serde(default)]
    pub district_sessions: HashMap<DistrictId, u32>,
    #[serde(default)]
    pub districts: HashMap<DistrictId, DistrictProgress>,
    #[serde(default)]
    pub actions_history: HashMap<String, u32>,
    /// Behavioral counters driving boss triggers and defeat series.
    #[serde(default)]
    pub counters: HashMap<String, u32>,
    #[serde(default)]
    pub acts_completed: u32,
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default)]
    pub last_card_used: Option<CardId>,
    #[serde(default)]
    pub last_session_district: Option<DistrictId>,
    #[serde(default)]
    pub last_session_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub session_history: Vec<SessionRecord>,
    #[serde(default)]
    pub agent_memory: Vec<MemoryNote>,
    #[serde(default)]
    pub endgame_unlocked: bool,
    #[serde(default)]
    pub trajectory_state: Option<TrajectoryCursor>,
    /// Chosen fork path per level, sticky once set.
    #[serde(default)]
    pub trajectory_paths: HashMap<LevelId, PathId>,
}

impl PlayerState {
    /// Create a fresh save for the given player.
    pub fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            ..Self::default()
        }
    }

    pub fn owns_card(&self, card_id: &CardId) -> bool {
        self.owned_cards.contains(card_id)
    }

    /// Add a card to ownership. Returns `false` when it was already owned.
    pub fn grant_card(&mut self, card_id: CardId) -> bool {
        if self.owns_card(&card_id) {
            return false;
        }
        self.owned_cards.push(card_id);
        true
    }

    /// Remove a card from ownership.
    pub fn remove_card(&mut self, card_id: &CardId) {
        self.owned_cards.retain(|owned| owned != card_id);
    }

    /// Clear the equipped slot and its timestamp.
    pub fn unequip(&mut self) {
        self.equipped_card = None;
        self.equipped_at = None;
    }

    /// Current value of a named behavioral counter.
    pub fn counter(&self, name: &str) -> u32 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    /// Bump a named behavioral counter.
    pub fn increment_counter(&mut self, name: &str) {
        *self.counters.entry(name.to_string()).or_insert(0) += 1;
    }

    /// Reset a named behavioral counter to zero.
    pub fn reset_counter(&mut self, name: &str) {
        self.counters.remove(name);
    }

    /// Record one occurrence of a named action.
    pub fn record_action(&mut self, action: &str) {
        *self.actions_history.entry(action.to_string()).or_insert(0) += 1;
    }

    /// Completed sessions in a district.
    pub fn sessions_in(&self, district: &DistrictId) -> u32 {
        self.district_sessions.get(district).copied().unwrap_or(0)
    }

    pub fn is_boss_active(&self, boss_id: &BossId) -> bool {
        self.active_bosses.contains(boss_id)
    }

    /// Mark a boss active. Returns `false` when it already was.
    pub fn activate_boss(&mut self, boss_id: BossId) -> bool {
        if self.is_boss_active(&boss_id) {
            return false;
        }
        self.active_bosses.push(boss_id);
        true
    }

    pub fn deactivate_boss(&mut self, boss_id: &BossId) {
        self.active_bosses.retain(|active| active != boss_id);
    }

    /// Every blocked option id, across all active bosses.
    pub fn blocked_option_ids(&self) -> Vec<&str> {
        self.blocked_options
            .values()
            .flat_map(|blocks| blocks.iter().map(String::as_str))
            .collect()
    }

    /// Append to the session history, dropping the oldest past the cap.
    pub fn push_session(&mut self, record: SessionRecord) {
        self.session_history.push(record);
        if self.session_history.len() > SESSION_HISTORY_LIMIT {
            let excess = self.session_history.len() - SESSION_HISTORY_LIMIT;
            self.session_history.drain(..excess);
        }
    }

    /// Log a note from the agent's memory side-channel, dropping the oldest
    /// past the cap.
    pub fn log_memory(&mut self, text: impl Into<String>, timestamp: DateTime<Utc>) {
        self.agent_memory.push(MemoryNote {
            text: text.into(),
            timestamp,
        });
        if self.agent_memory.len() > AGENT_MEMORY_LIMIT {
            let excess = self.agent_memory.len() - AGENT_MEMORY_LIMIT;
            self.agent_memory.drain(..excess);
        }
    }
}
