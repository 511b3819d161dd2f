//! Player store - persistence seam for the save model.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use thiserror::Error;

use crate::player::{PlayerId, PlayerState};

/// Errors from the player store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("save io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("save serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Load/save seam the engine persists through after every state change.
pub trait PlayerStore {
    /// Load a player's save, or a fresh default save when none exists.
    fn load(&self, player_id: PlayerId) -> Result<PlayerState, StorageError>;

    /// Persist the save. Callers treat failures as best-effort; in-memory
    /// state is not rolled back.
    fn save(&self, state: &PlayerState) -> Result<(), StorageError>;
}

fn new_player(player_id: PlayerId) -> PlayerState {
    let mut state = PlayerState::new(player_id);
    state.created_at = Some(Utc::now());
    state
}

/// One pretty-printed JSON file per player under a saves directory. The
/// directory is created on first save; older saves fill missing fields from
/// defaults on load.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn save_path(&self, player_id: PlayerId) -> PathBuf {
        self.dir.join(format!("{player_id}.json"))
    }
}

impl PlayerStore for JsonFileStore {
    fn load(&self, player_id: PlayerId) -> Result<PlayerState, StorageError> {
        let path = self.save_path(player_id);
        if !path.exists() {
            return Ok(new_player(player_id));
        }
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, state: &PlayerState) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        let raw = serde_json::to_string_pretty(state)?;
        fs::write(self.save_path(state.player_id), raw)?;
        Ok(())
    }
}

/// In-memory store for tests and ephemeral play.
#[derive(Default)]
pub struct MemoryStore {
    saves: RefCell<HashMap<PlayerId, PlayerState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlayerStore for MemoryStore {
    fn load(&self, player_id: PlayerId) -> Result<PlayerState, StorageError> {
        Ok(self
            .saves
            .borrow()
            .get(&player_id)
            .cloned()
            .unwrap_or_else(|| new_player(player_id)))
    }

    fn save(&self, state: &PlayerState) -> Result<(), StorageError> {
        self.saves
            .borrow_mut()
            .insert(state.player_id, state.clone());
        Ok(())
    }
}
