//! Game tuning constants, loaded from TOML.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Tunable game constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Hours a player must wait between sessions. Zero disables the gate.
    pub session_cooldown_hours: u32,
    /// Base stability points granted per completed session.
    pub points_per_session: u64,
    /// Stability points at which locked districts open.
    pub unlock_threshold: u64,
    /// Directory player save files live in.
    pub saves_dir: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            session_cooldown_hours: 0,
            points_per_session: 15,
            unlock_threshold: 50,
            saves_dir: PathBuf::from("data/saves"),
        }
    }
}

impl GameConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.session_cooldown_hours, 0);
        assert_eq!(config.points_per_session, 15);
        assert_eq!(config.unlock_threshold, 50);
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config = GameConfig::from_toml_str("session_cooldown_hours = 8\n").unwrap();
        assert_eq!(config.session_cooldown_hours, 8);
        assert_eq!(config.points_per_session, 15);
    }
}
