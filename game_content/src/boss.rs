//! Boss definitions - narrative obstacles with triggers and defeat paths.

use serde::{Deserialize, Serialize};

use crate::card::CardId;
use crate::level::DistrictId;

/// Identifier of a boss.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BossId(pub String);

impl BossId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BossId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// When a boss appears. Unknown trigger types are rejected when content
/// loads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BossTrigger {
    /// A named behavioral counter crossed a threshold.
    Pattern {
        counter: String,
        #[serde(default = "default_pattern_threshold")]
        threshold: u32,
    },
    /// Structural milestone: every district at or above a level floor and
    /// enough narrative acts completed.
    Milestone {
        level_floor: u32,
        #[serde(default)]
        acts_completed: u32,
    },
}

fn default_pattern_threshold() -> u32 {
    3
}

/// Effects laid on the player while a boss is active.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BossEffects {
    /// Reward penalty recorded against the boss.
    #[serde(default)]
    pub penalty: Option<i64>,
    #[serde(default)]
    pub fog_increase: Option<f32>,
    /// Districts the fog increase hits; absent means every district.
    #[serde(default)]
    pub districts_affected: Option<Vec<DistrictId>>,
    /// Option identifiers blocked while the boss is active.
    #[serde(default)]
    pub blocks: Vec<String>,
}

/// One way to defeat a boss; any satisfied condition wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DefeatCondition {
    /// A named streak counter reached the required count.
    Series { counter: String, count: u32 },
    /// A specific card was the last one activated.
    Card { card_id: CardId },
    /// The last completed session happened in the given district.
    FullSession { district: DistrictId },
}

/// Boss flavor lines.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BossDialogue {
    #[serde(default)]
    pub appearance: Option<String>,
    #[serde(default)]
    pub defeat: Option<String>,
}

/// Immutable content record of one boss.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boss {
    pub boss_id: BossId,
    pub name: String,
    pub trigger: BossTrigger,
    #[serde(default)]
    pub effects: BossEffects,
    #[serde(default)]
    pub defeat_conditions: Vec<DefeatCondition>,
    /// Defeating a finale boss unlocks the endgame mode.
    #[serde(default)]
    pub finale: bool,
    #[serde(default)]
    pub dialogue: BossDialogue,
}

/// Contents of the boss content file. Declaration order matters: the first
/// declared boss whose trigger holds is the one that spawns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BossSet {
    #[serde(default)]
    pub bosses: Vec<Boss>,
}

impl BossSet {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_trigger_default_threshold() {
        let trigger: BossTrigger = serde_json::from_str(
            r#"{"type": "pattern", "counter": "sessions_without_rest"}"#,
        )
        .unwrap();
        assert!(matches!(
            trigger,
            BossTrigger::Pattern { threshold: 3, .. }
        ));
    }

    #[test]
    fn test_unknown_trigger_type_is_rejected() {
        let parsed: Result<BossTrigger, _> = serde_json::from_str(r#"{"type": "eclipse"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_boss_set_from_json() {
        let set = BossSet::from_json_str(
            r#"{
                "bosses": [
                    {
                        "boss_id": "burnout",
                        "name": "The Burnout",
                        "trigger": {"type": "pattern", "counter": "sessions_without_rest", "threshold": 4},
                        "effects": {"penalty": 5, "fog_increase": 0.3, "blocks": ["skip_rest"]},
                        "defeat_conditions": [
                            {"type": "series", "counter": "rest_series", "count": 2},
                            {"type": "full_session", "district": "oasis"}
                        ],
                        "dialogue": {"appearance": "You never stop, do you?"}
                    }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(set.bosses.len(), 1);
        let boss = &set.bosses[0];
        assert!(!boss.finale);
        assert_eq!(boss.defeat_conditions.len(), 2);
        assert_eq!(boss.effects.blocks, vec!["skip_rest".to_string()]);
    }
}
