//! Card definitions - unlockable bonuses bought with effort.

use serde::{Deserialize, Serialize};

use crate::level::{DistrictId, LevelId};

/// Identifier of a card.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardId(pub String);

impl CardId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a card behaves once activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    /// Single-use consumable, removed on activation.
    Skill,
    /// Multi-session card with a remaining-uses counter.
    Relic,
    /// Permanent once unlocked.
    Permanent,
}

/// Declarative condition gating a card unlock. Unknown condition types are
/// rejected when content loads; a card without a condition is always
/// unlockable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UnlockCondition {
    /// A named action performed at least `count` times.
    Action {
        action: String,
        #[serde(default = "default_action_count")]
        count: u32,
    },
    /// Completed-session count in a district.
    SessionsInDistrict { district: DistrictId, count: u32 },
    /// A specific level completed.
    CompleteLevel { level: LevelId },
    /// Accumulated stability points.
    StabilityPoints { amount: u64 },
    /// A contract finished.
    ContractCompletion { contract: String },
    /// Logical AND over sub-conditions.
    Combined { conditions: Vec<UnlockCondition> },
}

fn default_action_count() -> u32 {
    1
}

/// Fog cleared from a district. The card economy only reports this delta;
/// the district-visual subsystem applies it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FogReduction {
    /// Absent district means "everywhere".
    #[serde(default)]
    pub district: Option<DistrictId>,
    #[serde(default = "default_fog_amount")]
    pub amount: f32,
}

fn default_fog_amount() -> f32 {
    1.0
}

/// Effect payload applied when a card is activated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardEffect {
    #[serde(default)]
    pub stability_points: Option<u64>,
    #[serde(default)]
    pub fog_reduction: Option<FogReduction>,
}

/// Immutable content record of one card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub card_id: CardId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CardKind,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub unlock_condition: Option<UnlockCondition>,
    #[serde(default = "default_effort_cost")]
    pub effort_cost: u64,
    /// Uses a relic starts with once first activated.
    #[serde(default)]
    pub duration_sessions: Option<u32>,
    #[serde(default)]
    pub effect: CardEffect,
}

fn default_effort_cost() -> u64 {
    1
}

/// Contents of the card content file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardSet {
    #[serde(default)]
    pub cards: Vec<Card>,
}

impl CardSet {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_defaults() {
        let card: Card = serde_json::from_str(
            r#"{"card_id": "breath", "name": "Steady Breath", "type": "skill"}"#,
        )
        .unwrap();

        assert_eq!(card.kind, CardKind::Skill);
        assert_eq!(card.effort_cost, 1);
        assert!(card.unlock_condition.is_none());
        assert!(card.effect.stability_points.is_none());
    }

    #[test]
    fn test_combined_condition_nests() {
        let condition: UnlockCondition = serde_json::from_str(
            r#"{
                "type": "combined",
                "conditions": [
                    {"type": "action", "action": "morning_walk", "count": 3},
                    {"type": "stability_points", "amount": 25}
                ]
            }"#,
        )
        .unwrap();

        let UnlockCondition::Combined { conditions } = condition else {
            panic!("expected a combined condition");
        };
        assert_eq!(conditions.len(), 2);
        assert!(matches!(
            conditions[0],
            UnlockCondition::Action { ref action, count: 3 } if action == "morning_walk"
        ));
    }

    #[test]
    fn test_unknown_condition_type_is_rejected() {
        let parsed: Result<UnlockCondition, _> =
            serde_json::from_str(r#"{"type": "phase_of_moon"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_card_set_from_json() {
        let set = CardSet::from_json_str(
            r#"{
                "cards": [
                    {
                        "card_id": "lantern",
                        "name": "Old Lantern",
                        "type": "relic",
                        "duration_sessions": 2,
                        "effect": {"fog_reduction": {"district": "oasis", "amount": 0.2}}
                    }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(set.cards.len(), 1);
        let fog = set.cards[0].effect.fog_reduction.as_ref().unwrap();
        assert_eq!(fog.district, Some(DistrictId::new("oasis")));
        assert!((fog.amount - 0.2).abs() < f32::EPSILON);
    }
}
