//! Boss mechanics - spawn triggers, active effects, defeat conditions.

use std::collections::HashMap;

use serde::Serialize;
use tracing::info;

use game_content::{Boss, BossId, BossSet, BossTrigger, DefeatCondition, DistrictId, PlayerState};

use crate::error::EngineError;

/// Stability points granted for any boss defeat.
pub const BOSS_DEFEAT_STABILITY: u64 = 20;

/// Effort granted for any boss defeat.
pub const BOSS_DEFEAT_EFFORT: u64 = 5;

/// Summary of a freshly spawned boss.
#[derive(Debug, Clone, Serialize)]
pub struct BossSpawned {
    pub boss: Boss,
    pub message: Option<String>,
}

/// Fixed reward credited by a defeat.
#[derive(Debug, Clone, Serialize)]
pub struct BossReward {
    pub stability_points: u64,
    pub effort: u64,
    pub achievement: String,
}

/// Summary of a defeated boss.
#[derive(Debug, Clone, Serialize)]
pub struct BossDefeated {
    pub boss: Boss,
    pub message: Option<String>,
    pub rewards: BossReward,
}

/// Read-only boss lookup plus spawn/defeat evaluation.
///
/// Declaration order is preserved: the first declared boss whose trigger
/// holds is the one that spawns.
#[derive(Debug, Clone, Default)]
pub struct BossDirector {
    bosses: Vec<Boss>,
    by_id: HashMap<BossId, usize>,
}

impl BossDirector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_boss_set(set: BossSet) -> Self {
        let mut director = Self::new();
        for boss in set.bosses {
            director.insert_boss(boss);
        }
        director
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::from_boss_set(BossSet::from_json_str(json)?))
    }

    /// Register a boss, keeping its declaration position on re-registration.
    pub fn insert_boss(&mut self, boss: Boss) {
        if let Some(&index) = self.by_id.get(&boss.boss_id) {
            self.bosses[index] = boss;
        } else {
            self.by_id.insert(boss.boss_id.clone(), self.bosses.len());
            self.bosses.push(boss);
        }
    }

    pub fn get_boss(&self, boss_id: &BossId) -> Option<&Boss> {
        self.by_id.get(boss_id).map(|&index| &self.bosses[index])
    }

    /// First boss, in declaration order, whose trigger currently holds and
    /// which is not already active. Re-running with unchanged state keeps
    /// skipping active bosses.
    pub fn check_boss_spawn(&self, player: &PlayerState) -> Option<&Boss> {
        self.bosses
            .iter()
            .filter(|boss| !player.is_boss_active(&boss.boss_id))
            .find(|boss| trigger_holds(&boss.trigger, player))
    }

    /// Mark a boss active and apply its effects. An already-active boss is
    /// never re-triggered.
    pub fn spawn_boss(
        &self,
        boss_id: &BossId,
        player: &mut PlayerState,
    ) -> Result<BossSpawned, EngineError> {
        let boss = self
            .get_boss(boss_id)
            .ok_or_else(|| EngineError::not_found("boss", boss_id.as_str()))?;

        if player.is_boss_active(boss_id) {
            return Err(EngineError::precondition(format!(
                "boss {boss_id} is already active"
            )));
        }

        player.activate_boss(boss_id.clone());
        apply_boss_effects(boss, player);
        info!(boss = %boss_id, "boss spawned");

        Ok(BossSpawned {
            boss: boss.clone(),
            message: boss.dialogue.appearance.clone(),
        })
    }

    /// Whether any declared defeat condition holds.
    pub fn check_defeat_conditions(&self, boss_id: &BossId, player: &PlayerState) -> bool {
        let Some(boss) = self.get_boss(boss_id) else {
            return false;
        };
        boss.defeat_conditions
            .iter()
            .any(|condition| defeat_condition_holds(condition, player))
    }

    /// Clear an active boss: drop its penalty and its blocked options, credit
    /// the fixed reward, and unlock the endgame after a finale boss.
    pub fn defeat_boss(
        &self,
        boss_id: &BossId,
        player: &mut PlayerState,
    ) -> Result<BossDefeated, EngineError> {
        let boss = self
            .get_boss(boss_id)
            .ok_or_else(|| EngineError::not_found("boss", boss_id.as_str()))?;

        player.deactivate_boss(boss_id);
        player.boss_penalties.remove(boss_id);
        player.blocked_options.remove(boss_id);

        let achievement = format!("defeated_{boss_id}");
        player.stability_points += BOSS_DEFEAT_STABILITY;
        player.effort += BOSS_DEFEAT_EFFORT;
        if !player.achievements.contains(&achievement) {
            player.achievements.push(achievement.clone());
        }
        if boss.finale {
            player.endgame_unlocked = true;
        }

        info!(boss = %boss_id, finale = boss.finale, "boss defeated");
        Ok(BossDefeated {
            boss: boss.clone(),
            message: boss.dialogue.defeat.clone(),
            rewards: BossReward {
                stability_points: BOSS_DEFEAT_STABILITY,
                effort: BOSS_DEFEAT_EFFORT,
                achievement,
            },
        })
    }
}

fn trigger_holds(trigger: &BossTrigger, player: &PlayerState) -> bool {
    match trigger {
        BossTrigger::Pattern { counter, threshold } => player.counter(counter) >= *threshold,
        BossTrigger::Milestone {
            level_floor,
            acts_completed,
        } => {
            player
                .districts
                .values()
                .all(|district| district.level >= *level_floor)
                && player.acts_completed >= *acts_completed
        }
    }
}

fn defeat_condition_holds(condition: &DefeatCondition, player: &PlayerState) -> bool {
    match condition {
        DefeatCondition::Series { counter, count } => player.counter(counter) >= *count,
        DefeatCondition::Card { card_id } => player.last_card_used.as_ref() == Some(card_id),
        DefeatCondition::FullSession { district } => {
            player.last_session_district.as_ref() == Some(district)
        }
    }
}

fn apply_boss_effects(boss: &Boss, player: &mut PlayerState) {
    let effects = &boss.effects;

    if let Some(penalty) = effects.penalty {
        player.boss_penalties.insert(boss.boss_id.clone(), penalty);
    }

    if let Some(increase) = effects.fog_increase {
        let affected: Vec<DistrictId> = match &effects.districts_affected {
            Some(districts) => districts.clone(),
            None => player.districts.keys().cloned().collect(),
        };
        for district in affected {
            let progress = player.districts.entry(district).or_default();
            progress.fog = (progress.fog + increase).min(1.0);
        }
    }

    if !effects.blocks.is_empty() {
        player
            .blocked_options
            .entry(boss.boss_id.clone())
            .or_default()
            .extend(effects.blocks.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_content::{CardId, DistrictProgress, PlayerId};

    fn sample_director() -> BossDirector {
        BossDirector::from_json_str(
            r#"{
                "bosses": [
                    {
                        "boss_id": "burnout",
                        "name": "The Burnout",
                        "trigger": {"type": "pattern", "counter": "sessions_without_rest", "threshold": 3},
                        "effects": {"penalty": 5, "fog_increase": 0.3, "districts_affected": ["oasis"], "blocks": ["skip_rest"]},
                        "defeat_conditions": [
                            {"type": "series", "counter": "rest_series", "count": 2},
                            {"type": "full_session", "district": "oasis"}
                        ],
                        "dialogue": {"appearance": "You never stop, do you?", "defeat": "Rest won."}
                    },
                    {
                        "boss_id": "comparison",
                        "name": "The Mirror",
                        "trigger": {"type": "pattern", "counter": "comparison_thoughts"},
                        "effects": {"blocks": ["scroll_feed"]},
                        "defeat_conditions": [{"type": "card", "card_id": "compass"}]
                    },
                    {
                        "boss_id": "gray_king",
                        "name": "The Gray King",
                        "trigger": {"type": "milestone", "level_floor": 3, "acts_completed": 2},
                        "finale": true,
                        "defeat_conditions": [{"type": "series", "counter": "clarity_series", "count": 1}]
                    }
                ]
            }"#,
        )
        .unwrap()
    }

    fn player() -> PlayerState {
        PlayerState::new(PlayerId::new())
    }

    #[test]
    fn test_pattern_trigger_threshold() {
        let director = sample_director();
        let mut player = player();

        assert!(director.check_boss_spawn(&player).is_none());

        for _ in 0..3 {
            player.increment_counter("sessions_without_rest");
        }
        let boss = director.check_boss_spawn(&player).unwrap();
        assert_eq!(boss.boss_id, BossId::new("burnout"));
    }

    #[test]
    fn test_spawn_check_skips_active_bosses() {
        let director = sample_director();
        let mut player = player();
        for _ in 0..3 {
            player.increment_counter("sessions_without_rest");
        }

        let boss_id = director.check_boss_spawn(&player).unwrap().boss_id.clone();
        director.spawn_boss(&boss_id, &mut player).unwrap();

        // Unchanged state never spawns the same boss twice.
        assert!(director.check_boss_spawn(&player).is_none());
        let err = director.spawn_boss(&boss_id, &mut player).unwrap_err();
        assert!(matches!(err, EngineError::Precondition(_)));
        assert_eq!(player.active_bosses.len(), 1);
    }

    #[test]
    fn test_declaration_order_breaks_ties() {
        let director = sample_director();
        let mut player = player();
        for _ in 0..3 {
            player.increment_counter("sessions_without_rest");
            player.increment_counter("comparison_thoughts");
        }

        let first = director.check_boss_spawn(&player).unwrap();
        assert_eq!(first.boss_id, BossId::new("burnout"));

        director
            .spawn_boss(&BossId::new("burnout"), &mut player)
            .unwrap();
        let second = director.check_boss_spawn(&player).unwrap();
        assert_eq!(second.boss_id, BossId::new("comparison"));
    }

    #[test]
    fn test_spawn_applies_effects() {
        let director = sample_director();
        let mut player = player();
        player
            .districts
            .insert(DistrictId::new("oasis"), DistrictProgress::default());

        director
            .spawn_boss(&BossId::new("burnout"), &mut player)
            .unwrap();

        assert_eq!(
            player.boss_penalties.get(&BossId::new("burnout")),
            Some(&5)
        );
        let oasis = &player.districts[&DistrictId::new("oasis")];
        assert!((oasis.fog - 0.3).abs() < f32::EPSILON);
        assert_eq!(player.blocked_option_ids(), vec!["skip_rest"]);
    }

    #[test]
    fn test_fog_increase_defaults_to_every_district() {
        let mut director = sample_director();
        let mut player = player();
        player
            .districts
            .insert(DistrictId::new("oasis"), DistrictProgress::default());
        player
            .districts
            .insert(DistrictId::new("citadel"), DistrictProgress::default());

        // A boss with fog but no explicit district list.
        director.insert_boss(
            serde_json::from_str(
                r#"{
                    "boss_id": "fogbank",
                    "name": "The Fogbank",
                    "trigger": {"type": "pattern", "counter": "fog_thoughts"},
                    "effects": {"fog_increase": 0.2}
                }"#,
            )
            .unwrap(),
        );

        director
            .spawn_boss(&BossId::new("fogbank"), &mut player)
            .unwrap();
        for progress in player.districts.values() {
            assert!((progress.fog - 0.2).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn test_milestone_trigger_needs_floor_and_acts() {
        let director = sample_director();
        let mut player = player();
        player.districts.insert(
            DistrictId::new("oasis"),
            DistrictProgress {
                level: 3,
                ..DistrictProgress::default()
            },
        );
        player.districts.insert(
            DistrictId::new("citadel"),
            DistrictProgress {
                level: 2,
                ..DistrictProgress::default()
            },
        );
        player.acts_completed = 2;

        assert!(director.check_boss_spawn(&player).is_none());

        player
            .districts
            .get_mut(&DistrictId::new("citadel"))
            .unwrap()
            .level = 4;
        let boss = director.check_boss_spawn(&player).unwrap();
        assert_eq!(boss.boss_id, BossId::new("gray_king"));

        player.acts_completed = 1;
        assert!(director.check_boss_spawn(&player).is_none());
    }

    #[test]
    fn test_defeat_conditions_are_or_semantics() {
        let director = sample_director();
        let mut player = player();
        let burnout = BossId::new("burnout");

        assert!(!director.check_defeat_conditions(&burnout, &player));

        player.last_session_district = Some(DistrictId::new("oasis"));
        assert!(director.check_defeat_conditions(&burnout, &player));

        player.last_session_district = None;
        player.increment_counter("rest_series");
        player.increment_counter("rest_series");
        assert!(director.check_defeat_conditions(&burnout, &player));
    }

    #[test]
    fn test_card_defeat_condition_matches_last_used() {
        let director = sample_director();
        let mut player = player();
        let mirror = BossId::new("comparison");

        player.last_card_used = Some(CardId::new("breath"));
        assert!(!director.check_defeat_conditions(&mirror, &player));

        player.last_card_used = Some(CardId::new("compass"));
        assert!(director.check_defeat_conditions(&mirror, &player));
    }

    #[test]
    fn test_defeat_clears_only_this_bosss_blocks() {
        let director = sample_director();
        let mut player = player();
        for _ in 0..3 {
            player.increment_counter("sessions_without_rest");
            player.increment_counter("comparison_thoughts");
        }
        director
            .spawn_boss(&BossId::new("burnout"), &mut player)
            .unwrap();
        director
            .spawn_boss(&BossId::new("comparison"), &mut player)
            .unwrap();

        let defeated = director
            .defeat_boss(&BossId::new("burnout"), &mut player)
            .unwrap();

        assert_eq!(defeated.rewards.stability_points, BOSS_DEFEAT_STABILITY);
        assert_eq!(defeated.message.as_deref(), Some("Rest won."));
        assert!(!player.is_boss_active(&BossId::new("burnout")));
        assert!(player.is_boss_active(&BossId::new("comparison")));
        assert!(player.boss_penalties.is_empty());
        // The other boss keeps its blocks.
        assert_eq!(player.blocked_option_ids(), vec!["scroll_feed"]);
        assert_eq!(player.stability_points, BOSS_DEFEAT_STABILITY);
        assert_eq!(player.effort, BOSS_DEFEAT_EFFORT);
        assert_eq!(player.achievements, vec!["defeated_burnout".to_string()]);
    }

    #[test]
    fn test_finale_defeat_unlocks_endgame() {
        let director = sample_director();
        let mut player = player();

        player.activate_boss(BossId::new("comparison"));
        director
            .defeat_boss(&BossId::new("comparison"), &mut player)
            .unwrap();
        assert!(!player.endgame_unlocked);

        player.activate_boss(BossId::new("gray_king"));
        director
            .defeat_boss(&BossId::new("gray_king"), &mut player)
            .unwrap();
        assert!(player.endgame_unlocked);
        assert!(!player.is_boss_active(&BossId::new("gray_king")));
    }
}
