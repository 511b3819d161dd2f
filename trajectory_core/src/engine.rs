//! Trajectory engine - the per-session state machine composing scenario
//! levels, decision trees, the card economy, and bosses.
//!
//! A session moves through a small set of cursor states: idle (no cursor),
//! level started (root node loaded), advancing node by node, and finally a
//! task trigger or a plain completion. Task completion itself arrives from
//! outside the node graph, once the caller resolves the handed-out payload.

use serde::Serialize;
use tracing::{debug, warn};

use game_content::{
    BossPreview, CardId, DistrictId, Level, LevelId, LevelPath, NodeId, PathId, PlayerState,
    PlayerStore, TaskResult, TaskSpec, TrajectoryCursor,
};

use crate::bosses::{BossDefeated, BossDirector, BossSpawned};
use crate::cards::CardCatalog;
use crate::error::EngineError;
use crate::scenario::ScenarioCatalog;
use crate::trees::{Answer, DecisionTreeCatalog, ResolvedNode, TaskTrigger, TraversalOutcome};

/// Payload handed to the external task-completion flow.
#[derive(Debug, Clone, Serialize)]
pub struct TaskPayload {
    pub level_id: Option<LevelId>,
    /// Requirements from the owning level, when one is known.
    pub spec: Option<TaskSpec>,
    /// Prompt and guidance carried from the tree's trigger node.
    pub trigger: TaskTrigger,
}

/// Result of starting a level.
#[derive(Debug, Clone, Serialize)]
pub struct LevelStarted {
    pub level: Level,
    pub path: Option<LevelPath>,
    pub next_node: Option<ResolvedNode>,
    /// Reward cards the player could still earn from this level.
    pub planned_cards: Vec<CardId>,
    pub boss_hint: Option<BossPreview>,
}

/// Classification of one advance step.
#[derive(Debug, Clone, Serialize)]
pub enum AdvanceOutcome {
    /// An intermediate node; the session continues.
    Next(ResolvedNode),
    /// A terminal trigger fired; the payload goes to the external flow.
    TaskTriggered(TaskPayload),
    /// The tree ended with no task.
    Completed,
}

/// Result of advancing the active session.
#[derive(Debug, Clone, Serialize)]
pub struct NodeAdvanced {
    pub outcome: AdvanceOutcome,
    pub boss_update: BossSweep,
}

/// Rewards actually granted by a completion. Already-owned reward cards are
/// skipped, never granted twice.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RewardBundle {
    pub stability_points: u64,
    pub effort: u64,
    pub cards: Vec<CardId>,
}

/// Result of settling a task completion.
#[derive(Debug, Clone, Serialize)]
pub struct TaskCompleted {
    pub level_completed: bool,
    pub rewards: RewardBundle,
    pub boss_update: BossSweep,
}

/// Boss changes caused by one transition.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BossSweep {
    pub spawned: Option<BossSpawned>,
    pub defeated: Vec<BossDefeated>,
}

/// Orchestrates one player's session step by step.
///
/// Every state-changing call persists through the store before returning; a
/// failed persist is logged and the in-memory state kept.
pub struct TrajectoryEngine<S: PlayerStore> {
    scenarios: ScenarioCatalog,
    trees: DecisionTreeCatalog,
    cards: CardCatalog,
    bosses: BossDirector,
    store: S,
}

impl<S: PlayerStore> TrajectoryEngine<S> {
    pub fn new(
        scenarios: ScenarioCatalog,
        trees: DecisionTreeCatalog,
        cards: CardCatalog,
        bosses: BossDirector,
        store: S,
    ) -> Self {
        Self {
            scenarios,
            trees,
            cards,
            bosses,
            store,
        }
    }

    pub fn scenarios(&self) -> &ScenarioCatalog {
        &self.scenarios
    }

    pub fn trees(&self) -> &DecisionTreeCatalog {
        &self.trees
    }

    pub fn cards(&self) -> &CardCatalog {
        &self.cards
    }

    pub fn bosses(&self) -> &BossDirector {
        &self.bosses
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Persist best-effort: a failure is logged and in-memory state stands.
    pub fn persist(&self, player: &PlayerState) -> bool {
        match self.store.save(player) {
            Ok(()) => true,
            Err(err) => {
                warn!(player = %player.player_id, %err, "persisting player state failed");
                false
            }
        }
    }

    /// Start the district's current level and load the root question,
    /// overwriting any in-progress cursor.
    ///
    /// A forking level resolves its path sticky-first: a previously recorded
    /// choice wins over `path_id`, which wins over the first declared path.
    pub fn start_level(
        &self,
        player: &mut PlayerState,
        district: &DistrictId,
        path_id: Option<&PathId>,
    ) -> Result<LevelStarted, EngineError> {
        let sessions_done = player.sessions_in(district);
        let level = self
            .scenarios
            .get_current_level(district, sessions_done + 1)
            .ok_or_else(|| EngineError::not_found("level", district.as_str()))?
            .clone();

        let path = resolve_path(&level, player, path_id);
        let tree_id = path
            .as_ref()
            .and_then(|p| p.tree_id.clone())
            .or_else(|| level.tree_id.clone());
        let next_node = tree_id
            .as_ref()
            .and_then(|id| self.trees.get_root_question(id));

        player.trajectory_state = Some(TrajectoryCursor {
            level_id: level.level_id.clone(),
            district: district.clone(),
            tree_id,
            node_id: NodeId::root(),
            path_id: path.as_ref().map(|p| p.path_id.clone()),
        });
        self.persist(player);

        debug!(level = %level.level_id, district = %district, "level started");
        Ok(LevelStarted {
            planned_cards: planned_cards(&level, path.as_ref()),
            boss_hint: self.scenarios.district_boss(district).cloned(),
            next_node,
            level,
            path,
        })
    }

    /// Record the fork choice for a level. When that level is the one in
    /// progress, the cursor snaps back to the new path's root.
    pub fn choose_path(
        &self,
        player: &mut PlayerState,
        level_id: &LevelId,
        path_id: &PathId,
    ) -> Result<LevelPath, EngineError> {
        let level = self
            .scenarios
            .get_level_by_id(level_id)
            .ok_or_else(|| EngineError::not_found("level", level_id.as_str()))?;
        if !level.fork {
            return Err(EngineError::precondition(format!(
                "level {level_id} does not fork"
            )));
        }
        let path = level
            .path(path_id)
            .ok_or_else(|| EngineError::not_found("path", path_id.as_str()))?
            .clone();

        player
            .trajectory_paths
            .insert(level_id.clone(), path_id.clone());
        if let Some(cursor) = player
            .trajectory_state
            .as_mut()
            .filter(|cursor| &cursor.level_id == level_id)
        {
            cursor.path_id = Some(path_id.clone());
            cursor.tree_id = path.tree_id.clone().or_else(|| level.tree_id.clone());
            cursor.node_id = NodeId::root();
        }
        self.persist(player);

        Ok(path)
    }

    /// Advance the active session's tree with the player's answer, then run
    /// a boss spawn check and persist.
    pub fn advance_node(
        &self,
        player: &mut PlayerState,
        answer: &Answer,
    ) -> Result<NodeAdvanced, EngineError> {
        let cursor = player
            .trajectory_state
            .clone()
            .ok_or_else(|| EngineError::precondition("no active trajectory session"))?;
        let tree_id = cursor
            .tree_id
            .clone()
            .ok_or_else(|| EngineError::precondition("active level has no decision tree"))?;

        let outcome = self.trees.traverse(&tree_id, &cursor.node_id, answer)?;

        let advance = match outcome {
            TraversalOutcome::Next(node) => {
                if let Some(state) = player.trajectory_state.as_mut() {
                    state.node_id = node.node_id.clone();
                }
                AdvanceOutcome::Next(node)
            }
            TraversalOutcome::Task(trigger) => AdvanceOutcome::TaskTriggered(
                self.build_task_payload(Some(cursor.level_id.clone()), trigger),
            ),
            TraversalOutcome::End => AdvanceOutcome::Completed,
        };

        let boss_update = self.evaluate_bosses(player, false);
        self.persist(player);

        Ok(NodeAdvanced {
            outcome: advance,
            boss_update,
        })
    }

    /// Settle an externally resolved task: validate against the owning level
    /// (explicit, or the one in progress), grant level and sticky-path
    /// rewards, then run a full boss spawn-and-defeat sweep.
    pub fn handle_task_completion(
        &self,
        player: &mut PlayerState,
        level_id: Option<&LevelId>,
        result: &TaskResult,
    ) -> TaskCompleted {
        let level_id = level_id.cloned().or_else(|| {
            player
                .trajectory_state
                .as_ref()
                .map(|cursor| cursor.level_id.clone())
        });
        let level = level_id
            .as_ref()
            .and_then(|id| self.scenarios.get_level_by_id(id))
            .cloned();
        let completion_valid = level
            .as_ref()
            .map_or(true, |level| self.scenarios.check_level_completion(level, result));

        let mut rewards = RewardBundle::default();
        if completion_valid {
            if let Some(level) = &level {
                rewards = apply_level_rewards(player, level);
                if let Some(card) = apply_path_reward(player, level) {
                    rewards.cards.push(card);
                }
                debug!(level = %level.level_id, "level completed");
            }
        }

        let boss_update = self.evaluate_bosses(player, true);
        self.persist(player);

        TaskCompleted {
            level_completed: completion_valid && level.is_some(),
            rewards,
            boss_update,
        }
    }

    fn build_task_payload(&self, level_id: Option<LevelId>, trigger: TaskTrigger) -> TaskPayload {
        let spec = level_id
            .as_ref()
            .and_then(|id| self.scenarios.get_level_by_id(id))
            .and_then(|level| level.task.clone());
        TaskPayload {
            level_id,
            spec,
            trigger,
        }
    }

    /// Spawn check on every transition; defeat sweep when settling a task.
    fn evaluate_bosses(&self, player: &mut PlayerState, check_defeat: bool) -> BossSweep {
        let mut sweep = BossSweep::default();

        if let Some(boss) = self.bosses.check_boss_spawn(player) {
            let boss_id = boss.boss_id.clone();
            if let Ok(spawned) = self.bosses.spawn_boss(&boss_id, player) {
                sweep.spawned = Some(spawned);
            }
        }

        if check_defeat {
            for boss_id in player.active_bosses.clone() {
                if self.bosses.check_defeat_conditions(&boss_id, player) {
                    if let Ok(defeated) = self.bosses.defeat_boss(&boss_id, player) {
                        sweep.defeated.push(defeated);
                    }
                }
            }
        }

        sweep
    }
}

/// Resolve a forking level's path: previously-recorded choice, else the
/// caller's, else the first declared path. The resolved choice is recorded
/// sticky for the level.
fn resolve_path(level: &Level, player: &mut PlayerState, path_id: Option<&PathId>) -> Option<LevelPath> {
    if !level.fork {
        return None;
    }

    let chosen_id = player
        .trajectory_paths
        .get(&level.level_id)
        .cloned()
        .or_else(|| path_id.cloned());
    let chosen = chosen_id
        .as_ref()
        .and_then(|id| level.path(id))
        .or_else(|| level.paths.first())?
        .clone();

    player
        .trajectory_paths
        .insert(level.level_id.clone(), chosen.path_id.clone());
    Some(chosen)
}

/// Reward cards this level could still grant on the resolved path.
fn planned_cards(level: &Level, path: Option<&LevelPath>) -> Vec<CardId> {
    let mut cards = level.rewards.cards.clone();
    if let Some(reward) = path.and_then(|p| p.reward_card.clone()) {
        cards.push(reward);
    }
    cards
}

fn apply_level_rewards(player: &mut PlayerState, level: &Level) -> RewardBundle {
    let rewards = &level.rewards;
    let mut bundle = RewardBundle {
        stability_points: rewards.stability_points,
        effort: rewards.effort,
        cards: Vec::new(),
    };

    player.stability_points += rewards.stability_points;
    player.effort += rewards.effort;
    for card_id in &rewards.cards {
        if player.grant_card(card_id.clone()) {
            bundle.cards.push(card_id.clone());
        }
    }
    bundle
}

/// Grant the sticky path's reward card, skipping cards already owned.
fn apply_path_reward(player: &mut PlayerState, level: &Level) -> Option<CardId> {
    let path_id = player.trajectory_paths.get(&level.level_id)?.clone();
    let reward = level.path(&path_id)?.reward_card.clone()?;
    player.grant_card(reward.clone()).then_some(reward)
}
