//! Scenario level definitions - the ordered content units of a district.

use serde::{Deserialize, Serialize};

use crate::boss::BossId;
use crate::card::CardId;
use crate::tree::TreeId;

/// Identifier of a content track ("district"), e.g. health or finances.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DistrictId(pub String);

impl DistrictId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DistrictId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a scenario level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LevelId(pub String);

impl LevelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LevelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one path of a forking level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathId(pub String);

impl PathId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PathId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inclusive completed-session range gating a level, declared as `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct SessionRange {
    pub min: u32,
    pub max: u32,
}

impl SessionRange {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, sessions: u32) -> bool {
        self.min <= sessions && sessions <= self.max
    }
}

impl From<[u32; 2]> for SessionRange {
    fn from([min, max]: [u32; 2]) -> Self {
        Self { min, max }
    }
}

impl From<SessionRange> for [u32; 2] {
    fn from(range: SessionRange) -> Self {
        [range.min, range.max]
    }
}

/// Task attached to a level, validated when the external flow reports it
/// done. Unknown task types are rejected when content loads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskSpec {
    /// Free-text journaling with a minimum word count.
    Reflection {
        #[serde(default = "default_min_words")]
        min_words: usize,
        #[serde(default)]
        prompt: Option<String>,
    },
    /// Timed exercise; the client reports completion.
    Timer {
        #[serde(default)]
        duration_minutes: Option<u32>,
    },
    /// A decision between presented options.
    Choice {
        #[serde(default)]
        options: Vec<String>,
    },
    /// A list of items with a minimum count to submit.
    Checklist {
        #[serde(default = "default_checklist_items")]
        required_items: usize,
    },
}

fn default_min_words() -> usize {
    10
}

fn default_checklist_items() -> usize {
    1
}

impl TaskSpec {
    pub fn kind(&self) -> TaskKind {
        match self {
            TaskSpec::Reflection { .. } => TaskKind::Reflection,
            TaskSpec::Timer { .. } => TaskKind::Timer,
            TaskSpec::Choice { .. } => TaskKind::Choice,
            TaskSpec::Checklist { .. } => TaskKind::Checklist,
        }
    }
}

/// Discriminant of [`TaskSpec`], carried in task payloads and tree triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Reflection,
    Timer,
    Choice,
    Checklist,
}

/// Free-form result the caller submits once a task resolves. Its shape must
/// match the task type to validate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskResult {
    Reflection { text: String },
    Timer { completed: bool },
    Choice { choice: String },
    Checklist { items: Vec<String> },
}

/// Rewards granted when a level completes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LevelRewards {
    #[serde(default)]
    pub stability_points: u64,
    #[serde(default)]
    pub effort: u64,
    #[serde(default)]
    pub cards: Vec<CardId>,
}

/// One branch of a forking level. Sticky once chosen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelPath {
    pub path_id: PathId,
    #[serde(default)]
    pub name: Option<String>,
    /// Overrides the level's decision tree when present.
    #[serde(default)]
    pub tree_id: Option<TreeId>,
    /// Extra card granted when the level completes on this path.
    #[serde(default)]
    pub reward_card: Option<CardId>,
}

/// Immutable content record of one scenario level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    pub level_id: LevelId,
    /// Owning track.
    pub district: DistrictId,
    /// Completed-session counts during which this level is current.
    pub sessions_required: SessionRange,
    /// Narrative act this level belongs to.
    #[serde(default)]
    pub act: Option<u32>,
    #[serde(default)]
    pub tree_id: Option<TreeId>,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub paths: Vec<LevelPath>,
    #[serde(default)]
    pub task: Option<TaskSpec>,
    #[serde(default)]
    pub rewards: LevelRewards,
}

impl Level {
    pub fn path(&self, path_id: &PathId) -> Option<&LevelPath> {
        self.paths.iter().find(|p| &p.path_id == path_id)
    }
}

/// Flavor preview of a district's boss, shown when a level starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BossPreview {
    pub boss_id: BossId,
    pub name: String,
    #[serde(default)]
    pub taunt: Option<String>,
}

/// Contents of one district's scenario file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistrictScenario {
    #[serde(default)]
    pub philosophy: String,
    #[serde(default)]
    pub boss: Option<BossPreview>,
    #[serde(default)]
    pub levels: Vec<Level>,
}

impl DistrictScenario {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
