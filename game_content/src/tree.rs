//! Decision tree definitions - the branching question graphs of a session.

use std::collections::HashMap;

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::level::TaskKind;

/// Identifier of a decision tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreeId(pub String);

impl TreeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TreeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a node inside a tree. `root` is reserved for the tree's
/// dedicated root node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn root() -> Self {
        Self("root".to_string())
    }

    pub fn is_root(&self) -> bool {
        self.0 == "root"
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Option presented by a `choice` node. An answer matches by exact text or
/// by explicit option id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub text: String,
    #[serde(default)]
    pub id: Option<String>,
    /// Absent `next` ends the tree.
    #[serde(default)]
    pub next: Option<NodeId>,
}

impl ChoiceOption {
    pub fn matches(&self, answer: &str) -> bool {
        self.text == answer || self.id.as_deref() == Some(answer)
    }
}

/// Inclusive numeric range of a `scale` node, declared as a `"min-max"` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleBranch {
    pub min: i64,
    pub max: i64,
    pub next: NodeId,
}

impl ScaleBranch {
    pub fn contains(&self, value: i64) -> bool {
        self.min <= value && value <= self.max
    }
}

fn branches_from_map<'de, D>(deserializer: D) -> Result<Vec<ScaleBranch>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: HashMap<String, NodeId> = HashMap::deserialize(deserializer)?;
    let mut branches = Vec::with_capacity(raw.len());
    for (key, next) in raw {
        let (min, max) = key
            .split_once('-')
            .ok_or_else(|| D::Error::custom(format!("scale range `{key}` is not `min-max`")))?;
        let min = min
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("scale range `{key}` has a non-numeric bound")))?;
        let max = max
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("scale range `{key}` has a non-numeric bound")))?;
        branches.push(ScaleBranch { min, max, next });
    }
    Ok(branches)
}

fn branches_to_map<S>(branches: &[ScaleBranch], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(branches.len()))?;
    for branch in branches {
        map.serialize_entry(&format!("{}-{}", branch.min, branch.max), &branch.next)?;
    }
    map.end()
}

/// Where a `reflection` node leads: straight into a task trigger, or on to
/// another node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReflectionTarget {
    Task,
    Node(NodeId),
}

impl From<String> for ReflectionTarget {
    fn from(raw: String) -> Self {
        if raw == "task" {
            ReflectionTarget::Task
        } else {
            ReflectionTarget::Node(NodeId(raw))
        }
    }
}

impl From<ReflectionTarget> for String {
    fn from(target: ReflectionTarget) -> Self {
        match target {
            ReflectionTarget::Task => "task".to_string(),
            ReflectionTarget::Node(id) => id.0,
        }
    }
}

/// A single node of a decision tree, tagged by `type` in content files.
/// Unknown node types are rejected when content loads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    /// Fixed options; the answer picks one.
    Choice {
        text: String,
        options: Vec<ChoiceOption>,
    },
    /// Numeric answer routed through inclusive ranges, with an optional
    /// fallback for answers outside every range.
    Scale {
        text: String,
        #[serde(
            default,
            deserialize_with = "branches_from_map",
            serialize_with = "branches_to_map"
        )]
        branches: Vec<ScaleBranch>,
        #[serde(default)]
        next: Option<NodeId>,
    },
    /// Terminal node that hands a task to the external completion flow.
    TaskTrigger {
        #[serde(default)]
        task_kind: Option<TaskKind>,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        duration: Option<u32>,
        #[serde(default)]
        guidance: Option<String>,
    },
    /// A prompt that ignores the answer and leads on.
    Reflection {
        text: String,
        leads_to: ReflectionTarget,
    },
    /// Free-text question with literal fallback options checked first.
    OpenOrChoice {
        text: String,
        #[serde(default)]
        fallback_options: Vec<ChoiceOption>,
        #[serde(default)]
        next: Option<NodeId>,
    },
}

/// A branching question graph with a dedicated root node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub root: Node,
    #[serde(default)]
    pub nodes: HashMap<NodeId, Node>,
}

impl DecisionTree {
    /// Look up a node by id; `root` resolves to the dedicated root node.
    pub fn node(&self, node_id: &NodeId) -> Option<&Node> {
        if node_id.is_root() {
            Some(&self.root)
        } else {
            self.nodes.get(node_id)
        }
    }
}

/// Contents of the decision tree content file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeSet {
    #[serde(default)]
    pub trees: HashMap<TreeId, DecisionTree>,
}

impl TreeSet {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
