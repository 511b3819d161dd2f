//! Decision tree catalog - node lookup and answer-driven traversal.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use game_content::{
    ChoiceOption, DecisionTree, Node, NodeId, ReflectionTarget, TaskKind, TreeId, TreeSet,
};

use crate::error::EngineError;

/// Player answer driving one traversal step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Number(i64),
    Text(String),
}

impl Answer {
    pub fn text(raw: impl Into<String>) -> Self {
        Self::Text(raw.into())
    }

    pub fn number(value: i64) -> Self {
        Self::Number(value)
    }

    fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(raw) => Some(raw),
            Self::Number(_) => None,
        }
    }

    /// Numeric reading of the answer; text parses leniently.
    fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(raw) => raw.trim().parse().ok(),
        }
    }
}

/// A node handed back to callers: the stored content stays untouched, its id
/// rides alongside a copy.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedNode {
    pub node_id: NodeId,
    pub node: Node,
}

/// Task metadata carried out of a tree when a terminal trigger fires. A
/// reflection that leads straight to a task carries no metadata of its own.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskTrigger {
    pub task_kind: Option<TaskKind>,
    pub text: Option<String>,
    pub duration: Option<u32>,
    pub guidance: Option<String>,
}

/// Outcome of one traversal step.
#[derive(Debug, Clone, Serialize)]
pub enum TraversalOutcome {
    /// The session continues at this node.
    Next(ResolvedNode),
    /// A terminal task trigger fired.
    Task(TaskTrigger),
    /// The tree ended with no task.
    End,
}

/// Read-only lookup over every decision tree.
#[derive(Debug, Clone, Default)]
pub struct DecisionTreeCatalog {
    trees: HashMap<TreeId, DecisionTree>,
}

impl DecisionTreeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tree_set(set: TreeSet) -> Self {
        Self { trees: set.trees }
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::from_tree_set(TreeSet::from_json_str(json)?))
    }

    pub fn insert_tree(&mut self, tree_id: TreeId, tree: DecisionTree) {
        self.trees.insert(tree_id, tree);
    }

    pub fn get_tree(&self, tree_id: &TreeId) -> Option<&DecisionTree> {
        self.trees.get(tree_id)
    }

    /// Root question of a tree, annotated with its id.
    pub fn get_root_question(&self, tree_id: &TreeId) -> Option<ResolvedNode> {
        self.get_node(tree_id, &NodeId::root())
    }

    /// Copy-on-read node lookup: returns a clone annotated with `node_id`.
    pub fn get_node(&self, tree_id: &TreeId, node_id: &NodeId) -> Option<ResolvedNode> {
        let node = self.trees.get(tree_id)?.node(node_id)?;
        Some(ResolvedNode {
            node_id: node_id.clone(),
            node: node.clone(),
        })
    }

    /// Advance from `node_id` using `answer`.
    ///
    /// `NotFound` covers a missing tree or node and an answer no branch
    /// accepts; `Validation` covers a non-numeric answer to a scale node.
    pub fn traverse(
        &self,
        tree_id: &TreeId,
        node_id: &NodeId,
        answer: &Answer,
    ) -> Result<TraversalOutcome, EngineError> {
        let current = self
            .get_node(tree_id, node_id)
            .ok_or_else(|| EngineError::not_found("node", format!("{tree_id}/{node_id}")))?;

        match current.node {
            Node::Choice { ref options, .. } => self.follow_option(tree_id, options, answer),
            Node::Scale {
                ref branches,
                ref next,
                ..
            } => {
                let value = answer.as_number().ok_or_else(|| {
                    EngineError::validation("scale answer must be numeric".to_string())
                })?;
                if let Some(branch) = branches.iter().find(|branch| branch.contains(value)) {
                    return self.resolve_next(tree_id, &branch.next);
                }
                match next {
                    Some(next) => self.resolve_next(tree_id, next),
                    None => Err(EngineError::not_found("branch", value.to_string())),
                }
            }
            Node::TaskTrigger {
                task_kind,
                text,
                duration,
                guidance,
            } => Ok(TraversalOutcome::Task(TaskTrigger {
                task_kind,
                text,
                duration,
                guidance,
            })),
            Node::Reflection { ref leads_to, .. } => match leads_to {
                ReflectionTarget::Task => Ok(TraversalOutcome::Task(TaskTrigger::default())),
                ReflectionTarget::Node(next) => self.resolve_next(tree_id, next),
            },
            Node::OpenOrChoice {
                ref fallback_options,
                ref next,
                ..
            } => {
                let text = answer
                    .as_text()
                    .map(str::trim)
                    .filter(|text| !text.is_empty())
                    .ok_or_else(|| EngineError::not_found("branch", "empty answer"))?;

                if let Some(option) = fallback_options.iter().find(|option| option.matches(text)) {
                    return match &option.next {
                        Some(next) => self.resolve_next(tree_id, next),
                        None => Ok(TraversalOutcome::End),
                    };
                }
                match next {
                    Some(next) => self.resolve_next(tree_id, next),
                    None => Ok(TraversalOutcome::End),
                }
            }
        }
    }

    fn follow_option(
        &self,
        tree_id: &TreeId,
        options: &[ChoiceOption],
        answer: &Answer,
    ) -> Result<TraversalOutcome, EngineError> {
        let text = answer.as_text().unwrap_or_default();
        let option = options
            .iter()
            .find(|option| option.matches(text))
            .ok_or_else(|| EngineError::not_found("branch", text))?;

        match &option.next {
            Some(next) => self.resolve_next(tree_id, next),
            None => Ok(TraversalOutcome::End),
        }
    }

    fn resolve_next(
        &self,
        tree_id: &TreeId,
        next: &NodeId,
    ) -> Result<TraversalOutcome, EngineError> {
        self.get_node(tree_id, next)
            .map(TraversalOutcome::Next)
            .ok_or_else(|| EngineError::not_found("node", format!("{tree_id}/{next}")))
    }
}
