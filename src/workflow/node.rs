use crate::error::ExprError;
use crate::expr::Expr;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Config key under which a Condition node stores its guard.
pub const EXPRESSION_KEY: &str = "expression";

/// Opaque key/value configuration owned by the provider forms.
pub type NodeConfig = serde_json::Map<String, serde_json::Value>;

/// Stable, opaque identifier of a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&NodeId> for NodeId {
    fn from(id: &NodeId) -> Self {
        id.clone()
    }
}

/// The kind of step a node performs. The serialized names are part of the persisted
/// format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Start,
    Apply,
    Deploy,
    Notify,
    Branch,
    Condition,
    End,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Start => "start",
            NodeType::Apply => "apply",
            NodeType::Deploy => "deploy",
            NodeType::Notify => "notify",
            NodeType::Branch => "branch",
            NodeType::Condition => "condition",
            NodeType::End => "end",
        }
    }

    pub fn default_name(&self) -> &'static str {
        match self {
            NodeType::Start => "Start",
            NodeType::Apply => "Apply certificate",
            NodeType::Deploy => "Deploy certificate",
            NodeType::Notify => "Send notification",
            NodeType::Branch => "Parallel branch",
            NodeType::Condition => "Condition",
            NodeType::End => "End",
        }
    }

    /// Whether a freshly created node of this type counts as configured.
    ///
    /// Only node types without provider configuration start out validated.
    pub fn is_configured_by_default(&self) -> bool {
        matches!(self, NodeType::Start | NodeType::Branch | NodeType::End)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single step of a workflow as stored in the arena.
///
/// Structure is expressed by id: `next` names the following node and `branches`
/// names the head of each parallel chain of a Branch node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub node_type: NodeType,
    pub name: String,
    pub config: NodeConfig,
    pub validated: bool,
    pub next: Option<NodeId>,
    pub branches: Vec<NodeId>,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, node_type: NodeType, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type,
            name: name.into(),
            config: NodeConfig::new(),
            validated: node_type.is_configured_by_default(),
            next: None,
            branches: Vec::new(),
        }
    }

    /// A node of the given type with a fresh id and the type's default name.
    pub fn of_type(node_type: NodeType) -> Self {
        Self::new(NodeId::generate(), node_type, node_type.default_name())
    }

    /// An unconfigured Condition node with no guard, as used for new branch heads.
    pub fn condition(name: impl Into<String>) -> Self {
        Self::new(NodeId::generate(), NodeType::Condition, name)
    }

    pub fn with_config(mut self, config: NodeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_validated(mut self, validated: bool) -> Self {
        self.validated = validated;
        self
    }

    pub fn is_branch(&self) -> bool {
        self.node_type == NodeType::Branch
    }

    /// Decodes `config.expression`; an absent or null entry means no guard.
    pub fn expression(&self) -> Result<Option<Expr>, ExprError> {
        match self.config.get(EXPRESSION_KEY) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(raw) => Expr::from_json(raw).map(Some),
        }
    }

    pub fn set_expression(&mut self, expression: Option<Expr>) {
        match expression {
            Some(expr) => {
                self.config.insert(EXPRESSION_KEY.to_string(), expr.to_json());
            }
            None => {
                self.config.remove(EXPRESSION_KEY);
            }
        }
    }

    pub fn with_expression(mut self, expression: Expr) -> Self {
        self.set_expression(Some(expression));
        self
    }
}
