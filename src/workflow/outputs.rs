use super::{Node, NodeId, NodeType, Workflow};
use crate::error::GraphError;
use crate::expr::{Selector, ValueType};
use serde::Serialize;
use std::sync::Arc;

/// The declared type of a node output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    /// An issued certificate; selectable through its derived fields only.
    Certificate,
    String,
    Number,
    Boolean,
}

/// A statically known output of a node type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputDefinition {
    pub name: &'static str,
    pub label: &'static str,
    #[serde(rename = "type")]
    pub output_type: OutputType,
}

/// A selectable variable: something a condition can compare against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Variable {
    pub selector: Selector,
    pub label: String,
}

const APPLY_OUTPUTS: &[OutputDefinition] = &[OutputDefinition {
    name: "certificate",
    label: "Certificate",
    output_type: OutputType::Certificate,
}];

/// Fields a certificate output is expanded into for selection.
const CERTIFICATE_FIELDS: &[(&str, &str, ValueType)] = &[
    ("validity", "Certificate validity", ValueType::Boolean),
    ("daysLeft", "Certificate days left", ValueType::Number),
];

impl NodeType {
    /// The output schema of this node type.
    pub fn outputs(&self) -> &'static [OutputDefinition] {
        match self {
            NodeType::Apply => APPLY_OUTPUTS,
            NodeType::Start
            | NodeType::Deploy
            | NodeType::Notify
            | NodeType::Branch
            | NodeType::Condition
            | NodeType::End => &[],
        }
    }
}

impl OutputDefinition {
    /// Expands the output into the variables a condition may select.
    pub fn variables(&self, node_id: &NodeId) -> Vec<Variable> {
        let scalar = |value_type: ValueType| {
            vec![Variable {
                selector: Selector::new(node_id, self.name, value_type),
                label: self.label.to_string(),
            }]
        };

        match self.output_type {
            OutputType::Certificate => CERTIFICATE_FIELDS
                .iter()
                .map(|(field, label, value_type)| Variable {
                    selector: Selector::new(node_id, format!("{}.{}", self.name, field), *value_type),
                    label: label.to_string(),
                })
                .collect(),
            OutputType::String => scalar(ValueType::String),
            OutputType::Number => scalar(ValueType::Number),
            OutputType::Boolean => scalar(ValueType::Boolean),
        }
    }
}

/// A node that runs before the queried node, with the outputs it exposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeOutputs {
    pub node: Arc<Node>,
    pub outputs: &'static [OutputDefinition],
}

impl NodeOutputs {
    pub fn variables(&self) -> Vec<Variable> {
        self.outputs
            .iter()
            .flat_map(|output| output.variables(&self.node.id))
            .collect()
    }
}

impl Workflow {
    /// Lists every node that is guaranteed to run before `node_id`, with its outputs.
    ///
    /// When the target sits inside a branch, only the enclosing branch is descended
    /// into; outputs produced inside a sibling branch, or inside a branch the target
    /// follows, are not visible. The target's own outputs are never included.
    pub fn outputs_before(&self, node_id: &NodeId) -> Result<Vec<NodeOutputs>, GraphError> {
        self.require(node_id)?;
        let mut found = Vec::new();
        if self.collect_outputs(&self.root, node_id, &mut found) {
            Ok(found)
        } else {
            Err(GraphError::NodeNotFound(node_id.clone()))
        }
    }

    /// All variables selectable by a condition at `node_id`, optionally of one type.
    pub fn variables_before(
        &self,
        node_id: &NodeId,
        value_type: Option<ValueType>,
    ) -> Result<Vec<Variable>, GraphError> {
        Ok(self
            .outputs_before(node_id)?
            .iter()
            .flat_map(NodeOutputs::variables)
            .filter(|variable| value_type.is_none_or(|t| variable.selector.value_type == t))
            .collect())
    }

    /// Walks the chain at `head`, returning `true` once `target` is reached.
    fn collect_outputs(&self, head: &NodeId, target: &NodeId, found: &mut Vec<NodeOutputs>) -> bool {
        for node in self.chain_from(head) {
            if &node.id == target {
                return true;
            }
            if node.is_branch() {
                let mark = found.len();
                for branch in &node.branches {
                    if self.collect_outputs(branch, target, found) {
                        return true;
                    }
                    found.truncate(mark);
                }
            } else if !node.node_type.outputs().is_empty() {
                if let Some(shared) = self.node_arc(&node.id) {
                    found.push(NodeOutputs {
                        node: Arc::clone(shared),
                        outputs: node.node_type.outputs(),
                    });
                }
            }
        }
        false
    }
}
