//! The persisted form of a workflow.
//!
//! A workflow is stored as one nested JSON document: every node embeds its successor
//! under `next` and its branch heads under `branches`. The editor works on the flat
//! [`Workflow`] arena instead; this module converts between the two and refuses
//! documents that break the graph invariants.
//!
//! Every node of a chain adds one level of JSON nesting. Documents are parsed without
//! serde_json's default recursion limit, and both loading and editing are capped at
//! [`MAX_DOCUMENT_DEPTH`] levels instead, so anything the editor can save can be
//! loaded again.

use crate::error::{DocumentError, GraphError};
use crate::workflow::{Node, NodeConfig, NodeId, NodeType, Workflow, check_branch_shape};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Deepest JSON nesting, counting every object and array, a workflow document may reach.
pub const MAX_DOCUMENT_DEPTH: usize = 512;

/// One node of the persisted document, owning its successor and branches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDocument {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub config: NodeConfig,
    #[serde(default)]
    pub validated: bool,
    #[serde(default)]
    pub next: Option<Box<NodeDocument>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branches: Option<Vec<NodeDocument>>,
}

impl NodeDocument {
    /// Builds the nested document for the chain starting at `head`.
    fn from_chain(workflow: &Workflow, head: &NodeId) -> Option<NodeDocument> {
        let chain: Vec<&Node> = workflow.chain_from(head).collect();
        chain.into_iter().rev().fold(None, |next, node| {
            let branches = node.is_branch().then(|| {
                node.branches
                    .iter()
                    .filter_map(|branch| NodeDocument::from_chain(workflow, branch))
                    .collect()
            });
            Some(NodeDocument {
                id: node.id.clone(),
                node_type: node.node_type,
                name: node.name.clone(),
                config: node.config.clone(),
                validated: node.validated,
                next: next.map(Box::new),
                branches,
            })
        })
    }
}

impl From<&Workflow> for NodeDocument {
    fn from(workflow: &Workflow) -> Self {
        // The root chain always holds at least the Start node.
        NodeDocument::from_chain(workflow, workflow.root_id()).unwrap_or_else(|| NodeDocument {
            id: workflow.root_id().clone(),
            node_type: NodeType::Start,
            name: NodeType::Start.default_name().to_string(),
            config: NodeConfig::new(),
            validated: true,
            next: None,
            branches: None,
        })
    }
}

impl TryFrom<NodeDocument> for Workflow {
    type Error = DocumentError;

    fn try_from(document: NodeDocument) -> Result<Self, Self::Error> {
        if document.node_type != NodeType::Start {
            return Err(DocumentError::InvalidRoot(document.node_type.to_string()));
        }
        let mut nodes = AHashMap::new();
        let root = insert_chain(document, &mut nodes)?;
        let workflow = Workflow::from_parts(root, nodes);

        let depth = workflow.document_depth();
        if depth > MAX_DOCUMENT_DEPTH {
            return Err(DocumentError::TooDeep {
                depth,
                limit: MAX_DOCUMENT_DEPTH,
            });
        }
        if workflow.count_of(NodeType::Start) != 1 {
            return Err(DocumentError::InvalidNode {
                node_id: workflow.root_id().clone(),
                message: "a workflow has exactly one start node".to_string(),
            });
        }
        Ok(workflow)
    }
}

/// Unrolls the chain at `head` into the arena and returns the head's id.
fn insert_chain(
    head: NodeDocument,
    nodes: &mut AHashMap<NodeId, Arc<Node>>,
) -> Result<NodeId, DocumentError> {
    let mut documents = Vec::new();
    let mut cursor = Some(head);
    while let Some(mut document) = cursor {
        cursor = document.next.take().map(|next| *next);
        documents.push(document);
    }

    let ids: Vec<NodeId> = documents.iter().map(|d| d.id.clone()).collect();
    for (position, document) in documents.into_iter().enumerate() {
        let id = document.id.clone();
        if nodes.contains_key(&id) {
            return Err(DocumentError::DuplicateNode(id));
        }

        let branches = document
            .branches
            .unwrap_or_default()
            .into_iter()
            .map(|branch| insert_chain(branch, nodes))
            .collect::<Result<Vec<_>, _>>()?;

        let node = Node {
            id: id.clone(),
            node_type: document.node_type,
            name: document.name,
            config: document.config,
            validated: document.validated,
            next: ids.get(position + 1).cloned(),
            branches,
        };
        check_node(&node)?;

        // A branch chain may have claimed this id while it was being inserted.
        if nodes.insert(id.clone(), Arc::new(node)).is_some() {
            return Err(DocumentError::DuplicateNode(id));
        }
    }

    Ok(ids[0].clone())
}

fn check_node(node: &Node) -> Result<(), DocumentError> {
    let invalid = |message: String| DocumentError::InvalidNode {
        node_id: node.id.clone(),
        message,
    };

    check_branch_shape(node).map_err(invalid)?;
    if node.node_type == NodeType::Condition {
        node.expression().map_err(|e| invalid(e.to_string()))?;
    }
    Ok(())
}

impl Workflow {
    /// Parses a persisted workflow document.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        check_depth(json_depth(json))?;
        let mut deserializer = serde_json::Deserializer::from_str(json);
        deserializer.disable_recursion_limit();
        let document = NodeDocument::deserialize(&mut deserializer)?;
        deserializer.end()?;
        Workflow::try_from(document)
    }

    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        check_depth(value_depth(&value))?;
        let document: NodeDocument = serde_json::from_value(value)?;
        Workflow::try_from(document)
    }

    /// Nesting depth of the persisted document, as [`MAX_DOCUMENT_DEPTH`] counts it.
    pub fn document_depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(self.root_id(), 1)];
        while let Some((head, level)) = pending.pop() {
            for (offset, node) in self.chain_from(head).enumerate() {
                let level = level + offset;
                let config = node.config.values().map(value_depth).max().unwrap_or(0);
                deepest = deepest.max(level + 1 + config);
                // `branches` array, then the head object inside it.
                pending.extend(node.branches.iter().map(|branch| (branch, level + 2)));
            }
        }
        deepest
    }

    /// Hands back an edited workflow if its document still fits the depth limit.
    pub(crate) fn within_depth(self, node_id: &NodeId) -> Result<Workflow, GraphError> {
        let depth = self.document_depth();
        if depth > MAX_DOCUMENT_DEPTH {
            return Err(GraphError::TooDeep {
                node_id: node_id.clone(),
                depth,
                limit: MAX_DOCUMENT_DEPTH,
            });
        }
        Ok(self)
    }

    pub fn to_document(&self) -> NodeDocument {
        NodeDocument::from(self)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_document())
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.to_document())
    }
}

fn check_depth(depth: usize) -> Result<(), DocumentError> {
    if depth > MAX_DOCUMENT_DEPTH {
        return Err(DocumentError::TooDeep {
            depth,
            limit: MAX_DOCUMENT_DEPTH,
        });
    }
    Ok(())
}

fn value_depth(value: &Value) -> usize {
    let mut deepest = 0;
    let mut pending = vec![(value, 0)];
    while let Some((value, depth)) = pending.pop() {
        match value {
            Value::Object(map) => {
                deepest = deepest.max(depth + 1);
                pending.extend(map.values().map(|v| (v, depth + 1)));
            }
            Value::Array(items) => {
                deepest = deepest.max(depth + 1);
                pending.extend(items.iter().map(|v| (v, depth + 1)));
            }
            _ => {}
        }
    }
    deepest
}

/// Bracket nesting of raw JSON text, skipping string contents. Runs before parsing so
/// an oversized document is refused without recursing into it.
fn json_depth(json: &str) -> usize {
    let (mut depth, mut deepest) = (0usize, 0usize);
    let (mut in_string, mut escaped) = (false, false);
    for byte in json.bytes() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}
