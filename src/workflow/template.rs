use super::{Node, NodeId, NodeType, Workflow};
use crate::error::GraphError;
use ahash::{AHashMap, AHashSet};
use std::sync::Arc;

/// A detached piece of workflow ready to be spliced in with [`Workflow::add_node`]:
/// one head node plus the branch chains it owns, if it is a Branch node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    head: Node,
    owned: Vec<Node>,
}

impl Fragment {
    /// A default node of the given type with a fresh id. A Branch node comes with two
    /// unconfigured Condition branches.
    pub fn new(node_type: NodeType) -> Self {
        let mut head = Node::of_type(node_type);
        let mut owned = Vec::new();
        if node_type == NodeType::Branch {
            for n in 1..=2 {
                let condition =
                    Node::condition(format!("{} {}", NodeType::Condition.default_name(), n));
                head.branches.push(condition.id.clone());
                owned.push(condition);
            }
        }
        Self { head, owned }
    }

    /// Wraps a single node that owns no branches.
    pub fn single(node: Node) -> Self {
        Self {
            head: node,
            owned: Vec::new(),
        }
    }

    pub(crate) fn from_parts(head: Node, owned: Vec<Node>) -> Self {
        Self { head, owned }
    }

    pub fn head(&self) -> &Node {
        &self.head
    }

    /// Every id in the fragment, head first.
    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        std::iter::once(&self.head.id).chain(self.owned.iter().map(|node| &node.id))
    }

    pub fn into_parts(self) -> (Node, Vec<Node>) {
        (self.head, self.owned)
    }

    /// Checks the fragment is self-contained and keeps the branch invariants.
    pub(crate) fn check(&self) -> Result<(), GraphError> {
        let invalid = |node: &Node, message: &str| GraphError::InvalidBranchState {
            node_id: node.id.clone(),
            message: message.to_string(),
        };

        if self.head.next.is_some() {
            return Err(invalid(&self.head, "a new node must not have a successor yet"));
        }

        let mut by_id: AHashMap<&NodeId, &Node> = AHashMap::new();
        for node in &self.owned {
            if node.id == self.head.id || by_id.insert(&node.id, node).is_some() {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
        }

        let mut reached: AHashSet<&NodeId> = AHashSet::new();
        let mut pending: Vec<&Node> = vec![&self.head];
        while let Some(node) = pending.pop() {
            check_branch_shape(node).map_err(|message| invalid(node, &message))?;
            if node.node_type == NodeType::Start {
                return Err(invalid(node, "a workflow has exactly one start node"));
            }
            let links = node.branches.iter().chain(
                // The head's own `next` is checked above.
                (node.id != self.head.id).then_some(node.next.as_ref()).flatten(),
            );
            for id in links {
                let target = by_id
                    .get(id)
                    .copied()
                    .ok_or_else(|| GraphError::NodeNotFound(id.clone()))?;
                if !reached.insert(id) {
                    return Err(invalid(target, "node is referenced more than once"));
                }
                pending.push(target);
            }
        }

        if reached.len() != self.owned.len() {
            return Err(invalid(&self.head, "fragment contains unreachable nodes"));
        }
        Ok(())
    }
}

/// Branch nodes fork into at least two chains; nothing else forks.
pub(crate) fn check_branch_shape(node: &Node) -> Result<(), String> {
    match (node.is_branch(), node.branches.len()) {
        (true, n) if n < 2 => Err(format!("branch node has {} branches, needs at least 2", n)),
        (false, n) if n > 0 => Err(format!("{} node cannot own branches", node.node_type)),
        _ => Ok(()),
    }
}

/// Predefined starting points for a new workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Template {
    /// Only the Start node.
    #[default]
    Blank,
    /// `Start → Apply → Deploy → Notify → End`.
    Standard,
}

impl Template {
    fn node_types(&self) -> &'static [NodeType] {
        match self {
            Template::Blank => &[NodeType::Start],
            Template::Standard => &[
                NodeType::Start,
                NodeType::Apply,
                NodeType::Deploy,
                NodeType::Notify,
                NodeType::End,
            ],
        }
    }
}

impl Workflow {
    /// A new workflow holding only a Start node.
    pub fn blank() -> Self {
        Self::from_template(Template::Blank)
    }

    pub fn from_template(template: Template) -> Self {
        let mut chain: Vec<Node> = template
            .node_types()
            .iter()
            .map(|node_type| Node::of_type(*node_type))
            .collect();

        let next_ids: Vec<NodeId> = chain.iter().skip(1).map(|n| n.id.clone()).collect();
        for (node, next) in chain.iter_mut().zip(next_ids) {
            node.next = Some(next);
        }

        let root = chain[0].id.clone();
        let nodes = chain
            .into_iter()
            .map(|node| (node.id.clone(), Arc::new(node)))
            .collect();
        Workflow::from_parts(root, nodes)
    }
}
