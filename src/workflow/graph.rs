use super::{Node, NodeId, NodeType};
use crate::error::GraphError;
use ahash::AHashMap;
use std::sync::Arc;

/// A workflow definition: a chain of nodes rooted at a Start node, where Branch nodes
/// fork into parallel chains that rejoin at the Branch node's `next`.
///
/// Nodes live in an arena keyed by id and are shared through `Arc`, so cloning a
/// workflow is cheap and every mutation produces a new value that reuses all nodes it
/// did not touch.
///
/// Invariants upheld by every constructor and mutation:
/// - `root` is the only Start node;
/// - every id referenced through `next` or `branches` is in the arena;
/// - every node in the arena is reachable from `root`;
/// - Branch nodes have at least two branches, other nodes have none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workflow {
    pub(crate) root: NodeId,
    pub(crate) nodes: AHashMap<NodeId, Arc<Node>>,
}

/// The place that owns a node: what points at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// The node is the workflow root.
    Root,
    /// The node is the `next` of the given node.
    Next(NodeId),
    /// The node heads `branches[index]` of the given Branch node.
    Branch { owner: NodeId, index: usize },
}

/// Lazy iterator over one chain, following `next` links.
pub struct Chain<'a> {
    workflow: &'a Workflow,
    cursor: Option<&'a NodeId>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor.take()?;
        let node = self.workflow.nodes.get(id)?.as_ref();
        self.cursor = node.next.as_ref();
        Some(node)
    }
}

impl Workflow {
    /// Assembles a workflow from an arena the caller has already checked.
    pub(crate) fn from_parts(root: NodeId, nodes: AHashMap<NodeId, Arc<Node>>) -> Self {
        Self { root, nodes }
    }

    pub fn root(&self) -> &Node {
        // `root` is always present in the arena.
        &self.nodes[&self.root]
    }

    pub fn root_id(&self) -> &NodeId {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Looks up a node anywhere in the workflow, including inside branches.
    pub fn find_node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id).map(Arc::as_ref)
    }

    pub(crate) fn node_arc(&self, id: &NodeId) -> Option<&Arc<Node>> {
        self.nodes.get(id)
    }

    pub(crate) fn require(&self, id: &NodeId) -> Result<&Node, GraphError> {
        self.find_node(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.clone()))
    }

    /// Iterates the top-level chain in execution order. Branch contents are not
    /// visited; callers descend into `branches` themselves.
    pub fn chain_elements(&self) -> Chain<'_> {
        self.chain_from(&self.root)
    }

    /// Iterates the chain starting at `head`. Empty if `head` is unknown.
    pub fn chain_from(&self, head: &NodeId) -> Chain<'_> {
        Chain {
            workflow: self,
            cursor: self.nodes.get_key_value(head).map(|(id, _)| id),
        }
    }

    /// Every node in depth-first pre-order: a Branch node, then its branch chains in
    /// order, then its successor.
    pub fn walk(&self) -> Vec<&Node> {
        let mut visited = Vec::with_capacity(self.nodes.len());
        self.search(&self.root, &mut |node| {
            visited.push(node);
            false
        });
        visited
    }

    /// Depth-first search from `head`, stopping at the first node `found` accepts.
    pub(crate) fn search<'a, F>(&'a self, head: &NodeId, found: &mut F) -> Option<&'a Node>
    where
        F: FnMut(&'a Node) -> bool,
    {
        for node in self.chain_from(head) {
            if found(node) {
                return Some(node);
            }
            for branch in &node.branches {
                if let Some(hit) = self.search(branch, found) {
                    return Some(hit);
                }
            }
        }
        None
    }

    /// Finds the slot that owns `id`.
    pub fn position_of(&self, id: &NodeId) -> Option<Slot> {
        self.find_slot(&self.root, Slot::Root, id)
    }

    fn find_slot(&self, head: &NodeId, head_slot: Slot, target: &NodeId) -> Option<Slot> {
        let mut slot = head_slot;
        for node in self.chain_from(head) {
            if &node.id == target {
                return Some(slot);
            }
            for (index, branch) in node.branches.iter().enumerate() {
                let branch_slot = Slot::Branch {
                    owner: node.id.clone(),
                    index,
                };
                if let Some(found) = self.find_slot(branch, branch_slot, target) {
                    return Some(found);
                }
            }
            slot = Slot::Next(node.id.clone());
        }
        None
    }

    /// The last node of the chain starting at `head`.
    pub(crate) fn tail_of(&self, head: &NodeId) -> Option<&Node> {
        self.chain_from(head).last()
    }

    /// The node and everything it owns through `branches`, but not its successors.
    pub(crate) fn owned_ids(&self, id: &NodeId) -> Vec<NodeId> {
        let mut ids = vec![id.clone()];
        if let Some(node) = self.find_node(id) {
            for branch in &node.branches {
                ids.extend(self.chain_ids(branch));
            }
        }
        ids
    }

    /// Every node of the chain starting at `head`, with everything those nodes own.
    pub(crate) fn chain_ids(&self, head: &NodeId) -> Vec<NodeId> {
        self.chain_from(head)
            .flat_map(|node| self.owned_ids(&node.id))
            .collect()
    }

    /// Number of nodes of the given type.
    pub(crate) fn count_of(&self, node_type: NodeType) -> usize {
        self.nodes
            .values()
            .filter(|node| node.node_type == node_type)
            .count()
    }
}
