//! Structural edits of a [`Workflow`].
//!
//! Every operation borrows the current workflow and returns a new one; the input is
//! never modified, so a failed edit leaves the caller with the exact value it had.
//! Nodes that an edit does not touch stay shared with the previous workflow. An edit
//! that would nest the persisted document past
//! [`MAX_DOCUMENT_DEPTH`](crate::document::MAX_DOCUMENT_DEPTH) fails with
//! [`GraphError::TooDeep`].

use super::{Fragment, Node, NodeId, NodeType, Slot, Workflow};
use crate::error::GraphError;
use std::sync::Arc;
use tracing::{debug, warn};

impl Workflow {
    /// Splices `fragment` in as the immediate successor of `after_id`.
    ///
    /// The fragment's head takes over the old successor as its `next`. Any branch
    /// chains the fragment carries are inserted with it.
    pub fn add_node(&self, after_id: &NodeId, fragment: Fragment) -> Result<Workflow, GraphError> {
        let after = self.require(after_id)?;
        fragment.check()?;
        if fragment.head().node_type == NodeType::Start {
            return Err(GraphError::InvalidBranchState {
                node_id: fragment.head().id.clone(),
                message: "a workflow has exactly one start node".to_string(),
            });
        }
        if let Some(existing) = fragment.ids().find(|id| self.contains(id)) {
            return Err(GraphError::DuplicateNode(existing.clone()));
        }

        let (mut head, owned) = fragment.into_parts();
        head.next = after.next.clone();
        let head_id = head.id.clone();

        let mut out = self.clone();
        out.insert(head);
        for node in owned {
            out.insert(node);
        }
        out.node_mut(after_id)?.next = Some(head_id.clone());

        debug!(node_id = %head_id, after = %after_id, "Added node");
        out.within_depth(&head_id)
    }

    /// Replaces the `name`, `config` and `validated` flag of the node with the same id.
    ///
    /// Structure (`next`, `branches`) and the node type stay where they are.
    pub fn update_node(&self, node: Node) -> Result<Workflow, GraphError> {
        let existing = self.require(&node.id)?;
        if existing.node_type != node.node_type {
            warn!(
                node_id = %node.id,
                from = %existing.node_type,
                to = %node.node_type,
                "Ignoring node type change in update"
            );
        }

        let mut out = self.clone();
        let target = out.node_mut(&node.id)?;
        target.name = node.name;
        target.config = node.config;
        target.validated = node.validated;

        debug!(node_id = %node.id, "Updated node");
        out.within_depth(&node.id)
    }

    /// Removes a node, reconnecting whatever pointed at it to its successor.
    ///
    /// A Branch node is removed together with all of its branches. A node that is the
    /// only node of its branch takes the branch with it, collapsing the fork if fewer
    /// than two branches would remain. The Start node cannot be removed.
    pub fn remove_node(&self, id: &NodeId) -> Result<Workflow, GraphError> {
        let node = self.require(id)?;
        if node.node_type == NodeType::Start {
            return Err(GraphError::InvalidBranchState {
                node_id: id.clone(),
                message: "the start node cannot be removed".to_string(),
            });
        }
        let slot = self
            .position_of(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.clone()))?;

        if let (Slot::Branch { owner, index }, None) = (&slot, &node.next) {
            return self.remove_branch(owner, *index);
        }

        let successor = node.next.clone();
        let mut out = self.clone();
        for dead in self.owned_ids(id) {
            out.nodes.remove(&dead);
        }
        out.set_slot(&slot, successor)?;

        debug!(node_id = %id, "Removed node");
        Ok(out)
    }

    /// Inserts a copy of the node right after it, with a fresh id and copied config.
    ///
    /// Only the node is copied, not its successors; a Branch node is copied together
    /// with its branch chains.
    pub fn duplicate_node(&self, id: &NodeId) -> Result<Workflow, GraphError> {
        let node = self.require(id)?;
        if node.node_type == NodeType::Start {
            return Err(GraphError::InvalidBranchState {
                node_id: id.clone(),
                message: "the start node cannot be duplicated".to_string(),
            });
        }
        let fragment = self.copy_subtree(node);
        self.add_node(id, fragment)
    }

    /// Appends a new, unconfigured Condition branch to a Branch node.
    pub fn add_branch(&self, branch_id: &NodeId) -> Result<Workflow, GraphError> {
        let owner = self.require_branch(branch_id)?;
        let head = Node::condition(format!(
            "{} {}",
            NodeType::Condition.default_name(),
            owner.branches.len() + 1
        ));
        let head_id = head.id.clone();

        let mut out = self.clone();
        out.insert(head);
        out.node_mut(branch_id)?.branches.push(head_id.clone());

        debug!(node_id = %branch_id, head = %head_id, "Added branch");
        out.within_depth(&head_id)
    }

    /// Deep-copies `branches[index]` with fresh ids and inserts it right after the
    /// source branch.
    pub fn duplicate_branch(&self, branch_id: &NodeId, index: usize) -> Result<Workflow, GraphError> {
        let owner = self.require_branch(branch_id)?;
        let head = branch_head(owner, index)?;

        let mut copies = Vec::new();
        let copy_head = self.copy_chain(head, &mut copies).ok_or_else(|| {
            GraphError::NodeNotFound(head.clone())
        })?;

        let mut out = self.clone();
        for node in copies {
            out.insert(node);
        }
        out.node_mut(branch_id)?
            .branches
            .insert(index + 1, copy_head);

        debug!(node_id = %branch_id, index, "Duplicated branch");
        out.within_depth(branch_id)
    }

    /// Removes `branches[index]` and every node in it.
    ///
    /// When fewer than two branches would remain the Branch node collapses: the
    /// surviving chain takes the Branch node's place and its tail connects to the
    /// Branch node's former `next`.
    pub fn remove_branch(&self, branch_id: &NodeId, index: usize) -> Result<Workflow, GraphError> {
        let owner = self.require_branch(branch_id)?;
        let head = branch_head(owner, index)?;

        let mut out = self.clone();
        for dead in self.chain_ids(head) {
            out.nodes.remove(&dead);
        }

        let remaining: Vec<NodeId> = owner
            .branches
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, id)| id.clone())
            .collect();

        if remaining.len() >= 2 {
            out.node_mut(branch_id)?.branches = remaining;
            debug!(node_id = %branch_id, index, "Removed branch");
            return Ok(out);
        }

        let slot = self
            .position_of(branch_id)
            .ok_or_else(|| GraphError::NodeNotFound(branch_id.clone()))?;
        out.nodes.remove(branch_id);

        match remaining.into_iter().next() {
            Some(survivor) => {
                let tail_id = out
                    .tail_of(&survivor)
                    .map(|tail| tail.id.clone())
                    .ok_or_else(|| GraphError::NodeNotFound(survivor.clone()))?;
                out.node_mut(&tail_id)?.next = owner.next.clone();
                out.set_slot(&slot, Some(survivor))?;
            }
            None => out.set_slot(&slot, owner.next.clone())?,
        }

        debug!(node_id = %branch_id, index, "Removed branch and collapsed fork");
        // Hoisting the surviving chain can push the fork's successors deeper.
        out.within_depth(branch_id)
    }

    fn require_branch(&self, id: &NodeId) -> Result<&Node, GraphError> {
        let node = self.require(id)?;
        if !node.is_branch() {
            return Err(GraphError::InvalidBranchState {
                node_id: id.clone(),
                message: format!("expected a branch node, found a {} node", node.node_type),
            });
        }
        Ok(node)
    }

    fn insert(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), Arc::new(node));
    }

    /// Copy-on-write access: clones the node only if it is still shared.
    fn node_mut(&mut self, id: &NodeId) -> Result<&mut Node, GraphError> {
        self.nodes
            .get_mut(id)
            .map(Arc::make_mut)
            .ok_or_else(|| GraphError::NodeNotFound(id.clone()))
    }

    /// Points `slot` at `target`.
    fn set_slot(&mut self, slot: &Slot, target: Option<NodeId>) -> Result<(), GraphError> {
        match (slot, target) {
            (Slot::Root, Some(target)) => {
                self.root = target;
                Ok(())
            }
            (Slot::Next(prev), target) => {
                self.node_mut(prev)?.next = target;
                Ok(())
            }
            (Slot::Branch { owner, index }, Some(target)) => {
                let owner_node = self.node_mut(owner)?;
                match owner_node.branches.get_mut(*index) {
                    Some(head) => {
                        *head = target;
                        Ok(())
                    }
                    None => Err(GraphError::BranchIndexOutOfRange {
                        node_id: owner.clone(),
                        index: *index,
                        len: owner_node.branches.len(),
                    }),
                }
            }
            (Slot::Root, None) => Err(GraphError::InvalidBranchState {
                node_id: self.root.clone(),
                message: "the workflow root cannot be left empty".to_string(),
            }),
            (Slot::Branch { owner, .. }, None) => Err(GraphError::InvalidBranchState {
                node_id: owner.clone(),
                message: "a branch cannot be left empty".to_string(),
            }),
        }
    }

    /// Copies a node and the branch chains it owns with fresh ids. The copy is
    /// detached: its `next` is empty.
    fn copy_subtree(&self, node: &Node) -> Fragment {
        let mut owned = Vec::new();
        let head = self.copy_node(node, &mut owned);
        Fragment::from_parts(head, owned)
    }

    fn copy_node(&self, node: &Node, owned: &mut Vec<Node>) -> Node {
        let branches = node
            .branches
            .iter()
            .filter_map(|branch| self.copy_chain(branch, owned))
            .collect();
        Node {
            id: NodeId::generate(),
            next: None,
            branches,
            ..node.clone()
        }
    }

    /// Copies a whole chain with fresh ids, appending the copies to `owned` and
    /// returning the id of the copied head.
    fn copy_chain(&self, head: &NodeId, owned: &mut Vec<Node>) -> Option<NodeId> {
        let mut copies: Vec<Node> = self
            .chain_from(head)
            .map(|node| self.copy_node(node, owned))
            .collect();

        let next_ids: Vec<NodeId> = copies.iter().skip(1).map(|n| n.id.clone()).collect();
        for (copy, next) in copies.iter_mut().zip(next_ids) {
            copy.next = Some(next);
        }

        let copy_head = copies.first().map(|n| n.id.clone());
        owned.extend(copies);
        copy_head
    }
}

fn branch_head(owner: &Node, index: usize) -> Result<&NodeId, GraphError> {
    owner
        .branches
        .get(index)
        .ok_or_else(|| GraphError::BranchIndexOutOfRange {
            node_id: owner.id.clone(),
            index,
            len: owner.branches.len(),
        })
}
