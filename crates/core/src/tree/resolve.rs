//! Effective status and precision resolution, plus cached static counts.
//!
//! Both resolutions combine two directions:
//! - downward: an ancestor with an explicit setting shadows everything below it;
//! - upward: a container without its own setting inherits from its descendants
//!   (unanimous status, or maximum precision).

use crate::model::{NodeKind, NodeStatus};
use crate::tree::{ConfigTree, Memo, NodeId};

impl ConfigTree {
    /// Resolved status of `id`.
    ///
    /// A parent whose effective status is not `None` always wins, even over a
    /// unanimous inference from this node's children.
    pub fn effective_status(&self, id: NodeId) -> NodeStatus {
        if let Some(parent) = self.parent(id) {
            let inherited = self.effective_status(parent);
            if inherited != NodeStatus::None {
                return inherited;
            }
        }
        self.status_from_children(id)
    }

    /// Status inferred from descendants only, without any parent override.
    ///
    /// A `None` container adopts its children's common status, or stays `None`
    /// when they disagree. Any other node keeps its own status.
    pub fn status_from_children(&self, id: NodeId) -> NodeStatus {
        let node = self.node(id);
        if node.status != NodeStatus::None || node.children.is_empty() {
            return node.status;
        }
        let mut statuses = node.children.iter().map(|c| self.status_from_children(*c));
        let first = statuses.next().unwrap_or(NodeStatus::None);
        if statuses.all(|s| s == first) {
            first
        } else {
            NodeStatus::None
        }
    }

    /// Effective status of every node below (and including) `from`, computed in
    /// two linear passes. Indexed by arena slot; unvisited slots hold `None`.
    pub fn resolve_statuses(&self, from: NodeId) -> Vec<NodeStatus> {
        let order = self.subtree(from);
        let mut upward = vec![NodeStatus::None; self.arena_len()];
        for id in order.iter().rev() {
            let node = self.node(*id);
            upward[id.index()] = if node.status != NodeStatus::None || node.children.is_empty() {
                node.status
            } else {
                let first = upward[node.children[0].index()];
                if node.children.iter().all(|c| upward[c.index()] == first) {
                    first
                } else {
                    NodeStatus::None
                }
            };
        }

        let mut effective = vec![NodeStatus::None; self.arena_len()];
        let above = self.parent(from).map(|p| self.effective_status(p)).unwrap_or(NodeStatus::None);
        for id in order {
            let inherited = match self.parent(id) {
                Some(p) if id != from => effective[p.index()],
                _ => above,
            };
            effective[id.index()] =
                if inherited != NodeStatus::None { inherited } else { upward[id.index()] };
        }
        effective
    }

    /// Resolved precision of `id`; `None` when nothing in scope sets one.
    ///
    /// Prefers a higher precision found below the node, then the parent's
    /// effective precision when the node has none of its own.
    pub fn effective_precision(&self, id: NodeId) -> Option<u32> {
        let own = self.node(id).precision;
        let below = self.precision_from_children(id);
        if below != own {
            below
        } else if own.is_none() {
            self.precision_from_parent(id)
        } else {
            own
        }
    }

    /// Parent's effective precision, falling back to this node's own value.
    pub fn precision_from_parent(&self, id: NodeId) -> Option<u32> {
        match self.parent(id).and_then(|p| self.effective_precision(p)) {
            Some(p) => Some(p),
            None => self.node(id).precision,
        }
    }

    /// Maximum of the node's own precision and every descendant's. Cached.
    pub fn precision_from_children(&self, id: NodeId) -> Option<u32> {
        let node = self.node(id);
        if let Memo::Ready(value) = node.precision_from_children.get() {
            return value;
        }
        let value = node
            .children
            .iter()
            .map(|c| self.precision_from_children(*c))
            .fold(node.precision, |acc, p| acc.max(p));
        node.precision_from_children.set(Memo::Ready(value));
        value
    }

    /// Static instruction count of the subtree. Cached until the subtree changes.
    pub fn insn_count(&self, id: NodeId) -> u64 {
        let node = self.node(id);
        if let Memo::Ready(count) = node.insn_count.get() {
            return count;
        }
        let count = match node.kind {
            NodeKind::Instruction => 1,
            NodeKind::Application
            | NodeKind::Module
            | NodeKind::Function
            | NodeKind::BasicBlock => node.children.iter().map(|c| self.insn_count(*c)).sum(),
            NodeKind::Variable | NodeKind::None => 0,
        };
        node.insn_count.set(Memo::Ready(count));
        count
    }

    /// Static variable count. Blocks never hold variables, so they are not searched.
    pub fn var_count(&self, id: NodeId) -> u64 {
        let node = self.node(id);
        match node.kind {
            NodeKind::Variable => 1,
            NodeKind::Application | NodeKind::Module | NodeKind::Function => {
                node.children.iter().map(|c| self.var_count(*c)).sum()
            }
            NodeKind::BasicBlock | NodeKind::Instruction | NodeKind::None => 0,
        }
    }

    /// Drop cached instruction counts for the whole tree.
    pub fn reset_insn_counts(&self) {
        for id in self.pre_order() {
            self.node(id).insn_count.set(Memo::Stale);
        }
    }
}
