//! Predicate-driven removal of subtrees.
//!
//! Removal is post-order: a node's children are pruned first, then the
//! predicate sees each child in its already-pruned state. A container emptied
//! by the pass is therefore removable in the same call.

use crate::model::NodeKind;
use crate::settings::PruneOptions;
use crate::tree::{ConfigNode, ConfigTree, NodeId};

impl ConfigTree {
    /// Detach every descendant of `from` for which `remove` returns true.
    ///
    /// `from` itself is never removed. Returns the number of detached subtrees.
    pub fn prune<F>(&mut self, from: NodeId, remove: F) -> usize
    where
        F: Fn(&ConfigTree, NodeId) -> bool,
    {
        self.prune_inner(from, &remove)
    }

    fn prune_inner<F>(&mut self, id: NodeId, remove: &F) -> usize
    where
        F: Fn(&ConfigTree, NodeId) -> bool,
    {
        let mut removed = 0;
        let mut doomed = Vec::new();
        for child in self.children(id).to_vec() {
            removed += self.prune_inner(child, remove);
            if remove(self, child) {
                doomed.push(child);
            }
        }
        // Detaching invalidates the cached counts of `id` and its ancestors.
        for child in doomed {
            self.detach(child);
            removed += 1;
        }
        removed
    }

    /// Drop instructions that never executed, along with any subtree whose
    /// aggregated count is zero, then re-derive roll-ups.
    pub fn remove_non_executed(&mut self) -> usize {
        let removed = self.prune(self.root(), |t, id| t.node(id).total_exec_count == 0);
        self.update_exec_counts(None);
        tracing::debug!(removed, "pruned non-executed entries");
        removed
    }

    /// Drop data-movement instructions and the containers left empty.
    pub fn remove_movement(&mut self, options: &PruneOptions) -> usize {
        let mnemonic = options.movement_mnemonic.as_str();
        let removed = self.prune(self.root(), |t, id| {
            let node = t.node(id);
            match node.kind {
                NodeKind::Instruction => node.label.contains(mnemonic),
                _ => is_empty_container(node),
            }
        });
        self.update_exec_counts(None);
        tracing::debug!(removed, mnemonic, "pruned movement entries");
        removed
    }

    /// Keep only instructions ever tagged as candidates.
    pub fn remove_non_candidates(&mut self) -> usize {
        let removed = self.prune(self.root(), |t, id| {
            let node = t.node(id);
            match node.kind {
                NodeKind::Instruction => !node.candidate,
                _ => is_empty_container(node),
            }
        });
        self.update_exec_counts(None);
        tracing::debug!(removed, "pruned non-candidate entries");
        removed
    }

    /// Drop modules, functions and blocks without children.
    pub fn remove_empty_containers(&mut self) -> usize {
        self.prune(self.root(), |t, id| is_empty_container(t.node(id)))
    }
}

fn is_empty_container(node: &ConfigNode) -> bool {
    node.kind.is_container() && node.children.is_empty()
}
