//! Bottom-up roll-up of dynamic execution counts onto the config tree.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::log::LogFile;
use crate::model::{NodeKind, NodeStatus};
use crate::tree::{ConfigTree, NodeId};

/// Percentages of an execution count spent under the main precision statuses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusShares {
    pub single: u64,
    pub double: u64,
    pub ignore: u64,
}

impl StatusShares {
    fn of(exec_count: &HashMap<NodeStatus, u64>, total: u64) -> Self {
        if total == 0 {
            return Self::default();
        }
        let pct = |s: NodeStatus| exec_count.get(&s).map(|c| percent(*c, total)).unwrap_or(0);
        Self {
            single: pct(NodeStatus::Single),
            double: pct(NodeStatus::Double),
            ignore: pct(NodeStatus::Ignore),
        }
    }
}

/// Coverage and status breakdown of one node after aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecSummary {
    pub insn_count: u64,
    /// Covered instructions as a percentage of `insn_count`.
    pub coverage: u64,
    pub total_exec_count: u64,
    /// Shares relative to this node's own execution count.
    pub local: StatusShares,
    /// Shares relative to the root's execution count.
    pub global: StatusShares,
}

impl ConfigTree {
    /// Recompute execution counts for the whole attached tree.
    ///
    /// With a log, every instruction whose address the log knows takes that
    /// instruction's count; instructions the log does not know keep their
    /// current count. Containers are zeroed and rebuilt from their children on
    /// every call, so repeated calls give identical results.
    pub fn update_exec_counts(&mut self, log: Option<&LogFile>) {
        let effective = self.resolve_statuses(self.root());
        for id in self.post_order() {
            let status = effective[id.index()];
            if self.node(id).kind == NodeKind::Instruction {
                self.update_leaf(id, status, log);
            } else {
                self.rollup(id);
            }
        }
        let root = self.node(self.root());
        tracing::debug!(
            total = root.total_exec_count,
            covered = root.insn_exec_count,
            with_log = log.is_some(),
            "execution counts updated"
        );
    }

    fn update_leaf(&mut self, id: NodeId, status: NodeStatus, log: Option<&LogFile>) {
        let node = self.node_mut(id);
        if let Some(insn) = log.and_then(|l| l.instruction_by_address(&node.address)) {
            node.total_exec_count = insn.count;
        }
        node.insn_exec_count = u64::from(node.total_exec_count > 0);
        node.exec_count.clear();
        node.exec_count.insert(status, node.total_exec_count);
    }

    // Children are already up to date (post-order).
    fn rollup(&mut self, id: NodeId) {
        let mut insn_exec = 0u64;
        let mut total = 0u64;
        let mut by_status: HashMap<NodeStatus, u64> = HashMap::new();
        for child in self.children(id) {
            let c = self.node(*child);
            insn_exec = c.insn_exec_count.saturating_add(insn_exec);
            total = c.total_exec_count.saturating_add(total);
            for (status, count) in &c.exec_count {
                let slot = by_status.entry(*status).or_insert(0);
                *slot = slot.saturating_add(*count);
            }
        }
        let node = self.node_mut(id);
        node.reset_exec_counts();
        node.insn_exec_count = insn_exec;
        node.total_exec_count = total;
        node.exec_count = by_status;
    }

    /// Coverage and status shares of `id`, from the last aggregation pass.
    pub fn exec_summary(&self, id: NodeId) -> ExecSummary {
        let node = self.node(id);
        let insn_count = self.insn_count(id);
        let coverage = percent(node.insn_exec_count, insn_count);
        let root_total = self.node(self.root()).total_exec_count;
        ExecSummary {
            insn_count,
            coverage,
            total_exec_count: node.total_exec_count,
            local: StatusShares::of(&node.exec_count, node.total_exec_count),
            global: StatusShares::of(&node.exec_count, root_total),
        }
    }
}

// Integer percentage of `part` in `total`, widened so large counts cannot overflow.
fn percent(part: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    u64::try_from(u128::from(part) * 100 / u128::from(total)).unwrap_or(u64::MAX)
}
