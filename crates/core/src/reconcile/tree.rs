use crate::error::{MergeIssue, MergeReport};
use crate::tree::{ConfigTree, NodeId};

impl ConfigTree {
    /// Merge the statuses of a same-shaped tree into this one.
    ///
    /// Each incoming entry is folded into the first child of the matched parent
    /// with the same kind and label. Entries without a counterpart are reported
    /// and skipped along with their subtree; siblings still merge.
    pub fn merge(&mut self, incoming: &ConfigTree) -> MergeReport {
        let mut report = MergeReport::default();
        let (ours, theirs) = (self.root(), incoming.root());

        let (original, other) = (&self.node(ours).label, &incoming.node(theirs).label);
        if original != other {
            report.push(MergeIssue::RootLabelMismatch {
                original: original.clone(),
                incoming: other.clone(),
            });
            return report;
        }

        self.node_mut(ours).merge_status(incoming.node(theirs));
        self.merge_children(ours, incoming, theirs, &mut report);
        tracing::debug!(issues = report.issues.len(), "config trees merged");
        report
    }

    fn merge_children(
        &mut self,
        ours: NodeId,
        incoming: &ConfigTree,
        theirs: NodeId,
        report: &mut MergeReport,
    ) {
        for &child in incoming.children(theirs) {
            let other = incoming.node(child);
            let target = self.children(ours).iter().copied().find(|c| {
                let node = self.node(*c);
                node.kind == other.kind && node.label == other.label
            });
            match target {
                Some(target) => {
                    self.node_mut(target).merge_status(other);
                    self.merge_children(target, incoming, child, report);
                }
                None => report.push(MergeIssue::MissingEntry {
                    kind: other.kind,
                    label: other.label.clone(),
                }),
            }
        }
    }
}
