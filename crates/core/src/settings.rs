use serde::{Deserialize, Serialize};

use crate::model::{NodeKind, NodeStatus};
use crate::tree::{ConfigTree, NodeId};

/// What a renderer is currently colouring the tree by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    #[default]
    Status,
    Precision,
    Coverage,
    Error,
}

/// Display preferences, passed explicitly to the queries that need them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewOptions {
    pub mode: DisplayMode,
    pub show_code_coverage: bool,
    pub show_error: bool,
    pub show_precision: bool,
}

/// Knobs for turning a raw event stream into a log model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestOptions {
    /// Relative message times are divided by this (integer division).
    pub time_divisor: i64,
    /// Priority that marks a cancellation as affecting every digit.
    pub all_priority_sentinel: String,
    /// Replacement written for [`Self::all_priority_sentinel`].
    pub all_priority_label: String,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            time_divisor: 1000,
            all_priority_sentinel: "999".to_string(),
            all_priority_label: "ALL".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PruneOptions {
    /// Instructions whose label contains this are treated as data movement.
    pub movement_mnemonic: String,
}

impl Default for PruneOptions {
    fn default() -> Self {
        Self { movement_mnemonic: "mov".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Detach modules, functions and blocks that end up with no instructions or variables.
    pub detach_empty_containers: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { detach_empty_containers: true }
    }
}

/// Serializable session settings, typically stored as JSON next to the config files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Settings format version, not the tool version.
    pub config_version: String,
    pub view: ViewOptions,
    pub ingest: IngestOptions,
    pub prune: PruneOptions,
    pub load: LoadOptions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            config_version: "0.1.0".to_string(),
            view: ViewOptions::default(),
            ingest: IngestOptions::default(),
            prune: PruneOptions::default(),
            load: LoadOptions::default(),
        }
    }
}

/// Read-back of one node for a renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeView {
    pub kind: NodeKind,
    pub label: String,
    pub identity_tag: String,
    pub effective_status: NodeStatus,
    pub candidate: bool,
    pub insn_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_precision: Option<u32>,
    /// Covered-instruction percentage and total execution count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage: Option<(u64, u64)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<f64>,
}

impl ConfigTree {
    /// Snapshot of `id` with the optional columns selected by `options`.
    pub fn view(&self, id: NodeId, options: &ViewOptions) -> NodeView {
        let node = self.node(id);
        let show_precision = options.show_precision || options.mode == DisplayMode::Precision;
        let show_coverage = options.show_code_coverage || options.mode == DisplayMode::Coverage;
        let show_error = options.show_error || options.mode == DisplayMode::Error;
        NodeView {
            kind: node.kind,
            label: node.label.clone(),
            identity_tag: node.identity_tag(),
            effective_status: self.effective_status(id),
            candidate: node.candidate,
            insn_count: self.insn_count(id),
            effective_precision: if show_precision { self.effective_precision(id) } else { None },
            coverage: show_coverage.then(|| {
                let summary = self.exec_summary(id);
                (summary.coverage, summary.total_exec_count)
            }),
            error: show_error.then_some(node.error),
        }
    }
}
