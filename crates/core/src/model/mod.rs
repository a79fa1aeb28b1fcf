//! Closed vocabularies shared by the config tree and the config-line codec.
//!
//! - `NodeKind`: the level of a config entry (application down to instruction/variable).
//! - `NodeStatus`: the analysis status attached to an entry.

use serde::{Deserialize, Serialize};

/// Level of a config-tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Line carried no recognizable kind keyword.
    None,
    Application,
    Module,
    Function,
    BasicBlock,
    Instruction,
    /// Leaf for a program variable; lives beside instructions rather than under blocks.
    Variable,
}

impl NodeKind {
    /// Keyword search order used when decoding a line. First hit wins.
    pub const DECODE_ORDER: [NodeKind; 6] = [
        NodeKind::Application,
        NodeKind::Module,
        NodeKind::Function,
        NodeKind::BasicBlock,
        NodeKind::Instruction,
        NodeKind::Variable,
    ];

    /// Literal written to (and searched for in) config lines.
    pub fn keyword(self) -> &'static str {
        match self {
            NodeKind::Application => "APPLICATION",
            NodeKind::Module => "MODULE",
            NodeKind::Function => "FUNC",
            NodeKind::BasicBlock => "BBLK",
            NodeKind::Instruction => "INSN",
            NodeKind::Variable => "VAR",
            NodeKind::None => "UNKNOWN",
        }
    }

    /// Short name used by precision lines (`FUNC_12_precision=23`).
    pub fn short_name(self) -> &'static str {
        match self {
            NodeKind::Application => "APPL",
            NodeKind::Module => "MODL",
            NodeKind::Function => "FUNC",
            NodeKind::BasicBlock => "BBLK",
            NodeKind::Instruction => "INSN",
            NodeKind::Variable => "VAR",
            NodeKind::None => "UNKNOWN",
        }
    }

    /// Default number of spaces written before the keyword.
    pub fn default_indent(self) -> usize {
        match self {
            NodeKind::Application | NodeKind::None => 0,
            NodeKind::Module => 2,
            NodeKind::Function => 4,
            NodeKind::BasicBlock => 6,
            NodeKind::Instruction | NodeKind::Variable => 8,
        }
    }

    /// Kind expected for children of this kind, if any.
    pub fn child_kind(self) -> Option<NodeKind> {
        match self {
            NodeKind::Application => Some(NodeKind::Module),
            NodeKind::Module => Some(NodeKind::Function),
            NodeKind::Function => Some(NodeKind::BasicBlock),
            NodeKind::BasicBlock => Some(NodeKind::Instruction),
            NodeKind::Instruction | NodeKind::Variable | NodeKind::None => None,
        }
    }

    /// Whether `child` may sit directly below this kind in a well-formed tree.
    ///
    /// Variables hang off modules (globals) and functions (locals).
    pub fn accepts_child(self, child: NodeKind) -> bool {
        self.child_kind() == Some(child)
            || (child == NodeKind::Variable
                && matches!(self, NodeKind::Module | NodeKind::Function))
    }

    pub fn is_leaf(self) -> bool {
        matches!(self, NodeKind::Instruction | NodeKind::Variable)
    }

    /// Containers whose only purpose is grouping; pruned when they end up empty.
    pub fn is_container(self) -> bool {
        matches!(self, NodeKind::Module | NodeKind::Function | NodeKind::BasicBlock)
    }
}

/// Analysis status of a config entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    None,
    Ignore,
    Candidate,
    Single,
    Double,
    TimeRange,
    ReducedPrecision,
    Null,
    CustomInstrumentation,
    DisabledCancel,
    DisabledNaN,
}

impl NodeStatus {
    pub const ALL: [NodeStatus; 11] = [
        NodeStatus::None,
        NodeStatus::Ignore,
        NodeStatus::Candidate,
        NodeStatus::Single,
        NodeStatus::Double,
        NodeStatus::TimeRange,
        NodeStatus::ReducedPrecision,
        NodeStatus::Null,
        NodeStatus::CustomInstrumentation,
        NodeStatus::DisabledCancel,
        NodeStatus::DisabledNaN,
    ];

    /// Order in which a merge picks a winner when neither side is a candidate.
    pub const MERGE_PRIORITY: [NodeStatus; 9] = [
        NodeStatus::Ignore,
        NodeStatus::Double,
        NodeStatus::Single,
        NodeStatus::ReducedPrecision,
        NodeStatus::TimeRange,
        NodeStatus::CustomInstrumentation,
        NodeStatus::DisabledCancel,
        NodeStatus::DisabledNaN,
        NodeStatus::Null,
    ];

    /// Decode the one-character status code. Unknown codes map to `None`.
    pub fn from_code(code: char) -> Self {
        match code {
            '!' => NodeStatus::Ignore,
            '?' => NodeStatus::Candidate,
            's' => NodeStatus::Single,
            'd' => NodeStatus::Double,
            't' => NodeStatus::TimeRange,
            'r' => NodeStatus::ReducedPrecision,
            'x' => NodeStatus::Null,
            'i' => NodeStatus::CustomInstrumentation,
            'c' => NodeStatus::DisabledCancel,
            'n' => NodeStatus::DisabledNaN,
            _ => NodeStatus::None,
        }
    }

    pub fn code(self) -> char {
        match self {
            NodeStatus::None => ' ',
            NodeStatus::Ignore => '!',
            NodeStatus::Candidate => '?',
            NodeStatus::Single => 's',
            NodeStatus::Double => 'd',
            NodeStatus::TimeRange => 't',
            NodeStatus::ReducedPrecision => 'r',
            NodeStatus::Null => 'x',
            NodeStatus::CustomInstrumentation => 'i',
            NodeStatus::DisabledCancel => 'c',
            NodeStatus::DisabledNaN => 'n',
        }
    }

    /// Four-letter abbreviation used in diagnostics.
    pub fn abbrev(self) -> &'static str {
        match self {
            NodeStatus::None => "NONE",
            NodeStatus::Ignore => "IGNR",
            NodeStatus::Candidate => "CAND",
            NodeStatus::Single => "SING",
            NodeStatus::Double => "DOUB",
            NodeStatus::TimeRange => "TRAN",
            NodeStatus::ReducedPrecision => "RPRC",
            NodeStatus::Null => "NULL",
            NodeStatus::CustomInstrumentation => "CINS",
            NodeStatus::DisabledCancel => "DCAN",
            NodeStatus::DisabledNaN => "DNAN",
        }
    }

    /// Combine the status already in place with an incoming one, ignoring candidate tags.
    ///
    /// The first status of [`Self::MERGE_PRIORITY`] present on either side wins.
    pub fn merged_with(self, incoming: NodeStatus) -> NodeStatus {
        NodeStatus::MERGE_PRIORITY
            .into_iter()
            .find(|s| *s == self || *s == incoming)
            .unwrap_or(NodeStatus::None)
    }
}
