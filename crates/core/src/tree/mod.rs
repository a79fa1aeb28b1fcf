//! Config tree: the static program structure annotated with analysis statuses.
//!
//! Nodes live in an arena owned by [`ConfigTree`] and are addressed by [`NodeId`].
//! Each node stores its parent's id as a non-owning back-reference; children are
//! ordered id lists. Detaching a subtree unlinks it from its parent but keeps the
//! arena slots, so entries that were loaded from a file can still be written back.

use std::cell::Cell;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{NodeKind, NodeStatus};

pub mod aggregate;
pub mod file;
pub mod line;
pub mod prune;
pub mod resolve;

pub use aggregate::{ExecSummary, StatusShares};
pub use file::ConfigFile;
pub use line::{decode_line, encode_line, CONFIG_LINE_MARKER};

/// Stable index of a node inside its [`ConfigTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Lazily derived value: distinct from an "unset" payload such as `Option::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Memo<T> {
    #[default]
    Stale,
    Ready(T),
}

/// One entry of the config tree.
#[derive(Debug, Clone)]
pub struct ConfigNode {
    pub kind: NodeKind,
    pub status: NodeStatus,
    /// Sticky flag: set once the entry was ever tagged as a candidate.
    pub candidate: bool,
    pub number: u32,
    /// Hexadecimal address literal, `"0"` when the entry had none.
    pub address: String,
    /// Free text, kept verbatim including its surrounding quotes.
    pub label: String,
    pub(crate) precision: Option<u32>,
    /// Spaces seen before the kind keyword when decoded; `None` means the kind default.
    pub indent: Option<usize>,

    pub exec_count: HashMap<NodeStatus, u64>,
    pub total_exec_count: u64,
    /// Number of covered instructions (executed at least once) in this subtree.
    pub insn_exec_count: u64,

    /// Error score attached from tested results.
    pub error: f64,
    pub tested: bool,

    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) insn_count: Cell<Memo<u64>>,
    pub(crate) precision_from_children: Cell<Memo<Option<u32>>>,
}

impl ConfigNode {
    pub fn new(kind: NodeKind, status: NodeStatus, number: u32, label: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            candidate: status == NodeStatus::Candidate,
            number,
            address: "0".to_string(),
            label: label.into(),
            precision: None,
            indent: None,
            exec_count: HashMap::new(),
            total_exec_count: 0,
            insn_exec_count: 0,
            error: 0.0,
            tested: false,
            parent: None,
            children: Vec::new(),
            insn_count: Cell::new(Memo::Stale),
            precision_from_children: Cell::new(Memo::Stale),
        }
    }

    /// Root placeholder used before any APPLICATION entry is seen.
    pub fn default_application() -> Self {
        let mut node = Self::new(NodeKind::Application, NodeStatus::None, 1, "Default App");
        node.address = String::new();
        node
    }

    /// Builder-style helper to attach an address.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Builder-style helper to attach a precision hint.
    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn precision(&self) -> Option<u32> {
        self.precision
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Cross-reference key: `KEYWORD #number: address`.
    pub fn identity_tag(&self) -> String {
        let keyword = if self.kind == NodeKind::None { "" } else { self.kind.keyword() };
        format!("{keyword} #{}: {}", self.number, self.address)
    }

    /// Key used by precision lines: `SHORT_number`.
    pub fn short_id(&self) -> String {
        format!("{}_{}", self.kind.short_name(), self.number)
    }

    /// Zero all dynamic counters.
    pub fn reset_exec_counts(&mut self) {
        self.insn_exec_count = 0;
        self.total_exec_count = 0;
        self.exec_count.clear();
    }

    /// Fold another entry's status into this one.
    ///
    /// Candidate tags are sticky: an incoming candidate only sets the tag, and a
    /// tagged entry adopts whatever non-candidate status arrives. Otherwise the
    /// fixed priority chain decides.
    pub fn merge_status(&mut self, incoming: &ConfigNode) {
        if (self.candidate || incoming.candidate) && incoming.status != NodeStatus::Candidate {
            self.status = incoming.status;
            self.candidate = true;
        } else if incoming.status == NodeStatus::Candidate {
            self.candidate = true;
        } else {
            self.status = self.status.merged_with(incoming.status);
        }
    }
}

/// Rooted config tree backed by an arena.
#[derive(Debug, Clone)]
pub struct ConfigTree {
    nodes: Vec<ConfigNode>,
    root: NodeId,
}

impl Default for ConfigTree {
    fn default() -> Self {
        Self::new(ConfigNode::default_application())
    }
}

impl ConfigTree {
    pub fn new(mut root: ConfigNode) -> Self {
        root.parent = None;
        root.children.clear();
        Self { nodes: vec![root], root: NodeId(0) }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Make an already-allocated, detached node the new root.
    pub fn set_root(&mut self, id: NodeId) {
        self.detach(id);
        self.root = id;
    }

    /// Allocate a node without linking it anywhere.
    pub fn alloc(&mut self, mut node: ConfigNode) -> NodeId {
        node.parent = None;
        node.children.clear();
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Allocate `node` and append it below `parent`.
    ///
    /// Kind mismatches are tolerated; resolution never assumes a well-formed tree.
    pub fn add_child(&mut self, parent: NodeId, node: ConfigNode) -> NodeId {
        let id = self.alloc(node);
        self.attach(parent, id);
        id
    }

    /// Link an allocated, detached node below `parent`.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        let (parent_kind, child_kind) = (self.nodes[parent.0].kind, self.nodes[child.0].kind);
        if !parent_kind.accepts_child(child_kind) {
            tracing::debug!(
                parent = parent_kind.keyword(),
                child = child_kind.keyword(),
                "attaching child of unexpected kind"
            );
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        self.invalidate_upward(parent);
    }

    /// Unlink `child` from its parent. The arena slot is kept.
    pub fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.nodes[child.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != child);
            self.invalidate_upward(parent);
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&ConfigNode> {
        self.nodes.get(id.0)
    }

    pub fn node(&self, id: NodeId) -> &ConfigNode {
        &self.nodes[id.0]
    }

    /// Mutable access to a node's fields. Use [`Self::set_precision`] for precision
    /// so derived caches stay coherent.
    pub fn node_mut(&mut self, id: NodeId) -> &mut ConfigNode {
        &mut self.nodes[id.0]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Whether `id` is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut cur = id;
        loop {
            if cur == self.root {
                return true;
            }
            match self.nodes[cur.0].parent {
                Some(p) => cur = p,
                None => return false,
            }
        }
    }

    /// Total arena slots, attached or not.
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    pub fn set_precision(&mut self, id: NodeId, precision: Option<u32>) {
        self.nodes[id.0].precision = precision;
        self.invalidate_upward(id);
    }

    /// Mark `id` and all its ancestors as needing recomputation of derived counts.
    pub(crate) fn invalidate_upward(&self, id: NodeId) {
        let mut cur = Some(id);
        while let Some(n) = cur {
            let node = &self.nodes[n.0];
            node.insn_count.set(Memo::Stale);
            node.precision_from_children.set(Memo::Stale);
            cur = node.parent;
        }
    }

    /// Node ids of the attached tree in pre-order (parent before children).
    pub fn pre_order(&self) -> Vec<NodeId> {
        self.subtree(self.root)
    }

    /// Node ids of the attached tree in post-order (children before parent).
    pub fn post_order(&self) -> Vec<NodeId> {
        let mut out = self.pre_order_mirrored();
        out.reverse();
        out
    }

    // Pre-order with children visited right to left; reversed it yields post-order.
    fn pre_order_mirrored(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id.0].children.iter().copied());
        }
        out
    }

    /// Number of nodes reachable from the root.
    pub fn len(&self) -> usize {
        self.pre_order().len()
    }

    /// True when the root has no entries below it.
    pub fn has_no_entries(&self) -> bool {
        self.nodes[self.root.0].children.is_empty()
    }

    /// Every attached non-leaf has children of exactly the kind below it.
    pub fn is_well_formed(&self) -> bool {
        self.pre_order().into_iter().all(|id| {
            let node = &self.nodes[id.0];
            node.children.iter().all(|c| node.kind.accepts_child(self.nodes[c.0].kind))
        })
    }

    /// Map identity tag → node for every attached node.
    pub fn tag_index(&self) -> HashMap<String, NodeId> {
        self.pre_order().into_iter().map(|id| (self.nodes[id.0].identity_tag(), id)).collect()
    }

    pub fn find_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.pre_order().into_iter().find(|id| self.nodes[id.0].identity_tag() == tag)
    }

    /// First attached node with the given kind and number.
    pub fn find_by_short_id(&self, short_id: &str) -> Option<NodeId> {
        self.pre_order().into_iter().find(|id| self.nodes[id.0].short_id() == short_id)
    }

    /// Count attached instructions by their raw status.
    pub fn status_counts(&self) -> HashMap<NodeStatus, u64> {
        let mut counts = HashMap::new();
        for id in self.pre_order() {
            let node = &self.nodes[id.0];
            if node.kind == NodeKind::Instruction {
                *counts.entry(node.status).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Rewrite the raw status of every instruction below `from` that currently equals `orig`.
    pub fn batch_config(&mut self, from: NodeId, orig: NodeStatus, dest: NodeStatus) -> usize {
        let mut changed = 0;
        for id in self.subtree(from) {
            let node = &mut self.nodes[id.0];
            if node.kind == NodeKind::Instruction && node.status == orig {
                node.status = dest;
                changed += 1;
            }
        }
        changed
    }

    /// Assign an error score to `id` and its whole subtree.
    pub fn set_error(&mut self, id: NodeId, error: f64) {
        for n in self.subtree(id) {
            self.nodes[n.0].error = error;
        }
    }

    /// Ids of `id` and all its descendants, pre-order.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.nodes[n.0].children.iter().rev().copied());
        }
        out
    }
}
