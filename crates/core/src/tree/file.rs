//! A whole config file: passthrough lines plus the tree built from structured entries.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::NodeKind;
use crate::settings::LoadOptions;
use crate::tree::line::{decode_line, encode_line};
use crate::tree::{ConfigNode, ConfigTree, NodeId};

static PRECISION_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+_\d+)_precision=(\d+)").expect("precision line pattern"));

/// Parsed config file.
///
/// `entries` keeps every structured entry in file order, including entries that
/// were never attached or were later pruned, so saving reproduces a complete
/// configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub tree: ConfigTree,
    pub misc_lines: Vec<String>,
    pub entries: Vec<NodeId>,
}

// Most recent open container at each level while reading.
#[derive(Default)]
struct Cursor {
    module: Option<NodeId>,
    function: Option<NodeId>,
    block: Option<NodeId>,
}

impl ConfigFile {
    /// Build a config file from raw lines.
    pub fn from_lines<I, S>(lines: I, options: &LoadOptions) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut file = ConfigFile::default();
        let mut cursor = Cursor::default();
        let mut detached = 0usize;
        let mut orphans = 0usize;

        for line in lines {
            let line = line.as_ref();
            let Some(node) = decode_line(line) else {
                file.misc_lines.push(line.to_string());
                continue;
            };
            let kind = node.kind;
            let id = file.tree.alloc(node);
            file.entries.push(id);

            let parent = match kind {
                NodeKind::Application => {
                    file.tree.set_root(id);
                    cursor = Cursor::default();
                    continue;
                }
                NodeKind::Module => {
                    detached += file.close(cursor.block.take(), options);
                    detached += file.close(cursor.function.take(), options);
                    detached += file.close(cursor.module.replace(id), options);
                    Some(file.tree.root())
                }
                NodeKind::Function => {
                    detached += file.close(cursor.block.take(), options);
                    detached += file.close(cursor.function.take(), options);
                    cursor.function = cursor.module.map(|_| id);
                    cursor.module
                }
                NodeKind::BasicBlock => {
                    detached += file.close(cursor.block.take(), options);
                    cursor.block = cursor.function.map(|_| id);
                    cursor.function
                }
                NodeKind::Instruction => cursor.block,
                NodeKind::Variable => cursor.function.or(cursor.module),
                NodeKind::None => None,
            };

            match parent {
                Some(parent) => file.tree.attach(parent, id),
                None => {
                    orphans += 1;
                    tracing::debug!(line, "config entry has no enclosing container");
                }
            }
        }

        detached += file.close(cursor.block.take(), options);
        detached += file.close(cursor.function.take(), options);
        detached += file.close(cursor.module.take(), options);

        for line in file.misc_lines.clone() {
            file.apply_precision_line(&line);
        }

        tracing::debug!(
            entries = file.entries.len(),
            misc = file.misc_lines.len(),
            detached,
            orphans,
            "config file parsed"
        );
        file
    }

    // Detach a finished container that holds nothing countable.
    fn close(&mut self, container: Option<NodeId>, options: &LoadOptions) -> usize {
        let Some(id) = container else { return 0 };
        if !options.detach_empty_containers {
            return 0;
        }
        if self.tree.insn_count(id) == 0 && self.tree.var_count(id) == 0 {
            self.tree.detach(id);
            1
        } else {
            0
        }
    }

    /// Apply a `KIND_N_precision=P` line to the matching entry.
    ///
    /// Returns whether a node was updated. The line is not consumed; it stays
    /// among the passthrough lines.
    pub fn apply_precision_line(&mut self, line: &str) -> bool {
        let Some(caps) = PRECISION_LINE.captures(line) else { return false };
        let Ok(precision) = caps[2].parse::<u32>() else { return false };
        let short_id = &caps[1];
        // Later entries shadow earlier ones with the same short id.
        let target =
            self.entries.iter().rev().copied().find(|id| self.tree.node(*id).short_id() == short_id);
        match target {
            Some(id) => {
                self.tree.set_precision(id, Some(precision));
                true
            }
            None => false,
        }
    }

    /// Serialize: passthrough lines first, then every structured entry in file order.
    pub fn to_lines(&self) -> Vec<String> {
        self.misc_lines
            .iter()
            .cloned()
            .chain(self.entries.iter().map(|id| encode_line(self.tree.node(*id))))
            .collect()
    }

    /// Append a new entry below `parent`, recording it for saving.
    pub fn push_entry(&mut self, parent: NodeId, node: ConfigNode) -> NodeId {
        let id = self.tree.add_child(parent, node);
        self.entries.push(id);
        id
    }
}
