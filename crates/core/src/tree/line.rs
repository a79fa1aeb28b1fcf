//! Codec for single config-file entries.
//!
//! Line shape: `^` status-code ` ` indent KEYWORD ` #` number `: ` address [` "label"`].
//! Every field is decoded independently; a missing or malformed field falls back
//! to its default instead of rejecting the line.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{NodeKind, NodeStatus};
use crate::tree::ConfigNode;

/// First character of every structured entry. Other lines are passthrough data.
pub const CONFIG_LINE_MARKER: char = '^';

static HEX_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"0x[0-9a-fA-F]+").expect("hex literal pattern"));

/// Decode one line. Returns `None` when the line is not a structured entry.
pub fn decode_line(line: &str) -> Option<ConfigNode> {
    if !line.starts_with(CONFIG_LINE_MARKER) {
        return None;
    }

    let status = line[1..].chars().next().map(NodeStatus::from_code).unwrap_or(NodeStatus::None);

    let kind = NodeKind::DECODE_ORDER
        .into_iter()
        .find(|k| line.contains(k.keyword()))
        .unwrap_or(NodeKind::None);

    let mut node = ConfigNode::new(kind, status, 0, label_of(line));
    if let Some(number) = number_of(line) {
        node.number = number;
    }
    node.address =
        HEX_LITERAL.find(line).map(|m| m.as_str().to_string()).unwrap_or_else(|| "0".to_string());
    node.indent = indent_of(line, kind);
    Some(node)
}

/// Encode a node back into its line form.
pub fn encode_line(node: &ConfigNode) -> String {
    let indent = node.indent.unwrap_or_else(|| node.kind.default_indent());
    let mut out = String::with_capacity(32 + node.label.len());
    out.push(CONFIG_LINE_MARKER);
    out.push(node.status.code());
    out.push(' ');
    out.extend(std::iter::repeat(' ').take(indent));
    out.push_str(node.kind.keyword());
    out.push_str(" #");
    out.push_str(&node.number.to_string());
    out.push_str(": ");
    out.push_str(&node.address);
    if !node.label.is_empty() {
        out.push(' ');
        out.push_str(&node.label);
    }
    out
}

// Digits right after the first '#'; an overflowing run is treated as absent.
fn number_of(line: &str) -> Option<u32> {
    let rest = &line[line.find('#')? + 1..];
    let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    rest[..end].parse().ok()
}

// Outermost double-quoted run, quotes included.
fn label_of(line: &str) -> String {
    match (line.find('"'), line.rfind('"')) {
        (Some(start), Some(end)) if end > start => line[start..=end].to_string(),
        _ => String::new(),
    }
}

// Spaces between the status separator and the keyword, when the keyword comes first.
fn indent_of(line: &str, kind: NodeKind) -> Option<usize> {
    let body = line.get(3..)?;
    let trimmed = body.trim_start_matches(' ');
    if kind != NodeKind::None && trimmed.starts_with(kind.keyword()) {
        Some(body.len() - trimmed.len())
    } else {
        None
    }
}
