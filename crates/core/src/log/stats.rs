//! Per-instruction statistics derived from the message stream.

use crate::log::{LogFile, CANCELLATION, INST_COUNT, SUMMARY};

const CANCEL_DATA: &str = "CANCEL_DATA";
const RANGE_DATA: &str = "RANGE_DATA";

impl LogFile {
    /// Recompute counts, cancellations and range data of every instruction.
    ///
    /// Requires resolved message references. Also fills an instruction's empty
    /// function, file and line from the top frame of any message trace that
    /// points at it.
    pub fn refresh_instruction_stats(&mut self) {
        let LogFile { messages, traces, instructions, .. } = self;
        let traces = &*traces;
        for insn in instructions.iter_mut() {
            insn.count = 0;
            insn.cancellations = 0;
        }

        for msg in messages.iter() {
            let Some(r) = msg.instruction else { continue };
            let insn = &mut instructions[r.0];

            if let Some(frame) = msg.trace.and_then(|t| traces[t.0].frames.first()) {
                if insn.function.is_empty() {
                    insn.function = frame.function.clone();
                }
                if insn.file.is_empty() {
                    insn.file = frame.file.clone();
                }
                if insn.lineno.is_empty() {
                    insn.lineno = frame.lineno.clone();
                }
            }

            match (msg.kind.as_str(), msg.label.as_str()) {
                (INST_COUNT, _) => {
                    if insn.disassembly.is_empty() {
                        insn.disassembly = msg.label.clone();
                    }
                    if let Ok(count) = msg.priority.trim().parse() {
                        insn.count = count;
                    }
                    insn.update_ratio();
                }
                (CANCELLATION, _) => {
                    insn.cancellations += 1;
                    insn.update_ratio();
                }
                (SUMMARY, CANCEL_DATA) => {
                    let fields = detail_fields(&msg.details);
                    if let Some(total) = fields.get(2).and_then(|f| f.trim().parse().ok()) {
                        insn.total_cancels = total;
                        insn.update_ratio();
                    }
                    if let Some(digits) = fields.get(6).and_then(|f| parse_stat(f)) {
                        insn.average_digits = digits;
                    }
                }
                (SUMMARY, RANGE_DATA) => {
                    let fields = detail_fields(&msg.details);
                    if let Some(min) = fields.get(2).and_then(|f| parse_stat(f)) {
                        insn.min = min;
                    }
                    if let Some(max) = fields.get(4).and_then(|f| parse_stat(f)) {
                        insn.max = max;
                        insn.range = insn.max - insn.min;
                    }
                    if let Some(range) = fields.get(6).and_then(|f| parse_stat(f)) {
                        insn.range = range;
                    }
                }
                _ => {}
            }
        }

        tracing::debug!(instructions = instructions.len(), "instruction statistics refreshed");
    }
}

// `key=value` pairs separated by newlines, flattened. Trailing empty fields are dropped.
fn detail_fields(details: &str) -> Vec<&str> {
    let mut fields: Vec<&str> = details.split(['\n', '=']).collect();
    while fields.last().is_some_and(|f| f.is_empty()) {
        fields.pop();
    }
    fields
}

/// Parse a statistic, accepting `inf`, `-inf` and `nan` prefixes in any case.
pub fn parse_stat(text: &str) -> Option<f64> {
    let text = text.trim();
    let lower = text.to_ascii_lowercase();
    if lower.starts_with("inf") {
        Some(f64::INFINITY)
    } else if lower.starts_with("-inf") {
        Some(f64::NEG_INFINITY)
    } else if lower.starts_with("nan") {
        Some(f64::NAN)
    } else {
        text.parse().ok()
    }
}

