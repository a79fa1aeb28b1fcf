use std::collections::HashMap;

use crate::log::{LogFile, Message};

/// What one log merge added to the target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogMergeSummary {
    pub instructions_added: usize,
    pub traces_added: usize,
    pub messages_appended: usize,
    /// Incoming message references that named nothing in the incoming log.
    pub dangling_references: usize,
}

impl LogFile {
    /// Append another log's messages, reconciling instructions and traces.
    ///
    /// An incoming instruction at an address this log already knows maps onto
    /// the existing entry; any other gets a fresh id and joins both indexes.
    /// Traces with an identical frame sequence are shared, others get a fresh
    /// id. Messages are appended in arrival order with their ids remapped.
    pub fn merge(&mut self, incoming: &LogFile) -> LogMergeSummary {
        let mut summary = LogMergeSummary::default();

        let mut insn_ids: HashMap<&str, String> = HashMap::new();
        for insn in incoming.instructions() {
            let found = self.instruction_by_address(&insn.address).map(|i| i.id.clone());
            let id = match found {
                Some(existing) => existing,
                None => {
                    let mut fresh = insn.clone();
                    fresh.id = self.fresh_instruction_id();
                    let id = fresh.id.clone();
                    self.register_instruction(fresh);
                    summary.instructions_added += 1;
                    id
                }
            };
            insn_ids.insert(insn.id.as_str(), id);
        }

        let mut trace_ids: HashMap<&str, String> = HashMap::new();
        for trace in incoming.traces() {
            let found = self.traces().find(|t| t.same_frames(trace)).map(|t| t.id.clone());
            let id = match found {
                Some(existing) => existing,
                None => {
                    let mut fresh = trace.clone();
                    fresh.id = self.fresh_trace_id();
                    let id = fresh.id.clone();
                    self.register_trace(fresh);
                    summary.traces_added += 1;
                    id
                }
            };
            trace_ids.insert(trace.id.as_str(), id);
        }

        for msg in &incoming.messages {
            let mut msg: Message = msg.clone();
            summary.dangling_references += remap(&mut msg.trace_id, &trace_ids);
            summary.dangling_references += remap(&mut msg.instruction_id, &insn_ids);
            msg.trace = self.trace_ref(&msg.trace_id);
            msg.instruction = self.instruction_ref(&msg.instruction_id);
            self.messages.push(msg);
            summary.messages_appended += 1;
        }

        if summary.dangling_references > 0 {
            tracing::debug!(
                dangling = summary.dangling_references,
                "cleared message references unknown to the merged log"
            );
        }
        tracing::debug!(
            instructions_added = summary.instructions_added,
            traces_added = summary.traces_added,
            messages = summary.messages_appended,
            "log merged"
        );
        summary
    }
}

// Rewrite a non-empty id through `mapping`, clearing it when unmapped.
fn remap(id: &mut String, mapping: &HashMap<&str, String>) -> usize {
    if id.is_empty() {
        return 0;
    }
    match mapping.get(id.as_str()) {
        Some(new_id) => {
            *id = new_id.clone();
            0
        }
        None => {
            id.clear();
            1
        }
    }
}
