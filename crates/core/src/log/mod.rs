//! Dynamic execution log: messages referring to stack traces and instructions.
//!
//! Traces and instructions are stored in arenas and addressed by [`TraceRef`] /
//! [`InsnRef`]. Their serialized ids and (for instructions) addresses are kept in
//! side indexes; the address index is the identity used when logs are merged or
//! matched against a config tree.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

mod stats;

pub use stats::parse_stat;

/// Message type of per-instruction execution counts.
pub const INST_COUNT: &str = "InstCount";
pub const CANCELLATION: &str = "Cancellation";
pub const SUMMARY: &str = "Summary";

/// Priority value shown for "every digit cancelled".
pub const ALL_PRIORITY: &str = "ALL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceRef(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InsnRef(usize);

/// One stack frame. All fields are kept as the text the log carried.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub level: String,
    pub address: String,
    pub function: String,
    pub file: String,
    pub lineno: String,
    pub module: String,
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}  {}", self.level, self.address)?;
        if !self.function.is_empty() {
            write!(f, " in {}", self.function)?;
        }
        if !self.file.is_empty() {
            write!(f, " at {}", self.file)?;
            if !self.lineno.is_empty() {
                write!(f, ":{}", self.lineno)?;
            }
        }
        if !self.module.is_empty() {
            write!(f, " from {}", self.module)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    pub id: String,
    pub frames: Vec<Frame>,
}

impl Trace {
    /// Structural equality of the frame sequence, ignoring ids.
    pub fn same_frames(&self, other: &Trace) -> bool {
        self.frames == other.frames
    }

    pub fn top(&self) -> Option<&Frame> {
        self.frames.first()
    }
}

/// Static description of an instruction plus the statistics derived from messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub id: String,
    pub address: String,
    pub text: String,
    pub disassembly: String,
    pub function: String,
    pub file: String,
    pub lineno: String,
    pub module: String,

    pub count: u64,
    pub cancellations: u64,
    pub total_cancels: u64,
    pub ratio: f64,
    pub average_digits: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
}

impl Default for Instruction {
    fn default() -> Self {
        Self {
            id: String::new(),
            address: String::new(),
            text: String::new(),
            disassembly: String::new(),
            function: String::new(),
            file: String::new(),
            lineno: String::new(),
            module: String::new(),
            count: 0,
            cancellations: 0,
            total_cancels: 0,
            ratio: 0.0,
            average_digits: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            range: f64::INFINITY,
        }
    }
}

impl Instruction {
    pub fn new(id: impl Into<String>, address: impl Into<String>) -> Self {
        Self { id: id.into(), address: address.into(), ..Self::default() }
    }

    /// Cancellations per execution, preferring the summarized total when present.
    pub fn update_ratio(&mut self) {
        self.ratio = if self.count == 0 {
            0.0
        } else if self.total_cancels != 0 {
            self.total_cancels as f64 / self.count as f64
        } else {
            self.cancellations as f64 / self.count as f64
        };
    }

    /// `file:lineno`, or empty when either part is unknown.
    pub fn source(&self) -> String {
        if self.file.is_empty() || self.lineno.is_empty() {
            String::new()
        } else {
            format!("{}:{}", self.file, self.lineno)
        }
    }
}

/// One logged event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub time: String,
    pub priority: String,
    /// Message type such as `InstCount`, `Cancellation` or `Summary`.
    pub kind: String,
    pub label: String,
    pub details: String,
    pub trace_id: String,
    pub instruction_id: String,
    /// Resolved from `trace_id` once every trace is known.
    #[serde(skip)]
    pub trace: Option<TraceRef>,
    /// Resolved from `instruction_id` once every instruction is known.
    #[serde(skip)]
    pub instruction: Option<InsnRef>,
}

impl Message {
    /// Numeric priority; the `ALL` marker ranks as 999 and unparseable text as 0.
    pub fn priority_level(&self) -> i64 {
        if self.priority == ALL_PRIORITY {
            999
        } else {
            self.priority.trim().parse().unwrap_or(0)
        }
    }

    /// Time relative to the first message, when it was numeric.
    pub fn elapsed(&self) -> Option<i64> {
        self.time.parse().ok()
    }
}

/// Parsed log file.
#[derive(Debug, Clone, Default)]
pub struct LogFile {
    pub app_name: String,
    pub messages: Vec<Message>,
    traces: Vec<Trace>,
    trace_ids: HashMap<String, TraceRef>,
    instructions: Vec<Instruction>,
    insn_ids: HashMap<String, InsnRef>,
    insn_addresses: HashMap<String, InsnRef>,
}

impl LogFile {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self { app_name: app_name.into(), ..Self::default() }
    }

    /// Store a trace under its id. A trace already registered with the same id is replaced.
    pub fn register_trace(&mut self, trace: Trace) -> TraceRef {
        match self.trace_ids.get(&trace.id) {
            Some(&r) => {
                self.traces[r.0] = trace;
                r
            }
            None => {
                let r = TraceRef(self.traces.len());
                self.trace_ids.insert(trace.id.clone(), r);
                self.traces.push(trace);
                r
            }
        }
    }

    /// Store an instruction under its id and index it by address.
    ///
    /// Same-id registrations replace the earlier entry; a later instruction at a
    /// known address takes over the address index.
    pub fn register_instruction(&mut self, insn: Instruction) -> InsnRef {
        let r = match self.insn_ids.get(&insn.id) {
            Some(&r) => {
                let old = std::mem::replace(&mut self.instructions[r.0], insn);
                if self.insn_addresses.get(&old.address) == Some(&r) {
                    self.insn_addresses.remove(&old.address);
                }
                r
            }
            None => {
                let r = InsnRef(self.instructions.len());
                self.insn_ids.insert(insn.id.clone(), r);
                self.instructions.push(insn);
                r
            }
        };
        self.insn_addresses.insert(self.instructions[r.0].address.clone(), r);
        r
    }

    pub fn trace(&self, r: TraceRef) -> &Trace {
        &self.traces[r.0]
    }

    pub fn trace_ref(&self, id: &str) -> Option<TraceRef> {
        self.trace_ids.get(id).copied()
    }

    pub fn trace_by_id(&self, id: &str) -> Option<&Trace> {
        self.trace_ref(id).map(|r| self.trace(r))
    }

    pub fn instruction(&self, r: InsnRef) -> &Instruction {
        &self.instructions[r.0]
    }

    pub fn instruction_mut(&mut self, r: InsnRef) -> &mut Instruction {
        &mut self.instructions[r.0]
    }

    pub fn instruction_ref(&self, id: &str) -> Option<InsnRef> {
        self.insn_ids.get(id).copied()
    }

    pub fn instruction_by_id(&self, id: &str) -> Option<&Instruction> {
        self.instruction_ref(id).map(|r| self.instruction(r))
    }

    pub fn instruction_ref_by_address(&self, address: &str) -> Option<InsnRef> {
        self.insn_addresses.get(address).copied()
    }

    pub fn instruction_by_address(&self, address: &str) -> Option<&Instruction> {
        self.instruction_ref_by_address(address).map(|r| self.instruction(r))
    }

    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter()
    }

    pub fn traces(&self) -> impl Iterator<Item = &Trace> {
        self.traces.iter()
    }

    /// Number of distinct instruction ids.
    pub fn instruction_count(&self) -> usize {
        self.insn_ids.len()
    }

    /// Number of distinct instruction addresses.
    pub fn address_index_len(&self) -> usize {
        self.insn_addresses.len()
    }

    pub fn trace_count(&self) -> usize {
        self.trace_ids.len()
    }

    /// Turn every message's trace/instruction id into a direct reference.
    ///
    /// Ids that name nothing leave the reference empty; the id text is kept.
    pub fn resolve_references(&mut self) {
        for msg in &mut self.messages {
            msg.trace = self.trace_ids.get(&msg.trace_id).copied();
            msg.instruction = self.insn_ids.get(&msg.instruction_id).copied();
        }
    }

    pub fn message_trace(&self, msg: &Message) -> Option<&Trace> {
        msg.trace.map(|r| self.trace(r))
    }

    pub fn message_instruction(&self, msg: &Message) -> Option<&Instruction> {
        msg.instruction.map(|r| self.instruction(r))
    }

    /// Address of the instruction a message points at, or empty.
    pub fn message_address<'a>(&'a self, msg: &Message) -> &'a str {
        self.message_instruction(msg).map(|i| i.address.as_str()).unwrap_or("")
    }

    /// Function of a message: top trace frame first, else the instruction's.
    pub fn message_function<'a>(&'a self, msg: &Message) -> &'a str {
        if let Some(frame) = self.message_trace(msg).and_then(Trace::top) {
            return &frame.function;
        }
        self.message_instruction(msg).map(|i| i.function.as_str()).unwrap_or("")
    }

    /// Smallest positive decimal id not yet used by an instruction, starting at `len + 1`.
    pub(crate) fn fresh_instruction_id(&self) -> String {
        fresh_id(&self.insn_ids)
    }

    pub(crate) fn fresh_trace_id(&self) -> String {
        fresh_id(&self.trace_ids)
    }
}

fn fresh_id<V>(taken: &HashMap<String, V>) -> String {
    let mut n = taken.len() + 1;
    while taken.contains_key(&n.to_string()) {
        n += 1;
    }
    n.to_string()
}
