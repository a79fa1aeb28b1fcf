//! Turning a stream of element events into a [`LogFile`].
//!
//! [`LogFileHandler`] is a small state machine: it tracks which elements are
//! currently open and routes character data by the combination of open names.
//! `address`, `function`, `file`, `lineno`, `module` and `id` appear under more
//! than one parent element, so the parent decides which object receives the text.

use crate::log::{Frame, Instruction, LogFile, Message, Trace, CANCELLATION};
use crate::settings::IngestOptions;

mod xml;

pub use xml::{parse_log_bytes, parse_log_str};

/// One element event, already decoded and unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    Start { name: String, attributes: Vec<(String, String)> },
    End { name: String },
    Text(String),
}

// Where a piece of character data ends up.
#[derive(Debug, Clone, Copy)]
enum Slot {
    AppName,
    Time,
    Priority,
    Type,
    MessageTraceId,
    MessageInstId,
    Label,
    Details,
    TraceId,
    InsnId,
    Disassembly,
    Level,
    FrameAddress,
    InsnAddress,
    FrameFunction,
    InsnFunction,
    FrameFile,
    InsnFile,
    FrameLineno,
    InsnLineno,
    FrameModule,
    InsnModule,
    Text,
}

// Checked in order; the first entry whose names are all open wins.
const DISPATCH: &[(&[&str], Slot)] = &[
    (&["app"], Slot::AppName),
    (&["appname"], Slot::AppName),
    (&["time"], Slot::Time),
    (&["priority"], Slot::Priority),
    (&["type"], Slot::Type),
    (&["trace_id"], Slot::MessageTraceId),
    (&["inst_id"], Slot::MessageInstId),
    (&["label"], Slot::Label),
    (&["details"], Slot::Details),
    (&["id", "trace"], Slot::TraceId),
    (&["id", "instruction"], Slot::InsnId),
    (&["disassembly"], Slot::Disassembly),
    (&["level"], Slot::Level),
    (&["address", "frame"], Slot::FrameAddress),
    (&["address", "instruction"], Slot::InsnAddress),
    (&["function", "frame"], Slot::FrameFunction),
    (&["function", "instruction"], Slot::InsnFunction),
    (&["file", "frame"], Slot::FrameFile),
    (&["file", "instruction"], Slot::InsnFile),
    (&["lineno", "frame"], Slot::FrameLineno),
    (&["lineno", "instruction"], Slot::InsnLineno),
    (&["module", "frame"], Slot::FrameModule),
    (&["module", "instruction"], Slot::InsnModule),
    (&["text"], Slot::Text),
];

/// Builds a [`LogFile`] from start/end/text callbacks.
#[derive(Debug, Default)]
pub struct LogFileHandler {
    options: IngestOptions,
    log: LogFile,
    open: Vec<String>,
    message: Option<Message>,
    trace: Option<Trace>,
    frame: Option<Frame>,
    instruction: Option<Instruction>,
    initial_time: Option<i64>,
}

impl LogFileHandler {
    pub fn new(options: IngestOptions) -> Self {
        Self { options, ..Self::default() }
    }

    pub fn handle(&mut self, event: XmlEvent) {
        match event {
            XmlEvent::Start { name, attributes } => self.start_element(&name, &attributes),
            XmlEvent::End { name } => self.end_element(&name),
            XmlEvent::Text(text) => self.characters(&text),
        }
    }

    pub fn start_element(&mut self, name: &str, attributes: &[(String, String)]) {
        self.open.push(name.to_string());
        let attr = |key: &str| attributes.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone());

        match name {
            "log" => {
                self.log = LogFile::default();
                self.message = None;
                self.trace = None;
                self.frame = None;
                self.instruction = None;
                self.initial_time = None;
                if let Some(app) = attr("app").or_else(|| attr("appname")) {
                    self.log.app_name = app;
                }
            }
            "message" => {
                let mut msg = Message::default();
                set_from(&mut msg.time, attr("time"));
                set_from(&mut msg.priority, attr("priority"));
                set_from(&mut msg.kind, attr("type"));
                set_from(&mut msg.trace_id, attr("trace_id"));
                set_from(&mut msg.instruction_id, attr("inst_id"));
                set_from(&mut msg.label, attr("label"));
                set_from(&mut msg.details, attr("details"));
                self.message = Some(msg);
            }
            "trace" => {
                let mut trace = Trace::default();
                set_from(&mut trace.id, attr("id"));
                self.trace = Some(trace);
            }
            "frame" => {
                let mut frame = Frame::default();
                set_from(&mut frame.level, attr("level"));
                set_from(&mut frame.address, attr("address"));
                set_from(&mut frame.function, attr("function"));
                set_from(&mut frame.file, attr("file"));
                set_from(&mut frame.lineno, attr("lineno"));
                set_from(&mut frame.module, attr("module"));
                self.frame = Some(frame);
            }
            "instruction" => {
                let mut insn = Instruction::default();
                set_from(&mut insn.id, attr("id"));
                set_from(&mut insn.address, attr("address"));
                set_from(&mut insn.disassembly, attr("disassembly"));
                set_from(&mut insn.function, attr("function"));
                set_from(&mut insn.file, attr("file"));
                set_from(&mut insn.lineno, attr("lineno"));
                set_from(&mut insn.module, attr("module"));
                set_from(&mut insn.text, attr("text"));
                self.instruction = Some(insn);
            }
            _ => {}
        }
    }

    pub fn end_element(&mut self, name: &str) {
        if let Some(pos) = self.open.iter().rposition(|n| n == name) {
            self.open.remove(pos);
        }

        match name {
            "message" => {
                if let Some(msg) = self.message.take() {
                    let msg = self.finish_message(msg);
                    self.log.messages.push(msg);
                }
            }
            "trace" => {
                if let Some(trace) = self.trace.take() {
                    self.log.register_trace(trace);
                }
            }
            "instruction" => {
                if let Some(insn) = self.instruction.take() {
                    self.log.register_instruction(insn);
                }
            }
            "frame" => {
                if let (Some(frame), Some(trace)) = (self.frame.take(), self.trace.as_mut()) {
                    trace.frames.push(frame);
                }
            }
            "log" => self.log.resolve_references(),
            _ => {}
        }
    }

    /// Append character data to whatever the open elements select. Text in any
    /// other combination is dropped.
    pub fn characters(&mut self, text: &str) {
        let Some(slot) = self.current_slot() else { return };
        if let Some(target) = self.slot_mut(slot) {
            target.push_str(text);
        }
    }

    /// Return the log built so far, with message references resolved.
    pub fn finish(mut self) -> LogFile {
        self.log.resolve_references();
        tracing::debug!(
            app = %self.log.app_name,
            messages = self.log.messages.len(),
            traces = self.log.trace_count(),
            instructions = self.log.instruction_count(),
            "log ingested"
        );
        self.log
    }

    fn is_open(&self, name: &str) -> bool {
        self.open.iter().any(|n| n == name)
    }

    fn current_slot(&self) -> Option<Slot> {
        DISPATCH
            .iter()
            .find(|(names, _)| names.iter().all(|n| self.is_open(n)))
            .map(|(_, slot)| *slot)
    }

    fn slot_mut(&mut self, slot: Slot) -> Option<&mut String> {
        let msg = self.message.as_mut();
        let field = match slot {
            Slot::AppName => return Some(&mut self.log.app_name),
            Slot::Time => &mut msg?.time,
            Slot::Priority => &mut msg?.priority,
            Slot::Type => &mut msg?.kind,
            Slot::MessageTraceId => &mut msg?.trace_id,
            Slot::MessageInstId => &mut msg?.instruction_id,
            Slot::Label => &mut msg?.label,
            Slot::Details => &mut msg?.details,
            Slot::TraceId => &mut self.trace.as_mut()?.id,
            Slot::InsnId => &mut self.instruction.as_mut()?.id,
            Slot::Disassembly => &mut self.instruction.as_mut()?.disassembly,
            Slot::Level => &mut self.frame.as_mut()?.level,
            Slot::FrameAddress => &mut self.frame.as_mut()?.address,
            Slot::InsnAddress => &mut self.instruction.as_mut()?.address,
            Slot::FrameFunction => &mut self.frame.as_mut()?.function,
            Slot::InsnFunction => &mut self.instruction.as_mut()?.function,
            Slot::FrameFile => &mut self.frame.as_mut()?.file,
            Slot::InsnFile => &mut self.instruction.as_mut()?.file,
            Slot::FrameLineno => &mut self.frame.as_mut()?.lineno,
            Slot::InsnLineno => &mut self.instruction.as_mut()?.lineno,
            Slot::FrameModule => &mut self.frame.as_mut()?.module,
            Slot::InsnModule => &mut self.instruction.as_mut()?.module,
            Slot::Text => &mut self.instruction.as_mut()?.text,
        };
        Some(field)
    }

    // Priority remap and time normalization, applied when a message closes.
    fn finish_message(&mut self, mut msg: Message) -> Message {
        if msg.kind == CANCELLATION && msg.priority == self.options.all_priority_sentinel {
            msg.priority = self.options.all_priority_label.clone();
        }
        if let Ok(absolute) = msg.time.trim().parse::<i64>() {
            let base = *self.initial_time.get_or_insert(absolute);
            // Offsets that do not fit in an i64 keep their original text.
            if let Some(relative) = absolute.checked_sub(base) {
                msg.time =
                    relative.checked_div(self.options.time_divisor).unwrap_or(relative).to_string();
            }
        }
        msg
    }
}

fn set_from(field: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *field = value;
    }
}

/// Build a log from an already-decoded event sequence.
pub fn ingest_events<I>(events: I, options: &IngestOptions) -> LogFile
where
    I: IntoIterator<Item = XmlEvent>,
{
    let mut handler = LogFileHandler::new(options.clone());
    for event in events {
        handler.handle(event);
    }
    handler.finish()
}
