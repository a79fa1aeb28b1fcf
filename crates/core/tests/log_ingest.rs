// crates/core/tests/log_ingest.rs

use craft_core::ingest::{ingest_events, parse_log_str, XmlEvent};
use craft_core::io::load_log_file;
use craft_core::log::parse_stat;
use craft_core::settings::IngestOptions;
use craft_core::IngestError;
use tempfile::tempdir;

const SAMPLE: &str = r#"<?xml version="1.0"?>
<log appname="demo">
<message time="5000" priority="10" type="InstCount">
<label>addsd xmm0, xmm1</label>
<inst_id>1</inst_id>
</message>
<message time="9000" priority="999" type="Cancellation">
<label>cancel</label>
<details>lost 12 digits</details>
<trace_id>1</trace_id>
<inst_id>1</inst_id>
</message>
<message time="12500" priority="0" type="Summary">
<label>CANCEL_DATA</label>
<details>CANCEL_DATA:
total_cancels=4
total_digits=10
average_digits=2.5
</details>
<inst_id>1</inst_id>
</message>
<message time="13000" priority="0" type="Summary" label="RANGE_DATA" details="RANGE_DATA:&#10;min=-1.5&#10;max=inf&#10;">
<inst_id>1</inst_id>
</message>
<trace id="1">
<frame level="0" address="0x401008" function="main" file="demo.c" lineno="12"/>
<frame level="1" address="0x400100" function="_start"/>
</trace>
<instruction id="1" address="0x401008">
<disassembly>addsd xmm0, xmm1</disassembly>
<text>0x401008 addsd xmm0, xmm1</text>
</instruction>
</log>
"#;

fn sample() -> craft_core::LogFile {
    parse_log_str(SAMPLE, &IngestOptions::default()).expect("parse sample log")
}

#[test]
fn builds_messages_traces_and_instructions() {
    let log = sample();
    assert_eq!(log.app_name, "demo");
    assert_eq!(log.messages.len(), 4);
    assert_eq!(log.trace_count(), 1);
    assert_eq!(log.instruction_count(), 1);
    assert_eq!(log.address_index_len(), 1);

    let trace = log.trace_by_id("1").expect("trace 1");
    assert_eq!(trace.frames.len(), 2);
    assert_eq!(trace.frames[0].function, "main");
    assert_eq!(trace.frames[1].address, "0x400100");
    assert_eq!(trace.frames[0].to_string(), "#0  0x401008 in main at demo.c:12");

    let insn = log.instruction_by_address("0x401008").expect("instruction");
    assert_eq!(insn.id, "1");
    assert_eq!(insn.disassembly, "addsd xmm0, xmm1");
    assert_eq!(insn.text, "0x401008 addsd xmm0, xmm1");
}

#[test]
fn child_elements_fill_message_fields() {
    let log = sample();
    let first = &log.messages[0];
    assert_eq!(first.kind, "InstCount");
    assert_eq!(first.label, "addsd xmm0, xmm1");
    assert_eq!(first.instruction_id, "1");
    assert_eq!(first.trace_id, "");
    assert!(first.trace.is_none());
    assert!(first.instruction.is_some());

    let second = &log.messages[1];
    assert_eq!(second.details, "lost 12 digits");
    assert_eq!(log.message_function(second), "main");
    assert_eq!(log.message_address(second), "0x401008");
}

#[test]
fn message_times_become_relative_whole_units() {
    let log = sample();
    let times: Vec<&str> = log.messages.iter().map(|m| m.time.as_str()).collect();
    assert_eq!(times, vec!["0", "4", "7", "8"]);
    assert_eq!(log.messages[2].elapsed(), Some(7));
}

#[test]
fn cancellation_sentinel_priority_becomes_all() {
    let log = sample();
    assert_eq!(log.messages[1].priority, "ALL");
    assert_eq!(log.messages[1].priority_level(), 999);
    assert_eq!(log.messages[0].priority_level(), 10);
}

#[test]
fn instruction_statistics_come_from_messages() {
    let mut log = sample();
    log.refresh_instruction_stats();
    let insn = log.instruction_by_id("1").expect("instruction");

    assert_eq!(insn.count, 10);
    assert_eq!(insn.cancellations, 1);
    assert_eq!(insn.total_cancels, 4);
    assert!((insn.ratio - 0.4).abs() < 1e-9);
    assert!((insn.average_digits - 2.5).abs() < 1e-9);
    assert_eq!(insn.min, -1.5);
    assert_eq!(insn.max, f64::INFINITY);
    assert_eq!(insn.range, f64::INFINITY);

    // Source location is back-filled from the cancellation's trace.
    assert_eq!(insn.function, "main");
    assert_eq!(insn.source(), "demo.c:12");
}

#[test]
fn refreshing_twice_does_not_double_count() {
    let mut log = sample();
    log.refresh_instruction_stats();
    log.refresh_instruction_stats();
    let insn = log.instruction_by_id("1").expect("instruction");
    assert_eq!(insn.cancellations, 1);
    assert_eq!(insn.count, 10);
}

#[test]
fn custom_time_divisor_and_labels_apply() {
    let options = IngestOptions {
        time_divisor: 500,
        all_priority_sentinel: "100".to_string(),
        all_priority_label: "EVERY".to_string(),
    };
    let xml = r#"<log app="x">
<message time="1000" priority="100" type="Cancellation"/>
<message time="2000" priority="999" type="Cancellation"/>
</log>"#;
    let log = parse_log_str(xml, &options).expect("parse");
    assert_eq!(log.app_name, "x");
    assert_eq!(log.messages[0].priority, "EVERY");
    assert_eq!(log.messages[1].priority, "999");
    assert_eq!(log.messages[1].time, "2");
}

#[test]
fn unparseable_times_are_left_alone() {
    let xml = r#"<log><message time="soon" type="Info"/><message type="Info"/></log>"#;
    let log = parse_log_str(xml, &IngestOptions::default()).expect("parse");
    assert_eq!(log.messages[0].time, "soon");
    assert_eq!(log.messages[1].time, "");
}

#[test]
fn shared_child_names_are_routed_by_parent() {
    let xml = r#"<log>
<trace id="3"><frame level="0"><address>0xaaa</address><function>f</function></frame></trace>
<instruction><id>5</id><address>0xbbb</address><function>g</function><lineno>7</lineno></instruction>
</log>"#;
    let log = parse_log_str(xml, &IngestOptions::default()).expect("parse");

    let frame = &log.trace_by_id("3").expect("trace").frames[0];
    assert_eq!(frame.address, "0xaaa");
    assert_eq!(frame.function, "f");

    let insn = log.instruction_by_id("5").expect("instruction");
    assert_eq!(insn.address, "0xbbb");
    assert_eq!(insn.function, "g");
    assert_eq!(insn.lineno, "7");
}

#[test]
fn unknown_elements_and_stray_text_are_ignored() {
    let xml = r#"<log app="x">stray<bogus>hello</bogus><message type="Info"><extra>x</extra></message></log>"#;
    let log = parse_log_str(xml, &IngestOptions::default()).expect("parse");
    assert_eq!(log.app_name, "x");
    assert_eq!(log.messages.len(), 1);
    assert_eq!(log.messages[0].label, "");
}

#[test]
fn forward_references_resolve_after_the_stream() {
    let start = |name: &str, attrs: &[(&str, &str)]| XmlEvent::Start {
        name: name.to_string(),
        attributes: attrs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
    };
    let end = |name: &str| XmlEvent::End { name: name.to_string() };

    let events = vec![
        start("log", &[("app", "demo")]),
        start("message", &[("type", "InstCount"), ("priority", "3"), ("inst_id", "7")]),
        end("message"),
        start("instruction", &[("id", "7"), ("address", "0x70")]),
        end("instruction"),
        end("log"),
    ];
    let log = ingest_events(events, &IngestOptions::default());
    let insn = log.message_instruction(&log.messages[0]).expect("resolved");
    assert_eq!(insn.address, "0x70");
}

#[test]
fn dangling_references_stay_unresolved() {
    let xml = r#"<log><message type="Info" trace_id="9" inst_id="9"/></log>"#;
    let log = parse_log_str(xml, &IngestOptions::default()).expect("parse");
    assert!(log.messages[0].trace.is_none());
    assert!(log.messages[0].instruction.is_none());
    assert_eq!(log.messages[0].instruction_id, "9");
}

#[test]
fn malformed_xml_is_an_error() {
    let err = parse_log_str("<log><message></log>", &IngestOptions::default())
        .expect_err("mismatched end tag");
    assert!(matches!(err, IngestError::Xml { .. }), "got {err}");
}

#[test]
fn special_statistic_values_parse() {
    assert_eq!(parse_stat("Infinity"), Some(f64::INFINITY));
    assert_eq!(parse_stat("-INF"), Some(f64::NEG_INFINITY));
    assert!(parse_stat("nan(0x1)").is_some_and(f64::is_nan));
    assert_eq!(parse_stat(" 2.5 "), Some(2.5));
    assert_eq!(parse_stat("bogus"), None);
}

#[test]
fn load_log_file_reads_and_refreshes() {
    let tmp = tempdir().expect("temp dir");
    let path = tmp.path().join("run.log.xml");
    std::fs::write(&path, SAMPLE).expect("write log");

    let log = load_log_file(&path, &IngestOptions::default()).expect("load log");
    assert_eq!(log.instruction_by_address("0x401008").map(|i| i.count), Some(10));

    let missing = load_log_file(&tmp.path().join("nope.xml"), &IngestOptions::default());
    assert!(missing.is_err());
}

#[test]
fn time_offsets_beyond_i64_keep_their_text() {
    let xml = r#"<log>
<message time="9223372036854775807" type="Info"/>
<message time="-9223372036854775808" type="Info"/>
<message time="9223372036854770807" type="Info"/>
</log>"#;
    let log = parse_log_str(xml, &IngestOptions::default()).expect("parse");
    assert_eq!(log.messages[0].time, "0");
    assert_eq!(log.messages[1].time, "-9223372036854775808");
    assert_eq!(log.messages[2].time, "-5");
}

#[test]
fn each_log_element_starts_a_fresh_time_base() {
    let start = |name: &str, attrs: &[(&str, &str)]| XmlEvent::Start {
        name: name.to_string(),
        attributes: attrs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
    };
    let end = |name: &str| XmlEvent::End { name: name.to_string() };

    let events = vec![
        start("log", &[("app", "first")]),
        start("message", &[("time", "1000")]),
        end("message"),
        end("log"),
        start("log", &[("app", "second")]),
        start("message", &[("time", "50000")]),
        end("message"),
        start("message", &[("time", "52000")]),
        end("message"),
        end("log"),
    ];
    let log = ingest_events(events, &IngestOptions::default());
    assert_eq!(log.app_name, "second");
    let times: Vec<&str> = log.messages.iter().map(|m| m.time.as_str()).collect();
    assert_eq!(times, vec!["0", "2"]);
}
