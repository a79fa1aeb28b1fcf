// crates/core/tests/tree_merge.rs

use craft_core::settings::LoadOptions;
use craft_core::{ConfigFile, ConfigNode, MergeIssue, NodeKind, NodeStatus};

fn load(lines: &[&str]) -> ConfigFile {
    ConfigFile::from_lines(lines.iter().copied(), &LoadOptions::default())
}

fn status_node(status: NodeStatus) -> ConfigNode {
    ConfigNode::new(NodeKind::Instruction, status, 1, "")
}

#[test]
fn priority_chain_picks_first_status_on_either_side() {
    let cases = [
        (NodeStatus::Single, NodeStatus::Ignore, NodeStatus::Ignore),
        (NodeStatus::Ignore, NodeStatus::Single, NodeStatus::Ignore),
        (NodeStatus::Single, NodeStatus::Double, NodeStatus::Double),
        (NodeStatus::TimeRange, NodeStatus::ReducedPrecision, NodeStatus::ReducedPrecision),
        (NodeStatus::Null, NodeStatus::DisabledNaN, NodeStatus::DisabledNaN),
        (NodeStatus::DisabledCancel, NodeStatus::CustomInstrumentation, NodeStatus::CustomInstrumentation),
        (NodeStatus::None, NodeStatus::Null, NodeStatus::Null),
        (NodeStatus::None, NodeStatus::None, NodeStatus::None),
    ];
    for (current, incoming, expected) in cases {
        let mut node = status_node(current);
        node.merge_status(&status_node(incoming));
        assert_eq!(node.status, expected, "{current:?} + {incoming:?}");
        assert!(!node.candidate);
    }
}

#[test]
fn candidate_tag_is_sticky() {
    let mut node = status_node(NodeStatus::Candidate);
    assert!(node.candidate);

    node.merge_status(&status_node(NodeStatus::Single));
    assert_eq!(node.status, NodeStatus::Single);
    assert!(node.candidate);

    // A tagged entry adopts the incoming status even when it ranks lower.
    node.merge_status(&status_node(NodeStatus::None));
    assert_eq!(node.status, NodeStatus::None);
    assert!(node.candidate);
}

#[test]
fn incoming_candidate_only_sets_the_tag() {
    let mut node = status_node(NodeStatus::Double);
    node.merge_status(&status_node(NodeStatus::Candidate));
    assert_eq!(node.status, NodeStatus::Double);
    assert!(node.candidate);
}

#[test]
fn incoming_candidate_tag_carries_over() {
    let mut node = status_node(NodeStatus::Double);
    let mut incoming = status_node(NodeStatus::Single);
    incoming.candidate = true;
    node.merge_status(&incoming);
    assert_eq!(node.status, NodeStatus::Single);
    assert!(node.candidate);
}

const ORIGINAL: &[&str] = &[
    r#"^  APPLICATION #1: 0 "demo""#,
    r#"^    MODULE #1: 0x400000 "demo.so""#,
    r#"^      FUNC #1: 0x401000 "main""#,
    r#"^        BBLK #1: 0x401000 "entry""#,
    r#"^s         INSN #1: 0x401000 "addsd""#,
    r#"^          INSN #2: 0x401008 "mulsd""#,
];

#[test]
fn same_shaped_trees_merge_statuses() {
    let mut original = load(ORIGINAL);
    let incoming = load(&[
        r#"^  APPLICATION #1: 0 "demo""#,
        r#"^    MODULE #1: 0x400000 "demo.so""#,
        r#"^      FUNC #1: 0x401000 "main""#,
        r#"^        BBLK #1: 0x401000 "entry""#,
        r#"^d         INSN #1: 0x401000 "addsd""#,
        r#"^?         INSN #2: 0x401008 "mulsd""#,
    ]);

    let report = original.tree.merge(&incoming.tree);
    assert!(report.is_clean(), "{report}");

    let add = original.tree.find_by_tag("INSN #1: 0x401000").expect("addsd");
    let mul = original.tree.find_by_tag("INSN #2: 0x401008").expect("mulsd");
    assert_eq!(original.tree.node(add).status, NodeStatus::Double);
    assert_eq!(original.tree.node(mul).status, NodeStatus::None);
    assert!(original.tree.node(mul).candidate);
}

#[test]
fn root_label_mismatch_stops_the_merge() {
    let mut original = load(ORIGINAL);
    let mut other: Vec<&str> = ORIGINAL.to_vec();
    other[0] = r#"^  APPLICATION #1: 0 "other""#;
    other[4] = r#"^d         INSN #1: 0x401000 "addsd""#;
    let incoming = load(&other);

    let report = original.tree.merge(&incoming.tree);
    assert_eq!(
        report.issues,
        vec![MergeIssue::RootLabelMismatch {
            original: "\"demo\"".to_string(),
            incoming: "\"other\"".to_string(),
        }]
    );
    let add = original.tree.find_by_tag("INSN #1: 0x401000").expect("addsd");
    assert_eq!(original.tree.node(add).status, NodeStatus::Single);
}

#[test]
fn missing_entries_are_reported_and_siblings_still_merge() {
    let mut original = load(ORIGINAL);
    let incoming = load(&[
        r#"^  APPLICATION #1: 0 "demo""#,
        r#"^    MODULE #1: 0x400000 "demo.so""#,
        r#"^      FUNC #2: 0x402000 "helper""#,
        r#"^        BBLK #2: 0x402000 "body""#,
        r#"^d         INSN #3: 0x402000 "subsd""#,
        r#"^      FUNC #1: 0x401000 "main""#,
        r#"^        BBLK #1: 0x401000 "entry""#,
        r#"^!         INSN #2: 0x401008 "mulsd""#,
    ]);

    let report = original.tree.merge(&incoming.tree);
    assert_eq!(
        report.issues,
        vec![MergeIssue::MissingEntry { kind: NodeKind::Function, label: "\"helper\"".to_string() }]
    );
    let rendered = report.to_string();
    assert!(rendered.starts_with("Errors merging"));
    assert!(rendered.contains("FUNC \"helper\""));

    let mul = original.tree.find_by_tag("INSN #2: 0x401008").expect("mulsd");
    assert_eq!(original.tree.node(mul).status, NodeStatus::Ignore);
}

#[test]
fn duplicate_labels_merge_into_first_match() {
    let lines = [
        r#"^  APPLICATION #1: 0 "demo""#,
        r#"^    MODULE #1: 0x400000 "demo.so""#,
        r#"^      FUNC #1: 0x401000 "dup""#,
        r#"^        BBLK #1: 0x401000"#,
        r#"^          INSN #1: 0x401000"#,
        r#"^      FUNC #2: 0x402000 "dup""#,
        r#"^        BBLK #2: 0x402000"#,
        r#"^          INSN #2: 0x402000"#,
    ];
    let mut original = load(&lines);
    // The incoming function is empty; keep it so it takes part in the merge.
    let incoming = ConfigFile::from_lines(
        [lines[0], lines[1], r#"^d     FUNC #9: 0x409000 "dup""#],
        &LoadOptions { detach_empty_containers: false },
    );

    let report = original.tree.merge(&incoming.tree);
    assert!(report.is_clean());
    let first = original.tree.find_by_short_id("FUNC_1").expect("first dup");
    let second = original.tree.find_by_short_id("FUNC_2").expect("second dup");
    assert_eq!(original.tree.node(first).status, NodeStatus::Double);
    assert_eq!(original.tree.node(second).status, NodeStatus::None);
}

#[test]
fn clean_report_renders_without_errors() {
    let mut original = load(ORIGINAL);
    let incoming = load(ORIGINAL);
    let report = original.tree.merge(&incoming.tree);
    assert!(report.is_clean());
    assert_eq!(report.to_string(), "Merge completed without errors");
}

#[test]
fn merge_config_file_reads_incoming_from_disk() {
    let tmp = tempfile::tempdir().expect("temp dir");
    let path = tmp.path().join("incoming.cfg");
    let mut incoming: Vec<&str> = ORIGINAL.to_vec();
    incoming[5] = r#"^d         INSN #2: 0x401008 "mulsd""#;
    std::fs::write(&path, incoming.join("\n")).expect("write config");

    let mut original = load(ORIGINAL);
    let report =
        craft_core::io::merge_config_file(&mut original.tree, &path, &LoadOptions::default())
            .expect("merge config file");
    assert!(report.is_clean());

    let mul = original.tree.find_by_tag("INSN #2: 0x401008").expect("mulsd");
    assert_eq!(original.tree.node(mul).status, NodeStatus::Double);

    let missing = craft_core::io::merge_config_file(
        &mut original.tree,
        &tmp.path().join("absent.cfg"),
        &LoadOptions::default(),
    );
    assert!(missing.is_err());
}
