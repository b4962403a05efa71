//! Tests for the optimizer driver

use regex_bytecode::{ByteCode, ByteCodeError, CharRange, CompareTypeAndValuePair, OpCodeId};
use regex_optimizer::{OptimizationReport, Optimizer, OptimizerOptions};

use crate::{init_tracing, literal};

fn opcodes(bytecode: &ByteCode) -> Vec<OpCodeId> {
    bytecode
        .instructions()
        .map(|item| item.unwrap().1.opcode_id())
        .collect()
}

#[test]
fn test_star_followed_by_distinct_char_is_rewritten() {
    init_tracing();
    let mut bytecode = ByteCode::new();
    bytecode.insert_bytecode_repetition_any(literal("a"), true);
    bytecode.extend(literal("b"));
    let len = bytecode.len();

    let report = Optimizer::new().optimize(&mut bytecode).unwrap();
    assert_eq!(report.rewritten_loops, 1);
    assert_eq!(bytecode.len(), len);
    assert_eq!(
        opcodes(&bytecode),
        vec![
            OpCodeId::ForkReplaceStay,
            OpCodeId::Compare,
            OpCodeId::Jump,
            OpCodeId::Compare
        ]
    );
}

#[test]
fn test_star_followed_by_same_char_is_kept() {
    init_tracing();
    let mut bytecode = ByteCode::new();
    bytecode.insert_bytecode_repetition_any(literal("a"), true);
    bytecode.extend(literal("a"));
    let original = bytecode.clone();

    let report = Optimizer::new().optimize(&mut bytecode).unwrap();
    assert_eq!(report.rewritten_loops, 0);
    assert_eq!(bytecode, original);
}

#[test]
fn test_plus_followed_by_distinct_char_is_rewritten() {
    let mut bytecode = ByteCode::new();
    bytecode.insert_bytecode_repetition_min_one(literal("a"), true);
    bytecode.extend(literal("b"));

    Optimizer::new().optimize(&mut bytecode).unwrap();
    assert_eq!(
        opcodes(&bytecode),
        vec![OpCodeId::Compare, OpCodeId::ForkReplaceJump, OpCodeId::Compare]
    );
}

#[test]
fn test_lazy_loops_are_left_alone() {
    let mut bytecode = ByteCode::new();
    bytecode.insert_bytecode_repetition_any(literal("a"), false);
    bytecode.extend(literal("b"));
    let original = bytecode.clone();

    let report = Optimizer::new().optimize(&mut bytecode).unwrap();
    assert_eq!(report.rewritten_loops, 0);
    assert_eq!(bytecode, original);
}

#[test]
fn test_digit_class_loop_before_letter() {
    // [0-9]+x
    let mut body = ByteCode::new();
    body.insert_bytecode_compare_values(vec![CompareTypeAndValuePair::CharRange(CharRange::new(
        '0' as u32, '9' as u32,
    ))]);
    let mut bytecode = ByteCode::new();
    bytecode.insert_bytecode_repetition_min_one(body, true);
    bytecode.extend(literal("x"));

    let report = Optimizer::new().optimize(&mut bytecode).unwrap();
    assert_eq!(report.rewritten_loops, 1);
}

#[test]
fn test_optimize_twice_changes_nothing() {
    let mut bytecode = literal("x");
    bytecode.insert_bytecode_repetition_any(literal("a"), true);
    bytecode.insert_bytecode_repetition_min_one(literal("b"), true);
    bytecode.extend(literal("c"));

    let optimizer = Optimizer::new();
    let first = optimizer.optimize(&mut bytecode).unwrap();
    assert_eq!(first.rewritten_loops, 2);
    let once = bytecode.clone();

    let second = optimizer.optimize(&mut bytecode).unwrap();
    assert_eq!(second.rewritten_loops, 0);
    assert_eq!(second.blocks, first.blocks);
    assert_eq!(bytecode, once);
}

#[test]
fn test_empty_stream() {
    let mut bytecode = ByteCode::new();
    let report = Optimizer::new().optimize(&mut bytecode).unwrap();
    assert_eq!(report, OptimizationReport::default());
}

#[test]
fn test_truncated_stream_is_rejected() {
    let mut bytecode = literal("a");
    bytecode.empend(OpCodeId::ForkStay.value());
    assert!(matches!(
        Optimizer::new().optimize(&mut bytecode),
        Err(ByteCodeError::Truncated { .. })
    ));
}

#[test]
fn test_compare_with_impossible_argument_count_is_rejected() {
    let mut bytecode = ByteCode::from(vec![OpCodeId::Compare.value(), 1u64 << 61, 0]);
    let original = bytecode.clone();
    assert!(matches!(
        Optimizer::new().optimize(&mut bytecode),
        Err(ByteCodeError::CompareSizeMismatch { .. })
    ));
    assert_eq!(bytecode, original);
}

#[test]
fn test_options_from_json() {
    let options =
        OptimizerOptions::from_json(r#"{ "rewrite_loops_as_atomic_groups": false }"#).unwrap();
    let mut bytecode = ByteCode::new();
    bytecode.insert_bytecode_repetition_any(literal("a"), true);
    bytecode.extend(literal("b"));
    let original = bytecode.clone();

    let optimizer = Optimizer::with_options(options);
    assert!(optimizer.options().tabulate_character_classes);
    let report = optimizer.optimize(&mut bytecode).unwrap();
    assert_eq!(report.rewritten_loops, 0);
    assert_eq!(bytecode, original);
}

#[test]
fn test_report_serializes() {
    let report = OptimizationReport {
        blocks: 3,
        rewritten_loops: 1,
    };
    let json = serde_json::to_string(&report).unwrap();
    assert_eq!(json, r#"{"blocks":3,"rewritten_loops":1}"#);
    let back: OptimizationReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back, report);
}

#[test]
fn test_disabled_optimizer_emits_plain_constructs() {
    let optimizer = Optimizer::with_options(OptimizerOptions::disabled());

    let mut alternation = ByteCode::new();
    optimizer
        .append_alternation(&mut alternation, vec![literal("ab"), literal("ac")])
        .unwrap();
    // fork, full "ab", jump, full "ac"
    assert_eq!(alternation.len(), 2 + 10 + 2 + 10);

    let pairs = vec![
        CompareTypeAndValuePair::Char('a' as u32),
        CompareTypeAndValuePair::Char('b' as u32),
    ];
    let mut class = ByteCode::new();
    optimizer.append_character_class(&mut class, pairs.clone());
    let mut expected = ByteCode::new();
    expected.insert_bytecode_compare_values(pairs);
    assert_eq!(class, expected);
}
