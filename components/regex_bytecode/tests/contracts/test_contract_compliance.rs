//! Contract compliance tests for regex_bytecode
//! Verifies the cell layout consumed by the optimizer and the matcher

use regex_bytecode::{
    ByteCode, CharClass, CharRange, CharacterCompareType, CompareTypeAndValuePair, Instruction,
    OpCodeId,
};

/// Opcode tag values are part of the stream format
#[test]
fn test_contract_opcode_values() {
    assert_eq!(OpCodeId::Compare.value(), 1);
    assert_eq!(OpCodeId::Jump.value(), 2);
    assert_eq!(OpCodeId::ForkJump.value(), 3);
    assert_eq!(OpCodeId::ForkStay.value(), 4);
    assert_eq!(OpCodeId::ForkReplaceJump.value(), 5);
    assert_eq!(OpCodeId::ForkReplaceStay.value(), 6);
    assert_eq!(OpCodeId::Repeat.value(), 7);
    assert_eq!(OpCodeId::ResetRepeat.value(), 8);
    assert_eq!(OpCodeId::SaveLeftCaptureGroup.value(), 9);
    assert_eq!(OpCodeId::SaveRightCaptureGroup.value(), 10);
    assert_eq!(OpCodeId::ClearCaptureGroup.value(), 11);
    assert_eq!(OpCodeId::CheckBegin.value(), 12);
    assert_eq!(OpCodeId::CheckEnd.value(), 13);
    assert_eq!(OpCodeId::CheckBoundary.value(), 14);
    assert_eq!(OpCodeId::Save.value(), 15);
    assert_eq!(OpCodeId::Restore.value(), 16);
    assert_eq!(OpCodeId::GoBack.value(), 17);
}

/// Relative targets resolve as position + size + offset
#[test]
fn test_contract_relative_offsets() {
    let mut bytecode = ByteCode::new();
    bytecode.insert_bytecode_check_begin();
    bytecode.append_instruction(&Instruction::Jump { offset: 1 });
    bytecode.insert_bytecode_check_end();
    bytecode.insert_bytecode_check_end();

    let jump = bytecode.decode_at(1).unwrap();
    assert_eq!(jump.jump_target(1, bytecode.len()).unwrap(), Some(4));
    assert_eq!(bytecode.as_slice()[2], 1);
}

/// Negative offsets are stored as two's complement cells
#[test]
fn test_contract_negative_offset_cell() {
    let mut bytecode = ByteCode::new();
    bytecode.append_instruction(&Instruction::ForkJump { offset: -2 });
    assert_eq!(bytecode.as_slice(), &[3, (-2i64) as u64]);
    assert_eq!(
        bytecode.decode_at(0).unwrap().jump_target(0, 2).unwrap(),
        Some(0)
    );
}

/// Repeat stores the distance back from itself
#[test]
fn test_contract_repeat_layout() {
    let mut bytecode = ByteCode::new();
    bytecode.append_instruction(&Instruction::Repeat {
        offset: 0,
        count: 3,
        id: 1,
    });
    assert_eq!(bytecode.as_slice(), &[7, 0, 3, 1]);
}

/// CharRange packs from in the high half and to in the low half
#[test]
fn test_contract_char_range_packing() {
    let range = CharRange::new(0x41, 0x5A);
    assert_eq!(range.to_value(), (0x41u64 << 32) | 0x5A);
}

/// Compare layout: tag, argument count, argument cell count, arguments
#[test]
fn test_contract_compare_layout() {
    let mut bytecode = ByteCode::new();
    bytecode.insert_bytecode_compare_values(vec![
        CompareTypeAndValuePair::TemporaryInverse,
        CompareTypeAndValuePair::CharClass(CharClass::Space),
        CompareTypeAndValuePair::LookupTable(vec![CharRange::new(0x30, 0x39)]),
    ]);
    assert_eq!(
        bytecode.as_slice(),
        &[
            1,
            3,
            6,
            CharacterCompareType::TemporaryInverse as u64,
            CharacterCompareType::CharClass as u64,
            CharClass::Space as u64,
            CharacterCompareType::LookupTable as u64,
            1,
            (0x30u64 << 32) | 0x39,
        ]
    );
}

/// String arguments carry their length then one code point per cell
#[test]
fn test_contract_string_layout() {
    let mut bytecode = ByteCode::new();
    bytecode.insert_bytecode_compare_string("hi");
    assert_eq!(
        bytecode.as_slice(),
        &[1, 1, 4, CharacterCompareType::String as u64, 2, 'h' as u64, 'i' as u64]
    );
}
