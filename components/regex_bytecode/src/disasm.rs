//! Human-readable disassembly of regex bytecode

use std::collections::HashSet;
use std::fmt;

use crate::bytecode::ByteCode;
use crate::instruction::Instruction;

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.opcode_id().name();
        match self {
            Instruction::Compare { arguments } => {
                write!(f, "{:<22}", name)?;
                for (i, argument) in arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", argument)?;
                }
                Ok(())
            }
            Instruction::Jump { offset }
            | Instruction::ForkJump { offset }
            | Instruction::ForkStay { offset }
            | Instruction::ForkReplaceJump { offset }
            | Instruction::ForkReplaceStay { offset } => write!(f, "{:<22}{:+}", name, offset),
            Instruction::Repeat { offset, count, id } => {
                write!(f, "{:<22}-{} count={} id={}", name, offset, count, id)
            }
            Instruction::ResetRepeat { id }
            | Instruction::SaveLeftCaptureGroup { id }
            | Instruction::SaveRightCaptureGroup { id }
            | Instruction::ClearCaptureGroup { id } => write!(f, "{:<22}{}", name, id),
            Instruction::CheckBoundary { kind } => write!(f, "{:<22}{:?}", name, kind),
            Instruction::GoBack { count } => write!(f, "{:<22}{}", name, count),
            Instruction::CheckBegin
            | Instruction::CheckEnd
            | Instruction::Save
            | Instruction::Restore => write!(f, "{}", name),
        }
    }
}

/// One line per instruction: position, a `►` marker on jump targets, the
/// instruction, and the resolved target of control transfers
impl fmt::Display for ByteCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.len();
        let mut decoded = Vec::new();
        let mut jump_targets = HashSet::new();
        for item in self.instructions() {
            match item {
                Ok((position, instruction)) => {
                    let target = instruction.jump_target(position, len).ok().flatten();
                    if let Some(target) = target {
                        jump_targets.insert(target);
                    }
                    decoded.push((position, instruction, target));
                }
                Err(err) => {
                    for (position, instruction, target) in &decoded {
                        write_line(f, *position, instruction, *target, &jump_targets)?;
                    }
                    return writeln!(f, "<error: {}>", err);
                }
            }
        }

        for (position, instruction, target) in &decoded {
            write_line(f, *position, instruction, *target, &jump_targets)?;
        }
        if jump_targets.contains(&len) {
            writeln!(f, "{:04} ► <end>", len)?;
        }
        Ok(())
    }
}

fn write_line(
    f: &mut fmt::Formatter<'_>,
    position: usize,
    instruction: &Instruction,
    target: Option<usize>,
    jump_targets: &HashSet<usize>,
) -> fmt::Result {
    let marker = if jump_targets.contains(&position) { "►" } else { " " };
    write!(f, "{:04} {} {}", position, marker, instruction)?;
    if let Some(target) = target {
        write!(f, "  -> {:04}", target)?;
    }
    writeln!(f)
}
