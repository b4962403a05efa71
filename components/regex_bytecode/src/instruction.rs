//! Decoded instruction view and the cursor used to walk a stream
//!
//! Instructions are decoded on demand from the flat cell buffer; nothing
//! here is stored back into a `ByteCode` except through [`Instruction::encode`].

use crate::compare::CompareTypeAndValuePair;
use crate::error::{ByteCodeError, ByteCodeResult};
use crate::opcode::{BoundaryKind, ByteCodeValue, OpCodeId};

/// One decoded instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Match one character (or a string / back-reference) against the arguments
    Compare {
        /// Tests tried in order
        arguments: Vec<CompareTypeAndValuePair>,
    },
    /// Continue at the target
    Jump {
        /// Distance from the end of this instruction
        offset: i64,
    },
    /// Try the target first, falling back to the next instruction
    ForkJump {
        /// Distance from the end of this instruction
        offset: i64,
    },
    /// Try the next instruction first, falling back to the target
    ForkStay {
        /// Distance from the end of this instruction
        offset: i64,
    },
    /// `ForkJump` that replaces a fallback it pushed earlier
    ForkReplaceJump {
        /// Distance from the end of this instruction
        offset: i64,
    },
    /// `ForkStay` that replaces a fallback it pushed earlier
    ForkReplaceStay {
        /// Distance from the end of this instruction
        offset: i64,
    },
    /// Jump `offset` cells back from this instruction until `count` passes ran
    Repeat {
        /// Backward distance from the start of this instruction
        offset: usize,
        /// Passes before falling through
        count: usize,
        /// Repeat counter slot
        id: usize,
    },
    /// Zero a repeat counter
    ResetRepeat {
        /// Repeat counter slot
        id: usize,
    },
    /// Record the start of a capture group
    SaveLeftCaptureGroup {
        /// Group number
        id: usize,
    },
    /// Record the end of a capture group
    SaveRightCaptureGroup {
        /// Group number
        id: usize,
    },
    /// Forget a capture group
    ClearCaptureGroup {
        /// Group number
        id: usize,
    },
    /// Succeed only at the start of input
    CheckBegin,
    /// Succeed only at the end of input
    CheckEnd,
    /// Word boundary assertion
    CheckBoundary {
        /// Boundary or non-boundary
        kind: BoundaryKind,
    },
    /// Push the current input position
    Save,
    /// Pop and return to a saved input position
    Restore,
    /// Step the input position back
    GoBack {
        /// Characters to step back
        count: usize,
    },
}

impl Instruction {
    /// The opcode tag of this instruction
    pub fn opcode_id(&self) -> OpCodeId {
        match self {
            Instruction::Compare { .. } => OpCodeId::Compare,
            Instruction::Jump { .. } => OpCodeId::Jump,
            Instruction::ForkJump { .. } => OpCodeId::ForkJump,
            Instruction::ForkStay { .. } => OpCodeId::ForkStay,
            Instruction::ForkReplaceJump { .. } => OpCodeId::ForkReplaceJump,
            Instruction::ForkReplaceStay { .. } => OpCodeId::ForkReplaceStay,
            Instruction::Repeat { .. } => OpCodeId::Repeat,
            Instruction::ResetRepeat { .. } => OpCodeId::ResetRepeat,
            Instruction::SaveLeftCaptureGroup { .. } => OpCodeId::SaveLeftCaptureGroup,
            Instruction::SaveRightCaptureGroup { .. } => OpCodeId::SaveRightCaptureGroup,
            Instruction::ClearCaptureGroup { .. } => OpCodeId::ClearCaptureGroup,
            Instruction::CheckBegin => OpCodeId::CheckBegin,
            Instruction::CheckEnd => OpCodeId::CheckEnd,
            Instruction::CheckBoundary { .. } => OpCodeId::CheckBoundary,
            Instruction::Save => OpCodeId::Save,
            Instruction::Restore => OpCodeId::Restore,
            Instruction::GoBack { .. } => OpCodeId::GoBack,
        }
    }

    /// Number of cells this instruction occupies
    pub fn size(&self) -> usize {
        match self {
            Instruction::Compare { arguments } => {
                OpCodeId::Compare.fixed_size()
                    + arguments.iter().map(|a| a.encoded_size()).sum::<usize>()
            }
            other => other.opcode_id().fixed_size(),
        }
    }

    /// Relative offset of a jump or fork, measured from the end of the
    /// instruction
    pub fn relative_offset(&self) -> Option<i64> {
        match self {
            Instruction::Jump { offset }
            | Instruction::ForkJump { offset }
            | Instruction::ForkStay { offset }
            | Instruction::ForkReplaceJump { offset }
            | Instruction::ForkReplaceStay { offset } => Some(*offset),
            _ => None,
        }
    }

    /// Check if this instruction transfers control (jump, fork, repeat)
    pub fn is_control_transfer(&self) -> bool {
        self.opcode_id().is_control_transfer()
    }

    /// Resolve the absolute target of a control transfer located at
    /// `position` in a stream of `len` cells. Returns `None` for
    /// straight-line instructions.
    pub fn jump_target(&self, position: usize, len: usize) -> ByteCodeResult<Option<usize>> {
        let target = match self {
            Instruction::Repeat { offset, .. } => position as i128 - *offset as i128,
            other => match other.relative_offset() {
                Some(offset) => (position + other.size()) as i128 + offset as i128,
                None => return Ok(None),
            },
        };
        if target < 0 || target > len as i128 {
            return Err(ByteCodeError::JumpOutOfBounds {
                position,
                target,
                len,
            });
        }
        Ok(Some(target as usize))
    }

    /// Return a copy with its relative offset replaced. Straight-line
    /// instructions are returned unchanged; `Repeat` takes the backward
    /// distance as `-offset`.
    pub fn with_relative_offset(&self, new_offset: i64) -> Instruction {
        match self {
            Instruction::Jump { .. } => Instruction::Jump { offset: new_offset },
            Instruction::ForkJump { .. } => Instruction::ForkJump { offset: new_offset },
            Instruction::ForkStay { .. } => Instruction::ForkStay { offset: new_offset },
            Instruction::ForkReplaceJump { .. } => Instruction::ForkReplaceJump { offset: new_offset },
            Instruction::ForkReplaceStay { .. } => Instruction::ForkReplaceStay { offset: new_offset },
            Instruction::Repeat { count, id, .. } => Instruction::Repeat {
                offset: new_offset.unsigned_abs() as usize,
                count: *count,
                id: *id,
            },
            other => other.clone(),
        }
    }

    /// Append the encoded instruction to `out`
    pub fn encode(&self, out: &mut Vec<ByteCodeValue>) {
        out.push(self.opcode_id().value());
        match self {
            Instruction::Compare { arguments } => {
                let start = out.len();
                out.push(arguments.len() as u64);
                out.push(0);
                for argument in arguments {
                    argument.encode(out);
                }
                out[start + 1] = (out.len() - start - 2) as u64;
            }
            Instruction::Jump { offset }
            | Instruction::ForkJump { offset }
            | Instruction::ForkStay { offset }
            | Instruction::ForkReplaceJump { offset }
            | Instruction::ForkReplaceStay { offset } => out.push(*offset as u64),
            Instruction::Repeat { offset, count, id } => {
                out.push(*offset as u64);
                out.push(*count as u64);
                out.push(*id as u64);
            }
            Instruction::ResetRepeat { id }
            | Instruction::SaveLeftCaptureGroup { id }
            | Instruction::SaveRightCaptureGroup { id }
            | Instruction::ClearCaptureGroup { id } => out.push(*id as u64),
            Instruction::CheckBoundary { kind } => out.push(*kind as u64),
            Instruction::GoBack { count } => out.push(*count as u64),
            Instruction::CheckBegin
            | Instruction::CheckEnd
            | Instruction::Save
            | Instruction::Restore => {}
        }
    }

    /// Decode the instruction starting at `position`
    pub fn decode(cells: &[ByteCodeValue], position: usize) -> ByteCodeResult<Instruction> {
        let value = *cells.get(position).ok_or(ByteCodeError::Truncated {
            position,
            opcode: "opcode",
            needed: 1,
            available: 0,
        })?;
        let id = OpCodeId::from_value(value).ok_or(ByteCodeError::UnknownOpcode { position, value })?;

        let available = cells.len() - position;
        if available < id.fixed_size() {
            return Err(ByteCodeError::Truncated {
                position,
                opcode: id.name(),
                needed: id.fixed_size(),
                available,
            });
        }
        let operand = |index: usize| cells[position + index];

        let instruction = match id {
            OpCodeId::Compare => {
                let argument_count = operand(1) as usize;
                let arguments_size = operand(2) as usize;
                let needed = arguments_size.saturating_add(3);
                if available < needed {
                    return Err(ByteCodeError::Truncated {
                        position,
                        opcode: id.name(),
                        needed,
                        available,
                    });
                }
                // Every argument occupies at least one cell.
                if argument_count > arguments_size {
                    return Err(ByteCodeError::CompareSizeMismatch {
                        position,
                        declared: arguments_size,
                        used: argument_count,
                    });
                }
                let end = position + needed;
                let mut cursor = position + 3;
                let mut arguments = Vec::with_capacity(argument_count);
                for _ in 0..argument_count {
                    let (argument, consumed) = CompareTypeAndValuePair::decode(&cells[..end], cursor)?;
                    arguments.push(argument);
                    cursor += consumed;
                }
                if cursor != end {
                    return Err(ByteCodeError::CompareSizeMismatch {
                        position,
                        declared: arguments_size,
                        used: cursor - position - 3,
                    });
                }
                Instruction::Compare { arguments }
            }
            OpCodeId::Jump => Instruction::Jump {
                offset: operand(1) as i64,
            },
            OpCodeId::ForkJump => Instruction::ForkJump {
                offset: operand(1) as i64,
            },
            OpCodeId::ForkStay => Instruction::ForkStay {
                offset: operand(1) as i64,
            },
            OpCodeId::ForkReplaceJump => Instruction::ForkReplaceJump {
                offset: operand(1) as i64,
            },
            OpCodeId::ForkReplaceStay => Instruction::ForkReplaceStay {
                offset: operand(1) as i64,
            },
            OpCodeId::Repeat => Instruction::Repeat {
                offset: operand(1) as usize,
                count: operand(2) as usize,
                id: operand(3) as usize,
            },
            OpCodeId::ResetRepeat => Instruction::ResetRepeat {
                id: operand(1) as usize,
            },
            OpCodeId::SaveLeftCaptureGroup => Instruction::SaveLeftCaptureGroup {
                id: operand(1) as usize,
            },
            OpCodeId::SaveRightCaptureGroup => Instruction::SaveRightCaptureGroup {
                id: operand(1) as usize,
            },
            OpCodeId::ClearCaptureGroup => Instruction::ClearCaptureGroup {
                id: operand(1) as usize,
            },
            OpCodeId::CheckBegin => Instruction::CheckBegin,
            OpCodeId::CheckEnd => Instruction::CheckEnd,
            OpCodeId::CheckBoundary => {
                let raw = operand(1);
                let kind = BoundaryKind::from_value(raw).ok_or(ByteCodeError::UnknownBoundaryKind {
                    position: position + 1,
                    value: raw,
                })?;
                Instruction::CheckBoundary { kind }
            }
            OpCodeId::Save => Instruction::Save,
            OpCodeId::Restore => Instruction::Restore,
            OpCodeId::GoBack => Instruction::GoBack {
                count: operand(1) as usize,
            },
        };
        Ok(instruction)
    }
}

/// Instruction position used to decode a stream one instruction at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    /// Cell index of the next instruction
    pub position: usize,
}

impl Cursor {
    /// Create a cursor at `position`
    pub fn new(position: usize) -> Self {
        Self { position }
    }

    /// Decode the instruction under the cursor and advance past it.
    /// Returns `None` once `end` is reached.
    pub fn next(
        &mut self,
        cells: &[ByteCodeValue],
        end: usize,
    ) -> Option<ByteCodeResult<(usize, Instruction)>> {
        if self.position >= end {
            return None;
        }
        let position = self.position;
        Some(Instruction::decode(cells, position).map(|instruction| {
            self.position += instruction.size();
            (position, instruction)
        }))
    }
}
