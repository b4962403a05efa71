//! Jump offset repair after cells are inserted or removed
//!
//! Edits are described as splices in original coordinates. Every kept
//! instruction is moved to its new position, and every control transfer is
//! re-aimed at the new position of its original target.

use regex_bytecode::{ByteCode, ByteCodeError, ByteCodeResult, ByteCodeValue, Instruction};
use tracing::trace;

/// Replace `remove` cells at `at` with `insert`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    /// Position in the original stream
    pub at: usize,
    /// Cells removed starting at `at`
    pub remove: usize,
    /// Cells put in their place
    pub insert: Vec<ByteCodeValue>,
}

impl Splice {
    /// Insert `cells` before position `at`
    pub fn insert(at: usize, cells: Vec<ByteCodeValue>) -> Self {
        Self {
            at,
            remove: 0,
            insert: cells,
        }
    }

    /// Remove `count` cells starting at `at`
    pub fn remove(at: usize, count: usize) -> Self {
        Self {
            at,
            remove: count,
            insert: Vec::new(),
        }
    }

    /// End of the removed range, in original coordinates
    pub fn end(&self) -> usize {
        self.at + self.remove
    }

    fn delta(&self) -> i64 {
        self.insert.len() as i64 - self.remove as i64
    }
}

/// New position of a kept instruction starting at `old`. Cells inserted at
/// `old` come before it.
fn map_position(splices: &[Splice], old: usize) -> usize {
    let delta: i64 = splices
        .iter()
        .take_while(|splice| splice.at <= old)
        .map(Splice::delta)
        .sum();
    (old as i64 + delta) as usize
}

/// New position of a jump target `old`. A target on an insertion point lands
/// on the inserted cells; `None` when the target was removed.
fn map_target(splices: &[Splice], old: usize) -> Option<usize> {
    let mut delta = 0i64;
    for splice in splices {
        if splice.at >= old {
            break;
        }
        if old < splice.end() {
            return None;
        }
        delta += splice.delta();
    }
    Some((old as i64 + delta) as usize)
}

fn check_splices(bytecode: &ByteCode, splices: &[Splice], starts: &[usize]) -> ByteCodeResult<()> {
    let len = bytecode.len();
    let mut previous_end = 0;
    for splice in splices {
        if splice.at < previous_end {
            return Err(ByteCodeError::OverlappingSplices {
                at: splice.at,
                previous_end,
            });
        }
        if splice.end() > len {
            return Err(ByteCodeError::SpliceOutOfBounds {
                at: splice.at,
                end: splice.end(),
                len,
            });
        }
        for boundary in [splice.at, splice.end()] {
            if boundary == len {
                continue;
            }
            if let Err(index) = starts.binary_search(&boundary) {
                return Err(ByteCodeError::SpliceSplitsInstruction {
                    at: boundary,
                    position: starts[index - 1],
                });
            }
        }
        previous_end = splice.end();
    }
    Ok(())
}

/// Rebuild `bytecode` with `splices` applied, re-targeting every `Jump`,
/// fork, and `Repeat` whose target moved.
///
/// Splices must be sorted by position, must not overlap, and must start and
/// end on instruction boundaries. Inserted cells are copied verbatim. A
/// control transfer into a removed range is an error.
pub fn repair_jump_offsets(bytecode: &ByteCode, splices: &[Splice]) -> ByteCodeResult<ByteCode> {
    let len = bytecode.len();
    let instructions = bytecode.instructions().collect::<ByteCodeResult<Vec<_>>>()?;
    let starts: Vec<usize> = instructions.iter().map(|(position, _)| *position).collect();
    check_splices(bytecode, splices, &starts)?;

    let mut repaired = ByteCode::new();
    let mut pending = splices.iter().peekable();
    for (position, instruction) in &instructions {
        let position = *position;
        while let Some(splice) = pending.next_if(|splice| splice.at <= position) {
            repaired.extend_from_slice(&splice.insert);
        }
        if splices
            .iter()
            .any(|splice| splice.at <= position && position < splice.end())
        {
            continue;
        }

        let target = match instruction.jump_target(position, len)? {
            Some(target) => target,
            None => {
                repaired.append_instruction(instruction);
                continue;
            }
        };
        let new_target = map_target(splices, target)
            .ok_or(ByteCodeError::JumpIntoRemovedRange { position, target })?;
        let new_position = map_position(splices, position);
        let retargeted = match instruction {
            Instruction::Repeat { count, id, .. } => Instruction::Repeat {
                offset: new_position - new_target,
                count: *count,
                id: *id,
            },
            other => other.with_relative_offset(
                new_target as i64 - (new_position + other.size()) as i64,
            ),
        };
        trace!(position, new_position, target, new_target, "retargeted control transfer");
        repaired.append_instruction(&retargeted);
    }
    for splice in pending {
        repaired.extend_from_slice(&splice.insert);
    }
    Ok(repaired)
}
