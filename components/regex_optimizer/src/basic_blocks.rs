//! Basic block splitting
//!
//! Partitions a stream into half-open ranges that end at control transfers,
//! so loops show up as blocks whose terminal fork targets their own start.

use regex_bytecode::{ByteCode, ByteCodeResult, Instruction, OpCodeId};
use tracing::trace;

/// Half-open cell range `[start, end)` of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Block {
    /// First cell of the block
    pub start: usize,
    /// One past the last cell
    pub end: usize,
}

impl Block {
    /// Create a block covering `[start, end)`
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of cells in the block
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if the block has no cells
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Check if `position` lies inside the block
    pub fn contains(&self, position: usize) -> bool {
        self.start <= position && position < self.end
    }
}

fn push_block(blocks: &mut Vec<Block>, start: usize, end: usize) {
    if start < end {
        blocks.push(Block::new(start, end));
    }
}

/// Split `bytecode` into basic blocks that exactly tile `[0, len)`, sorted
/// by start.
///
/// A block closes right after every `Jump`, fork, and `Repeat`. A backward
/// transfer landing inside the block opened since the last boundary splits
/// that block at its target, and `Repeat` also opens a block at the start of
/// the region it repeats.
pub fn split_basic_blocks(bytecode: &ByteCode) -> ByteCodeResult<Vec<Block>> {
    let len = bytecode.len();
    let mut blocks = Vec::new();
    let mut last_boundary = 0;

    for item in bytecode.instructions() {
        let (position, instruction) = item?;
        let target = match instruction.jump_target(position, len)? {
            Some(target) => target,
            None => continue,
        };
        let after = position + instruction.size();
        let lands_in_open_block = target > last_boundary && target <= position;

        if instruction.opcode_id() == OpCodeId::Repeat {
            if lands_in_open_block {
                push_block(&mut blocks, last_boundary, target);
                last_boundary = target;
            }
            push_block(&mut blocks, last_boundary, after);
        } else if lands_in_open_block {
            push_block(&mut blocks, last_boundary, target);
            push_block(&mut blocks, target, after);
        } else {
            push_block(&mut blocks, last_boundary, after);
        }
        last_boundary = after;
    }
    push_block(&mut blocks, last_boundary, len);

    trace!(blocks = blocks.len(), cells = len, "split basic blocks");
    Ok(blocks)
}

/// The last instruction starting inside `block`, with its position
pub fn terminal_instruction(
    bytecode: &ByteCode,
    block: Block,
) -> ByteCodeResult<Option<(usize, Instruction)>> {
    let mut terminal = None;
    for item in bytecode.instructions_in(block.start, block.end) {
        terminal = Some(item?);
    }
    Ok(terminal)
}
