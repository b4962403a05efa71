//! Alternation compilation
//!
//! Emits `a|b|c` as a row of forks followed by the alternatives. A prefix
//! shared by every alternative is hoisted out and emitted once.

use regex_bytecode::{ByteCode, ByteCodeResult, Instruction, OpCodeId};
use tracing::{debug, trace};

use crate::basic_blocks::split_basic_blocks;

/// Length of the straight-line prefix every alternative starts with.
fn shared_prefix_length(alternatives: &[ByteCode]) -> ByteCodeResult<usize> {
    let mut block_lists = Vec::with_capacity(alternatives.len());
    for alternative in alternatives {
        block_lists.push(split_basic_blocks(alternative)?);
    }
    let shared_blocks = block_lists.iter().map(Vec::len).min().unwrap_or(0);
    let (first, rest) = match alternatives.split_first() {
        Some(split) => split,
        None => return Ok(0),
    };

    let mut left_skip = 0;
    'blocks: for block_index in 0..shared_blocks {
        let block = block_lists[0][block_index];
        if block.start != left_skip
            || block_lists
                .iter()
                .any(|blocks| blocks[block_index].start != block.start)
        {
            break;
        }
        let block_end = block_lists
            .iter()
            .map(|blocks| blocks[block_index].end)
            .min()
            .unwrap_or(block.start);

        let mut position = block.start;
        while position < block_end {
            let instruction = first.decode_at(position)?;
            if instruction.is_control_transfer() {
                break 'blocks;
            }
            let end = position + instruction.size();
            let cells = &first.as_slice()[position..end];
            let identical = rest.iter().all(|alternative| {
                alternative.len() >= end && &alternative.as_slice()[position..end] == cells
            });
            if !identical {
                break 'blocks;
            }
            position = end;
            left_skip = end;
        }
        if block_lists
            .iter()
            .any(|blocks| blocks[block_index].end != left_skip)
        {
            break;
        }
    }

    // No transfer left behind may aim into the hoisted prefix.
    loop {
        let mut shrunk = false;
        for alternative in alternatives {
            for item in alternative.instructions_in(left_skip, alternative.len()) {
                let (position, instruction) = item?;
                if let Some(target) = instruction.jump_target(position, alternative.len())? {
                    if target < left_skip {
                        left_skip = target;
                        shrunk = true;
                    }
                }
            }
        }
        if !shrunk {
            break;
        }
    }
    Ok(left_skip)
}

/// Append `alternatives` to `target` as a prioritised alternation.
///
/// Alternatives are tried first to last. Each one except the last ends with
/// a `Jump` past the construct; the fork row uses `ForkStay`, so the fork
/// nearest the alternatives falls through to alternative 0 and keeps
/// alternative 1 as its fallback, while the first fork keeps the last one.
pub fn append_alternation(target: &mut ByteCode, alternatives: Vec<ByteCode>) -> ByteCodeResult<()> {
    append_alternation_with(target, alternatives, true)
}

pub(crate) fn append_alternation_with(
    target: &mut ByteCode,
    mut alternatives: Vec<ByteCode>,
    share_prefixes: bool,
) -> ByteCodeResult<()> {
    match alternatives.len() {
        0 => return Ok(()),
        1 => {
            if let Some(alternative) = alternatives.pop() {
                target.extend(alternative);
            }
            return Ok(());
        }
        _ => {}
    }
    if alternatives.iter().all(ByteCode::is_empty) {
        return Ok(());
    }

    if share_prefixes {
        let left_skip = shared_prefix_length(&alternatives)?;
        if left_skip > 0 {
            debug!(
                alternatives = alternatives.len(),
                shared_prefix = left_skip,
                "hoisting shared alternation prefix"
            );
            target.extend(alternatives[0].slice(0, left_skip));
            alternatives = alternatives
                .iter()
                .map(|alternative| alternative.slice(left_skip, alternative.len()))
                .collect();
            if alternatives.iter().all(ByteCode::is_empty) {
                return Ok(());
            }
        }
    }

    let count = alternatives.len();
    let fork_size = OpCodeId::ForkStay.fixed_size();
    let jump_size = OpCodeId::Jump.fixed_size();
    let fork_row_start = target.len();
    let alternatives_start = fork_row_start + (count - 1) * fork_size;

    // Where each alternative starts; later empty alternatives reuse the
    // first empty one.
    let mut locations = Vec::with_capacity(count);
    let mut emitted = Vec::with_capacity(count);
    let mut first_empty = None;
    let mut position = alternatives_start;
    for (index, alternative) in alternatives.iter().enumerate() {
        if alternative.is_empty() {
            if let Some(location) = first_empty {
                locations.push(location);
                emitted.push(false);
                continue;
            }
            first_empty = Some(position);
        }
        locations.push(position);
        emitted.push(true);
        position += alternative.len();
        if index + 1 != count {
            position += jump_size;
        }
    }
    let end = position;

    for k in 1..count {
        let fork_position = fork_row_start + (k - 1) * fork_size;
        let offset = locations[count - k] as i64 - (fork_position + fork_size) as i64;
        target.append_instruction(&Instruction::ForkStay { offset });
    }
    for (index, alternative) in alternatives.into_iter().enumerate() {
        if !emitted[index] {
            continue;
        }
        target.extend(alternative);
        if index + 1 != count {
            let offset = end as i64 - (target.len() + jump_size) as i64;
            target.append_instruction(&Instruction::Jump { offset });
        }
    }

    trace!(alternatives = count, cells = end - fork_row_start, "emitted alternation");
    Ok(())
}
