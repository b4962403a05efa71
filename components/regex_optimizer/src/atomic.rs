//! Loop-to-atomic-group rewriting
//!
//! A greedy loop whose body can never consume the character its follower
//! needs first gains nothing from backtracking into earlier iterations.
//! Such loops get their fork swapped for the committing `ForkReplace*`
//! variant, which keeps a single fallback entry on the backtrack stack
//! instead of one per iteration.

use std::collections::HashSet;

use regex_bytecode::{
    ByteCode, ByteCodeResult, CharRange, CompareTypeAndValuePair, Instruction, OpCodeId,
};
use tracing::{debug, trace};

use crate::basic_blocks::{terminal_instruction, Block};
use crate::code_point_set::CodePointSet;

/// Outcome of the atomic-rewrite safety check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomicRewritePrecondition {
    /// The follower starts with something the loop body can never match
    SatisfiedWithProperHeader,
    /// Nothing after the loop can consume input
    SatisfiedWithEmptyHeader,
    /// The loop may have to give back input for the follower to match
    NotSatisfied,
}

impl AtomicRewritePrecondition {
    /// Check if the loop may be made atomic
    pub fn is_satisfied(self) -> bool {
        self != AtomicRewritePrecondition::NotSatisfied
    }
}

/// Loop shape recognised by the rewriter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlternateForm {
    /// `L: body; Fork L` followed by a checked block
    DirectLoopWithoutHeader,
    /// `L: body; Fork L` at the very end of the stream
    DirectLoopWithoutHeaderAndEmptyFollow,
    /// `L: Fork END; body; Jump L; END:`
    DirectLoopWithHeader,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RewriteCandidate {
    forking_block: Block,
    fork_position: usize,
    follow_block: Option<Block>,
    form: AlternateForm,
}

/// Characters a `Compare` may consume first, or `None` when the arguments
/// include a test that cannot be expressed as a code point set.
fn first_characters(arguments: &[CompareTypeAndValuePair]) -> Option<CodePointSet> {
    let mut direct = CodePointSet::new();
    let mut inverted = CodePointSet::new();
    let mut has_inverted = false;
    let mut inverse = false;
    let mut temporary_inverse = false;

    for argument in arguments {
        match argument {
            CompareTypeAndValuePair::Inverse => {
                inverse = !inverse;
                continue;
            }
            CompareTypeAndValuePair::TemporaryInverse => {
                temporary_inverse = true;
                continue;
            }
            _ => {}
        }
        let is_inverted = inverse ^ std::mem::take(&mut temporary_inverse);

        let term = match argument {
            CompareTypeAndValuePair::AnyChar => {
                direct = CodePointSet::full();
                continue;
            }
            CompareTypeAndValuePair::Char(code_point) => {
                CodePointSet::from_ranges([CharRange::single(*code_point)])
            }
            CompareTypeAndValuePair::CharRange(range) => CodePointSet::from_ranges([*range]),
            CompareTypeAndValuePair::CharClass(class) => {
                CodePointSet::from_ranges(class.ranges().iter().copied())
            }
            CompareTypeAndValuePair::LookupTable(ranges) => {
                CodePointSet::from_ranges(ranges.iter().copied())
            }
            CompareTypeAndValuePair::String(code_points) if !is_inverted => {
                let first = *code_points.first()?;
                CodePointSet::from_ranges([CharRange::single(first)])
            }
            _ => return None,
        };

        if is_inverted {
            has_inverted = true;
            inverted.union(&term);
        } else {
            direct.union(&term);
        }
    }

    if has_inverted {
        inverted.negate();
        direct.union(&inverted);
    }
    Some(direct)
}

fn has_any_char(arguments: &[CompareTypeAndValuePair]) -> bool {
    arguments
        .iter()
        .any(|argument| matches!(argument, CompareTypeAndValuePair::AnyChar))
}

/// Decide whether the loop whose body is `repeated_block` may commit to its
/// iterations, given the block that runs once the loop exits.
///
/// The check is conservative: it may reject loops that would be safe to
/// rewrite, but never accepts one whose match results could change.
pub fn block_satisfies_atomic_rewrite_precondition(
    bytecode: &ByteCode,
    repeated_block: Block,
    following_block: Block,
) -> ByteCodeResult<AtomicRewritePrecondition> {
    let mut repeated_values: Vec<Vec<CompareTypeAndValuePair>> = Vec::new();
    let mut active_groups = HashSet::new();

    for item in bytecode.instructions_in(repeated_block.start, repeated_block.end) {
        let (_, instruction) = item?;
        match instruction {
            Instruction::Compare { arguments } => {
                if has_any_char(&arguments) {
                    return Ok(AtomicRewritePrecondition::NotSatisfied);
                }
                repeated_values.push(arguments);
            }
            Instruction::CheckBoundary { .. } | Instruction::Restore | Instruction::GoBack { .. } => {
                return Ok(AtomicRewritePrecondition::NotSatisfied);
            }
            Instruction::SaveLeftCaptureGroup { id } | Instruction::SaveRightCaptureGroup { id } => {
                active_groups.insert(id);
            }
            // Anchors consume nothing; the compares around them decide.
            _ => {}
        }
    }

    // A body that consumes nothing has no first character to compare with.
    if repeated_values.is_empty() {
        return Ok(AtomicRewritePrecondition::NotSatisfied);
    }

    let mut follow_has_transfer = false;
    for item in bytecode.instructions_in(following_block.start, following_block.end) {
        let (_, instruction) = item?;
        if instruction.is_control_transfer() {
            follow_has_transfer = true;
        }
        match instruction {
            Instruction::Compare { arguments } => {
                if arguments.is_empty() {
                    continue;
                }
                return Ok(compare_against_repeated_values(
                    &arguments,
                    &repeated_values,
                    &active_groups,
                ));
            }
            Instruction::SaveLeftCaptureGroup { id } | Instruction::SaveRightCaptureGroup { id } => {
                active_groups.insert(id);
            }
            Instruction::CheckEnd => return Ok(AtomicRewritePrecondition::SatisfiedWithProperHeader),
            Instruction::CheckBegin
            | Instruction::CheckBoundary { .. }
            | Instruction::GoBack { .. }
            | Instruction::Restore => return Ok(AtomicRewritePrecondition::NotSatisfied),
            _ => {}
        }
    }

    if !follow_has_transfer && following_block.end == bytecode.len() {
        Ok(AtomicRewritePrecondition::SatisfiedWithEmptyHeader)
    } else {
        Ok(AtomicRewritePrecondition::NotSatisfied)
    }
}

fn compare_against_repeated_values(
    following: &[CompareTypeAndValuePair],
    repeated_values: &[Vec<CompareTypeAndValuePair>],
    active_groups: &HashSet<usize>,
) -> AtomicRewritePrecondition {
    for argument in following {
        match argument {
            CompareTypeAndValuePair::AnyChar => return AtomicRewritePrecondition::NotSatisfied,
            CompareTypeAndValuePair::Reference(group) if active_groups.contains(group) => {
                return AtomicRewritePrecondition::NotSatisfied
            }
            _ => {}
        }
    }

    let shares_primitive = following
        .iter()
        .filter(|argument| !argument.is_marker())
        .any(|argument| repeated_values.iter().flatten().any(|repeated| repeated == argument));
    if shares_primitive {
        return AtomicRewritePrecondition::NotSatisfied;
    }

    let following_set = match first_characters(following) {
        Some(set) => set,
        None => return AtomicRewritePrecondition::NotSatisfied,
    };
    for repeated in repeated_values {
        match first_characters(repeated) {
            Some(set) if !set.intersects(&following_set) => {}
            _ => return AtomicRewritePrecondition::NotSatisfied,
        }
    }
    AtomicRewritePrecondition::SatisfiedWithProperHeader
}

fn is_backtracking_fork(id: OpCodeId) -> bool {
    matches!(id, OpCodeId::ForkJump | OpCodeId::ForkStay)
}

/// Greedy loops prefer another pass: a backward `ForkJump` closing a
/// headerless loop, or a forward `ForkStay` skipping a loop with a header.
/// Lazy loops never pile up fallbacks and are left alone.
fn prefers_another_pass(id: OpCodeId, backward: bool) -> bool {
    if backward {
        id == OpCodeId::ForkJump
    } else {
        id == OpCodeId::ForkStay
    }
}

/// Find every loop in `blocks` that can be made atomic and swap its fork for
/// the committing variant. Returns the number of loops rewritten.
///
/// All candidates are collected before the stream is touched, and every
/// rewrite preserves the stream length, so no offsets move.
pub fn attempt_rewrite_loops_as_atomic_groups(
    bytecode: &mut ByteCode,
    blocks: &[Block],
) -> ByteCodeResult<usize> {
    let len = bytecode.len();
    let mut candidates = Vec::new();

    for (i, &forking_block) in blocks.iter().enumerate() {
        let (fork_position, fork) = match terminal_instruction(bytecode, forking_block)? {
            Some(terminal) => terminal,
            None => continue,
        };
        if !is_backtracking_fork(fork.opcode_id()) {
            continue;
        }
        let fork_target = match fork.jump_target(fork_position, len)? {
            Some(target) => target,
            None => continue,
        };

        if !prefers_another_pass(fork.opcode_id(), fork_target <= fork_position) {
            continue;
        }

        if fork_target == forking_block.start {
            // Loop without a header: the block forks back to its own start.
            let candidate = match blocks.get(i + 1) {
                None => Some(RewriteCandidate {
                    forking_block,
                    fork_position,
                    follow_block: None,
                    form: AlternateForm::DirectLoopWithoutHeaderAndEmptyFollow,
                }),
                Some(&follow) => {
                    let precondition =
                        block_satisfies_atomic_rewrite_precondition(bytecode, forking_block, follow)?;
                    trace!(?forking_block, ?follow, ?precondition, "checked headerless loop");
                    precondition.is_satisfied().then_some(RewriteCandidate {
                        forking_block,
                        fork_position,
                        follow_block: Some(follow),
                        form: AlternateForm::DirectLoopWithoutHeader,
                    })
                }
            };
            candidates.extend(candidate);
            continue;
        }

        // Loop with a header: the fork skips over a body that jumps back to it.
        let body = match blocks.get(i + 1) {
            Some(&body) if body.end == fork_target => body,
            _ => continue,
        };
        let closes_loop = match terminal_instruction(bytecode, body)? {
            Some((position, Instruction::Jump { offset })) => {
                Instruction::Jump { offset }.jump_target(position, len)? == Some(fork_position)
            }
            _ => false,
        };
        if !closes_loop {
            continue;
        }
        let follow_block = blocks.get(i + 2).copied();
        let precondition = match follow_block {
            Some(follow) => block_satisfies_atomic_rewrite_precondition(bytecode, body, follow)?,
            None => AtomicRewritePrecondition::SatisfiedWithEmptyHeader,
        };
        trace!(?forking_block, ?body, ?follow_block, ?precondition, "checked loop with header");
        if precondition.is_satisfied() {
            candidates.push(RewriteCandidate {
                forking_block,
                fork_position,
                follow_block,
                form: AlternateForm::DirectLoopWithHeader,
            });
        }
    }

    candidates.sort_by(|a, b| b.fork_position.cmp(&a.fork_position));
    for candidate in &candidates {
        let fork = OpCodeId::from_value(bytecode[candidate.fork_position]);
        if let Some(replacement) = fork.and_then(OpCodeId::replace_variant) {
            bytecode.replace_opcode(candidate.fork_position, replacement);
            trace!(
                position = candidate.fork_position,
                forking_block = ?candidate.forking_block,
                follow_block = ?candidate.follow_block,
                form = ?candidate.form,
                "rewrote loop as atomic group"
            );
        }
    }

    debug!(
        blocks = blocks.len(),
        rewritten = candidates.len(),
        "atomic loop rewrite pass"
    );
    Ok(candidates.len())
}
