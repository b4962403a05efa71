//! Structural errors raised while decoding or validating bytecode
//!
//! These signal an emitter bug (a stream that breaks the instruction
//! layout contract), never an ordinary "cannot optimize" outcome.

use thiserror::Error;

/// Errors produced when a bytecode stream is not well formed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ByteCodeError {
    /// An opcode cell holds no known opcode
    #[error("unknown opcode {value} at position {position}")]
    UnknownOpcode {
        /// Cell index
        position: usize,
        /// Raw cell value
        value: u64,
    },

    /// An instruction runs past the end of the stream
    #[error("{opcode} at position {position} needs {needed} cells but only {available} remain")]
    Truncated {
        /// Start of the instruction
        position: usize,
        /// Opcode or argument being decoded
        opcode: &'static str,
        /// Cells the instruction requires
        needed: usize,
        /// Cells left in the stream
        available: usize,
    },

    /// A compare argument has an unknown type tag
    #[error("unknown compare type {value} at position {position}")]
    UnknownCompareType {
        /// Cell index
        position: usize,
        /// Raw cell value
        value: u64,
    },

    /// A `CharClass` argument names no known class
    #[error("unknown character class {value} at position {position}")]
    UnknownCharacterClass {
        /// Cell index
        position: usize,
        /// Raw cell value
        value: u64,
    },

    /// A `CheckBoundary` operand names no known kind
    #[error("unknown boundary kind {value} at position {position}")]
    UnknownBoundaryKind {
        /// Cell index
        position: usize,
        /// Raw cell value
        value: u64,
    },

    /// The declared argument size of a `Compare` disagrees with its arguments
    #[error("compare at position {position} declares {declared} argument cells but uses {used}")]
    CompareSizeMismatch {
        /// Start of the `Compare`
        position: usize,
        /// Declared argument cells
        declared: usize,
        /// Cells the arguments need
        used: usize,
    },

    /// A transfer target lies outside the stream
    #[error("control transfer at position {position} targets {target}, outside 0..={len}")]
    JumpOutOfBounds {
        /// Start of the transfer
        position: usize,
        /// Resolved target
        target: i128,
        /// Stream length
        len: usize,
    },

    /// A transfer target is not the start of an instruction
    #[error("control transfer at position {position} targets {target}, which is not an instruction start")]
    JumpIntoInstruction {
        /// Start of the transfer
        position: usize,
        /// Resolved target
        target: usize,
    },

    /// A transfer target was removed by a splice
    #[error("control transfer at position {position} targets {target}, inside a removed range")]
    JumpIntoRemovedRange {
        /// Start of the transfer
        position: usize,
        /// Resolved target
        target: usize,
    },

    /// Splices are unsorted or overlap
    #[error("splice at {at} overlaps the previous splice ending at {previous_end}")]
    OverlappingSplices {
        /// Start of the offending splice
        at: usize,
        /// End of the splice before it
        previous_end: usize,
    },

    /// A splice removes cells past the end of the stream
    #[error("splice {at}..{end} reaches past the end of a {len}-cell stream")]
    SpliceOutOfBounds {
        /// Start of the splice
        at: usize,
        /// End of the removed range
        end: usize,
        /// Stream length
        len: usize,
    },

    /// A splice boundary cuts an instruction in two
    #[error("splice boundary {at} falls inside the instruction at position {position}")]
    SpliceSplitsInstruction {
        /// Splice boundary
        at: usize,
        /// Start of the cut instruction
        position: usize,
    },
}

/// Result type for bytecode operations
pub type ByteCodeResult<T> = Result<T, ByteCodeError>;
