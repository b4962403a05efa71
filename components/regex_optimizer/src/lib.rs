//! Optimization passes for regex bytecode
//!
//! # Features
//!
//! - Basic block splitting over flat, offset-addressed streams
//! - Atomic loop rewriting guarded by a conservative safety check
//! - Jump offset repair for cell insertions and removals
//! - Alternation compilation with shared-prefix hoisting
//! - Character-class compilation into range lookup tables
//!
//! # Example
//!
//! ```
//! use regex_bytecode::{ByteCode, CompareTypeAndValuePair, OpCodeId};
//! use regex_optimizer::Optimizer;
//!
//! let literal = |c: char| {
//!     let mut bytecode = ByteCode::new();
//!     bytecode.insert_bytecode_compare_values(vec![CompareTypeAndValuePair::Char(c as u32)]);
//!     bytecode
//! };
//!
//! // a*b
//! let mut bytecode = ByteCode::new();
//! bytecode.insert_bytecode_repetition_any(literal('a'), true);
//! bytecode.extend(literal('b'));
//!
//! let report = Optimizer::new().optimize(&mut bytecode).unwrap();
//! assert_eq!(report.rewritten_loops, 1);
//! assert_eq!(bytecode.decode_at(0).unwrap().opcode_id(), OpCodeId::ForkReplaceStay);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod alternation;
pub mod atomic;
pub mod basic_blocks;
pub mod char_class;
pub mod code_point_set;
pub mod offset_repair;
pub mod optimizer;
pub mod options;

// Re-export main types at crate root
pub use alternation::append_alternation;
pub use atomic::{
    attempt_rewrite_loops_as_atomic_groups, block_satisfies_atomic_rewrite_precondition,
    AlternateForm, AtomicRewritePrecondition,
};
pub use basic_blocks::{split_basic_blocks, terminal_instruction, Block};
pub use char_class::append_character_class;
pub use code_point_set::CodePointSet;
pub use offset_repair::{repair_jump_offsets, Splice};
pub use optimizer::{OptimizationReport, Optimizer};
pub use options::OptimizerOptions;
