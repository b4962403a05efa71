//! Bytecode for a backtracking regular-expression matcher
//!
//! This crate defines the flat instruction stream a compiled pattern is
//! lowered to, along with decoding, validation, construct emitters, and a
//! disassembler.
//!
//! # Features
//!
//! - Flat `u64` cell stream with relative jump/fork offsets
//! - Decoded instruction view and single-step cursor
//! - Compare arguments with packed ranges and lookup tables
//! - Emitters for repetitions, groups, anchors, and lookaround
//!
//! # Example
//!
//! ```
//! use regex_bytecode::{ByteCode, CompareTypeAndValuePair, OpCodeId};
//!
//! let mut body = ByteCode::new();
//! body.insert_bytecode_compare_values(vec![CompareTypeAndValuePair::Char('a' as u32)]);
//!
//! // a*
//! let mut bytecode = ByteCode::new();
//! bytecode.insert_bytecode_repetition_any(body, true);
//! bytecode.validate().unwrap();
//!
//! let first = bytecode.decode_at(0).unwrap();
//! assert_eq!(first.opcode_id(), OpCodeId::ForkStay);
//! println!("{}", bytecode);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bytecode;
pub mod compare;
mod disasm;
pub mod error;
pub mod instruction;
pub mod opcode;

// Re-export main types at crate root
pub use bytecode::{ByteCode, Instructions, LookAroundType};
pub use compare::{CharClass, CharRange, CharacterCompareType, CompareTypeAndValuePair};
pub use error::{ByteCodeError, ByteCodeResult};
pub use instruction::{Cursor, Instruction};
pub use opcode::{BoundaryKind, ByteCodeValue, OpCodeId};
