//! Regex bytecode optimizer
//!
//! Runs the whole-program passes over a finished stream and exposes the
//! construct compilers used while a pattern is being emitted.

use regex_bytecode::{ByteCode, ByteCodeResult, CompareTypeAndValuePair};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::alternation::append_alternation_with;
use crate::atomic::attempt_rewrite_loops_as_atomic_groups;
use crate::basic_blocks::split_basic_blocks;
use crate::char_class::append_character_class;
use crate::options::OptimizerOptions;

/// Summary of one `optimize` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OptimizationReport {
    /// Number of basic blocks the stream was split into
    pub blocks: usize,
    /// Number of loops turned into atomic loops
    pub rewritten_loops: usize,
}

/// Bytecode optimizer that applies the enabled optimization passes
#[derive(Debug, Clone, Default)]
pub struct Optimizer {
    options: OptimizerOptions,
}

impl Optimizer {
    /// Create a new optimizer with every optimization enabled
    pub fn new() -> Self {
        Self {
            options: OptimizerOptions::default(),
        }
    }

    /// Create an optimizer from explicit options
    pub fn with_options(options: OptimizerOptions) -> Self {
        Self { options }
    }

    /// Enable or disable the atomic loop rewrite
    pub fn with_loop_rewriting(mut self, enabled: bool) -> Self {
        self.options.rewrite_loops_as_atomic_groups = enabled;
        self
    }

    /// Enable or disable alternation prefix sharing
    pub fn with_alternation_prefix_sharing(mut self, enabled: bool) -> Self {
        self.options.share_alternation_prefixes = enabled;
        self
    }

    /// Enable or disable character-class tables
    pub fn with_character_class_tables(mut self, enabled: bool) -> Self {
        self.options.tabulate_character_classes = enabled;
        self
    }

    /// Options in effect
    pub fn options(&self) -> &OptimizerOptions {
        &self.options
    }

    /// Run the whole-program passes on `bytecode`.
    ///
    /// The stream is validated first; on error it is left untouched.
    pub fn optimize(&self, bytecode: &mut ByteCode) -> ByteCodeResult<OptimizationReport> {
        bytecode.validate()?;
        trace!(disassembly = %bytecode, "optimizing");

        let blocks = split_basic_blocks(bytecode)?;
        let mut report = OptimizationReport {
            blocks: blocks.len(),
            rewritten_loops: 0,
        };
        if self.options.rewrite_loops_as_atomic_groups {
            report.rewritten_loops = attempt_rewrite_loops_as_atomic_groups(bytecode, &blocks)?;
        }

        debug!(
            cells = bytecode.len(),
            blocks = report.blocks,
            rewritten_loops = report.rewritten_loops,
            "optimized bytecode"
        );
        Ok(report)
    }

    /// Append an alternation of `alternatives` to `target`
    pub fn append_alternation(
        &self,
        target: &mut ByteCode,
        alternatives: Vec<ByteCode>,
    ) -> ByteCodeResult<()> {
        append_alternation_with(target, alternatives, self.options.share_alternation_prefixes)
    }

    /// Append a character class to `target`
    pub fn append_character_class(&self, target: &mut ByteCode, pairs: Vec<CompareTypeAndValuePair>) {
        if self.options.tabulate_character_classes {
            append_character_class(target, pairs);
        } else {
            target.insert_bytecode_compare_values(pairs);
        }
    }
}
