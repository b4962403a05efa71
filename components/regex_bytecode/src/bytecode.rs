//! ByteCode - flat instruction stream for the backtracking matcher
//!
//! Cells are stored contiguously. Emitters append complete constructs and
//! keep every relative offset they produce consistent with the layout they
//! emit.

use std::collections::HashSet;
use std::ops::{Index, IndexMut};

use crate::compare::CompareTypeAndValuePair;
use crate::error::{ByteCodeError, ByteCodeResult};
use crate::instruction::{Cursor, Instruction};
use crate::opcode::{BoundaryKind, ByteCodeValue, OpCodeId};

/// Direction of a lookaround assertion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookAroundType {
    /// `(?=...)`
    LookAhead,
    /// `(?<=...)` over a body of fixed `length` characters
    LookBehind { length: usize },
}

/// A compiled regex program
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ByteCode {
    cells: Vec<ByteCodeValue>,
}

impl ByteCode {
    /// Create a new empty stream
    pub fn new() -> Self {
        Self { cells: Vec::new() }
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the stream holds no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The raw cells
    pub fn as_slice(&self) -> &[ByteCodeValue] {
        &self.cells
    }

    /// Consume the stream, returning its cells
    pub fn into_cells(self) -> Vec<ByteCodeValue> {
        self.cells
    }

    /// Append one raw cell
    pub fn empend(&mut self, value: ByteCodeValue) {
        self.cells.push(value);
    }

    /// Append raw cells
    pub fn extend_from_slice(&mut self, values: &[ByteCodeValue]) {
        self.cells.extend_from_slice(values);
    }

    /// Move all cells of `other` to the end of this stream
    pub fn extend(&mut self, other: ByteCode) {
        if self.cells.is_empty() {
            self.cells = other.cells;
        } else {
            self.cells.extend(other.cells);
        }
    }

    /// Copy the cells in `[start, end)` into a new stream
    pub fn slice(&self, start: usize, end: usize) -> ByteCode {
        ByteCode {
            cells: self.cells[start..end].to_vec(),
        }
    }

    /// Append an encoded instruction
    pub fn append_instruction(&mut self, instruction: &Instruction) {
        instruction.encode(&mut self.cells);
    }

    /// Decode the instruction starting at `position`
    pub fn decode_at(&self, position: usize) -> ByteCodeResult<Instruction> {
        Instruction::decode(&self.cells, position)
    }

    /// Overwrite the opcode cell at `position`
    pub fn replace_opcode(&mut self, position: usize, id: OpCodeId) {
        self.cells[position] = id.value();
    }

    /// Iterate over `(position, instruction)` pairs of the whole stream
    pub fn instructions(&self) -> Instructions<'_> {
        self.instructions_in(0, self.cells.len())
    }

    /// Iterate over the instructions starting inside `[start, end)`
    pub fn instructions_in(&self, start: usize, end: usize) -> Instructions<'_> {
        Instructions {
            cells: &self.cells,
            cursor: Cursor::new(start),
            end,
            failed: false,
        }
    }

    /// Check the layout contract: known tags, complete operands, and
    /// control transfers landing on an instruction start or the end
    pub fn validate(&self) -> ByteCodeResult<()> {
        let mut starts = HashSet::new();
        let mut transfers = Vec::new();
        for item in self.instructions() {
            let (position, instruction) = item?;
            starts.insert(position);
            if let Some(target) = instruction.jump_target(position, self.len())? {
                transfers.push((position, target));
            }
        }
        for (position, target) in transfers {
            if target != self.len() && !starts.contains(&target) {
                return Err(ByteCodeError::JumpIntoInstruction { position, target });
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Construct emitters
    // ------------------------------------------------------------------

    /// Append a `Compare` with the given arguments
    pub fn insert_bytecode_compare_values(&mut self, arguments: Vec<CompareTypeAndValuePair>) {
        self.append_instruction(&Instruction::Compare { arguments });
    }

    /// Append a `Compare` matching `text` literally
    pub fn insert_bytecode_compare_string(&mut self, text: &str) {
        self.insert_bytecode_compare_values(vec![CompareTypeAndValuePair::string(text)]);
    }

    /// Append a start-of-input assertion
    pub fn insert_bytecode_check_begin(&mut self) {
        self.append_instruction(&Instruction::CheckBegin);
    }

    /// Append an end-of-input assertion
    pub fn insert_bytecode_check_end(&mut self) {
        self.append_instruction(&Instruction::CheckEnd);
    }

    /// Append a word boundary assertion
    pub fn insert_bytecode_check_boundary(&mut self, kind: BoundaryKind) {
        self.append_instruction(&Instruction::CheckBoundary { kind });
    }

    /// Append the opening mark of capture group `id`
    pub fn insert_bytecode_group_capture_left(&mut self, id: usize) {
        self.append_instruction(&Instruction::SaveLeftCaptureGroup { id });
    }

    /// Append the closing mark of capture group `id`
    pub fn insert_bytecode_group_capture_right(&mut self, id: usize) {
        self.append_instruction(&Instruction::SaveRightCaptureGroup { id });
    }

    /// Append a reset of capture group `id`
    pub fn insert_bytecode_clear_capture_group(&mut self, id: usize) {
        self.append_instruction(&Instruction::ClearCaptureGroup { id });
    }

    /// Wrap `body` in capture group `id`
    pub fn insert_bytecode_group_capture(&mut self, id: usize, body: ByteCode) {
        self.insert_bytecode_group_capture_left(id);
        self.extend(body);
        self.insert_bytecode_group_capture_right(id);
    }

    /// Append a positive lookaround around `body`
    pub fn insert_bytecode_lookaround(&mut self, body: ByteCode, kind: LookAroundType) {
        self.append_instruction(&Instruction::Save);
        if let LookAroundType::LookBehind { length } = kind {
            self.append_instruction(&Instruction::GoBack { count: length });
        }
        self.extend(body);
        self.append_instruction(&Instruction::Restore);
    }

    /// `body*`
    ///
    /// ```text
    /// L:   ForkStay END      (ForkJump when lazy)
    ///      body
    ///      Jump L
    /// END:
    /// ```
    pub fn insert_bytecode_repetition_any(&mut self, body: ByteCode, greedy: bool) {
        let body_size = body.len() as i64;
        let fork_size = OpCodeId::ForkStay.fixed_size() as i64;
        let jump_size = OpCodeId::Jump.fixed_size() as i64;
        let offset = body_size + jump_size;
        self.append_instruction(&if greedy {
            Instruction::ForkStay { offset }
        } else {
            Instruction::ForkJump { offset }
        });
        self.extend(body);
        self.append_instruction(&Instruction::Jump {
            offset: -(fork_size + body_size + jump_size),
        });
    }

    /// `body+`
    ///
    /// ```text
    /// L:   body
    ///      ForkJump L        (ForkStay when lazy)
    /// ```
    pub fn insert_bytecode_repetition_min_one(&mut self, body: ByteCode, greedy: bool) {
        let offset = -(body.len() as i64 + OpCodeId::ForkJump.fixed_size() as i64);
        self.extend(body);
        self.append_instruction(&if greedy {
            Instruction::ForkJump { offset }
        } else {
            Instruction::ForkStay { offset }
        });
    }

    /// `body?`
    pub fn insert_bytecode_repetition_zero_or_one(&mut self, body: ByteCode, greedy: bool) {
        let offset = body.len() as i64;
        self.append_instruction(&if greedy {
            Instruction::ForkStay { offset }
        } else {
            Instruction::ForkJump { offset }
        });
        self.extend(body);
    }

    /// `body{n}` using the repetition counter `repetition_id`
    ///
    /// ```text
    ///      ResetRepeat id
    /// L:   body
    ///      Repeat L, n, id
    /// ```
    pub fn insert_bytecode_repetition_n(&mut self, body: ByteCode, n: usize, repetition_id: usize) {
        match n {
            0 => {}
            1 => self.extend(body),
            _ => {
                self.append_instruction(&Instruction::ResetRepeat { id: repetition_id });
                let offset = body.len();
                self.extend(body);
                self.append_instruction(&Instruction::Repeat {
                    offset,
                    count: n,
                    id: repetition_id,
                });
            }
        }
    }

    /// `body{min,max}`, or `body{min,}` when `max` is `None`
    ///
    /// The optional tail is emitted as nested forks that all exit to the
    /// end of the construct.
    pub fn insert_bytecode_repetition_min_max(
        &mut self,
        body: ByteCode,
        min: usize,
        max: Option<usize>,
        repetition_id: usize,
        greedy: bool,
    ) {
        let max = match max {
            Some(max) => max.max(min),
            None => {
                self.insert_bytecode_repetition_n(body.clone(), min, repetition_id);
                self.insert_bytecode_repetition_any(body, greedy);
                return;
            }
        };

        self.insert_bytecode_repetition_n(body.clone(), min, repetition_id);

        let optional = max - min;
        let fork_size = OpCodeId::ForkStay.fixed_size();
        let copy_size = fork_size + body.len();
        for copy in 0..optional {
            let remaining = optional - copy;
            let offset = (remaining * copy_size - fork_size) as i64;
            self.append_instruction(&if greedy {
                Instruction::ForkStay { offset }
            } else {
                Instruction::ForkJump { offset }
            });
            self.extend_from_slice(body.as_slice());
        }
    }
}

impl Index<usize> for ByteCode {
    type Output = ByteCodeValue;

    fn index(&self, index: usize) -> &Self::Output {
        &self.cells[index]
    }
}

impl IndexMut<usize> for ByteCode {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.cells[index]
    }
}

impl From<Vec<ByteCodeValue>> for ByteCode {
    fn from(cells: Vec<ByteCodeValue>) -> Self {
        Self { cells }
    }
}

/// Iterator over decoded instructions; stops after the first error
pub struct Instructions<'a> {
    cells: &'a [ByteCodeValue],
    cursor: Cursor,
    end: usize,
    failed: bool,
}

impl<'a> Iterator for Instructions<'a> {
    type Item = ByteCodeResult<(usize, Instruction)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.cursor.next(self.cells, self.end)?;
        self.failed = item.is_err();
        Some(item)
    }
}
