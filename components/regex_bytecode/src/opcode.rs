//! Regex bytecode opcodes
//!
//! Every instruction starts with one opcode cell. The opcode fully
//! determines how many operand cells follow, except for `Compare`, which
//! carries its own argument cell count.

/// A single bytecode cell
pub type ByteCodeValue = u64;

/// Opcode tags for the backtracking regex VM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u64)]
pub enum OpCodeId {
    // Matching
    /// Test the current character against a list of compare arguments
    Compare = 1,

    // Control flow
    /// Unconditional relative jump
    Jump = 2,
    /// Try the jump target first, remember the fall-through
    ForkJump = 3,
    /// Try the fall-through first, remember the jump target
    ForkStay = 4,
    /// Committing `ForkJump`: replaces the fallback it pushed last time
    ForkReplaceJump = 5,
    /// Committing `ForkStay`: replaces the fallback it pushed last time
    ForkReplaceStay = 6,
    /// Jump back over a bounded body until its count is reached
    Repeat = 7,
    /// Reset a repetition counter
    ResetRepeat = 8,

    // Capture groups
    /// Record the start of a capture group
    SaveLeftCaptureGroup = 9,
    /// Record the end of a capture group
    SaveRightCaptureGroup = 10,
    /// Forget a capture group's span
    ClearCaptureGroup = 11,

    // Assertions
    /// Assert the start of input
    CheckBegin = 12,
    /// Assert the end of input
    CheckEnd = 13,
    /// Assert a word boundary (or its absence)
    CheckBoundary = 14,

    // Lookaround
    /// Push the current string position
    Save = 15,
    /// Pop and restore the saved string position
    Restore = 16,
    /// Move the string position backwards
    GoBack = 17,
}

impl OpCodeId {
    /// Decode an opcode cell
    pub fn from_value(value: ByteCodeValue) -> Option<Self> {
        let id = match value {
            1 => OpCodeId::Compare,
            2 => OpCodeId::Jump,
            3 => OpCodeId::ForkJump,
            4 => OpCodeId::ForkStay,
            5 => OpCodeId::ForkReplaceJump,
            6 => OpCodeId::ForkReplaceStay,
            7 => OpCodeId::Repeat,
            8 => OpCodeId::ResetRepeat,
            9 => OpCodeId::SaveLeftCaptureGroup,
            10 => OpCodeId::SaveRightCaptureGroup,
            11 => OpCodeId::ClearCaptureGroup,
            12 => OpCodeId::CheckBegin,
            13 => OpCodeId::CheckEnd,
            14 => OpCodeId::CheckBoundary,
            15 => OpCodeId::Save,
            16 => OpCodeId::Restore,
            17 => OpCodeId::GoBack,
            _ => return None,
        };
        Some(id)
    }

    /// The cell value of this opcode
    pub fn value(self) -> ByteCodeValue {
        self as ByteCodeValue
    }

    /// Display name, as printed by the disassembler
    pub fn name(self) -> &'static str {
        match self {
            OpCodeId::Compare => "Compare",
            OpCodeId::Jump => "Jump",
            OpCodeId::ForkJump => "ForkJump",
            OpCodeId::ForkStay => "ForkStay",
            OpCodeId::ForkReplaceJump => "ForkReplaceJump",
            OpCodeId::ForkReplaceStay => "ForkReplaceStay",
            OpCodeId::Repeat => "Repeat",
            OpCodeId::ResetRepeat => "ResetRepeat",
            OpCodeId::SaveLeftCaptureGroup => "SaveLeftCaptureGroup",
            OpCodeId::SaveRightCaptureGroup => "SaveRightCaptureGroup",
            OpCodeId::ClearCaptureGroup => "ClearCaptureGroup",
            OpCodeId::CheckBegin => "CheckBegin",
            OpCodeId::CheckEnd => "CheckEnd",
            OpCodeId::CheckBoundary => "CheckBoundary",
            OpCodeId::Save => "Save",
            OpCodeId::Restore => "Restore",
            OpCodeId::GoBack => "GoBack",
        }
    }

    /// Number of cells, opcode included. `Compare` reports its fixed header
    /// only; its arguments follow.
    pub fn fixed_size(self) -> usize {
        match self {
            OpCodeId::Compare => 3,
            OpCodeId::Repeat => 4,
            OpCodeId::CheckBegin | OpCodeId::CheckEnd | OpCodeId::Save | OpCodeId::Restore => 1,
            OpCodeId::Jump
            | OpCodeId::ForkJump
            | OpCodeId::ForkStay
            | OpCodeId::ForkReplaceJump
            | OpCodeId::ForkReplaceStay
            | OpCodeId::ResetRepeat
            | OpCodeId::SaveLeftCaptureGroup
            | OpCodeId::SaveRightCaptureGroup
            | OpCodeId::ClearCaptureGroup
            | OpCodeId::CheckBoundary
            | OpCodeId::GoBack => 2,
        }
    }

    /// Check if this opcode is a fork (any variant)
    pub fn is_fork(self) -> bool {
        matches!(
            self,
            OpCodeId::ForkJump
                | OpCodeId::ForkStay
                | OpCodeId::ForkReplaceJump
                | OpCodeId::ForkReplaceStay
        )
    }

    /// Check if this opcode transfers control through a relative offset
    pub fn is_control_transfer(self) -> bool {
        self == OpCodeId::Jump || self == OpCodeId::Repeat || self.is_fork()
    }

    /// The committing counterpart of a backtracking fork
    pub fn replace_variant(self) -> Option<Self> {
        match self {
            OpCodeId::ForkJump => Some(OpCodeId::ForkReplaceJump),
            OpCodeId::ForkStay => Some(OpCodeId::ForkReplaceStay),
            _ => None,
        }
    }
}

/// Kind of word-boundary assertion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u64)]
pub enum BoundaryKind {
    /// `\b`
    Word = 0,
    /// `\B`
    NonWord = 1,
}

impl BoundaryKind {
    /// Decode a boundary kind cell
    pub fn from_value(value: ByteCodeValue) -> Option<Self> {
        match value {
            0 => Some(BoundaryKind::Word),
            1 => Some(BoundaryKind::NonWord),
            _ => None,
        }
    }
}
