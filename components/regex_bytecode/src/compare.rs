//! Compare arguments
//!
//! A `Compare` instruction carries a list of primitive character tests.
//! Each test is encoded as a type cell followed by its value cells.

use std::fmt;

use crate::error::{ByteCodeError, ByteCodeResult};
use crate::opcode::ByteCodeValue;

/// Type tag of one compare argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u64)]
pub enum CharacterCompareType {
    /// Toggle inversion for the remaining arguments
    Inverse = 1,
    /// Invert the next argument only
    TemporaryInverse = 2,
    /// Any character
    AnyChar = 3,
    /// One code point
    Char = 4,
    /// A code point sequence
    String = 5,
    /// A named class
    CharClass = 6,
    /// A packed inclusive range
    CharRange = 7,
    /// Back-reference
    Reference = 8,
    /// Unicode binary property
    Property = 9,
    /// Unicode general category
    GeneralCategory = 10,
    /// Unicode script
    Script = 11,
    /// Unicode script extension
    ScriptExtension = 12,
    /// Range table
    LookupTable = 13,
}

impl CharacterCompareType {
    /// Decode a compare type cell
    pub fn from_value(value: ByteCodeValue) -> Option<Self> {
        let ty = match value {
            1 => CharacterCompareType::Inverse,
            2 => CharacterCompareType::TemporaryInverse,
            3 => CharacterCompareType::AnyChar,
            4 => CharacterCompareType::Char,
            5 => CharacterCompareType::String,
            6 => CharacterCompareType::CharClass,
            7 => CharacterCompareType::CharRange,
            8 => CharacterCompareType::Reference,
            9 => CharacterCompareType::Property,
            10 => CharacterCompareType::GeneralCategory,
            11 => CharacterCompareType::Script,
            12 => CharacterCompareType::ScriptExtension,
            13 => CharacterCompareType::LookupTable,
            _ => return None,
        };
        Some(ty)
    }
}

/// Closed code point interval `[from, to]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CharRange {
    /// First code point
    pub from: u32,
    /// Last code point, inclusive
    pub to: u32,
}

impl CharRange {
    /// Create a range; bounds are reordered if given backwards
    pub const fn new(from: u32, to: u32) -> Self {
        if from <= to {
            Self { from, to }
        } else {
            Self { from: to, to: from }
        }
    }

    /// A range holding a single code point
    pub const fn single(code_point: u32) -> Self {
        Self {
            from: code_point,
            to: code_point,
        }
    }

    /// Check if the range contains a code point
    pub fn contains(&self, code_point: u32) -> bool {
        self.from <= code_point && code_point <= self.to
    }

    /// Pack into one cell: `from` in the high half, `to` in the low half
    pub fn to_value(self) -> ByteCodeValue {
        ((self.from as u64) << 32) | self.to as u64
    }

    /// Unpack a cell produced by [`CharRange::to_value`]
    pub fn from_value(value: ByteCodeValue) -> Self {
        Self::new((value >> 32) as u32, value as u32)
    }
}

impl fmt::Display for CharRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", DisplayCodePoint(self.from), DisplayCodePoint(self.to))
    }
}

/// Formats a code point as a quoted char when printable, else as hex
pub(crate) struct DisplayCodePoint(pub u32);

impl fmt::Display for DisplayCodePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match char::from_u32(self.0) {
            Some(c) if !c.is_control() => write!(f, "'{}'", c),
            _ => write!(f, "U+{:04X}", self.0),
        }
    }
}

/// Named character classes (`\d`, `\w`, `\s`, POSIX brackets)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u64)]
pub enum CharClass {
    /// `[[:alnum:]]`
    Alnum = 0,
    /// `[[:cntrl:]]`
    Cntrl = 1,
    /// `[[:lower:]]`
    Lower = 2,
    /// `\s`, `[[:space:]]`
    Space = 3,
    /// `[[:alpha:]]`
    Alpha = 4,
    /// `\d`, `[[:digit:]]`
    Digit = 5,
    /// `[[:print:]]`
    Print = 6,
    /// `[[:upper:]]`
    Upper = 7,
    /// `[[:blank:]]`
    Blank = 8,
    /// `[[:graph:]]`
    Graph = 9,
    /// `[[:punct:]]`
    Punct = 10,
    /// `\w`
    Word = 11,
    /// `[[:xdigit:]]`
    Xdigit = 12,
}

const ALNUM: &[CharRange] = &[
    CharRange::new(0x30, 0x39),
    CharRange::new(0x41, 0x5A),
    CharRange::new(0x61, 0x7A),
];
const CNTRL: &[CharRange] = &[CharRange::new(0x00, 0x1F), CharRange::single(0x7F)];
const LOWER: &[CharRange] = &[CharRange::new(0x61, 0x7A)];
const SPACE: &[CharRange] = &[
    CharRange::new(0x09, 0x0D),
    CharRange::single(0x20),
    CharRange::single(0xA0),
    CharRange::single(0x1680),
    CharRange::new(0x2000, 0x200A),
    CharRange::new(0x2028, 0x2029),
    CharRange::single(0x202F),
    CharRange::single(0x205F),
    CharRange::single(0x3000),
    CharRange::single(0xFEFF),
];
const ALPHA: &[CharRange] = &[CharRange::new(0x41, 0x5A), CharRange::new(0x61, 0x7A)];
const DIGIT: &[CharRange] = &[CharRange::new(0x30, 0x39)];
const PRINT: &[CharRange] = &[CharRange::new(0x20, 0x7E)];
const UPPER: &[CharRange] = &[CharRange::new(0x41, 0x5A)];
const BLANK: &[CharRange] = &[CharRange::single(0x09), CharRange::single(0x20)];
const GRAPH: &[CharRange] = &[CharRange::new(0x21, 0x7E)];
const PUNCT: &[CharRange] = &[
    CharRange::new(0x21, 0x2F),
    CharRange::new(0x3A, 0x40),
    CharRange::new(0x5B, 0x60),
    CharRange::new(0x7B, 0x7E),
];
const WORD: &[CharRange] = &[
    CharRange::new(0x30, 0x39),
    CharRange::new(0x41, 0x5A),
    CharRange::single(0x5F),
    CharRange::new(0x61, 0x7A),
];
const XDIGIT: &[CharRange] = &[
    CharRange::new(0x30, 0x39),
    CharRange::new(0x41, 0x46),
    CharRange::new(0x61, 0x66),
];

impl CharClass {
    /// Decode a character class cell
    pub fn from_value(value: ByteCodeValue) -> Option<Self> {
        let class = match value {
            0 => CharClass::Alnum,
            1 => CharClass::Cntrl,
            2 => CharClass::Lower,
            3 => CharClass::Space,
            4 => CharClass::Alpha,
            5 => CharClass::Digit,
            6 => CharClass::Print,
            7 => CharClass::Upper,
            8 => CharClass::Blank,
            9 => CharClass::Graph,
            10 => CharClass::Punct,
            11 => CharClass::Word,
            12 => CharClass::Xdigit,
            _ => return None,
        };
        Some(class)
    }

    /// Sorted, disjoint ranges making up this class
    pub fn ranges(self) -> &'static [CharRange] {
        match self {
            CharClass::Alnum => ALNUM,
            CharClass::Cntrl => CNTRL,
            CharClass::Lower => LOWER,
            CharClass::Space => SPACE,
            CharClass::Alpha => ALPHA,
            CharClass::Digit => DIGIT,
            CharClass::Print => PRINT,
            CharClass::Upper => UPPER,
            CharClass::Blank => BLANK,
            CharClass::Graph => GRAPH,
            CharClass::Punct => PUNCT,
            CharClass::Word => WORD,
            CharClass::Xdigit => XDIGIT,
        }
    }

    /// Check if the class contains a code point
    pub fn contains(self, code_point: u32) -> bool {
        self.ranges().iter().any(|range| range.contains(code_point))
    }
}

/// One primitive character test inside a `Compare`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CompareTypeAndValuePair {
    /// Toggle inversion for the remaining arguments
    Inverse,
    /// Invert only the next argument
    TemporaryInverse,
    /// Any character
    AnyChar,
    /// One code point
    Char(u32),
    /// A literal sequence, consumed as a whole
    String(Vec<u32>),
    /// A named class
    CharClass(CharClass),
    /// An inclusive range
    CharRange(CharRange),
    /// Back-reference to a capture group
    Reference(usize),
    /// Unicode binary property id
    Property(u64),
    /// Unicode general category id
    GeneralCategory(u64),
    /// Unicode script id
    Script(u64),
    /// Unicode script extension id
    ScriptExtension(u64),
    /// Sorted, coalesced ranges searched by interval
    LookupTable(Vec<CharRange>),
}

impl CompareTypeAndValuePair {
    /// Build a `String` argument from text
    pub fn string(text: &str) -> Self {
        CompareTypeAndValuePair::String(text.chars().map(u32::from).collect())
    }

    /// The type tag of this argument
    pub fn compare_type(&self) -> CharacterCompareType {
        match self {
            CompareTypeAndValuePair::Inverse => CharacterCompareType::Inverse,
            CompareTypeAndValuePair::TemporaryInverse => CharacterCompareType::TemporaryInverse,
            CompareTypeAndValuePair::AnyChar => CharacterCompareType::AnyChar,
            CompareTypeAndValuePair::Char(_) => CharacterCompareType::Char,
            CompareTypeAndValuePair::String(_) => CharacterCompareType::String,
            CompareTypeAndValuePair::CharClass(_) => CharacterCompareType::CharClass,
            CompareTypeAndValuePair::CharRange(_) => CharacterCompareType::CharRange,
            CompareTypeAndValuePair::Reference(_) => CharacterCompareType::Reference,
            CompareTypeAndValuePair::Property(_) => CharacterCompareType::Property,
            CompareTypeAndValuePair::GeneralCategory(_) => CharacterCompareType::GeneralCategory,
            CompareTypeAndValuePair::Script(_) => CharacterCompareType::Script,
            CompareTypeAndValuePair::ScriptExtension(_) => CharacterCompareType::ScriptExtension,
            CompareTypeAndValuePair::LookupTable(_) => CharacterCompareType::LookupTable,
        }
    }

    /// Check if this argument is an inversion marker rather than a test
    pub fn is_marker(&self) -> bool {
        matches!(
            self,
            CompareTypeAndValuePair::Inverse | CompareTypeAndValuePair::TemporaryInverse
        )
    }

    /// Number of cells this argument occupies
    pub fn encoded_size(&self) -> usize {
        match self {
            CompareTypeAndValuePair::Inverse
            | CompareTypeAndValuePair::TemporaryInverse
            | CompareTypeAndValuePair::AnyChar => 1,
            CompareTypeAndValuePair::String(code_points) => 2 + code_points.len(),
            CompareTypeAndValuePair::LookupTable(ranges) => 2 + ranges.len(),
            _ => 2,
        }
    }

    /// Append the encoded argument to `out`
    pub fn encode(&self, out: &mut Vec<ByteCodeValue>) {
        out.push(self.compare_type() as ByteCodeValue);
        match self {
            CompareTypeAndValuePair::Inverse
            | CompareTypeAndValuePair::TemporaryInverse
            | CompareTypeAndValuePair::AnyChar => {}
            CompareTypeAndValuePair::Char(code_point) => out.push(*code_point as u64),
            CompareTypeAndValuePair::String(code_points) => {
                out.push(code_points.len() as u64);
                out.extend(code_points.iter().map(|&cp| cp as u64));
            }
            CompareTypeAndValuePair::CharClass(class) => out.push(*class as u64),
            CompareTypeAndValuePair::CharRange(range) => out.push(range.to_value()),
            CompareTypeAndValuePair::Reference(group) => out.push(*group as u64),
            CompareTypeAndValuePair::Property(id)
            | CompareTypeAndValuePair::GeneralCategory(id)
            | CompareTypeAndValuePair::Script(id)
            | CompareTypeAndValuePair::ScriptExtension(id) => out.push(*id),
            CompareTypeAndValuePair::LookupTable(ranges) => {
                out.push(ranges.len() as u64);
                out.extend(ranges.iter().map(|range| range.to_value()));
            }
        }
    }

    /// Decode one argument starting at `position`; returns it with the
    /// number of cells consumed
    pub fn decode(cells: &[ByteCodeValue], position: usize) -> ByteCodeResult<(Self, usize)> {
        let truncated = |needed: usize| ByteCodeError::Truncated {
            position,
            opcode: "Compare argument",
            needed,
            available: cells.len().saturating_sub(position),
        };
        let tag = *cells.get(position).ok_or_else(|| truncated(1))?;
        let ty = CharacterCompareType::from_value(tag)
            .ok_or(ByteCodeError::UnknownCompareType { position, value: tag })?;

        let value = |index: usize| cells.get(position + index).copied().ok_or_else(|| truncated(index + 1));

        let pair = match ty {
            CharacterCompareType::Inverse => return Ok((CompareTypeAndValuePair::Inverse, 1)),
            CharacterCompareType::TemporaryInverse => {
                return Ok((CompareTypeAndValuePair::TemporaryInverse, 1))
            }
            CharacterCompareType::AnyChar => return Ok((CompareTypeAndValuePair::AnyChar, 1)),
            CharacterCompareType::Char => CompareTypeAndValuePair::Char(value(1)? as u32),
            CharacterCompareType::CharClass => {
                let raw = value(1)?;
                let class = CharClass::from_value(raw).ok_or(ByteCodeError::UnknownCharacterClass {
                    position: position + 1,
                    value: raw,
                })?;
                CompareTypeAndValuePair::CharClass(class)
            }
            CharacterCompareType::CharRange => {
                CompareTypeAndValuePair::CharRange(CharRange::from_value(value(1)?))
            }
            CharacterCompareType::Reference => CompareTypeAndValuePair::Reference(value(1)? as usize),
            CharacterCompareType::Property => CompareTypeAndValuePair::Property(value(1)?),
            CharacterCompareType::GeneralCategory => {
                CompareTypeAndValuePair::GeneralCategory(value(1)?)
            }
            CharacterCompareType::Script => CompareTypeAndValuePair::Script(value(1)?),
            CharacterCompareType::ScriptExtension => {
                CompareTypeAndValuePair::ScriptExtension(value(1)?)
            }
            CharacterCompareType::String => {
                let length = value(1)? as usize;
                let code_points = (0..length)
                    .map(|i| value(2 + i).map(|cp| cp as u32))
                    .collect::<ByteCodeResult<Vec<_>>>()?;
                return Ok((CompareTypeAndValuePair::String(code_points), 2 + length));
            }
            CharacterCompareType::LookupTable => {
                let count = value(1)? as usize;
                let ranges = (0..count)
                    .map(|i| value(2 + i).map(CharRange::from_value))
                    .collect::<ByteCodeResult<Vec<_>>>()?;
                return Ok((CompareTypeAndValuePair::LookupTable(ranges), 2 + count));
            }
        };
        Ok((pair, 2))
    }
}

impl fmt::Display for CompareTypeAndValuePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareTypeAndValuePair::Inverse => write!(f, "Inverse"),
            CompareTypeAndValuePair::TemporaryInverse => write!(f, "TemporaryInverse"),
            CompareTypeAndValuePair::AnyChar => write!(f, "AnyChar"),
            CompareTypeAndValuePair::Char(cp) => write!(f, "Char({})", DisplayCodePoint(*cp)),
            CompareTypeAndValuePair::String(code_points) => {
                let text: String = code_points
                    .iter()
                    .map(|&cp| char::from_u32(cp).unwrap_or(char::REPLACEMENT_CHARACTER))
                    .collect();
                write!(f, "String({:?})", text)
            }
            CompareTypeAndValuePair::CharClass(class) => write!(f, "CharClass({:?})", class),
            CompareTypeAndValuePair::CharRange(range) => write!(f, "CharRange({})", range),
            CompareTypeAndValuePair::Reference(group) => write!(f, "Reference({})", group),
            CompareTypeAndValuePair::Property(id) => write!(f, "Property({})", id),
            CompareTypeAndValuePair::GeneralCategory(id) => write!(f, "GeneralCategory({})", id),
            CompareTypeAndValuePair::Script(id) => write!(f, "Script({})", id),
            CompareTypeAndValuePair::ScriptExtension(id) => write!(f, "ScriptExtension({})", id),
            CompareTypeAndValuePair::LookupTable(ranges) => {
                write!(f, "LookupTable[")?;
                for (i, range) in ranges.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", range)?;
                }
                write!(f, "]")
            }
        }
    }
}
