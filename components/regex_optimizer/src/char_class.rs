//! Character-class table compilation
//!
//! Turns the argument list of a bracket expression into one `Compare` where
//! all single characters and ranges are folded into sorted lookup tables.

use std::collections::BTreeMap;

use regex_bytecode::{ByteCode, CharRange, CompareTypeAndValuePair};
use tracing::trace;

/// Which table a tabulated range is inserted into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableSelector {
    Direct,
    Inverted,
}

#[derive(Debug, Default)]
struct RangeTables {
    direct: BTreeMap<u32, CharRange>,
    inverted: BTreeMap<u32, CharRange>,
}

impl RangeTables {
    fn table(&mut self, selector: TableSelector) -> &mut BTreeMap<u32, CharRange> {
        match selector {
            TableSelector::Direct => &mut self.direct,
            TableSelector::Inverted => &mut self.inverted,
        }
    }

    fn insert(&mut self, selector: TableSelector, range: CharRange) {
        self.table(selector)
            .entry(range.from)
            .and_modify(|existing| existing.to = existing.to.max(range.to))
            .or_insert(range);
    }

    fn clear(&mut self) {
        self.direct.clear();
        self.inverted.clear();
    }
}

/// Merge overlapping and adjacent ranges of a table ordered by start
fn coalesce(table: &BTreeMap<u32, CharRange>) -> Vec<CharRange> {
    let mut ranges: Vec<CharRange> = Vec::with_capacity(table.len());
    for range in table.values() {
        match ranges.last_mut() {
            Some(last) if range.from <= last.to.saturating_add(1) => {
                last.to = last.to.max(range.to);
            }
            _ => ranges.push(*range),
        }
    }
    ranges
}

/// Flush the direct table as a `LookupTable` argument
fn flush_direct(tables: &mut RangeTables, arguments: &mut Vec<CompareTypeAndValuePair>) {
    if !tables.direct.is_empty() {
        arguments.push(CompareTypeAndValuePair::LookupTable(coalesce(&tables.direct)));
        tables.direct.clear();
    }
}

/// Append a `Compare` equivalent to `pairs`, with characters and ranges
/// collected into lookup tables.
///
/// Non-inverted tests that can consume other than exactly one character
/// (strings, back-references) keep their place relative to the tables, since
/// the first matching test decides how far the match advances. `AnyChar`
/// subsumes every single-character test; only those variable-length tests
/// survive after it.
pub fn append_character_class(target: &mut ByteCode, pairs: Vec<CompareTypeAndValuePair>) {
    if pairs.len() <= 1 {
        target.insert_bytecode_compare_values(pairs);
        return;
    }

    let mut tables = RangeTables::default();
    let mut arguments = Vec::new();
    let mut inverse = false;
    let mut temporary_inverse = false;
    let mut saturated = false;

    for pair in pairs {
        match pair {
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
        let variable_length = match &pair {
            CompareTypeAndValuePair::String(code_points) => code_points.len() != 1,
            CompareTypeAndValuePair::Reference(_) => true,
            _ => false,
        };
        if saturated {
            if variable_length && !is_inverted {
                arguments.push(pair);
            }
            continue;
        }

        let selector = if is_inverted {
            TableSelector::Inverted
        } else {
            TableSelector::Direct
        };

        match pair {
            CompareTypeAndValuePair::Char(code_point) => {
                tables.insert(selector, CharRange::single(code_point));
            }
            CompareTypeAndValuePair::CharRange(range) => tables.insert(selector, range),
            CompareTypeAndValuePair::LookupTable(ranges) => {
                for range in ranges {
                    tables.insert(selector, range);
                }
            }
            CompareTypeAndValuePair::AnyChar => {
                tables.clear();
                arguments.push(CompareTypeAndValuePair::AnyChar);
                saturated = true;
                trace!(arguments = arguments.len(), "class saturated by AnyChar");
            }
            other => {
                if is_inverted {
                    arguments.push(CompareTypeAndValuePair::TemporaryInverse);
                } else if variable_length {
                    flush_direct(&mut tables, &mut arguments);
                }
                arguments.push(other);
            }
        }
    }

    flush_direct(&mut tables, &mut arguments);
    if !tables.inverted.is_empty() {
        arguments.push(CompareTypeAndValuePair::TemporaryInverse);
        arguments.push(CompareTypeAndValuePair::LookupTable(coalesce(&tables.inverted)));
    }
    trace!(arguments = arguments.len(), "compiled character class");
    target.insert_bytecode_compare_values(arguments);
}
