//! Canonical interval sets over code points
//!
//! Used to reason about which characters a `Compare` can consume first.

use regex_bytecode::CharRange;

/// Sorted, non-overlapping, non-adjacent code point ranges
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CodePointSet {
    ranges: Vec<CharRange>,
}

impl CodePointSet {
    /// An empty set
    pub fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Every code point a cell can hold
    pub fn full() -> Self {
        Self {
            ranges: vec![CharRange::new(0, u32::MAX)],
        }
    }

    /// Build a canonical set from arbitrary ranges
    pub fn from_ranges<I>(ranges: I) -> Self
    where
        I: IntoIterator<Item = CharRange>,
    {
        let mut set = Self {
            ranges: ranges.into_iter().collect(),
        };
        set.canonicalize();
        set
    }

    /// Sorted, disjoint, non-adjacent ranges
    pub fn ranges(&self) -> &[CharRange] {
        &self.ranges
    }

    /// Check if the set has no code points
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Check if `code_point` is in the set
    pub fn contains(&self, code_point: u32) -> bool {
        self.ranges
            .binary_search_by(|range| {
                if range.to < code_point {
                    std::cmp::Ordering::Less
                } else if range.from > code_point {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    /// Add a single range, in place
    pub fn insert(&mut self, range: CharRange) {
        self.ranges.push(range);
        self.canonicalize();
    }

    /// Union this set with the given set, in place
    pub fn union(&mut self, other: &CodePointSet) {
        if other.ranges.is_empty() {
            return;
        }
        self.ranges.extend_from_slice(&other.ranges);
        self.canonicalize();
    }

    /// Complement this set over `0..=u32::MAX`, in place
    pub fn negate(&mut self) {
        let mut negated = Vec::with_capacity(self.ranges.len() + 1);
        let mut next = 0u32;
        let mut reached_end = false;
        for range in &self.ranges {
            if range.from > next {
                negated.push(CharRange::new(next, range.from - 1));
            }
            match range.to.checked_add(1) {
                Some(after) => next = after,
                None => {
                    reached_end = true;
                    break;
                }
            }
        }
        if !reached_end {
            negated.push(CharRange::new(next, u32::MAX));
        }
        self.ranges = negated;
    }

    /// Check if any code point belongs to both sets
    pub fn intersects(&self, other: &CodePointSet) -> bool {
        let (mut a, mut b) = (0, 0);
        while a < self.ranges.len() && b < other.ranges.len() {
            let (left, right) = (self.ranges[a], other.ranges[b]);
            if left.to < right.from {
                a += 1;
            } else if right.to < left.from {
                b += 1;
            } else {
                return true;
            }
        }
        false
    }

    /// Sort and merge overlapping or adjacent ranges
    fn canonicalize(&mut self) {
        if self.ranges.len() < 2 {
            return;
        }
        self.ranges.sort_unstable();
        let mut merged: Vec<CharRange> = Vec::with_capacity(self.ranges.len());
        for range in self.ranges.drain(..) {
            match merged.last_mut() {
                Some(last) if range.from <= last.to.saturating_add(1) => {
                    last.to = last.to.max(range.to);
                }
                _ => merged.push(range),
            }
        }
        self.ranges = merged;
    }
}
