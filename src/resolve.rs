//! Resolution of instructions into concrete row ranges.
//!
//! Given the total row count of every split it references, a
//! [`ReadInstruction`] resolves to one half-open [`ResolvedRange`] per term,
//! in declared order. Resolution is pure: the same instruction can be
//! resolved against any number of size maps without re-parsing.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

use serde::Deserialize;
use serde::Serialize;

use crate::instruction::ReadInstruction;
use crate::instruction::RoundingPolicy;
use crate::instruction::SliceUnit;
use crate::instruction::SplitInstruction;

/// Total row count per split, supplied by the caller before resolution.
pub type SplitSizes = HashMap<String, usize>;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("unknown split `{name}`")]
    UnknownSplit { name: String },

    #[error("slice of `{split}` ({size} rows) resolves to begin {begin} past end {end}")]
    BoundsReversed {
        split: String,
        size: usize,
        begin: usize,
        end: usize,
    },
}

/// A concrete `[begin, end)` row interval within one split.
///
/// Only the resolver constructs these; `begin <= end` always holds, and
/// `begin == end` is a valid empty range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedRange {
    split: String,
    begin: usize,
    end: usize,
}

impl ResolvedRange {
    /// The split the rows are read from.
    pub fn split(&self) -> &str {
        &self.split
    }

    /// The first row of the range.
    pub fn begin(&self) -> usize {
        self.begin
    }

    /// One past the last row of the range.
    pub fn end(&self) -> usize {
        self.end
    }

    /// The number of rows in the range.
    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    /// The row interval, for handing to a row reader.
    pub fn rows(&self) -> Range<usize> {
        self.begin..self.end
    }
}

impl fmt::Display for ResolvedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}:{}]", self.split, self.begin, self.end)
    }
}

// A negative index counts from the end of the split. The result is clamped
// into [0, size]; out-of-range absolute bounds degrade to empty or truncated
// ranges rather than errors.
fn absolute_bound(value: i64, size: usize) -> usize {
    let size = size as i64;
    let value = if value < 0 { size + value } else { value };
    value.clamp(0, size) as usize
}

// Percent bounds are validated into [-100, 100] at construction, so the
// normalized value always lands in [0, 100].
fn percent_bound(value: i64) -> u64 {
    if value < 0 {
        (100 + value) as u64
    } else {
        value as u64
    }
}

// round(size * pct / 100) with ties to even, in exact integer arithmetic so
// the same literal boundary always maps to the same row for a given size.
fn closest_bound(size: usize, pct: u64) -> usize {
    let scaled = size as u64 * pct;
    let quotient = scaled / 100;
    let remainder = scaled % 100;
    let rounded = match (2 * remainder).cmp(&100) {
        Ordering::Less => quotient,
        Ordering::Greater => quotient + 1,
        Ordering::Equal => quotient + (quotient % 2),
    };
    rounded as usize
}

// Whole multiples of 1% of floor(size / 100) * 100 usable rows. The up to 99
// rows past that point are unreachable under this policy by design.
fn drop_remainder_bound(size: usize, pct: u64) -> usize {
    (size / 100) * pct as usize
}

impl SplitInstruction {
    /// Resolves this term against the given split sizes.
    pub fn resolve(&self, sizes: &SplitSizes) -> Result<ResolvedRange, ResolveError> {
        let size = *sizes
            .get(self.split_name())
            .ok_or_else(|| ResolveError::UnknownSplit {
                name: self.split_name().to_string(),
            })?;
        let (begin, end) = match self.unit() {
            SliceUnit::Absolute => (
                absolute_bound(self.from().unwrap_or(0), size),
                absolute_bound(self.to().unwrap_or(size as i64), size),
            ),
            SliceUnit::Percent => {
                let from = percent_bound(self.from().unwrap_or(0));
                let to = percent_bound(self.to().unwrap_or(100));
                match self.rounding() {
                    RoundingPolicy::ClosestInteger => {
                        (closest_bound(size, from), closest_bound(size, to))
                    }
                    RoundingPolicy::DropRemainder => {
                        (drop_remainder_bound(size, from), drop_remainder_bound(size, to))
                    }
                }
            }
        };
        if begin > end {
            return Err(ResolveError::BoundsReversed {
                split: self.split_name().to_string(),
                size,
                begin,
                end,
            });
        }
        Ok(ResolvedRange {
            split: self.split_name().to_string(),
            begin,
            end,
        })
    }
}

impl ReadInstruction {
    /// Resolves every term in declared order.
    ///
    /// ```rust
    /// use std::collections::HashMap;
    ///
    /// use splitslice::parse;
    ///
    /// let sizes = HashMap::from([("train".to_string(), 999)]);
    /// let ranges = parse("train[50%:52%]").unwrap().resolve(&sizes).unwrap();
    /// assert_eq!(ranges[0].rows(), 500..519);
    /// ```
    pub fn resolve(&self, sizes: &SplitSizes) -> Result<Vec<ResolvedRange>, ResolveError> {
        self.terms().iter().map(|term| term.resolve(sizes)).collect()
    }
}
