//! The instruction model for split slicing.
//!
//! A [`SplitInstruction`] names one split and an optional sub-range of it,
//! expressed either in absolute row indices or in percent of the split.
//! Instructions compose by union into a [`ReadInstruction`], an ordered
//! sequence of terms realized back to back:
//!
//! ```rust
//! use splitslice::SliceUnit;
//! use splitslice::SplitInstruction;
//!
//! let head = SplitInstruction::new("train", None, Some(10), SliceUnit::Percent).unwrap();
//! let tail = SplitInstruction::new("train", Some(-80), None, SliceUnit::Percent).unwrap();
//! let instruction = head + tail;
//! assert_eq!(instruction.to_string(), "train[:10%]+train[-80%:]");
//! ```
//!
//! Every instruction is immutable once built: composition produces a new,
//! flattened [`ReadInstruction`] and never mutates its operands. The same
//! values can also be obtained from the compact string grammar in
//! [`parse`](crate::instruction::parse); both construction paths share the
//! validation rules below and yield identical values for equivalent inputs.

/// A parser for slice expressions in a compact textual syntax.
///
/// See [`parse::parse`] for syntax details and examples.
pub mod parse;

use std::fmt;
use std::ops::Add;

use itertools::Itertools;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum InstructionError {
    #[error("empty split name")]
    EmptySplitName,

    #[error("rounding `pct1_dropremainder` requires percent bounds")]
    RoundingRequiresPercent,

    #[error("percent bound {value} is outside [-100, 100]")]
    PercentOutOfBounds { value: i64 },
}

/// The unit a slice bound is expressed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SliceUnit {
    /// Bounds are row indices into the split.
    #[default]
    Absolute,
    /// Bounds are percentages of the split's total row count.
    Percent,
}

/// How a percent boundary maps to an integer row index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundingPolicy {
    /// Round `size * pct / 100` to the closest integer, ties to even.
    #[default]
    ClosestInteger,
    /// Each percent maps to exactly `floor(size / 100)` rows; the remainder
    /// past `floor(size / 100) * 100` is never reachable. Spelled
    /// `pct1_dropremainder` in the string grammar.
    DropRemainder,
}

/// A single split with an optional sub-range.
///
/// Negative bounds count from the end of the split: for [`SliceUnit::Absolute`]
/// a bound `v < 0` denotes row `size + v`, for [`SliceUnit::Percent`] it
/// denotes percent `100 + v` (so `-80%` is the last 80%). A missing bound
/// defaults to the corresponding extremity of the split.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SplitInstruction {
    split_name: String,
    from: Option<i64>,
    to: Option<i64>,
    unit: SliceUnit,
    rounding: RoundingPolicy,
}

impl SplitInstruction {
    /// Creates an instruction for a sub-range of `split_name` with the
    /// default [`RoundingPolicy`].
    ///
    /// The split name must be non-empty, and percent bounds must lie within
    /// `[-100, 100]`. A term with neither bound is the full split; it carries
    /// no unit of its own and is canonicalized to [`SliceUnit::Absolute`].
    pub fn new(
        split_name: impl Into<String>,
        from: Option<i64>,
        to: Option<i64>,
        unit: SliceUnit,
    ) -> Result<Self, InstructionError> {
        let split_name = split_name.into();
        if split_name.is_empty() {
            return Err(InstructionError::EmptySplitName);
        }
        let unit = match (from, to) {
            (None, None) => SliceUnit::Absolute,
            _ => unit,
        };
        if unit == SliceUnit::Percent {
            for value in [from, to].into_iter().flatten() {
                if !(-100..=100).contains(&value) {
                    return Err(InstructionError::PercentOutOfBounds { value });
                }
            }
        }
        Ok(Self {
            split_name,
            from,
            to,
            unit,
            rounding: RoundingPolicy::default(),
        })
    }

    /// Creates an instruction covering all rows of `split_name`.
    pub fn full(split_name: impl Into<String>) -> Result<Self, InstructionError> {
        Self::new(split_name, None, None, SliceUnit::Absolute)
    }

    /// Replaces the rounding policy. [`RoundingPolicy::DropRemainder`] is
    /// only meaningful for percent bounds; requesting it on an absolute-unit
    /// instruction is an error.
    pub fn with_rounding(self, rounding: RoundingPolicy) -> Result<Self, InstructionError> {
        if rounding == RoundingPolicy::DropRemainder && self.unit != SliceUnit::Percent {
            return Err(InstructionError::RoundingRequiresPercent);
        }
        Ok(Self { rounding, ..self })
    }

    /// The name of the split this instruction reads from.
    pub fn split_name(&self) -> &str {
        &self.split_name
    }

    /// The lower bound, if any, in this instruction's unit.
    pub fn from(&self) -> Option<i64> {
        self.from
    }

    /// The upper bound, if any, in this instruction's unit.
    pub fn to(&self) -> Option<i64> {
        self.to
    }

    /// The unit both bounds are expressed in.
    pub fn unit(&self) -> SliceUnit {
        self.unit
    }

    /// The rounding policy applied to percent bounds.
    pub fn rounding(&self) -> RoundingPolicy {
        self.rounding
    }
}

/// An ordered union of [`SplitInstruction`] terms.
///
/// Realizing a `ReadInstruction` concatenates the rows of each term in
/// declared order. The representation is always flattened: composing two
/// instructions appends the right operand's terms after the left operand's,
/// which makes union structurally associative and order-preserving.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReadInstruction {
    terms: Vec<SplitInstruction>,
}

impl ReadInstruction {
    pub(crate) fn from_terms(terms: Vec<SplitInstruction>) -> Self {
        debug_assert!(!terms.is_empty(), "a ReadInstruction has at least one term");
        Self { terms }
    }

    /// The terms of this instruction, in realization order.
    pub fn terms(&self) -> &[SplitInstruction] {
        &self.terms
    }

    /// Returns a new instruction realizing `self`'s terms followed by
    /// `other`'s. Equivalent to the `+` operator and to `+` in the string
    /// grammar.
    pub fn union(mut self, other: impl Into<ReadInstruction>) -> ReadInstruction {
        self.terms.extend(other.into().terms);
        self
    }
}

impl From<SplitInstruction> for ReadInstruction {
    fn from(term: SplitInstruction) -> Self {
        Self { terms: vec![term] }
    }
}

impl<R: Into<ReadInstruction>> Add<R> for ReadInstruction {
    type Output = ReadInstruction;

    fn add(self, rhs: R) -> ReadInstruction {
        self.union(rhs)
    }
}

impl<R: Into<ReadInstruction>> Add<R> for SplitInstruction {
    type Output = ReadInstruction;

    fn add(self, rhs: R) -> ReadInstruction {
        ReadInstruction::from(self).union(rhs)
    }
}

impl fmt::Display for SplitInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.split_name)?;
        if self.from.is_some() || self.to.is_some() {
            let suffix = match self.unit {
                SliceUnit::Absolute => "",
                SliceUnit::Percent => "%",
            };
            write!(f, "[")?;
            if let Some(from) = self.from {
                write!(f, "{}{}", from, suffix)?;
            }
            write!(f, ":")?;
            if let Some(to) = self.to {
                write!(f, "{}{}", to, suffix)?;
            }
            write!(f, "]")?;
        }
        if self.rounding == RoundingPolicy::DropRemainder {
            write!(f, "(pct1_dropremainder)")?;
        }
        Ok(())
    }
}

impl fmt::Display for ReadInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.terms.iter().join("+"))
    }
}
