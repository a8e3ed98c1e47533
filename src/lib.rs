//! Split slicing algebra for dataset read instructions.
//!
//! Provides [`ReadInstruction`], a structured description of which rows to
//! read from a dataset's named splits, together with a parser for the
//! compact slice-expression grammar (`"train[:10%]+train[-80%:]"`) and a
//! resolver that turns an instruction into concrete row ranges once split
//! sizes are known.
//!
//! The crate is a pure algebra: parsing and resolution are deterministic,
//! synchronous, and free of shared state, so both are safe to call
//! concurrently. Reading the selected rows is the caller's concern.
//!
//! ```rust
//! use std::collections::HashMap;
//!
//! use splitslice::parse;
//!
//! let sizes = HashMap::from([("train".to_string(), 999)]);
//! let instruction = parse("train[:10%]+train[-80%:]").unwrap();
//! let ranges = instruction.resolve(&sizes).unwrap();
//! assert_eq!(ranges[0].rows(), 0..100);
//! assert_eq!(ranges[1].rows(), 200..999);
//! ```

/// The instruction model and its expression parser.
pub mod instruction;

/// Resolution of instructions into per-split row ranges.
pub mod resolve;

pub use instruction::InstructionError;
pub use instruction::ReadInstruction;
pub use instruction::RoundingPolicy;
pub use instruction::SliceUnit;
pub use instruction::SplitInstruction;
pub use instruction::parse::ParseError;
pub use instruction::parse::parse;
pub use resolve::ResolveError;
pub use resolve::ResolvedRange;
pub use resolve::SplitSizes;
