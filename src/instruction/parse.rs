//! Parsing of slice expressions.
//!
//! The grammar, with whitespace insignificant everywhere:
//!
//! ```text
//! expr     := term ('+' term)*
//! term     := split_name slice? rounding?
//! slice    := '[' bound? ':' bound? ']'
//! bound    := '-'? digits '%'?
//! rounding := '(' 'pct1_dropremainder' ')'
//! ```
//!
//! A `%` on either bound makes the whole term percent-unit; mixing a percent
//! bound with an absolute one in the same term is an error. Examples:
//!
//! ```rust
//! use splitslice::parse;
//!
//! parse("train").unwrap();
//! parse("train+test").unwrap();
//! parse("train[10:20]").unwrap();
//! parse("train[:10%]+train[-80%:]").unwrap();
//! parse("train[50%:52%](pct1_dropremainder)").unwrap();
//! ```

use std::str::FromStr;

use nom::IResult;
use nom::bytes::complete::tag;
use nom::bytes::complete::take_while1;
use nom::character::complete::char;
use nom::character::complete::digit1;
use nom::combinator::all_consuming;
use nom::combinator::map;
use nom::combinator::map_res;
use nom::combinator::opt;
use nom::combinator::recognize;
use nom::multi::separated_list1;
use nom::sequence::delimited;
use nom::sequence::pair;
use nom::sequence::preceded;
use nom::sequence::separated_pair;
use nom::sequence::tuple;

use crate::instruction::InstructionError;
use crate::instruction::ReadInstruction;
use crate::instruction::RoundingPolicy;
use crate::instruction::SliceUnit;
use crate::instruction::SplitInstruction;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("empty slice expression")]
    Empty,

    #[error("malformed slice expression `{expression}`")]
    Syntax { expression: String },

    #[error("mixed absolute and percent bounds in slice of `{split}`")]
    MixedUnits { split: String },

    #[error(transparent)]
    Instruction(#[from] InstructionError),
}

// A bound as written: signed magnitude plus whether it carried a `%`.
#[derive(Debug, Clone, Copy)]
struct RawBound {
    value: i64,
    percent: bool,
}

type RawSlice = (Option<RawBound>, Option<RawBound>);

#[derive(Debug)]
struct RawTerm<'a> {
    name: &'a str,
    slice: Option<RawSlice>,
    rounding: Option<RoundingPolicy>,
}

fn split_name(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)
}

fn number(input: &str) -> IResult<&str, i64> {
    map_res(recognize(preceded(opt(char('-')), digit1)), str::parse)(input)
}

fn bound(input: &str) -> IResult<&str, RawBound> {
    map(pair(number, opt(char('%'))), |(value, percent)| RawBound {
        value,
        percent: percent.is_some(),
    })(input)
}

fn slice(input: &str) -> IResult<&str, RawSlice> {
    delimited(
        char('['),
        separated_pair(opt(bound), char(':'), opt(bound)),
        char(']'),
    )(input)
}

fn rounding(input: &str) -> IResult<&str, RoundingPolicy> {
    map(delimited(char('('), tag("pct1_dropremainder"), char(')')), |_| {
        RoundingPolicy::DropRemainder
    })(input)
}

fn term(input: &str) -> IResult<&str, RawTerm<'_>> {
    map(
        tuple((split_name, opt(slice), opt(rounding))),
        |(name, slice, rounding)| RawTerm {
            name,
            slice,
            rounding,
        },
    )(input)
}

fn expression(input: &str) -> IResult<&str, Vec<RawTerm<'_>>> {
    separated_list1(char('+'), term)(input)
}

fn build_term(raw: RawTerm<'_>) -> Result<SplitInstruction, ParseError> {
    let (from, to, unit) = match raw.slice {
        None => (None, None, SliceUnit::Absolute),
        Some((from, to)) => {
            let bounds = [from, to];
            let percent = bounds.iter().flatten().any(|b| b.percent);
            if percent && bounds.iter().flatten().any(|b| !b.percent) {
                return Err(ParseError::MixedUnits {
                    split: raw.name.to_string(),
                });
            }
            let unit = if percent {
                SliceUnit::Percent
            } else {
                SliceUnit::Absolute
            };
            (from.map(|b| b.value), to.map(|b| b.value), unit)
        }
    };
    let mut instruction = SplitInstruction::new(raw.name, from, to, unit)?;
    if let Some(rounding) = raw.rounding {
        instruction = instruction.with_rounding(rounding)?;
    }
    Ok(instruction)
}

/// Parses a slice expression into a [`ReadInstruction`].
///
/// Produces exactly the value the structured [`SplitInstruction`] builders
/// produce for the equivalent input, and fails with [`ParseError`] on
/// malformed or invalid expressions.
pub fn parse(expression_str: &str) -> Result<ReadInstruction, ParseError> {
    let input: String = expression_str
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if input.is_empty() {
        return Err(ParseError::Empty);
    }
    let (_, raw_terms) =
        all_consuming(expression)(input.as_str()).map_err(|_| ParseError::Syntax {
            expression: expression_str.trim().to_string(),
        })?;
    let terms = raw_terms
        .into_iter()
        .map(build_term)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ReadInstruction::from_terms(terms))
}

impl FromStr for ReadInstruction {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term_of(expr: &str) -> SplitInstruction {
        let instruction = parse(expr).unwrap();
        assert_eq!(instruction.terms().len(), 1, "expected one term in `{expr}`");
        instruction.terms()[0].clone()
    }

    #[test]
    fn test_parse_full_split() {
        assert_eq!(term_of("train"), SplitInstruction::full("train").unwrap());
        assert_eq!(
            term_of("validation_2"),
            SplitInstruction::full("validation_2").unwrap()
        );
    }

    #[test]
    fn test_parse_absolute() {
        assert_eq!(
            term_of("train[10:20]"),
            SplitInstruction::new("train", Some(10), Some(20), SliceUnit::Absolute).unwrap()
        );
        assert_eq!(
            term_of("train[10:]"),
            SplitInstruction::new("train", Some(10), None, SliceUnit::Absolute).unwrap()
        );
        assert_eq!(
            term_of("train[:-10]"),
            SplitInstruction::new("train", None, Some(-10), SliceUnit::Absolute).unwrap()
        );
        // `[:]` is the full split, same as no slice at all.
        assert_eq!(term_of("train[:]"), SplitInstruction::full("train").unwrap());
    }

    #[test]
    fn test_parse_percent() {
        assert_eq!(
            term_of("train[50%:52%]"),
            SplitInstruction::new("train", Some(50), Some(52), SliceUnit::Percent).unwrap()
        );
        assert_eq!(
            term_of("train[:10%]"),
            SplitInstruction::new("train", None, Some(10), SliceUnit::Percent).unwrap()
        );
        assert_eq!(
            term_of("train[-80%:]"),
            SplitInstruction::new("train", Some(-80), None, SliceUnit::Percent).unwrap()
        );
    }

    #[test]
    fn test_parse_rounding() {
        assert_eq!(
            term_of("train[50%:52%](pct1_dropremainder)"),
            SplitInstruction::new("train", Some(50), Some(52), SliceUnit::Percent)
                .unwrap()
                .with_rounding(RoundingPolicy::DropRemainder)
                .unwrap()
        );
    }

    #[test]
    fn test_parse_union() {
        let instruction = parse("train[:10%]+train[-80%:]+test").unwrap();
        assert_eq!(
            instruction,
            SplitInstruction::new("train", None, Some(10), SliceUnit::Percent).unwrap()
                + SplitInstruction::new("train", Some(-80), None, SliceUnit::Percent).unwrap()
                + SplitInstruction::full("test").unwrap()
        );
    }

    #[test]
    fn test_parse_ignores_whitespace() {
        assert_eq!(
            parse(" train [ 10 : 20 ] + test ").unwrap(),
            parse("train[10:20]+test").unwrap()
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse("").unwrap_err(), ParseError::Empty));
        assert!(matches!(parse("  ").unwrap_err(), ParseError::Empty));

        // Missing split name.
        assert!(matches!(
            parse("[10:20]").unwrap_err(),
            ParseError::Syntax { .. }
        ));
        // Unclosed slice, trailing input, empty union operand.
        assert!(matches!(
            parse("train[10:20").unwrap_err(),
            ParseError::Syntax { .. }
        ));
        assert!(matches!(
            parse("train]").unwrap_err(),
            ParseError::Syntax { .. }
        ));
        assert!(matches!(
            parse("train++test").unwrap_err(),
            ParseError::Syntax { .. }
        ));
        assert!(matches!(
            parse("train+").unwrap_err(),
            ParseError::Syntax { .. }
        ));
        // Unknown rounding qualifier.
        assert!(matches!(
            parse("train[50%:52%](closest)").unwrap_err(),
            ParseError::Syntax { .. }
        ));

        // Mixed units within one term.
        assert!(matches!(
            parse("train[10%:20]").unwrap_err(),
            ParseError::MixedUnits { split } if split == "train"
        ));
        assert!(matches!(
            parse("train[10:20%]").unwrap_err(),
            ParseError::MixedUnits { split } if split == "train"
        ));

        // Validation errors surface through the shared builder path.
        assert!(matches!(
            parse("train[10:20](pct1_dropremainder)").unwrap_err(),
            ParseError::Instruction(InstructionError::RoundingRequiresPercent)
        ));
        assert!(matches!(
            parse("train(pct1_dropremainder)").unwrap_err(),
            ParseError::Instruction(InstructionError::RoundingRequiresPercent)
        ));
        assert!(matches!(
            parse("train[150%:]").unwrap_err(),
            ParseError::Instruction(InstructionError::PercentOutOfBounds { value: 150 })
        ));
    }

    #[test]
    fn test_from_str() {
        let instruction: ReadInstruction = "train[50%:52%]".parse().unwrap();
        assert_eq!(
            instruction,
            SplitInstruction::new("train", Some(50), Some(52), SliceUnit::Percent)
                .unwrap()
                .into()
        );
    }

    #[test]
    fn test_display_round_trip() {
        for expr in [
            "train",
            "train+test",
            "train[10:20]",
            "train[-10:]",
            "train[:10%]",
            "train[-80%:]",
            "train[50%:52%](pct1_dropremainder)",
            "train[:10%]+train[-80%:]+test[5:]",
        ] {
            let instruction = parse(expr).unwrap();
            assert_eq!(instruction.to_string(), expr);
            assert_eq!(parse(&instruction.to_string()).unwrap(), instruction);
        }
    }
}
