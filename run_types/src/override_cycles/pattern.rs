//! Tokenizer for read override patterns such as `N2Y*` or `U8Y*N3`.
//!
//! A pattern is one or more tokens, each a cycle letter (`Y` read, `I` index,
//! `U` UMI, `N` masked) followed by a decimal cycle count or the `*` wildcard
//! that absorbs whatever cycles remain in the read.

use nom::branch::alt;
use nom::character::complete::{anychar, char, digit1};
use nom::combinator::{map, map_opt, value};
use nom::sequence::pair;
use nom::IResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("override pattern is empty")]
    Empty,

    #[error("unrecognized cycle letter '{letter}' at position {position} in override pattern '{pattern}'; expected one of Y, I, U, N")]
    UnknownLetter {
        pattern: String,
        letter: char,
        position: usize,
    },

    #[error("cycle letter '{letter}' at position {position} in override pattern '{pattern}' must be followed by a cycle count or '*'")]
    MissingCount {
        pattern: String,
        letter: char,
        position: usize,
    },

    #[error("cycle count {count} at position {position} in override pattern '{pattern}' exceeds the maximum of {max}", max = MAX_CYCLE_COUNT)]
    CountTooLarge {
        pattern: String,
        count: usize,
        position: usize,
    },
}

/// Largest cycle count a single token may claim.
pub const MAX_CYCLE_COUNT: usize = 1000;

/// What the sequencer does with a run of cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleKind {
    Read,
    Index,
    Umi,
    Mask,
}

impl CycleKind {
    pub fn letter(self) -> char {
        match self {
            CycleKind::Read => 'Y',
            CycleKind::Index => 'I',
            CycleKind::Umi => 'U',
            CycleKind::Mask => 'N',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'Y' => Some(CycleKind::Read),
            'I' => Some(CycleKind::Index),
            'U' => Some(CycleKind::Umi),
            'N' => Some(CycleKind::Mask),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleCount {
    Fixed(usize),
    Wildcard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatternToken {
    pub kind: CycleKind,
    pub count: CycleCount,
}

impl fmt::Display for PatternToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.count {
            CycleCount::Fixed(n) => write!(f, "{}{n}", self.kind.letter()),
            CycleCount::Wildcard => write!(f, "{}*", self.kind.letter()),
        }
    }
}

fn cycle_kind(input: &str) -> IResult<&str, CycleKind> {
    map_opt(anychar, CycleKind::from_letter)(input)
}

fn cycle_count(input: &str) -> IResult<&str, CycleCount> {
    alt((
        value(CycleCount::Wildcard, char('*')),
        // digit1 only yields digits, so parsing fails on overflow alone
        map(digit1, |d: &str| {
            CycleCount::Fixed(d.parse().unwrap_or(usize::MAX))
        }),
    ))(input)
}

fn token(input: &str) -> IResult<&str, PatternToken> {
    map(pair(cycle_kind, cycle_count), |(kind, count)| PatternToken {
        kind,
        count,
    })(input)
}

/// Split an override segment into tokens. Used for both user patterns and
/// computed segments; `*` only ever appears in the former.
pub fn tokenize(text: &str) -> Result<Vec<PatternToken>, PatternError> {
    if text.is_empty() {
        return Err(PatternError::Empty);
    }
    let mut tokens = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let position = text.len() - rest.len();
        match token(rest) {
            Ok((_, PatternToken {
                count: CycleCount::Fixed(count),
                ..
            })) if count > MAX_CYCLE_COUNT => {
                return Err(PatternError::CountTooLarge {
                    pattern: text.to_string(),
                    count,
                    position,
                });
            }
            Ok((remaining, tok)) => {
                tokens.push(tok);
                rest = remaining;
            }
            Err(_) => {
                let letter = rest.chars().next().unwrap_or_default();
                return Err(match CycleKind::from_letter(letter) {
                    Some(kind) => PatternError::MissingCount {
                        pattern: text.to_string(),
                        letter: kind.letter(),
                        position,
                    },
                    None => PatternError::UnknownLetter {
                        pattern: text.to_string(),
                        letter,
                        position,
                    },
                });
            }
        }
    }
    Ok(tokens)
}

/// A user-supplied read override pattern, validated and upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReadPattern {
    text: String,
    tokens: Vec<PatternToken>,
}

impl ReadPattern {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[PatternToken] {
        &self.tokens
    }

    pub fn has_wildcard(&self) -> bool {
        self.tokens.iter().any(|t| t.count == CycleCount::Wildcard)
    }

    /// Sum of the cycles claimed by tokens with an explicit count.
    pub fn fixed_cycles(&self) -> usize {
        self.tokens
            .iter()
            .map(|t| match t.count {
                CycleCount::Fixed(n) => n,
                CycleCount::Wildcard => 0,
            })
            .fold(0, usize::saturating_add)
    }

    /// Expand the pattern for a read of `total_cycles`. A pattern without a
    /// wildcard is returned as written; otherwise each `*` becomes the cycles
    /// left after the fixed tokens, never less than zero.
    pub fn resolve(&self, total_cycles: usize) -> String {
        if !self.has_wildcard() {
            return self.text.clone();
        }
        let remaining = total_cycles.saturating_sub(self.fixed_cycles());
        self.text.replace('*', &remaining.to_string())
    }
}

impl FromStr for ReadPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim().to_ascii_uppercase();
        let tokens = tokenize(&text)?;
        Ok(ReadPattern { text, tokens })
    }
}

impl TryFrom<String> for ReadPattern {
    type Error = PatternError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ReadPattern> for String {
    fn from(p: ReadPattern) -> String {
        p.text
    }
}

impl fmt::Display for ReadPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::{prop_assert_eq, proptest};

    fn pattern(s: &str) -> ReadPattern {
        s.parse().unwrap()
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("U8Y*N3").unwrap(),
            vec![
                PatternToken {
                    kind: CycleKind::Umi,
                    count: CycleCount::Fixed(8)
                },
                PatternToken {
                    kind: CycleKind::Read,
                    count: CycleCount::Wildcard
                },
                PatternToken {
                    kind: CycleKind::Mask,
                    count: CycleCount::Fixed(3)
                },
            ]
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<ReadPattern>(), Err(PatternError::Empty));
        assert_eq!("   ".parse::<ReadPattern>(), Err(PatternError::Empty));
        assert_eq!(
            "N2X5".parse::<ReadPattern>(),
            Err(PatternError::UnknownLetter {
                pattern: "N2X5".to_string(),
                letter: 'X',
                position: 2,
            })
        );
        assert_eq!(
            "N2Y".parse::<ReadPattern>(),
            Err(PatternError::MissingCount {
                pattern: "N2Y".to_string(),
                letter: 'Y',
                position: 2,
            })
        );
        assert!("Y*;I8".parse::<ReadPattern>().is_err());
    }

    #[test]
    fn test_oversized_count() {
        assert_eq!(
            "Y18446744073709551615N1Y*".parse::<ReadPattern>(),
            Err(PatternError::CountTooLarge {
                pattern: "Y18446744073709551615N1Y*".to_string(),
                count: usize::MAX,
                position: 0,
            })
        );
        assert!(matches!(
            tokenize("N2Y99999999999999999999999"),
            Err(PatternError::CountTooLarge { count: usize::MAX, position: 2, .. })
        ));
        assert_eq!(pattern("Y1000").fixed_cycles(), MAX_CYCLE_COUNT);
    }

    #[test]
    fn test_resolve() {
        assert_eq!(pattern("N2Y*").resolve(151), "N2Y149");
        assert_eq!(pattern("Y*N2").resolve(151), "Y149N2");
        assert_eq!(pattern("U8Y*").resolve(151), "U8Y143");
        assert_eq!(pattern("N2Y*N3").resolve(151), "N2Y146N3");
        assert_eq!(pattern("y*").resolve(151), "Y151");
        assert_eq!(pattern("y100n51").resolve(151), "Y100N51");
        assert_eq!(pattern("N200Y*").resolve(151), "N200Y0");
    }

    proptest! {
        #[test]
        fn prop_wildcard_fills_read(lead in 0usize..20, trail in 0usize..20, total in 40usize..320) {
            let p: ReadPattern = format!("N{lead}Y*N{trail}").parse().unwrap();
            let resolved = p.resolve(total);
            let read: ReadPattern = resolved.parse().unwrap();
            prop_assert_eq!(read.fixed_cycles(), total);
        }
    }
}
