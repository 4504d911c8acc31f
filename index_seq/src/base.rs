use crate::SeqError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single nucleotide as read by the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Base {
    A,
    C,
    G,
    T,
    N,
}

impl Base {
    pub const ACGT: [Base; 4] = [Base::A, Base::C, Base::G, Base::T];

    pub fn as_byte(self) -> u8 {
        match self {
            Base::A => b'A',
            Base::C => b'C',
            Base::G => b'G',
            Base::T => b'T',
            Base::N => b'N',
        }
    }

    pub fn complement(self) -> Base {
        match self {
            Base::A => Base::T,
            Base::C => Base::G,
            Base::G => Base::C,
            Base::T => Base::A,
            Base::N => Base::N,
        }
    }
}

impl TryFrom<u8> for Base {
    type Error = SeqError;

    fn try_from(b: u8) -> Result<Self, Self::Error> {
        Ok(match b.to_ascii_uppercase() {
            b'A' => Base::A,
            b'C' => Base::C,
            b'G' => Base::G,
            b'T' => Base::T,
            b'N' => Base::N,
            _ => return Err(SeqError::InvalidBase(char::from(b))),
        })
    }
}

impl TryFrom<char> for Base {
    type Error = SeqError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        u8::try_from(c)
            .map_err(|_| SeqError::InvalidBase(c))
            .and_then(Base::try_from)
    }
}

impl TryFrom<String> for Base {
    type Error = SeqError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Base::try_from(c),
            (Some(c), Some(_)) => Err(SeqError::InvalidBase(c)),
            (None, _) => Err(SeqError::InvalidBase(' ')),
        }
    }
}

impl From<Base> for String {
    fn from(b: Base) -> String {
        b.to_string()
    }
}

impl fmt::Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", char::from(self.as_byte()))
    }
}
