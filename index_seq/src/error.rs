use thiserror::Error;

/// Errors raised while constructing a sequence from untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeqError {
    #[error("invalid character '{character}' at position {position} in '{seq}': expected {expected}")]
    InvalidCharacter {
        seq: String,
        character: char,
        position: usize,
        expected: &'static str,
    },

    #[error("sequence '{seq}' has length {len}, which exceeds the capacity of {capacity}")]
    TooLong {
        seq: String,
        len: usize,
        capacity: usize,
    },

    #[error("'{0}' is not a nucleotide; expected one of A, C, G, T or N")]
    InvalidBase(char),
}
