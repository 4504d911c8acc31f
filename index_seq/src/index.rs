//! Stack-allocated container for an i7/i5 index sequence.

use crate::array::{ArrayContent, ByteArray};
use crate::Base;

const UPPER_ACGTN: &[u8; 5] = b"ACGTN";

/// Longest index sequence accepted, in bases.
pub const MAX_INDEX_LEN: usize = 32;

#[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq)]
pub struct IndexSeqContents;

impl ArrayContent for IndexSeqContents {
    /// Index sequences are stored upper-cased.
    fn normalize(byte: u8) -> u8 {
        byte.to_ascii_uppercase()
    }

    fn is_valid(byte: u8) -> bool {
        UPPER_ACGTN.contains(&byte)
    }

    fn expected_contents() -> &'static str {
        "An [ACGTN]* string"
    }
}

/// An index sequence guaranteed to contain only upper-case "ACGTN",
/// up to [`MAX_INDEX_LEN`] bases long.
pub type IndexSeq = ByteArray<IndexSeqContents, MAX_INDEX_LEN>;

impl IndexSeq {
    /// A synonym for as_bytes().
    pub fn seq(&self) -> &[u8] {
        self.as_bytes()
    }

    /// Return the reverse-complement sequence.
    pub fn revcomp(&self) -> Self {
        IndexSeq::from_iter_unchecked(
            self.iter()
                .rev()
                .map(|&c| Base::try_from(c).map_or(b'N', |b| b.complement().as_byte())),
        )
    }

    /// Hamming distance over the overlap with `other`.
    pub fn distance(&self, other: &IndexSeq) -> usize {
        crate::hamming_distance(self, other)
    }

    /// Number of consecutive copies of `base` at the start of the sequence,
    /// looking at no more than `window` positions.
    pub fn leading_count(&self, base: Base, window: usize) -> usize {
        self.iter()
            .take(window)
            .take_while(|&&c| c == base.as_byte())
            .count()
    }
}
