// Copyright (c) 2018 10x Genomics, Inc. All rights reserved.

//! Index sequence primitives: a validated stack-allocated sequence type,
//! the nucleotide alphabet, reverse-complement and Hamming distance.
#![deny(future_incompatible, nonstandard_style, rust_2018_idioms)]

mod array;
mod base;
mod error;
mod index;

pub use array::{ArrayContent, ByteArray};
pub use base::Base;
pub use error::SeqError;
pub use index::{IndexSeq, IndexSeqContents, MAX_INDEX_LEN};

/// Reverse-complement a sequence. A/T and C/G are swapped without changing case;
/// any other character is kept as is.
pub fn reverse_complement(seq: &str) -> String {
    seq.chars()
        .rev()
        .map(|c| match c {
            'A' => 'T',
            'T' => 'A',
            'C' => 'G',
            'G' => 'C',
            'a' => 't',
            't' => 'a',
            'c' => 'g',
            'g' => 'c',
            other => other,
        })
        .collect()
}

/// Number of mismatching positions over the overlap of `a` and `b`.
/// The longer sequence is never padded; trailing bases beyond the shorter
/// length are not compared.
pub fn hamming_distance(a: impl AsRef<[u8]>, b: impl AsRef<[u8]>) -> usize {
    a.as_ref()
        .iter()
        .zip(b.as_ref())
        .filter(|(x, y)| x != y)
        .count()
}
