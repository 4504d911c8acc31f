use crate::SeqError;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::Index;
use std::str::FromStr;

/// Alphabet rules for the contents of a [`ByteArray`].
pub trait ArrayContent {
    /// Map an input byte into its stored form before validation.
    fn normalize(byte: u8) -> u8 {
        byte
    }

    /// Whether `byte` is allowed in the array.
    fn is_valid(byte: u8) -> bool;

    /// Human readable description of the allowed contents.
    fn expected_contents() -> &'static str;
}

/// Fixed-capacity container for a short validated sequence.
/// The capacity is `N` and the contents are checked by `T`.
#[derive(Clone, Copy, PartialOrd, Ord, Eq)]
pub struct ByteArray<T, const N: usize>
where
    T: ArrayContent,
{
    bytes: [u8; N],
    length: u8,
    phantom: PhantomData<T>,
}

impl<T, const N: usize> ByteArray<T, N>
where
    T: ArrayContent,
{
    pub fn new() -> Self {
        ByteArray {
            length: 0,
            bytes: [0; N],
            phantom: PhantomData,
        }
    }

    /// Build an array from `src`, normalizing each byte and rejecting bytes
    /// outside the alphabet or inputs longer than `N`.
    pub fn from_bytes(src: &[u8]) -> Result<Self, SeqError> {
        if src.len() > N {
            return Err(SeqError::TooLong {
                seq: String::from_utf8_lossy(src).into_owned(),
                len: src.len(),
                capacity: N,
            });
        }
        let mut arr = Self::new();
        for (i, &b) in src.iter().enumerate() {
            let b = T::normalize(b);
            if !T::is_valid(b) {
                return Err(SeqError::InvalidCharacter {
                    seq: String::from_utf8_lossy(src).into_owned(),
                    character: char::from(src[i]),
                    position: i,
                    expected: T::expected_contents(),
                });
            }
            arr.bytes[i] = b;
        }
        arr.length = src.len() as u8;
        Ok(arr)
    }

    /// Caller needs to ensure that the bytes are valid and fit.
    pub(crate) fn from_iter_unchecked<C, D>(src: D) -> Self
    where
        C: Borrow<u8>,
        D: IntoIterator<Item = C>,
    {
        let mut arr = Self::new();
        for (l, r) in arr.bytes.iter_mut().zip(src) {
            *l = *r.borrow();
            arr.length += 1;
        }
        arr
    }

    /// Returns a byte slice of the contents.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[0..self.length as usize]
    }

    /// Returns a str of the contents.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(self.as_bytes()).unwrap()
    }

    pub fn len(&self) -> usize {
        self.length as usize
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, u8> {
        self.as_bytes().iter()
    }
}

impl<T, const N: usize> Default for ByteArray<T, N>
where
    T: ArrayContent,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> FromStr for ByteArray<T, N>
where
    T: ArrayContent,
{
    type Err = SeqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(s.trim().as_bytes())
    }
}

impl<T, const N: usize> fmt::Display for ByteArray<T, N>
where
    T: ArrayContent,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<T, const N: usize> fmt::Debug for ByteArray<T, N>
where
    T: ArrayContent,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self, f)
    }
}

impl<T, const N: usize> Index<usize> for ByteArray<T, N>
where
    T: ArrayContent,
{
    type Output = u8;

    fn index(&self, index: usize) -> &Self::Output {
        assert!(index < self.length as usize, "index out of bounds");
        &self.bytes[index]
    }
}

impl<T, const N: usize> AsRef<[u8]> for ByteArray<T, N>
where
    T: ArrayContent,
{
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl<T, const N: usize> From<ByteArray<T, N>> for String
where
    T: ArrayContent,
{
    fn from(v: ByteArray<T, N>) -> String {
        String::from(v.as_str())
    }
}

impl<T, const N: usize> Hash for ByteArray<T, N>
where
    T: ArrayContent,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl<T, const N: usize> PartialEq for ByteArray<T, N>
where
    T: ArrayContent,
{
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<T, const N: usize> Serialize for ByteArray<T, N>
where
    T: ArrayContent,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de, T, const N: usize> Deserialize<'de> for ByteArray<T, N>
where
    T: ArrayContent,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(ByteArrayVisitor {
            phantom_t: PhantomData,
        })
    }
}

struct ByteArrayVisitor<T, const N: usize> {
    phantom_t: PhantomData<[T; N]>,
}

impl<T, const N: usize> Visitor<'_> for ByteArrayVisitor<T, N>
where
    T: ArrayContent,
{
    type Value = ByteArray<T, N>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(T::expected_contents())
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        value.parse().map_err(E::custom)
    }
}
