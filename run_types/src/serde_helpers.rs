//! Deserialization helpers that normalize loosely-typed sample fields.

use crate::override_cycles::ReadPattern;
use serde::de::{self, Deserialize, Deserializer};

/// Barcode mismatches outside 0..=3 are clamped into range.
pub(crate) fn clamped_mismatches<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<i64>::deserialize(deserializer)?.map(|v| v.clamp(0, 3) as u8))
}

/// Explicit index cycle overrides are at least 1.
pub(crate) fn index_cycles<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<i64>::deserialize(deserializer)?.map(|v| v.max(1) as usize))
}

/// Only positive lane numbers are kept.
pub(crate) fn positive_lanes<'de, D>(deserializer: D) -> Result<Vec<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<i64>>::deserialize(deserializer)?
        .unwrap_or_default()
        .into_iter()
        .filter(|&l| l > 0)
        .map(|l| l as usize)
        .collect())
}

/// An absent or blank pattern means "read every cycle".
pub(crate) fn optional_pattern<'de, D>(deserializer: D) -> Result<Option<ReadPattern>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(s) if !s.trim().is_empty() => s.parse().map(Some).map_err(de::Error::custom),
        _ => Ok(None),
    }
}

/// Kit versions are written as text or as a bare number.
pub(crate) fn version_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Version {
        Text(String),
        Int(u64),
        Float(f64),
    }
    Ok(match Version::deserialize(deserializer)? {
        Version::Text(s) => s.trim().to_string(),
        Version::Int(n) => n.to_string(),
        Version::Float(f) => f.to_string(),
    })
}
