//! Index adapter kits and assigning their indexes to samples.

use crate::override_cycles::ReadPattern;
use crate::sample::{Index, IndexRead, Sample};
use crate::serde_helpers::{index_cycles, optional_pattern, version_string};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;

/// How a kit's indexes combine into sample barcodes.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IndexMode {
    /// Fixed i7/i5 pairs.
    #[default]
    UniqueDual,
    /// Any i7 with any i5.
    Combinatorial,
    /// i7 only.
    Single,
}

/// Which part of a kit is being assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum IndexSlot {
    Pair,
    I7,
    I5,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KitError {
    #[error("index kit '{kit}' has no {slot} named '{name}'")]
    UnknownIndex {
        kit: String,
        slot: IndexSlot,
        name: String,
    },
    #[error("no sample '{0}' on the run")]
    UnknownSample(String),
}

/// A pre-paired i7/i5 combination from a unique-dual kit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexPair {
    pub name: String,
    pub index1: Index,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index2: Option<Index>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub well_position: Option<String>,
}

fn default_version() -> String {
    "1.0".to_string()
}

/// An index adapter kit. Unique-dual kits list `index_pairs`; combinatorial
/// and single kits list `i7_indexes` (and `i5_indexes`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexKit {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_version", deserialize_with = "version_string")]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub index_mode: IndexMode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub index_pairs: Vec<IndexPair>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub i7_indexes: Vec<Index>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub i5_indexes: Vec<Index>,
    #[serde(default, deserialize_with = "index_cycles")]
    pub default_index1_cycles: Option<usize>,
    #[serde(default, deserialize_with = "index_cycles")]
    pub default_index2_cycles: Option<usize>,
    #[serde(default, deserialize_with = "optional_pattern")]
    pub default_read1_override: Option<ReadPattern>,
    #[serde(default, deserialize_with = "optional_pattern")]
    pub default_read2_override: Option<ReadPattern>,
}

impl IndexKit {
    pub fn new(name: &str, index_mode: IndexMode) -> Self {
        IndexKit {
            name: name.to_string(),
            version: default_version(),
            description: String::new(),
            index_mode,
            index_pairs: Vec::new(),
            i7_indexes: Vec::new(),
            i5_indexes: Vec::new(),
            default_index1_cycles: None,
            default_index2_cycles: None,
            default_read1_override: None,
            default_read2_override: None,
        }
    }

    pub fn pair(&self, name: &str) -> Option<&IndexPair> {
        self.index_pairs.iter().find(|p| p.name == name)
    }

    /// An individually listed index of a combinatorial or single kit.
    pub fn index(&self, read: IndexRead, name: &str) -> Option<&Index> {
        let indexes = match read {
            IndexRead::I7 => &self.i7_indexes,
            IndexRead::I5 => &self.i5_indexes,
        };
        indexes.iter().find(|i| i.name == name)
    }

    /// Number of assignable entries: pairs, or i7 plus i5 indexes.
    pub fn len(&self) -> usize {
        self.index_pairs.len() + self.i7_indexes.len() + self.i5_indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy the kit's cycle and read-pattern defaults onto `sample` and
    /// record the kit name. Unset defaults leave the sample alone.
    pub fn apply_defaults(&self, sample: &mut Sample) {
        if self.default_index1_cycles.is_some() {
            sample.index1_cycles = self.default_index1_cycles;
        }
        if self.default_index2_cycles.is_some() {
            sample.index2_cycles = self.default_index2_cycles;
        }
        if self.default_read1_override.is_some() {
            sample.read1_override_pattern = self.default_read1_override.clone();
        }
        if self.default_read2_override.is_some() {
            sample.read2_override_pattern = self.default_read2_override.clone();
        }
        sample.index_kit_name = Some(self.name.clone());
    }

    /// Assign the named pair or index to `sample`, then apply kit defaults.
    pub fn assign(&self, sample: &mut Sample, slot: IndexSlot, name: &str) -> Result<(), KitError> {
        let unknown = || KitError::UnknownIndex {
            kit: self.name.clone(),
            slot,
            name: name.to_string(),
        };
        match slot {
            IndexSlot::Pair => {
                let pair = self.pair(name).ok_or_else(unknown)?;
                sample.assign_pair(pair.index1.clone(), pair.index2.clone());
            }
            IndexSlot::I7 | IndexSlot::I5 => {
                let read = if slot == IndexSlot::I7 {
                    IndexRead::I7
                } else {
                    IndexRead::I5
                };
                let index = self.index(read, name).ok_or_else(unknown)?;
                sample.assign_index(read, index.clone());
            }
        }
        self.apply_defaults(sample);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use pretty_assertions::assert_eq;

    fn udi_kit() -> Result<IndexKit> {
        let mut kit = IndexKit::new("UDI Set A", IndexMode::UniqueDual);
        kit.index_pairs = vec![
            IndexPair {
                name: "UDI0001".to_string(),
                index1: Index::new("i7-001", "ATTACTCG")?,
                index2: Some(Index::new("i5-001", "TATAGCCT")?),
                well_position: Some("A01".to_string()),
            },
            IndexPair {
                name: "UDI0002".to_string(),
                index1: Index::new("i7-002", "TCCGGAGA")?,
                index2: None,
                well_position: None,
            },
        ];
        kit.default_index1_cycles = Some(10);
        kit.default_read1_override = Some("U8Y*".parse()?);
        Ok(kit)
    }

    #[test]
    fn test_assign_pair() -> Result<()> {
        let kit = udi_kit()?;
        let mut sample = Sample::new("S1");
        sample.read2_override_pattern = Some("N2Y*".parse()?);

        kit.assign(&mut sample, IndexSlot::Pair, "UDI0001")?;
        assert_eq!(sample.i7().map(|s| s.as_str()), Some("ATTACTCG"));
        assert_eq!(sample.i5().map(|s| s.as_str()), Some("TATAGCCT"));
        assert_eq!(sample.index_kit_name.as_deref(), Some("UDI Set A"));
        assert_eq!(sample.index1_cycles, Some(10));
        assert_eq!(sample.index2_cycles, None);
        assert_eq!(
            sample.read1_override_pattern.as_ref().map(ReadPattern::as_str),
            Some("U8Y*")
        );
        assert_eq!(
            sample.read2_override_pattern.as_ref().map(ReadPattern::as_str),
            Some("N2Y*")
        );

        kit.assign(&mut sample, IndexSlot::Pair, "UDI0002")?;
        assert_eq!(sample.i5(), None);
        Ok(())
    }

    #[test]
    fn test_assign_combinatorial() -> Result<()> {
        let mut kit = IndexKit::new("Combo", IndexMode::Combinatorial);
        kit.i7_indexes = vec![Index::new("A", "ATTACTCG")?];
        kit.i5_indexes = vec![Index::new("01", "TATAGCCT")?];
        assert_eq!(kit.len(), 2);

        let mut sample = Sample::new("S1");
        kit.assign(&mut sample, IndexSlot::I5, "01")?;
        kit.assign(&mut sample, IndexSlot::I7, "A")?;
        assert_eq!(sample.index(IndexRead::I7).map(|i| i.name.as_str()), Some("A"));
        assert_eq!(sample.index(IndexRead::I5).map(|i| i.name.as_str()), Some("01"));

        let err = kit.assign(&mut sample, IndexSlot::I7, "01").unwrap_err();
        assert_eq!(err.to_string(), "index kit 'Combo' has no i7 named '01'");
        assert!(kit.assign(&mut sample, IndexSlot::Pair, "A").is_err());
        Ok(())
    }

    #[test]
    fn test_deserialize_kit() -> Result<()> {
        let kit: IndexKit = serde_json::from_str(
            r#"{
                "name": "Kit",
                "version": 2,
                "index_mode": "single",
                "i7_indexes": [{"name": "D701", "sequence": "attactcg"}],
                "default_index1_cycles": 0,
                "default_read2_override": ""
            }"#,
        )?;
        assert_eq!(kit.version, "2");
        assert_eq!(kit.index_mode, IndexMode::Single);
        assert_eq!(kit.default_index1_cycles, Some(1));
        assert_eq!(kit.default_read2_override, None);
        assert_eq!(
            kit.index(IndexRead::I7, "D701").map(|i| i.sequence.as_str()),
            Some("ATTACTCG")
        );
        assert_eq!("unique_dual".parse::<IndexMode>()?, IndexMode::UniqueDual);
        assert_eq!("i5".parse::<IndexSlot>()?, IndexSlot::I5);
        Ok(())
    }
}
