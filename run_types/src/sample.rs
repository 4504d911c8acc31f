use crate::override_cycles::{OverrideAssignment, PatternError, ReadPattern};
use crate::serde_helpers::{clamped_mismatches, index_cycles, optional_pattern, positive_lanes};
use index_seq::{IndexSeq, SeqError};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter};

/// Which of the two index reads.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
    AsRefStr, EnumIter,
)]
pub enum IndexRead {
    #[serde(rename = "i7")]
    #[strum(serialize = "i7")]
    I7,
    #[serde(rename = "i5")]
    #[strum(serialize = "i5")]
    I5,
}

/// Lanes a sample is loaded on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lanes {
    /// Every lane of the flowcell.
    Any,
    Lanes(Vec<usize>),
}

impl Lanes {
    /// Concrete lane numbers for a flowcell with `lane_count` lanes.
    pub fn resolve(&self, lane_count: usize) -> Vec<usize> {
        match self {
            Lanes::Any => (1..=lane_count).collect(),
            Lanes::Lanes(lanes) => lanes.clone(),
        }
    }
}

impl From<&[usize]> for Lanes {
    fn from(lanes: &[usize]) -> Self {
        if lanes.is_empty() {
            Lanes::Any
        } else {
            let mut lanes = lanes.to_vec();
            lanes.sort_unstable();
            lanes.dedup();
            Lanes::Lanes(lanes)
        }
    }
}

/// An index oligo assigned to a sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    #[serde(default)]
    pub name: String,
    pub sequence: IndexSeq,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub well_position: Option<String>,
}

impl Index {
    pub fn new(name: &str, sequence: &str) -> Result<Self, SeqError> {
        Ok(Index {
            name: name.to_string(),
            sequence: sequence.parse()?,
            well_position: None,
        })
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// A sample on the run, with its index assignment and demultiplexing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sample {
    pub id: String,
    pub sample_id: String,
    pub sample_name: String,
    pub test_id: String,
    pub project: String,
    pub description: String,
    pub index_kit_name: Option<String>,
    pub index1: Option<Index>,
    pub index2: Option<Index>,
    /// Empty means every lane of the flowcell.
    #[serde(deserialize_with = "positive_lanes")]
    pub lanes: Vec<usize>,
    #[serde(deserialize_with = "index_cycles")]
    pub index1_cycles: Option<usize>,
    #[serde(deserialize_with = "index_cycles")]
    pub index2_cycles: Option<usize>,
    #[serde(deserialize_with = "optional_pattern")]
    pub read1_override_pattern: Option<ReadPattern>,
    #[serde(deserialize_with = "optional_pattern")]
    pub read2_override_pattern: Option<ReadPattern>,
    pub index1_override_pattern: Option<String>,
    pub index2_override_pattern: Option<String>,
    pub override_cycles: Option<String>,
    #[serde(deserialize_with = "clamped_mismatches")]
    pub barcode_mismatches_index1: Option<u8>,
    #[serde(deserialize_with = "clamped_mismatches")]
    pub barcode_mismatches_index2: Option<u8>,
}

impl Sample {
    pub fn new(sample_id: &str) -> Self {
        Sample {
            id: sample_id.to_string(),
            sample_id: sample_id.to_string(),
            ..Default::default()
        }
    }

    pub fn with_index1(mut self, sequence: &str) -> Result<Self, SeqError> {
        self.index1 = Some(Index::new("", sequence)?);
        Ok(self)
    }

    pub fn with_index2(mut self, sequence: &str) -> Result<Self, SeqError> {
        self.index2 = Some(Index::new("", sequence)?);
        Ok(self)
    }

    pub fn with_lanes(mut self, lanes: impl IntoIterator<Item = usize>) -> Self {
        self.lanes = lanes.into_iter().filter(|&l| l > 0).collect();
        self
    }

    pub fn with_index_cycles(mut self, index1: Option<usize>, index2: Option<usize>) -> Self {
        self.index1_cycles = index1.map(|c| c.max(1));
        self.index2_cycles = index2.map(|c| c.max(1));
        self
    }

    pub fn with_read_patterns(
        mut self,
        read1: Option<&str>,
        read2: Option<&str>,
    ) -> Result<Self, PatternError> {
        self.read1_override_pattern = read1.map(str::parse::<ReadPattern>).transpose()?;
        self.read2_override_pattern = read2.map(str::parse::<ReadPattern>).transpose()?;
        Ok(self)
    }

    pub fn with_barcode_mismatches(mut self, index1: Option<u8>, index2: Option<u8>) -> Self {
        self.barcode_mismatches_index1 = index1.map(|m| m.min(3));
        self.barcode_mismatches_index2 = index2.map(|m| m.min(3));
        self
    }

    /// Name shown in messages: the sample id, else the sample name, else the internal id.
    pub fn display_name(&self) -> &str {
        [&self.sample_id, &self.sample_name, &self.id]
            .into_iter()
            .find(|s| !s.is_empty())
            .map_or("", String::as_str)
    }

    pub fn lane_spec(&self) -> Lanes {
        Lanes::from(self.lanes.as_slice())
    }

    /// A sample counts as indexed once it has an i7.
    pub fn has_index(&self) -> bool {
        self.index1.is_some()
    }

    pub fn index(&self, read: IndexRead) -> Option<&Index> {
        match read {
            IndexRead::I7 => self.index1.as_ref(),
            IndexRead::I5 => self.index2.as_ref(),
        }
    }

    pub fn index_seq(&self, read: IndexRead) -> Option<&IndexSeq> {
        self.index(read).map(|i| &i.sequence)
    }

    pub fn i7(&self) -> Option<&IndexSeq> {
        self.index_seq(IndexRead::I7)
    }

    pub fn i5(&self) -> Option<&IndexSeq> {
        self.index_seq(IndexRead::I5)
    }

    /// Explicit cycle override, else the assigned sequence length, else 0.
    pub fn effective_index_length(&self, read: IndexRead) -> usize {
        let explicit = match read {
            IndexRead::I7 => self.index1_cycles,
            IndexRead::I5 => self.index2_cycles,
        };
        explicit.unwrap_or_else(|| self.index(read).map_or(0, Index::len))
    }

    /// Set the i7 (and i5, when the pair has one) from a kit pair. Any
    /// previous i5 is dropped.
    pub fn assign_pair(&mut self, index1: Index, index2: Option<Index>) {
        self.index1 = Some(index1);
        self.index2 = index2;
    }

    pub fn assign_index(&mut self, read: IndexRead, index: Index) {
        match read {
            IndexRead::I7 => self.index1 = Some(index),
            IndexRead::I5 => self.index2 = Some(index),
        }
    }

    /// Remove both indexes and everything derived from them.
    pub fn clear_index(&mut self) {
        self.index1 = None;
        self.index2 = None;
        self.index_kit_name = None;
        self.apply_override_assignment(OverrideAssignment::Cleared);
    }

    /// Store a freshly computed override-cycles assignment on this sample.
    pub fn apply_override_assignment(&mut self, assignment: OverrideAssignment) {
        match assignment {
            OverrideAssignment::Cleared => {
                self.override_cycles = None;
                self.index1_override_pattern = None;
                self.index2_override_pattern = None;
            }
            OverrideAssignment::Computed {
                override_cycles,
                index1_pattern,
                index2_pattern,
            } => {
                self.override_cycles = Some(override_cycles);
                if index1_pattern.is_some() {
                    self.index1_override_pattern = index1_pattern;
                }
                if index2_pattern.is_some() {
                    self.index2_override_pattern = index2_pattern;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_effective_index_length() -> anyhow::Result<()> {
        let s = Sample::new("S1").with_index1("ACGTACGT")?;
        assert_eq!(s.effective_index_length(IndexRead::I7), 8);
        assert_eq!(s.effective_index_length(IndexRead::I5), 0);

        let s = s.with_index_cycles(Some(10), None);
        assert_eq!(s.effective_index_length(IndexRead::I7), 10);

        let s = Sample::new("S2").with_index_cycles(None, Some(0));
        assert_eq!(s.effective_index_length(IndexRead::I5), 1);
        Ok(())
    }

    #[test]
    fn test_lanes() {
        let all = Sample::new("S1").lane_spec();
        assert_eq!(all, Lanes::Any);
        assert_eq!(all.resolve(4), vec![1, 2, 3, 4]);

        let some = Sample::new("S2").with_lanes([3, 2, 3]).lane_spec();
        assert_eq!(some, Lanes::Lanes(vec![2, 3]));
        assert_eq!(some.resolve(8), vec![2, 3]);
    }

    #[test]
    fn test_display_name() {
        let mut s = Sample {
            id: "internal".to_string(),
            ..Default::default()
        };
        assert_eq!(s.display_name(), "internal");
        s.sample_name = "Liver".to_string();
        assert_eq!(s.display_name(), "Liver");
        s.sample_id = "S-01".to_string();
        assert_eq!(s.display_name(), "S-01");
    }

    #[test]
    fn test_deserialize_normalizes() -> anyhow::Result<()> {
        let s: Sample = serde_json::from_str(
            r#"{
                "sample_id": "S1",
                "index1": {"name": "D701", "sequence": "attactcg"},
                "lanes": [0, 2, -1, 3],
                "index1_cycles": -4,
                "read1_override_pattern": "n2y*",
                "read2_override_pattern": "",
                "barcode_mismatches_index1": 7,
                "barcode_mismatches_index2": -2
            }"#,
        )?;
        assert_eq!(s.i7().map(|s| s.as_str()), Some("ATTACTCG"));
        assert_eq!(s.lanes, vec![2, 3]);
        assert_eq!(s.index1_cycles, Some(1));
        assert_eq!(
            s.read1_override_pattern.as_ref().map(ReadPattern::as_str),
            Some("N2Y*")
        );
        assert_eq!(s.read2_override_pattern, None);
        assert_eq!(s.barcode_mismatches_index1, Some(3));
        assert_eq!(s.barcode_mismatches_index2, Some(0));
        Ok(())
    }

    #[test]
    fn test_deserialize_rejects_bad_input() {
        assert!(serde_json::from_str::<Sample>(
            r#"{"sample_id": "S1", "index1": {"sequence": "ACGX"}}"#
        )
        .is_err());
        assert!(serde_json::from_str::<Sample>(
            r#"{"sample_id": "S1", "read1_override_pattern": "Q5Y*"}"#
        )
        .is_err());
    }

    #[test]
    fn test_apply_assignment() {
        let mut s = Sample::new("S1");
        s.index1_override_pattern = Some("I8".to_string());
        s.index2_override_pattern = Some("I8".to_string());
        s.apply_override_assignment(OverrideAssignment::Computed {
            override_cycles: "Y151;I10;Y151".to_string(),
            index1_pattern: Some("I10".to_string()),
            index2_pattern: None,
        });
        assert_eq!(s.override_cycles.as_deref(), Some("Y151;I10;Y151"));
        assert_eq!(s.index1_override_pattern.as_deref(), Some("I10"));
        assert_eq!(s.index2_override_pattern.as_deref(), Some("I8"));

        s.apply_override_assignment(OverrideAssignment::Cleared);
        assert_eq!(s.override_cycles, None);
        assert_eq!(s.index1_override_pattern, None);
        assert_eq!(s.index2_override_pattern, None);
    }

    #[test]
    fn test_assign_and_clear() -> anyhow::Result<()> {
        let mut s = Sample::new("S1").with_index2("GGGGGGGG")?;
        s.assign_pair(Index::new("D701", "ATTACTCG")?, None);
        assert_eq!(s.i7().map(|i| i.as_str()), Some("ATTACTCG"));
        assert_eq!(s.index2, None);

        s.assign_index(IndexRead::I5, Index::new("D501", "tatagcct")?);
        assert_eq!(s.index(IndexRead::I5).map(|i| i.name.as_str()), Some("D501"));
        assert_eq!(s.i5().map(|i| i.as_str()), Some("TATAGCCT"));

        s.index_kit_name = Some("Kit".to_string());
        s.override_cycles = Some("Y151;I8N2;I8N2;Y151".to_string());
        s.index1_override_pattern = Some("I8N2".to_string());
        s.clear_index();
        assert!(!s.has_index());
        assert_eq!(s.index2, None);
        assert_eq!(s.index_kit_name, None);
        assert_eq!(s.override_cycles, None);
        assert_eq!(s.index1_override_pattern, None);
        Ok(())
    }
}
