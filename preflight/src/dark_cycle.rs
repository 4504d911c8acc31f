//! Two-color chemistries cannot find the start of an index read that begins
//! with two cycles of the dark base.

use index_seq::{Base, IndexSeq};
use run_types::{IndexRead, InstrumentChannelConfig, Sample};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Only the first two cycles matter for index-start detection.
const DARK_WINDOW: usize = 2;

/// Leading dark-base count for one index of one sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DarkCycleFinding {
    pub sample_id: String,
    pub sample_name: String,
    pub index_type: IndexRead,
    /// As stored on the sample.
    pub sequence: String,
    /// As the instrument reads it; differs from `sequence` for
    /// reverse-complement i5.
    pub read_sequence: String,
    pub dark_base: Base,
    /// Consecutive dark bases from the first cycle: 0, 1 or 2.
    pub leading_dark: usize,
}

impl DarkCycleFinding {
    pub fn is_error(&self) -> bool {
        self.leading_dark >= DARK_WINDOW
    }
}

impl fmt::Display for DarkCycleFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} index ({}) starts with {} dark base(s) ({})",
            self.sample_name,
            self.index_type,
            self.read_sequence,
            self.leading_dark,
            self.dark_base.to_string().repeat(self.leading_dark),
        )
    }
}

fn finding(
    sample: &Sample,
    index_type: IndexRead,
    sequence: &IndexSeq,
    read_sequence: IndexSeq,
    dark_base: Base,
) -> DarkCycleFinding {
    DarkCycleFinding {
        sample_id: sample.id.clone(),
        sample_name: sample.display_name().to_string(),
        index_type,
        sequence: sequence.to_string(),
        read_sequence: read_sequence.to_string(),
        dark_base,
        leading_dark: read_sequence.leading_count(dark_base, DARK_WINDOW),
    }
}

/// One finding per index present on each sample, in sample order. Only
/// findings with [`DarkCycleFinding::is_error`] count against the run.
pub fn check_dark_cycles(
    samples: &[Sample],
    channel: &InstrumentChannelConfig,
) -> Vec<DarkCycleFinding> {
    let dark = channel.dark_base;
    let mut findings = Vec::new();
    for sample in samples {
        if let Some(i7) = sample.i7() {
            findings.push(finding(sample, IndexRead::I7, i7, *i7, dark));
        }
        if let Some(i5) = sample.i5() {
            let read = channel.i5_orientation.as_read(i5);
            findings.push(finding(sample, IndexRead::I5, i5, read, dark));
        }
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use pretty_assertions::assert_eq;
    use run_types::I5Orientation;

    #[test]
    fn test_leading_dark_counts() -> Result<()> {
        let samples = vec![
            Sample::new("two").with_index1("GGACTGAC")?,
            Sample::new("one").with_index1("GACTGACT")?,
            Sample::new("none").with_index1("ACTGACTG")?,
            Sample::new("unindexed"),
        ];
        let channel = InstrumentChannelConfig::xleap(I5Orientation::Forward);
        let findings = check_dark_cycles(&samples, &channel);
        let counts: Vec<_> = findings
            .iter()
            .map(|f| (f.sample_name.as_str(), f.leading_dark, f.is_error()))
            .collect();
        assert_eq!(
            counts,
            vec![("two", 2, true), ("one", 1, false), ("none", 0, false)]
        );
        assert_eq!(
            findings[0].to_string(),
            "two: i7 index (GGACTGAC) starts with 2 dark base(s) (GG)"
        );
        Ok(())
    }

    #[test]
    fn test_i5_read_orientation() -> Result<()> {
        let samples = vec![Sample::new("S1")
            .with_index1("ACTGACTG")?
            .with_index2("ACTTAGCC")?];

        let forward = InstrumentChannelConfig::xleap(I5Orientation::Forward);
        let f = check_dark_cycles(&samples, &forward);
        assert_eq!(f[1].index_type, IndexRead::I5);
        assert_eq!(f[1].leading_dark, 0);
        assert_eq!(f[1].read_sequence, "ACTTAGCC");

        let rc = InstrumentChannelConfig::xleap(I5Orientation::ReverseComplement);
        let f = check_dark_cycles(&samples, &rc);
        assert_eq!(f[1].sequence, "ACTTAGCC");
        assert_eq!(f[1].read_sequence, "GGCTAAGT");
        assert_eq!(f[1].leading_dark, 2);
        assert!(f[1].is_error());
        Ok(())
    }
}
