use crate::index_kit::{IndexKit, IndexSlot, KitError};
use crate::override_cycles::recompute_override_cycles;
use crate::sample::{IndexRead, Sample};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Cycles configured for each of the four reads of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCycles {
    #[serde(alias = "read1_cycles")]
    pub read1: usize,
    #[serde(alias = "read2_cycles")]
    pub read2: usize,
    #[serde(alias = "index1_cycles")]
    pub index1: usize,
    #[serde(alias = "index2_cycles")]
    pub index2: usize,
}

/// Used when the catalog has no defaults for a reagent kit.
pub const FALLBACK_CYCLES: RunCycles = RunCycles {
    read1: 151,
    read2: 151,
    index1: 10,
    index2: 10,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CycleError {
    #[error("Total cycles ({total}) exceeds reagent kit capacity ({capacity})")]
    ExceedsReagentKit { total: usize, capacity: usize },
    #[error("Read 1 cycles must be positive")]
    NoRead1,
}

impl RunCycles {
    pub fn total(&self) -> usize {
        self.read1 + self.read2 + self.index1 + self.index2
    }

    /// Shorten both reads evenly so the plan fits in `reagent_kit_cycles`,
    /// keeping the index reads. A plan that already fits is unchanged.
    pub fn fit_to(self, reagent_kit_cycles: usize) -> RunCycles {
        if self.total() <= reagent_kit_cycles {
            return self;
        }
        let per_read = reagent_kit_cycles.saturating_sub(self.index1 + self.index2) / 2;
        RunCycles {
            read1: self.read1.min(per_read),
            read2: self.read2.min(per_read),
            ..self
        }
    }

    /// Check the plan against the capacity of a reagent kit.
    pub fn validate(&self, reagent_kit_cycles: usize) -> Vec<CycleError> {
        let mut errors = Vec::new();
        if self.total() > reagent_kit_cycles {
            errors.push(CycleError::ExceedsReagentKit {
                total: self.total(),
                capacity: reagent_kit_cycles,
            });
        }
        if self.read1 == 0 {
            errors.push(CycleError::NoRead1);
        }
        errors
    }
}

fn default_mismatches() -> u8 {
    1
}

/// A planned sequencing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencingRun {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub run_name: String,
    #[serde(default)]
    pub run_description: String,
    #[serde(default)]
    pub created_by: String,
    /// ISO 8601 creation timestamp; the date part goes into v1 sheets.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Instrument name as keyed in the catalog.
    pub instrument: String,
    #[serde(default)]
    pub flowcell: String,
    #[serde(default)]
    pub reagent_kit_cycles: Option<usize>,
    #[serde(default)]
    pub run_cycles: Option<RunCycles>,
    #[serde(default = "default_mismatches")]
    pub barcode_mismatches_index1: u8,
    #[serde(default = "default_mismatches")]
    pub barcode_mismatches_index2: u8,
    #[serde(default)]
    pub samples: Vec<Sample>,
    #[serde(default)]
    pub validation_approved: bool,
}

impl SequencingRun {
    pub fn new(instrument: &str, flowcell: &str) -> Self {
        SequencingRun {
            id: String::new(),
            run_name: String::new(),
            run_description: String::new(),
            created_by: String::new(),
            created_at: None,
            instrument: instrument.to_string(),
            flowcell: flowcell.to_string(),
            reagent_kit_cycles: None,
            run_cycles: None,
            barcode_mismatches_index1: default_mismatches(),
            barcode_mismatches_index2: default_mismatches(),
            samples: Vec::new(),
            validation_approved: false,
        }
    }

    /// Recompute and store every sample's override fields. Does nothing when
    /// the run has no cycle plan yet.
    pub fn update_override_cycles(&mut self) {
        let Some(run_cycles) = self.run_cycles else {
            return;
        };
        for sample in &mut self.samples {
            let assignment = recompute_override_cycles(sample, &run_cycles);
            sample.apply_override_assignment(assignment);
        }
    }

    /// Assign kit entries `names` to consecutive samples, starting at the
    /// sample whose `id` or `sample_id` is `start`. Names beyond the last
    /// sample are ignored. Override fields of every touched sample are
    /// recomputed when the run has a cycle plan. Returns the number of
    /// samples assigned.
    pub fn assign_indexes<S: AsRef<str>>(
        &mut self,
        kit: &IndexKit,
        start: &str,
        slot: IndexSlot,
        names: &[S],
    ) -> Result<usize, KitError> {
        let first = self
            .samples
            .iter()
            .position(|s| s.id == start || s.sample_id == start)
            .ok_or_else(|| KitError::UnknownSample(start.to_string()))?;
        let run_cycles = self.run_cycles;
        let mut assigned = 0;
        for (sample, name) in self.samples[first..].iter_mut().zip(names) {
            kit.assign(sample, slot, name.as_ref())?;
            if let Some(cycles) = &run_cycles {
                if sample.has_index() {
                    let assignment = recompute_override_cycles(sample, cycles);
                    sample.apply_override_assignment(assignment);
                }
            }
            assigned += 1;
        }
        Ok(assigned)
    }

    /// Run-wide barcode mismatch allowance for one index read, honoring a
    /// sample's own setting when present.
    pub fn mismatches_for(&self, sample: &Sample, read: IndexRead) -> u8 {
        match read {
            IndexRead::I7 => sample
                .barcode_mismatches_index1
                .unwrap_or(self.barcode_mismatches_index1),
            IndexRead::I5 => sample
                .barcode_mismatches_index2
                .unwrap_or(self.barcode_mismatches_index2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_validate_cycles() {
        let ok = RunCycles {
            read1: 151,
            read2: 151,
            index1: 10,
            index2: 10,
        };
        assert!(ok.validate(322).is_empty());
        assert_eq!(
            ok.validate(300),
            vec![CycleError::ExceedsReagentKit {
                total: 322,
                capacity: 300
            }]
        );
        assert_eq!(ok.fit_to(322), ok);
        assert_eq!(
            ok.fit_to(300),
            RunCycles {
                read1: 140,
                read2: 140,
                ..ok
            }
        );
        assert_eq!(ok.fit_to(15).total(), 20);
        let no_read1 = RunCycles { read1: 0, ..ok };
        assert_eq!(no_read1.validate(400), vec![CycleError::NoRead1]);
        assert_eq!(
            CycleError::NoRead1.to_string(),
            "Read 1 cycles must be positive"
        );
    }

    #[test]
    fn test_deserialize_run() -> anyhow::Result<()> {
        let run: SequencingRun = serde_json::from_str(
            r#"{
                "instrument": "NovaSeq X Series",
                "flowcell": "10B",
                "run_cycles": {"read1_cycles": 151, "read2_cycles": 151, "index1_cycles": 10, "index2_cycles": 10},
                "barcode_mismatches_index2": 0,
                "samples": [{"sample_id": "S1", "barcode_mismatches_index1": 2}]
            }"#,
        )?;
        assert_eq!(run.run_cycles.map(|c| c.total()), Some(322));
        assert_eq!(run.barcode_mismatches_index1, 1);
        assert_eq!(run.mismatches_for(&run.samples[0], IndexRead::I7), 2);
        assert_eq!(run.mismatches_for(&run.samples[0], IndexRead::I5), 0);
        Ok(())
    }

    #[test]
    fn test_assign_indexes() -> anyhow::Result<()> {
        let mut kit = IndexKit::new("Kit", crate::IndexMode::Combinatorial);
        kit.i7_indexes = vec![
            crate::Index::new("A", "ATTACTCG")?,
            crate::Index::new("B", "TCCGGAGA")?,
            crate::Index::new("C", "CGCTCATT")?,
        ];
        let mut run = SequencingRun::new("NovaSeq X Series", "10B");
        run.run_cycles = Some(FALLBACK_CYCLES);
        run.samples = vec![Sample::new("S1"), Sample::new("S2"), Sample::new("S3")];

        let n = run.assign_indexes(&kit, "S2", IndexSlot::I7, &["A", "B", "C"])?;
        assert_eq!(n, 2);
        assert_eq!(run.samples[0].index1, None);
        assert_eq!(run.samples[1].i7().map(|s| s.as_str()), Some("ATTACTCG"));
        assert_eq!(run.samples[2].i7().map(|s| s.as_str()), Some("TCCGGAGA"));
        assert_eq!(
            run.samples[2].override_cycles.as_deref(),
            Some("Y151;I8N2;N10;Y151")
        );
        assert_eq!(run.samples[2].index_kit_name.as_deref(), Some("Kit"));

        assert_eq!(
            run.assign_indexes(&kit, "S9", IndexSlot::I7, &["A"]),
            Err(KitError::UnknownSample("S9".to_string()))
        );
        assert!(run
            .assign_indexes(&kit, "S1", IndexSlot::I7, &["Z"])
            .is_err());
        Ok(())
    }

    #[test]
    fn test_update_override_cycles() -> anyhow::Result<()> {
        let mut run = SequencingRun::new("NovaSeq X Series", "10B");
        run.samples = vec![
            Sample::new("S1").with_index1("ACGTACGT")?,
            Sample::new("S2"),
        ];
        run.samples[1].override_cycles = Some("stale".to_string());

        run.update_override_cycles();
        assert_eq!(run.samples[1].override_cycles.as_deref(), Some("stale"));

        run.run_cycles = Some(FALLBACK_CYCLES);
        run.update_override_cycles();
        assert_eq!(
            run.samples[0].override_cycles.as_deref(),
            Some("Y151;I8N2;N10;Y151")
        );
        assert_eq!(run.samples[0].index2_override_pattern.as_deref(), Some("N10"));
        assert_eq!(run.samples[1].override_cycles, None);
        Ok(())
    }
}
