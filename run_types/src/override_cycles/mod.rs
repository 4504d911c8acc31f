//! Override-cycles strings tell the base caller how to treat every cycle of
//! the run, e.g. `Y151;I8N2;I8N2;Y151`: read 1, index 1, index 2, read 2.
//!
//! Strings are always computed in forward i5 orientation. Instruments that
//! read i5 as the reverse complement get the Index2 segment flipped at export
//! time by [`adjust_for_orientation`].

mod pattern;

pub use pattern::{
    tokenize, CycleCount, CycleKind, PatternError, PatternToken, ReadPattern, MAX_CYCLE_COUNT,
};

use crate::instrument::I5Orientation;
use crate::run::RunCycles;
use crate::sample::{IndexRead, Sample};
use itertools::Itertools;

/// Segment for one index read, given the effective index length and the
/// cycles configured for that read.
pub fn index_segment(index_len: usize, cycles: usize) -> String {
    if index_len == 0 {
        format!("N{cycles}")
    } else if index_len == cycles {
        format!("I{index_len}")
    } else if index_len < cycles {
        format!("I{index_len}N{}", cycles - index_len)
    } else {
        format!("I{cycles}")
    }
}

/// Segment for a sequencing read of `cycles`, shaped by an optional pattern.
pub fn read_segment(cycles: usize, pattern: Option<&ReadPattern>) -> String {
    match pattern {
        None => format!("Y{cycles}"),
        Some(p) => p.resolve(cycles),
    }
}

/// The full override-cycles string for a sample. Index segments are left out
/// when the run has no cycles for that index read.
pub fn compute_override_cycles(sample: &Sample, run_cycles: &RunCycles) -> String {
    let mut parts = vec![read_segment(
        run_cycles.read1,
        sample.read1_override_pattern.as_ref(),
    )];
    if run_cycles.index1 > 0 {
        parts.push(index_segment(
            sample.effective_index_length(IndexRead::I7),
            run_cycles.index1,
        ));
    }
    if run_cycles.index2 > 0 {
        parts.push(index_segment(
            sample.effective_index_length(IndexRead::I5),
            run_cycles.index2,
        ));
    }
    parts.push(read_segment(
        run_cycles.read2,
        sample.read2_override_pattern.as_ref(),
    ));
    parts.join(";")
}

/// The values a sample should store after its indexes or the run cycles change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideAssignment {
    /// The sample has no index: nothing to demultiplex on.
    Cleared,
    Computed {
        override_cycles: String,
        /// `None` when the run has no cycles for that index read; the
        /// sample's previous value is then left untouched.
        index1_pattern: Option<String>,
        index2_pattern: Option<String>,
    },
}

/// Compute, without mutating the sample, what its override fields should be.
/// The caller owning persistence applies it with
/// [`Sample::apply_override_assignment`].
pub fn recompute_override_cycles(sample: &Sample, run_cycles: &RunCycles) -> OverrideAssignment {
    if !sample.has_index() {
        return OverrideAssignment::Cleared;
    }
    let index_pattern = |read, cycles| {
        (cycles > 0).then(|| index_segment(sample.effective_index_length(read), cycles))
    };
    OverrideAssignment::Computed {
        override_cycles: compute_override_cycles(sample, run_cycles),
        index1_pattern: index_pattern(IndexRead::I7, run_cycles.index1),
        index2_pattern: index_pattern(IndexRead::I5, run_cycles.index2),
    }
}

/// A single override string for the whole run, when every sample would get
/// the same one. Returns `None` when samples differ in effective index lengths
/// or read patterns, or when the run has no cycle plan.
pub fn infer_run_override_cycles(
    samples: &[Sample],
    run_cycles: Option<&RunCycles>,
) -> Option<String> {
    let run_cycles = run_cycles?;
    let Some(first) = samples.first() else {
        let mut parts = vec![format!("Y{}", run_cycles.read1)];
        if run_cycles.index1 > 0 {
            parts.push(format!("I{}", run_cycles.index1));
        }
        if run_cycles.index2 > 0 {
            parts.push(format!("I{}", run_cycles.index2));
        }
        parts.push(format!("Y{}", run_cycles.read2));
        return Some(parts.join(";"));
    };

    fn shape(s: &Sample) -> (usize, usize, Option<&str>, Option<&str>) {
        (
            s.effective_index_length(IndexRead::I7),
            s.effective_index_length(IndexRead::I5),
            s.read1_override_pattern.as_ref().map(ReadPattern::as_str),
            s.read2_override_pattern.as_ref().map(ReadPattern::as_str),
        )
    }
    if samples.iter().map(shape).all_equal() {
        Some(compute_override_cycles(first, run_cycles))
    } else {
        None
    }
}

/// Reverse the token order within one segment: `I8N2` becomes `N2I8`.
/// A segment that does not tokenize is returned unchanged.
pub fn reverse_segment(segment: &str) -> String {
    match tokenize(&segment.to_ascii_uppercase()) {
        Ok(tokens) => tokens.iter().rev().join(""),
        Err(_) => segment.to_string(),
    }
}

/// Adapt a forward-orientation override string to how the instrument reads
/// i5. Only four-segment strings carry an Index2 segment to flip.
pub fn adjust_for_orientation(override_cycles: &str, orientation: I5Orientation) -> String {
    if orientation != I5Orientation::ReverseComplement {
        return override_cycles.to_string();
    }
    let mut parts: Vec<String> = override_cycles.split(';').map(String::from).collect();
    if parts.len() != 4 {
        return override_cycles.to_string();
    }
    parts[2] = reverse_segment(&parts[2]);
    parts.join(";")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cycles(read1: usize, index1: usize, index2: usize, read2: usize) -> RunCycles {
        RunCycles {
            read1,
            read2,
            index1,
            index2,
        }
    }

    fn dual(id: &str, i7: &str, i5: &str) -> Sample {
        Sample::new(id)
            .with_index1(i7)
            .and_then(|s| s.with_index2(i5))
            .unwrap()
    }

    #[test]
    fn test_index_segment() {
        assert_eq!(index_segment(10, 10), "I10");
        assert_eq!(index_segment(8, 10), "I8N2");
        assert_eq!(index_segment(0, 10), "N10");
        assert_eq!(index_segment(12, 10), "I10");
    }

    #[test]
    fn test_read_segment() {
        let p: ReadPattern = "N2Y*".parse().unwrap();
        assert_eq!(read_segment(151, Some(&p)), "N2Y149");
        assert_eq!(read_segment(151, None), "Y151");
        let p: ReadPattern = "Y*N2".parse().unwrap();
        assert_eq!(read_segment(151, Some(&p)), "Y149N2");
    }

    #[test]
    fn test_full_string() {
        let run = cycles(151, 10, 10, 151);
        let s = dual("S1", "ACGTACGTAC", "TTGGCCAATT");
        assert_eq!(compute_override_cycles(&s, &run), "Y151;I10;I10;Y151");

        let s = dual("S2", "ACGTACGT", "TTGGCCAA");
        assert_eq!(compute_override_cycles(&s, &run), "Y151;I8N2;I8N2;Y151");

        let s = Sample::new("S3").with_index1("ACGTACGTAC").unwrap();
        assert_eq!(compute_override_cycles(&s, &run), "Y151;I10;N10;Y151");

        let s = s
            .with_read_patterns(Some("U8Y*"), Some("N2Y*N3"))
            .unwrap();
        assert_eq!(
            compute_override_cycles(&s, &run),
            "U8Y143;I10;N10;N2Y146N3"
        );
    }

    #[test]
    fn test_zero_index_cycles_omitted() {
        let s = dual("S1", "ACGTACGT", "TTGGCCAA");
        assert_eq!(
            compute_override_cycles(&s, &cycles(151, 8, 0, 151)),
            "Y151;I8;Y151"
        );
        assert_eq!(
            compute_override_cycles(&s, &cycles(151, 0, 0, 151)),
            "Y151;Y151"
        );
    }

    #[test]
    fn test_explicit_index_cycles_win() {
        let s = dual("S1", "ACGTACGTAC", "TTGGCCAATT").with_index_cycles(Some(8), Some(8));
        assert_eq!(
            compute_override_cycles(&s, &cycles(151, 10, 10, 151)),
            "Y151;I8N2;I8N2;Y151"
        );
    }

    #[test]
    fn test_recompute() {
        let run = cycles(151, 10, 0, 151);
        let s = dual("S1", "ACGTACGT", "TTGGCCAA");
        assert_eq!(
            recompute_override_cycles(&s, &run),
            OverrideAssignment::Computed {
                override_cycles: "Y151;I8N2;Y151".to_string(),
                index1_pattern: Some("I8N2".to_string()),
                index2_pattern: None,
            }
        );
        assert_eq!(
            recompute_override_cycles(&Sample::new("empty"), &run),
            OverrideAssignment::Cleared
        );
    }

    #[test]
    fn test_infer_run_override() {
        let run = cycles(151, 10, 10, 151);
        let same = vec![
            dual("S1", "ACGTACGT", "TTGGCCAA"),
            dual("S2", "GGGTACGT", "TTGGCCTT"),
        ];
        assert_eq!(
            infer_run_override_cycles(&same, Some(&run)).as_deref(),
            Some("Y151;I8N2;I8N2;Y151")
        );

        let mixed = vec![
            dual("S1", "ACGTACGT", "TTGGCCAA"),
            dual("S2", "GGGTACGTAC", "TTGGCCTTAA"),
        ];
        assert_eq!(infer_run_override_cycles(&mixed, Some(&run)), None);

        let patterned = vec![
            dual("S1", "ACGTACGT", "TTGGCCAA"),
            dual("S2", "GGGTACGT", "TTGGCCTT")
                .with_read_patterns(Some("N2Y*"), None)
                .unwrap(),
        ];
        assert_eq!(infer_run_override_cycles(&patterned, Some(&run)), None);

        assert_eq!(
            infer_run_override_cycles(&[], Some(&run)).as_deref(),
            Some("Y151;I10;I10;Y151")
        );
        assert_eq!(
            infer_run_override_cycles(&[], Some(&cycles(151, 10, 0, 151))).as_deref(),
            Some("Y151;I10;Y151")
        );
        assert_eq!(infer_run_override_cycles(&same, None), None);
    }

    #[test]
    fn test_reverse_segment() {
        assert_eq!(reverse_segment("I8N2"), "N2I8");
        assert_eq!(reverse_segment("I10"), "I10");
        assert_eq!(reverse_segment("N2I8N2"), "N2I8N2");
        assert_eq!(reverse_segment("U4I8N2"), "N2I8U4");
        assert_eq!(reverse_segment("garbage"), "garbage");
    }

    #[test]
    fn test_adjust_for_orientation() {
        assert_eq!(
            adjust_for_orientation("Y151;I8N2;I8N2;Y151", I5Orientation::ReverseComplement),
            "Y151;I8N2;N2I8;Y151"
        );
        assert_eq!(
            adjust_for_orientation("Y151;I8N2;I8N2;Y151", I5Orientation::Forward),
            "Y151;I8N2;I8N2;Y151"
        );
        assert_eq!(
            adjust_for_orientation("Y151;I8N2;Y151", I5Orientation::ReverseComplement),
            "Y151;I8N2;Y151"
        );
    }
}
