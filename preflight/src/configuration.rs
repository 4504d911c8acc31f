//! Run configuration checks: sample ids, lane assignments, index layout per
//! lane and the cycle plan.

use crate::lanes::{group_all_samples, LaneGroups};
use index_seq::IndexSeq;
use itertools::Itertools;
use run_types::{IndexRead, Sample, SequencingRun};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display};

/// How many sample names a message lists before summarizing the rest.
const LISTED_NAMES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IssueCategory {
    InvalidSampleId,
    LaneOutOfRange,
    NoLaneAssignment,
    IndexLengthMismatch,
    MixedIndexing,
    IndexExceedsCycles,
    DuplicateIndexPair,
    MismatchThresholdRisk,
    CycleConfiguration,
}

impl IssueCategory {
    pub fn severity(self) -> Severity {
        match self {
            IssueCategory::NoLaneAssignment | IssueCategory::MismatchThresholdRisk => {
                Severity::Warning
            }
            _ => Severity::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationIssue {
    pub severity: Severity,
    pub category: IssueCategory,
    pub message: String,
    #[serde(default)]
    pub sample_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lane: Option<usize>,
}

impl ConfigurationIssue {
    fn new(category: IssueCategory, message: String) -> Self {
        ConfigurationIssue {
            severity: category.severity(),
            category,
            message,
            sample_names: Vec::new(),
            lane: None,
        }
    }

    fn with_samples(mut self, sample_names: Vec<String>) -> Self {
        self.sample_names = sample_names;
        self
    }

    fn in_lane(mut self, lane: usize) -> Self {
        self.lane = Some(lane);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ConfigurationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// `a, b, c, d, e and 3 more`
fn list_names(names: &[String]) -> String {
    let listed = names.iter().take(LISTED_NAMES).join(", ");
    if names.len() > LISTED_NAMES {
        format!("{listed} and {} more", names.len() - LISTED_NAMES)
    } else {
        listed
    }
}

fn is_valid_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn check_sample_ids(samples: &[Sample]) -> Vec<ConfigurationIssue> {
    samples
        .iter()
        .filter(|s| !s.sample_id.is_empty())
        .filter_map(|s| {
            let invalid: Vec<char> = s
                .sample_id
                .chars()
                .filter(|&c| !is_valid_id_char(c))
                .sorted()
                .dedup()
                .collect();
            if invalid.is_empty() {
                return None;
            }
            let message = format!(
                "Sample ID '{}' contains invalid characters: {}. \
                 Only alphanumeric characters, hyphens, and underscores are allowed.",
                s.sample_id,
                invalid.iter().map(|c| format!("{c:?}")).join(", "),
            );
            Some(
                ConfigurationIssue::new(IssueCategory::InvalidSampleId, message)
                    .with_samples(vec![s.sample_id.clone()]),
            )
        })
        .collect()
}

fn check_lane_range(samples: &[Sample], lane_count: usize) -> Vec<ConfigurationIssue> {
    let mut issues = Vec::new();
    for sample in samples {
        let name = sample.display_name();
        for &lane in sample.lanes.iter().filter(|&&l| l < 1 || l > lane_count) {
            let message = format!(
                "Sample '{name}' is assigned to lane {lane}, \
                 but the selected flowcell only has lanes 1-{lane_count}."
            );
            issues.push(
                ConfigurationIssue::new(IssueCategory::LaneOutOfRange, message)
                    .with_samples(vec![name.to_string()])
                    .in_lane(lane),
            );
        }
    }
    issues
}

/// Warn only when explicit and implicit lane assignments are mixed.
fn check_unassigned_lanes(samples: &[Sample]) -> Option<ConfigurationIssue> {
    if samples.iter().all(|s| s.lanes.is_empty()) {
        return None;
    }
    let unassigned: Vec<String> = samples
        .iter()
        .filter(|s| s.lanes.is_empty())
        .map(|s| s.display_name().to_string())
        .collect();
    if unassigned.is_empty() {
        return None;
    }
    let message = format!(
        "{} sample(s) have no lane assignment and will be placed in all lanes: {}",
        unassigned.len(),
        list_names(&unassigned)
    );
    Some(ConfigurationIssue::new(IssueCategory::NoLaneAssignment, message).with_samples(unassigned))
}

fn check_index_lengths(groups: &LaneGroups<'_>) -> Vec<ConfigurationIssue> {
    let mut issues = Vec::new();
    for (&lane, samples) in groups {
        let indexed = samples.iter().filter(|s| s.has_index()).collect_vec();
        if indexed.len() < 2 {
            continue;
        }
        for read in IndexRead::iter() {
            let mut lengths = BTreeMap::<usize, usize>::new();
            for seq in indexed.iter().filter_map(|s| s.index_seq(read)) {
                *lengths.entry(seq.len()).or_default() += 1;
            }
            if lengths.len() < 2 {
                continue;
            }
            let detail = lengths
                .iter()
                .map(|(len, n)| format!("{len}bp ({n} samples)"))
                .join(", ");
            let message = format!(
                "Lane {lane}: {read} index lengths are inconsistent - {detail}. \
                 All samples in a lane must have the same index length."
            );
            issues.push(
                ConfigurationIssue::new(IssueCategory::IndexLengthMismatch, message).in_lane(lane),
            );
        }
    }
    issues
}

fn check_mixed_indexing(groups: &LaneGroups<'_>) -> Vec<ConfigurationIssue> {
    let mut issues = Vec::new();
    for (&lane, samples) in groups {
        let indexed = samples.iter().filter(|s| s.has_index()).collect_vec();
        if indexed.len() < 2 {
            continue;
        }
        let dual = indexed.iter().filter(|s| s.i5().is_some()).count();
        let single = indexed.len() - dual;
        if dual == 0 || single == 0 {
            continue;
        }
        let message = format!(
            "Lane {lane}: mixed single-indexed ({single} samples) and dual-indexed ({dual} samples). \
             All samples in a lane must use the same indexing mode."
        );
        issues.push(ConfigurationIssue::new(IssueCategory::MixedIndexing, message).in_lane(lane));
    }
    issues
}

/// Assigned sequences longer than the planned index reads.
fn check_index_cycles(run: &SequencingRun) -> Vec<ConfigurationIssue> {
    let Some(cycles) = run.run_cycles else {
        return Vec::new();
    };
    let mut issues = Vec::new();
    for sample in &run.samples {
        let name = sample.display_name();
        for (read, read_cycles, label) in [
            (IndexRead::I7, cycles.index1, "index1"),
            (IndexRead::I5, cycles.index2, "index2"),
        ] {
            let Some(seq) = sample.index_seq(read).filter(|s| s.len() > read_cycles) else {
                continue;
            };
            let message = format!(
                "Sample '{name}': {read} index length ({}bp) exceeds run {label} cycles \
                 ({read_cycles}). Index cycles must be >= index length.",
                seq.len()
            );
            issues.push(
                ConfigurationIssue::new(IssueCategory::IndexExceedsCycles, message)
                    .with_samples(vec![name.to_string()]),
            );
        }
    }
    issues
}

fn check_duplicate_pairs(groups: &LaneGroups<'_>) -> Vec<ConfigurationIssue> {
    let mut issues = Vec::new();
    for (&lane, samples) in groups {
        let keyed = samples
            .iter()
            .filter_map(|s| {
                let i7 = s.i7()?.as_str();
                let i5 = s.i5().map_or("", IndexSeq::as_str);
                Some(((i7, i5), s.display_name()))
            })
            .collect_vec();

        for key in keyed.iter().map(|(key, _)| *key).unique() {
            let names = keyed
                .iter()
                .filter(|(k, _)| *k == key)
                .map(|(_, name)| name.to_string())
                .collect_vec();
            if names.len() < 2 {
                continue;
            }
            let (i7, i5) = key;
            let indexes = if i5.is_empty() {
                format!("i7={i7}")
            } else {
                format!("i7={i7}, i5={i5}")
            };
            let message = format!(
                "Lane {lane}: {} samples share identical indexes ({indexes}): {}. \
                 Demultiplexing cannot distinguish these samples.",
                names.len(),
                list_names(&names)
            );
            issues.push(
                ConfigurationIssue::new(IssueCategory::DuplicateIndexPair, message)
                    .with_samples(names)
                    .in_lane(lane),
            );
        }
    }
    issues
}

/// Two reads each carrying the allowed number of mismatches can meet halfway
/// once the closest pair in a lane is within twice the allowance.
fn check_mismatch_threshold(
    run: &SequencingRun,
    groups: &LaneGroups<'_>,
) -> Vec<ConfigurationIssue> {
    let mut issues = Vec::new();
    for (&lane, samples) in groups {
        let indexed = samples.iter().filter(|s| s.has_index()).collect_vec();
        let min_distance = indexed
            .iter()
            .tuple_combinations()
            .filter_map(|(s1, s2)| Some(s1.i7()?.distance(s2.i7()?)))
            .min();
        let max_mismatches = indexed
            .iter()
            .map(|s| run.mismatches_for(s, IndexRead::I7))
            .max();
        let (Some(distance), Some(mismatches)) = (min_distance, max_mismatches) else {
            continue;
        };
        if distance <= 2 * usize::from(mismatches) {
            let message = format!(
                "Lane {lane}: minimum i7 distance ({distance}) is at or below 2x the barcode \
                 mismatch threshold ({mismatches}). Consider reducing the mismatch threshold \
                 to avoid misassignment."
            );
            issues.push(
                ConfigurationIssue::new(IssueCategory::MismatchThresholdRisk, message)
                    .in_lane(lane),
            );
        }
    }
    issues
}

fn check_cycle_configuration(run: &SequencingRun) -> Vec<ConfigurationIssue> {
    match (run.run_cycles, run.reagent_kit_cycles) {
        (Some(cycles), Some(kit)) => cycles
            .validate(kit)
            .into_iter()
            .map(|e| ConfigurationIssue::new(IssueCategory::CycleConfiguration, e.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

/// Every configuration problem of a run laid out on a flowcell with
/// `lane_count` lanes. A run without samples has nothing to check.
pub fn check_configuration(run: &SequencingRun, lane_count: usize) -> Vec<ConfigurationIssue> {
    if run.samples.is_empty() {
        return Vec::new();
    }
    let groups = group_all_samples(&run.samples, lane_count);

    let mut issues = check_sample_ids(&run.samples);
    issues.extend(check_lane_range(&run.samples, lane_count));
    issues.extend(check_unassigned_lanes(&run.samples));
    issues.extend(check_index_lengths(&groups));
    issues.extend(check_mixed_indexing(&groups));
    issues.extend(check_index_cycles(run));
    issues.extend(check_duplicate_pairs(&groups));
    issues.extend(check_mismatch_threshold(run, &groups));
    issues.extend(check_cycle_configuration(run));
    issues
}
