//! Pairwise index comparison within each lane.

use crate::lanes::LaneGroups;
use index_seq::IndexSeq;
use itertools::Itertools;
use run_types::Sample;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use strum_macros::Display;

/// Two samples compared on i7 alone are safely separable at this distance.
pub const I7_MIN_SAFE_DISTANCE: usize = 3;

/// Two dual-indexed samples are safely separable at this summed i7+i5 distance.
pub const COMBINED_MIN_SAFE_DISTANCE: usize = 4;

/// Which index reads a comparison used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum CollisionMode {
    #[serde(rename = "i7")]
    #[strum(serialize = "i7")]
    I7,
    #[serde(rename = "i7+i5")]
    #[strum(serialize = "i7+i5")]
    Combined,
}

impl CollisionMode {
    pub fn min_safe_distance(self) -> usize {
        match self {
            CollisionMode::I7 => I7_MIN_SAFE_DISTANCE,
            CollisionMode::Combined => COMBINED_MIN_SAFE_DISTANCE,
        }
    }
}

/// Two samples in one lane whose indexes are too close to demultiplex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexCollision {
    pub lane: usize,
    pub index_type: CollisionMode,
    pub sample1_id: String,
    pub sample1_name: String,
    pub sample2_id: String,
    pub sample2_name: String,
    /// `i7` or `i7+i5` depending on the mode.
    pub sequence1: String,
    pub sequence2: String,
    pub hamming_distance: usize,
    /// The minimum distance this pair should have had.
    pub threshold: usize,
}

impl fmt::Display for IndexCollision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} collision in lane {}: {} ({}) vs {} ({}) - distance {} is below {}",
            self.index_type,
            self.lane,
            self.sample1_name,
            self.sequence1,
            self.sample2_name,
            self.sequence2,
            self.hamming_distance,
            self.threshold,
        )
    }
}

fn sequence_label(i7: &IndexSeq, i5: Option<&IndexSeq>) -> String {
    match i5 {
        Some(i5) => format!("{i7}+{i5}"),
        None => i7.to_string(),
    }
}

/// Compare one pair. Pairs where either sample has no i7 are never flagged.
pub fn check_pair(s1: &Sample, s2: &Sample, lane: usize) -> Option<IndexCollision> {
    let (i7_1, i7_2) = (s1.i7()?, s2.i7()?);
    let i7_distance = i7_1.distance(i7_2);

    let (mode, distance, i5s) = match (s1.i5(), s2.i5()) {
        (Some(i5_1), Some(i5_2)) => (
            CollisionMode::Combined,
            i7_distance + i5_1.distance(i5_2),
            Some((i5_1, i5_2)),
        ),
        _ => (CollisionMode::I7, i7_distance, None),
    };
    if distance >= mode.min_safe_distance() {
        return None;
    }
    Some(IndexCollision {
        lane,
        index_type: mode,
        sample1_id: s1.id.clone(),
        sample1_name: s1.display_name().to_string(),
        sample2_id: s2.id.clone(),
        sample2_name: s2.display_name().to_string(),
        sequence1: sequence_label(i7_1, i5s.map(|(a, _)| a)),
        sequence2: sequence_label(i7_2, i5s.map(|(_, b)| b)),
        hamming_distance: distance,
        threshold: mode.min_safe_distance(),
    })
}

/// Every colliding unordered pair, lane by lane.
pub fn detect_collisions(groups: &LaneGroups<'_>) -> Vec<IndexCollision> {
    groups
        .iter()
        .flat_map(|(&lane, samples)| {
            samples
                .iter()
                .tuple_combinations()
                .filter_map(move |(s1, s2)| check_pair(s1, s2, lane))
        })
        .collect()
}

/// All-vs-all distances for one lane. The diagonal, and any cell where an
/// index is missing on either side, is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDistanceMatrix {
    pub sample_ids: Vec<String>,
    pub sample_names: Vec<String>,
    pub i7_distances: Vec<Vec<Option<usize>>>,
    pub i5_distances: Vec<Vec<Option<usize>>>,
    /// i7 + i5 when both are known, else whichever one is.
    pub combined_distances: Vec<Vec<Option<usize>>>,
}

impl IndexDistanceMatrix {
    pub fn for_samples(samples: &[&Sample]) -> Self {
        let n = samples.len();
        let mut i7_distances = vec![vec![None; n]; n];
        let mut i5_distances = vec![vec![None; n]; n];
        let mut combined_distances = vec![vec![None; n]; n];

        for ((i, s1), (j, s2)) in samples.iter().enumerate().tuple_combinations() {
            let i7 = s1.i7().zip(s2.i7()).map(|(a, b)| a.distance(b));
            let i5 = s1.i5().zip(s2.i5()).map(|(a, b)| a.distance(b));
            let combined = match (i7, i5) {
                (Some(a), Some(b)) => Some(a + b),
                (a, b) => a.or(b),
            };
            for (matrix, value) in [
                (&mut i7_distances, i7),
                (&mut i5_distances, i5),
                (&mut combined_distances, combined),
            ] {
                matrix[i][j] = value;
                matrix[j][i] = value;
            }
        }

        IndexDistanceMatrix {
            sample_ids: samples.iter().map(|s| s.id.clone()).collect(),
            sample_names: samples
                .iter()
                .map(|s| s.display_name().to_string())
                .collect(),
            i7_distances,
            i5_distances,
            combined_distances,
        }
    }
}

/// Distance matrices for every lane holding at least two samples.
pub fn distance_matrices(groups: &LaneGroups<'_>) -> BTreeMap<usize, IndexDistanceMatrix> {
    groups
        .iter()
        .filter(|(_, samples)| samples.len() >= 2)
        .map(|(&lane, samples)| (lane, IndexDistanceMatrix::for_samples(samples)))
        .collect()
}
