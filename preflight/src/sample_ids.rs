use itertools::Itertools;
use run_types::Sample;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A `sample_id` used by more than one sample of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateSampleId {
    pub sample_id: String,
    pub count: usize,
}

impl fmt::Display for DuplicateSampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Duplicate sample_id '{}' found {} times",
            self.sample_id, self.count
        )
    }
}

/// Duplicated ids in order of first appearance. Blank ids are not compared.
pub fn duplicate_sample_ids(samples: &[Sample]) -> Vec<DuplicateSampleId> {
    let ids = samples
        .iter()
        .map(|s| s.sample_id.as_str())
        .filter(|id| !id.is_empty())
        .collect_vec();
    ids.iter()
        .unique()
        .filter_map(|&id| {
            let count = ids.iter().filter(|&&other| other == id).count();
            (count > 1).then(|| DuplicateSampleId {
                sample_id: id.to_string(),
                count,
            })
        })
        .collect()
}
