//! Expands each sample's lane assignment into per-lane sample groups.

use run_types::Sample;
use std::collections::BTreeMap;

/// Samples loaded on each lane, in input order, keyed by lane number.
pub type LaneGroups<'a> = BTreeMap<usize, Vec<&'a Sample>>;

fn group<'a>(samples: impl IntoIterator<Item = &'a Sample>, lane_count: usize) -> LaneGroups<'a> {
    let mut groups = LaneGroups::new();
    for sample in samples {
        for lane in sample.lane_spec().resolve(lane_count) {
            groups.entry(lane).or_default().push(sample);
        }
    }
    groups
}

/// Indexed samples per lane. A sample with no lanes is placed on every lane
/// `1..=lane_count`; samples without an index are left out entirely.
pub fn group_indexed_samples(samples: &[Sample], lane_count: usize) -> LaneGroups<'_> {
    group(samples.iter().filter(|s| s.has_index()), lane_count)
}

/// Every sample per lane, indexed or not.
pub fn group_all_samples(samples: &[Sample], lane_count: usize) -> LaneGroups<'_> {
    group(samples, lane_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use pretty_assertions::assert_eq;

    fn ids(groups: &LaneGroups<'_>, lane: usize) -> Vec<String> {
        groups
            .get(&lane)
            .map(|g| g.iter().map(|s| s.sample_id.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_empty_lanes_means_all() -> Result<()> {
        let samples = vec![
            Sample::new("all").with_index1("ACGTACGT")?,
            Sample::new("two").with_index1("TTTTACGT")?.with_lanes([2]),
        ];
        let groups = group_indexed_samples(&samples, 4);
        assert_eq!(groups.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        for lane in [1, 3, 4] {
            assert_eq!(ids(&groups, lane), vec!["all"]);
        }
        assert_eq!(ids(&groups, 2), vec!["all", "two"]);
        Ok(())
    }

    #[test]
    fn test_unindexed_excluded() -> Result<()> {
        let samples = vec![
            Sample::new("indexed").with_index1("ACGTACGT")?,
            Sample::new("bare"),
            Sample::new("i5only").with_index2("ACGTACGT")?,
        ];
        let groups = group_indexed_samples(&samples, 2);
        assert_eq!(ids(&groups, 1), vec!["indexed"]);
        assert_eq!(
            ids(&group_all_samples(&samples, 2), 1),
            vec!["indexed", "bare", "i5only"]
        );
        Ok(())
    }

    #[test]
    fn test_no_lanes_configured() -> Result<()> {
        let samples = vec![
            Sample::new("all").with_index1("ACGTACGT")?,
            Sample::new("five").with_index1("ACGTACGT")?.with_lanes([5]),
        ];
        let groups = group_indexed_samples(&samples, 0);
        assert_eq!(groups.len(), 1);
        assert_eq!(ids(&groups, 5), vec!["five"]);
        assert!(group_indexed_samples(&[], 8).is_empty());
        Ok(())
    }
}
