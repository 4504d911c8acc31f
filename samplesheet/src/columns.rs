//! Header names recognized in pasted sample tables.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter};

/// What a column of a sample table holds. Variants are listed in the order
/// header cells are resolved: name columns come before sequence columns so
/// that `index_name` is never read as an index sequence.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ColumnRole {
    SampleId,
    TestId,
    Index1Name,
    Index2Name,
    Index1,
    Index2,
    IndexPairName,
    Lanes,
}

impl ColumnRole {
    /// Lower-case header spellings for this role.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            ColumnRole::SampleId => &[
                "sample_id",
                "sampleid",
                "sample",
                "sample id",
                "sample-id",
                "id",
                "name",
                "sample_name",
                "samplename",
            ],
            ColumnRole::TestId => &[
                "test_id",
                "testid",
                "test",
                "test id",
                "test-id",
                "test_type",
                "testtype",
                "test type",
                "assay",
                "application",
            ],
            ColumnRole::Index1Name => &[
                "i7_name",
                "i7 name",
                "index_i7_name",
                "index1_name",
                "index_name",
                "index name",
            ],
            ColumnRole::Index2Name => &["i5_name", "i5 name", "index_i5_name", "index2_name"],
            ColumnRole::Index1 => &["index", "index1", "i7", "index_i7", "i7_index", "index i7"],
            ColumnRole::Index2 => &["index2", "i5", "index_i5", "i5_index", "index i5"],
            ColumnRole::IndexPairName => &[
                "index_pair_name",
                "pair_name",
                "index_pair",
                "index pair",
                "index_kit",
                "kit_name",
                "kit name",
                "index kit",
            ],
            ColumnRole::Lanes => &["lane", "lanes"],
        }
    }

    pub fn matches(self, header: &str) -> bool {
        self.aliases().contains(&header.trim().to_lowercase().as_str())
    }

    /// First role, in resolution order, that `header` names.
    pub fn from_header(header: &str) -> Option<ColumnRole> {
        ColumnRole::iter().find(|role| role.matches(header))
    }
}

/// Column position of each role present in a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    columns: BTreeMap<ColumnRole, usize>,
}

impl Default for ColumnMap {
    /// Layout of a table pasted without a header row.
    fn default() -> Self {
        ColumnMap {
            columns: [
                (ColumnRole::SampleId, 0),
                (ColumnRole::TestId, 1),
                (ColumnRole::Index1, 2),
                (ColumnRole::Index2, 3),
            ]
            .into_iter()
            .collect(),
        }
    }
}

impl ColumnMap {
    /// True when `cells` look like a header: the first cell names the sample
    /// column, or any later cell names some other known column.
    pub fn is_header<'a>(cells: impl IntoIterator<Item = &'a str>) -> bool {
        let mut cells = cells.into_iter();
        match cells.next() {
            None => false,
            Some(first) if ColumnRole::SampleId.matches(first) => true,
            Some(_) => cells.any(|cell| {
                ColumnRole::iter()
                    .filter(|&role| role != ColumnRole::SampleId)
                    .any(|role| role.matches(cell))
            }),
        }
    }

    /// Map header cells to roles. A cell takes the first role it names that is
    /// still unassigned; the sample id falls back to the first column.
    pub fn from_header<'a>(cells: impl IntoIterator<Item = &'a str>) -> Self {
        let mut columns = BTreeMap::new();
        for (i, cell) in cells.into_iter().enumerate() {
            if let Some(role) = ColumnRole::iter()
                .find(|&role| !columns.contains_key(&role) && role.matches(cell))
            {
                columns.insert(role, i);
            }
        }
        columns.entry(ColumnRole::SampleId).or_insert(0);
        ColumnMap { columns }
    }

    pub fn position(&self, role: ColumnRole) -> Option<usize> {
        self.columns.get(&role).copied()
    }

    pub fn roles(&self) -> impl Iterator<Item = ColumnRole> + '_ {
        self.columns.keys().copied()
    }
}
