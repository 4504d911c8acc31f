//! Reads sample tables pasted from a spreadsheet or LIMS export.

use crate::columns::{ColumnMap, ColumnRole};
use crate::lanes::{parse_lanes, LaneParseError};
use csv::{ReaderBuilder, StringRecord, Trim};
use index_seq::{IndexSeq, SeqError};
use log::debug;
use run_types::{Index, IndexRead, Lanes, Sample};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SampleParseError {
    #[error("line {line}: invalid {read} index for sample '{sample_id}'")]
    InvalidIndex {
        line: u64,
        sample_id: String,
        read: IndexRead,
        #[source]
        source: SeqError,
    },

    #[error("line {line}: invalid lanes for sample '{sample_id}'")]
    InvalidLanes {
        line: u64,
        sample_id: String,
        #[source]
        source: LaneParseError,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// One row of a pasted sample table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSample {
    /// 1-based line in the input.
    pub line: u64,
    pub sample_id: String,
    pub test_id: String,
    pub index1: Option<IndexSeq>,
    pub index2: Option<IndexSeq>,
    pub index_pair_name: String,
    pub index1_name: String,
    pub index2_name: String,
    pub lanes: Lanes,
}

impl ParsedSample {
    pub fn into_sample(self) -> Sample {
        let mut sample = Sample::new(&self.sample_id);
        sample.test_id = self.test_id;
        sample.index_kit_name = Some(self.index_pair_name).filter(|name| !name.is_empty());
        sample.index1 = self.index1.map(|sequence| Index {
            name: self.index1_name,
            sequence,
            well_position: None,
        });
        sample.index2 = self.index2.map(|sequence| Index {
            name: self.index2_name,
            sequence,
            well_position: None,
        });
        sample.lanes = match self.lanes {
            Lanes::Any => Vec::new(),
            Lanes::Lanes(lanes) => lanes,
        };
        sample
    }
}

fn parse_record(
    record: &StringRecord,
    columns: &ColumnMap,
    line: u64,
) -> Result<Option<ParsedSample>, SampleParseError> {
    let cell = |role: ColumnRole| {
        columns
            .position(role)
            .and_then(|i| record.get(i))
            .unwrap_or("")
    };
    let sample_id = cell(ColumnRole::SampleId);
    if sample_id.is_empty() {
        return Ok(None);
    }

    let index = |role: ColumnRole, read: IndexRead| match cell(role) {
        "" => Ok(None),
        text => text
            .parse::<IndexSeq>()
            .map(Some)
            .map_err(|source| SampleParseError::InvalidIndex {
                line,
                sample_id: sample_id.to_string(),
                read,
                source,
            }),
    };
    let lanes =
        parse_lanes(cell(ColumnRole::Lanes)).map_err(|source| SampleParseError::InvalidLanes {
            line,
            sample_id: sample_id.to_string(),
            source,
        })?;

    Ok(Some(ParsedSample {
        line,
        sample_id: sample_id.to_string(),
        test_id: cell(ColumnRole::TestId).to_string(),
        index1: index(ColumnRole::Index1, IndexRead::I7)?,
        index2: index(ColumnRole::Index2, IndexRead::I5)?,
        index_pair_name: cell(ColumnRole::IndexPairName).to_string(),
        index1_name: cell(ColumnRole::Index1Name).to_string(),
        index2_name: cell(ColumnRole::Index2Name).to_string(),
        lanes,
    }))
}

/// Parse tab- or comma-separated sample rows. The delimiter is a tab when the
/// first non-blank line contains one. An optional header row selects the
/// columns; without one the layout is `sample_id, test_id, index1, index2`.
/// Rows without a sample id are skipped.
pub fn parse_samples(text: &str) -> Result<Vec<ParsedSample>, SampleParseError> {
    let delimiter = match text.lines().find(|line| !line.trim().is_empty()) {
        Some(line) if line.contains('\t') => b'\t',
        _ => b',',
    };
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut columns = ColumnMap::default();
    let mut first_row = true;
    let mut samples = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        if std::mem::take(&mut first_row) && ColumnMap::is_header(record.iter()) {
            columns = ColumnMap::from_header(record.iter());
            debug!("sample table header maps {:?}", columns.roles().collect::<Vec<_>>());
            continue;
        }
        let line = record.position().map_or(0, csv::Position::line);
        samples.extend(parse_record(&record, &columns, line)?);
    }
    Ok(samples)
}
