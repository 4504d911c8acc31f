//! Sample tables and index kits in, sample sheets out: parsing pasted sample
//! rows into [`run_types::Sample`]s, reading index kit files, and writing
//! BCL Convert v2 and IEM v1 sample sheets.
#![deny(future_incompatible, nonstandard_style, rust_2018_idioms)]

pub mod bclconvert;
pub mod columns;
pub mod iem;
pub mod kit_file;
pub mod lanes;
pub mod parser;
mod sheet;

pub use bclconvert::{samplesheet_v2_string, write_samplesheet_v2};
pub use columns::{ColumnMap, ColumnRole};
pub use iem::{samplesheet_v1_string, write_samplesheet_v1};
pub use kit_file::{load_index_kit, normalize_version, parse_index_kit, KitFormat, KitParseError};
pub use lanes::{parse_lanes, LaneParseError, MAX_LANE};
pub use parser::{parse_samples, ParsedSample, SampleParseError};
