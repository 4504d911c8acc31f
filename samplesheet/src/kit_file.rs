//! Reads index adapter kit definitions: plain or sectioned CSV, the Illumina
//! tab-separated kit template, and JSON or TOML in the kit's own layout.

use anyhow::Context;
use csv::{ReaderBuilder, StringRecord, Trim};
use index_seq::SeqError;
use lazy_static::lazy_static;
use log::{debug, info};
use regex::Regex;
use run_types::{Index, IndexKit, IndexMode, IndexPair};
use std::path::Path;
use strum_macros::{Display, EnumString};
use thiserror::Error;

lazy_static! {
    static ref SEMVER: Regex = Regex::new(r"^(\d+)\.(\d+)(?:\.(\d+))?$").unwrap();
}

const PAIR_NAME: &[&str] = &["name", "Name", "Sample_ID", "sample_id"];
const I7_NAME: &[&str] = &["i7_name", "I7_Name", "i7_index_name"];
const I5_NAME: &[&str] = &["i5_name", "I5_Name", "i5_index_name"];
const I7_SEQUENCE: &[&str] = &[
    "index", "Index", "i7", "Index1", "index1", "sequence", "Sequence",
];
const I5_SEQUENCE: &[&str] = &["index2", "Index2", "i5", "Index_2"];
const WELL: &[&str] = &["well", "Well", "well_position", "Well_Position"];
const SECTION_NAME: &[&str] = &["name", "Name"];
const SECTION_SEQUENCE: &[&str] = &["sequence", "Sequence"];

#[derive(Debug, Error)]
pub enum KitParseError {
    #[error("line {line}: invalid sequence for index '{name}'")]
    InvalidSequence {
        line: u64,
        name: String,
        #[source]
        source: SeqError,
    },

    #[error("kit version '{0}' is not of the form X.Y or X.Y.Z")]
    InvalidVersion(String),

    #[error("index kit '{0}' lists no indexes")]
    Empty(String),

    #[error("unsupported index kit file '{0}'; expected .csv, .tsv, .json or .toml")]
    UnknownFormat(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

/// Layout of an index kit file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum KitFormat {
    Csv,
    Tsv,
    Json,
    Toml,
}

impl KitFormat {
    pub fn from_path(path: &Path) -> Option<KitFormat> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        ext.parse().ok()
    }

    /// Guess the layout from the text itself.
    pub fn detect(content: &str) -> KitFormat {
        let content = content.trim_start();
        let first = content.lines().next().unwrap_or_default().trim();
        if content.starts_with('{') {
            KitFormat::Json
        } else if first.eq_ignore_ascii_case("[IndexKit]") || first.contains('\t') {
            KitFormat::Tsv
        } else if first.contains('=') {
            KitFormat::Toml
        } else {
            KitFormat::Csv
        }
    }
}

/// A bare major version gets a `.0`; anything else must be `X.Y` or `X.Y.Z`.
pub fn normalize_version(version: &str) -> Result<String, KitParseError> {
    let version = version.trim();
    let version = if !version.is_empty() && version.bytes().all(|b| b.is_ascii_digit()) {
        format!("{version}.0")
    } else {
        version.to_string()
    };
    if SEMVER.is_match(&version) {
        Ok(version)
    } else {
        Err(KitParseError::InvalidVersion(version))
    }
}

/// First non-empty cell among the `aliases` columns, in alias order.
fn field<'r>(headers: &StringRecord, row: &'r StringRecord, aliases: &[&str]) -> Option<&'r str> {
    aliases
        .iter()
        .filter_map(|alias| headers.iter().position(|h| h == *alias))
        .filter_map(|i| row.get(i))
        .find(|cell| !cell.is_empty())
}

fn index(name: &str, sequence: &str, well: Option<&str>, line: u64) -> Result<Index, KitParseError> {
    let mut index = Index::new(name, sequence).map_err(|source| KitParseError::InvalidSequence {
        line,
        name: name.to_string(),
        source,
    })?;
    index.well_position = well.map(str::to_string);
    Ok(index)
}

fn csv_rows(text: &str) -> Result<(StringRecord, Vec<StringRecord>), KitParseError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();
    let rows = reader
        .records()
        .collect::<Result<Vec<_>, csv::Error>>()?
        .into_iter()
        .filter(|row| !row.iter().all(str::is_empty))
        .collect();
    Ok((headers, rows))
}

fn line_of(row: &StringRecord, offset: u64) -> u64 {
    row.position().map_or(0, csv::Position::line) + offset
}

/// One kit entry per row: a pair name with an i7 and optional i5 sequence.
/// Rows without a name or i7 are skipped.
fn parse_simple_csv(
    text: &str,
    kit_name: &str,
    mode: Option<IndexMode>,
) -> Result<IndexKit, KitParseError> {
    let (headers, rows) = csv_rows(text)?;
    let has_i5 = rows.iter().any(|row| field(&headers, row, I5_SEQUENCE).is_some());
    let mode = mode.unwrap_or(if has_i5 {
        IndexMode::UniqueDual
    } else {
        IndexMode::Single
    });
    let mut kit = IndexKit::new(kit_name, mode);

    for row in &rows {
        let (Some(name), Some(i7)) = (
            field(&headers, row, PAIR_NAME),
            field(&headers, row, I7_SEQUENCE),
        ) else {
            continue;
        };
        let line = line_of(row, 0);
        let well = field(&headers, row, WELL);
        let i7_name = field(&headers, row, I7_NAME).unwrap_or(name);
        let i5_name = field(&headers, row, I5_NAME).unwrap_or(name);
        let i5 = field(&headers, row, I5_SEQUENCE);

        match mode {
            IndexMode::Single => kit.i7_indexes.push(index(name, i7, well, line)?),
            IndexMode::Combinatorial => {
                let i7 = index(i7_name, i7, well, line)?;
                if !kit.i7_indexes.iter().any(|i| i.name == i7.name) {
                    kit.i7_indexes.push(i7);
                }
                if let Some(i5) = i5 {
                    let i5 = index(i5_name, i5, well, line)?;
                    if !kit.i5_indexes.iter().any(|i| i.name == i5.name) {
                        kit.i5_indexes.push(i5);
                    }
                }
            }
            IndexMode::UniqueDual => kit.index_pairs.push(IndexPair {
                name: name.to_string(),
                index1: index(i7_name, i7, well, line)?,
                index2: i5.map(|seq| index(i5_name, seq, well, line)).transpose()?,
                well_position: well.map(str::to_string),
            }),
        }
    }
    Ok(kit)
}

/// `[i7]` and `[i5]` sections, each a CSV table of name, sequence and
/// optional well.
fn parse_sectioned_csv(
    text: &str,
    kit_name: &str,
    mode: Option<IndexMode>,
) -> Result<IndexKit, KitParseError> {
    let mut kit = IndexKit::new(kit_name, mode.unwrap_or(IndexMode::Combinatorial));
    let mut sections: Vec<(String, u64, Vec<&str>)> = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            sections.push((trimmed.to_ascii_lowercase(), i as u64 + 1, Vec::new()));
        } else if let Some((_, _, lines)) = sections.last_mut() {
            if !trimmed.is_empty() {
                lines.push(trimmed);
            }
        }
    }

    for (section, start, lines) in sections {
        let target = match section.as_str() {
            "[i7]" => &mut kit.i7_indexes,
            "[i5]" => &mut kit.i5_indexes,
            other => {
                debug!("skipping index kit section {other}");
                continue;
            }
        };
        let (headers, rows) = csv_rows(&lines.join("\n"))?;
        for row in &rows {
            let (Some(name), Some(seq)) = (
                field(&headers, row, SECTION_NAME),
                field(&headers, row, SECTION_SEQUENCE),
            ) else {
                continue;
            };
            let well = field(&headers, row, WELL);
            target.push(index(name, seq, well, line_of(row, start))?);
        }
    }
    Ok(kit)
}

/// Illumina kit template: an `[IndexKit]` block of tab-separated key/value
/// lines and an `[Indices]` block of name, sequence and index number
/// (1 for i7, 2 for i5). Pairs are formed by matching names.
fn parse_template_tsv(
    text: &str,
    kit_name: &str,
    mode: Option<IndexMode>,
) -> Result<IndexKit, KitParseError> {
    let mut name = kit_name.to_string();
    let mut version = String::from("1.0");
    let mut description = String::new();
    let mut i7 = Vec::new();
    let mut i5 = Vec::new();
    let mut section = "";

    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with('[') {
            section = line.trim_matches(|c| c == '[' || c == ']');
            continue;
        }
        let parts: Vec<&str> = line.split('\t').map(str::trim).collect();
        match (section, parts.as_slice()) {
            ("IndexKit", [key, value, ..]) => match *key {
                "Name" => name = value.to_string(),
                "Version" => version = value.to_string(),
                "Description" => description = value.to_string(),
                _ => {}
            },
            ("Indices", [entry, seq, number, ..]) => {
                let entry = (entry.to_string(), seq.to_string(), i as u64 + 1);
                match *number {
                    "1" => i7.push(entry),
                    "2" => i5.push(entry),
                    _ => {}
                }
            }
            _ => {}
        }
    }

    let mode = mode.unwrap_or(if i5.is_empty() {
        IndexMode::Single
    } else {
        IndexMode::UniqueDual
    });
    let mut kit = IndexKit::new(&name, mode);
    kit.version = version;
    kit.description = description;

    let build = |entries: &[(String, String, u64)]| -> Result<Vec<Index>, KitParseError> {
        entries
            .iter()
            .map(|(name, seq, line)| index(name, seq, None, *line))
            .collect()
    };
    match mode {
        IndexMode::Single => kit.i7_indexes = build(&i7)?,
        IndexMode::Combinatorial => {
            kit.i7_indexes = build(&i7)?;
            kit.i5_indexes = build(&i5)?;
        }
        IndexMode::UniqueDual => {
            let i5 = build(&i5)?;
            for index1 in build(&i7)? {
                kit.index_pairs.push(IndexPair {
                    name: index1.name.clone(),
                    index2: i5.iter().find(|i| i.name == index1.name).cloned(),
                    index1,
                    well_position: None,
                });
            }
        }
    }
    Ok(kit)
}

/// Parse an index kit. `kit_name` names kits whose file carries no name;
/// `mode` overrides the mode found in or inferred from the file. The
/// version is normalized and a kit without any index is rejected.
pub fn parse_index_kit(
    text: &str,
    format: KitFormat,
    kit_name: &str,
    mode: Option<IndexMode>,
) -> Result<IndexKit, KitParseError> {
    let mut kit = match format {
        KitFormat::Csv => {
            let sectioned = text
                .lines()
                .any(|line| line.trim().eq_ignore_ascii_case("[i7]"));
            if sectioned {
                parse_sectioned_csv(text, kit_name, mode)?
            } else {
                parse_simple_csv(text, kit_name, mode)?
            }
        }
        KitFormat::Tsv => parse_template_tsv(text, kit_name, mode)?,
        KitFormat::Json => serde_json::from_str(text)?,
        KitFormat::Toml => toml::from_str(text)?,
    };
    if kit.name.is_empty() {
        kit.name = kit_name.to_string();
    }
    if let Some(mode) = mode {
        kit.index_mode = mode;
    }
    kit.version = normalize_version(&kit.version)?;
    if kit.is_empty() {
        return Err(KitParseError::Empty(kit.name));
    }
    Ok(kit)
}

/// Load a kit file, choosing the layout from the extension or, failing
/// that, the content. The file stem names kits that carry no name.
pub fn load_index_kit(path: &Path, mode: Option<IndexMode>) -> anyhow::Result<IndexKit> {
    let text = std::fs::read_to_string(path).with_context(|| path.display().to_string())?;
    let format = match KitFormat::from_path(path) {
        Some(format) => format,
        None if path.extension().is_none() => KitFormat::detect(&text),
        None => return Err(KitParseError::UnknownFormat(path.display().to_string()).into()),
    };
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let kit = parse_index_kit(&text, format, &stem, mode)
        .with_context(|| path.display().to_string())?;
    info!(
        "loaded index kit '{}' {} ({}, {} entries)",
        kit.name,
        kit.version,
        kit.index_mode,
        kit.len()
    );
    Ok(kit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use pretty_assertions::assert_eq;
    use run_types::IndexRead;
    use std::io::Write;

    fn names(indexes: &[Index]) -> Vec<&str> {
        indexes.iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn test_simple_csv_dual() -> Result<()> {
        let text = "Name,I7_Name,Index,i5_name,Index2,Well\n\
                    UDI01,D701,attactcg,D501,TATAGCCT,A01\n\
                    ,D702,TCCGGAGA,D502,ATAGAGGC,B01\n\
                    UDI03,,CGCTCATT,,,C01\n";
        let kit = parse_index_kit(text, KitFormat::Csv, "my_kit", None)?;
        assert_eq!(kit.name, "my_kit");
        assert_eq!(kit.version, "1.0");
        assert_eq!(kit.index_mode, IndexMode::UniqueDual);
        assert_eq!(kit.index_pairs.len(), 2);

        let first = &kit.index_pairs[0];
        assert_eq!(first.name, "UDI01");
        assert_eq!(first.index1.name, "D701");
        assert_eq!(first.index1.sequence.as_str(), "ATTACTCG");
        assert_eq!(first.index2.as_ref().map(|i| i.name.as_str()), Some("D501"));
        assert_eq!(first.well_position.as_deref(), Some("A01"));

        let third = &kit.index_pairs[1];
        assert_eq!(third.index1.name, "UDI03");
        assert_eq!(third.index2, None);
        Ok(())
    }

    #[test]
    fn test_simple_csv_single_and_forced_mode() -> Result<()> {
        let text = "sample_id,sequence\nA1,ACGTACGT\nA2,TGCATGCA\n";
        let kit = parse_index_kit(text, KitFormat::Csv, "single", None)?;
        assert_eq!(kit.index_mode, IndexMode::Single);
        assert_eq!(names(&kit.i7_indexes), vec!["A1", "A2"]);

        let text = "name,i7_name,index,i5_name,index2\n\
                    P1,A,ACGTACGT,01,TTTTCCCC\n\
                    P2,A,ACGTACGT,02,GGGGAAAA\n";
        let kit = parse_index_kit(text, KitFormat::Csv, "combo", Some(IndexMode::Combinatorial))?;
        assert_eq!(names(&kit.i7_indexes), vec!["A"]);
        assert_eq!(names(&kit.i5_indexes), vec!["01", "02"]);
        Ok(())
    }

    #[test]
    fn test_sectioned_csv() -> Result<()> {
        let text = "[i7]\nname,sequence\nA,ATTACTCG\nB,TCCGGAGA\n\n[I5]\nName,Sequence,Well\n01,TATAGCCT,A01\n";
        let kit = parse_index_kit(text, KitFormat::Csv, "combo", None)?;
        assert_eq!(kit.index_mode, IndexMode::Combinatorial);
        assert_eq!(names(&kit.i7_indexes), vec!["A", "B"]);
        assert_eq!(
            kit.index(IndexRead::I5, "01").and_then(|i| i.well_position.as_deref()),
            Some("A01")
        );
        Ok(())
    }

    #[test]
    fn test_template_tsv() -> Result<()> {
        let text = "[IndexKit]\nName\tNextera XT\nVersion\t2\nDescription\tv2 set A\n\n\
                    [Indices]\nName\tSequence\tIndexNumber\n\
                    N701\tTAAGGCGA\t1\nN702\tCGTACTAG\t1\nN701\tTAGATCGC\t2\n";
        assert_eq!(KitFormat::detect(text), KitFormat::Tsv);
        let kit = parse_index_kit(text, KitFormat::Tsv, "file_stem", None)?;
        assert_eq!(kit.name, "Nextera XT");
        assert_eq!(kit.version, "2.0");
        assert_eq!(kit.description, "v2 set A");
        assert_eq!(kit.index_mode, IndexMode::UniqueDual);
        assert_eq!(kit.index_pairs.len(), 2);
        assert_eq!(
            kit.pair("N701").and_then(|p| p.index2.as_ref()).map(|i| i.sequence.as_str()),
            Some("TAGATCGC")
        );
        assert_eq!(kit.pair("N702").and_then(|p| p.index2.as_ref()), None);
        Ok(())
    }

    #[test]
    fn test_json_and_toml() -> Result<()> {
        let json = r#"{"version": "1.2.3", "index_mode": "unique_dual",
            "index_pairs": [{"name": "UDI0001",
                "index1": {"name": "i7-001", "sequence": "ATTACTCG"},
                "index2": {"name": "i5-001", "sequence": "TATAGCCT"}}],
            "default_index1_cycles": 10}"#;
        assert_eq!(KitFormat::detect(json), KitFormat::Json);
        let kit = parse_index_kit(json, KitFormat::Json, "from_file", None)?;
        assert_eq!(kit.name, "from_file");
        assert_eq!(kit.version, "1.2.3");
        assert_eq!(kit.default_index1_cycles, Some(10));

        let toml = "name = \"Set B\"\nversion = 3\nindex_mode = \"single\"\n\n\
                    [[i7_indexes]]\nname = \"D701\"\nsequence = \"ATTACTCG\"\n";
        assert_eq!(KitFormat::detect(toml), KitFormat::Toml);
        let kit = parse_index_kit(toml, KitFormat::Toml, "x", None)?;
        assert_eq!(kit.name, "Set B");
        assert_eq!(kit.version, "3.0");
        assert_eq!(kit.index_mode, IndexMode::Single);
        Ok(())
    }

    #[test]
    fn test_errors() {
        let bad_seq = "name,index\nA1,ACGTXCGT\n";
        assert!(matches!(
            parse_index_kit(bad_seq, KitFormat::Csv, "k", None),
            Err(KitParseError::InvalidSequence { line: 2, ref name, .. }) if name == "A1"
        ));
        assert!(matches!(
            parse_index_kit("name,index\n,\n", KitFormat::Csv, "k", None),
            Err(KitParseError::Empty(ref name)) if name == "k"
        ));
        assert!(matches!(
            parse_index_kit(r#"{"version": "v1", "i7_indexes": []}"#, KitFormat::Json, "k", None),
            Err(KitParseError::InvalidVersion(_))
        ));
    }

    #[test]
    fn test_normalize_version() {
        assert_eq!(normalize_version(" 1 ").ok(), Some("1.0".to_string()));
        assert_eq!(normalize_version("2.1").ok(), Some("2.1".to_string()));
        assert_eq!(normalize_version("2.1.3").ok(), Some("2.1.3".to_string()));
        assert!(normalize_version("").is_err());
        assert!(normalize_version("1.2.3.4").is_err());
    }

    #[test]
    fn test_load_file() -> Result<()> {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile()?;
        write!(file, "name,index\nD701,ATTACTCG\n")?;
        let kit = load_index_kit(file.path(), None)?;
        assert_eq!(kit.i7_indexes.len(), 1);
        assert!(!kit.name.is_empty());

        let other = tempfile::Builder::new().suffix(".xlsx").tempfile()?;
        assert!(load_index_kit(other.path(), None).is_err());
        Ok(())
    }
}
