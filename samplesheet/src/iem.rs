//! Illumina Experiment Manager sample sheet (v1), for instruments that
//! predate BCL Convert v2 sheets.

use crate::sheet::SheetWriter;
use anyhow::{bail, Result};
use log::info;
use run_types::{InstrumentCatalog, SequencingRun};
use std::io::Write;

const IEM_FILE_VERSION: &str = "4";

fn write_header<W: Write>(sheet: &mut SheetWriter<W>, run: &SequencingRun) -> Result<()> {
    sheet.section("Header")?;
    sheet.row(["IEMFileVersion", IEM_FILE_VERSION])?;
    if !run.created_by.is_empty() {
        sheet.row(["Investigator Name", run.created_by.as_str()])?;
    }
    if !run.run_name.is_empty() {
        sheet.row(["Experiment Name", run.run_name.as_str()])?;
    }
    // date part of an ISO 8601 timestamp
    if let Some(date) = run
        .created_at
        .as_deref()
        .and_then(|ts| ts.split(['T', ' ']).next())
        .filter(|d| !d.is_empty())
    {
        sheet.row(["Date", date])?;
    }
    sheet.row(["Workflow", "GenerateFASTQ"])?;
    sheet.row(["Application", "FASTQ Only"])?;
    if !run.run_description.is_empty() {
        sheet.row(["Description", run.run_description.as_str()])?;
    }
    sheet.row(["Chemistry", "Default"])?;
    sheet.row(["Custom_UUID", run.id.as_str()])?;
    sheet.end_section()
}

/// Write the IEM v1 sample sheet for `run`. Only instruments flagged with
/// `samplesheet_v1` in the catalog are accepted. The i5 is written the way
/// the instrument reads it.
pub fn write_samplesheet_v1<W: Write>(
    run: &SequencingRun,
    catalog: &InstrumentCatalog,
    writer: W,
) -> Result<()> {
    if !catalog.supports_samplesheet_v1(&run.instrument) {
        bail!(
            "instrument '{}' does not take v1 sample sheets",
            run.instrument
        );
    }
    let i5_read = catalog.i5_orientation(&run.instrument);

    let mut sheet = SheetWriter::new(writer);
    write_header(&mut sheet, run)?;

    sheet.section("Reads")?;
    if let Some(cycles) = run.run_cycles {
        sheet.row([cycles.read1.to_string()])?;
        if cycles.read2 > 0 {
            sheet.row([cycles.read2.to_string()])?;
        }
    }
    sheet.end_section()?;

    sheet.section("Settings")?;
    sheet.row(["ReverseComplement", "0"])?;
    sheet.row([
        "BarcodeMismatchesIndex1".to_string(),
        run.barcode_mismatches_index1.to_string(),
    ])?;
    sheet.row([
        "BarcodeMismatchesIndex2".to_string(),
        run.barcode_mismatches_index2.to_string(),
    ])?;
    sheet.end_section()?;

    let has_lanes = run.samples.iter().any(|s| !s.lanes.is_empty());
    sheet.section("Data")?;
    let mut columns = Vec::new();
    if has_lanes {
        columns.push("Lane");
    }
    columns.extend([
        "Sample_ID",
        "Sample_Name",
        "Sample_Project",
        "index",
        "index2",
        "Description",
    ]);
    sheet.row(&columns)?;

    let mut rows = 0;
    for sample in &run.samples {
        let i7 = sample.i7().map(ToString::to_string).unwrap_or_default();
        let i5 = sample
            .i5()
            .map(|seq| i5_read.as_read(seq).to_string())
            .unwrap_or_default();
        let lanes: Vec<Option<usize>> = if sample.lanes.is_empty() {
            vec![None]
        } else {
            sample.lanes.iter().copied().map(Some).collect()
        };
        for lane in lanes {
            let mut row = Vec::with_capacity(columns.len());
            if has_lanes {
                row.push(lane.map(|l| l.to_string()).unwrap_or_default());
            }
            row.extend([
                sample.sample_id.clone(),
                sample.sample_name.clone(),
                sample.project.clone(),
                i7.clone(),
                i5.clone(),
                sample.description.clone(),
            ]);
            sheet.row(&row)?;
            rows += 1;
        }
    }
    sheet.end_section()?;
    sheet.finish()?;
    info!(
        "wrote v1 sample sheet for {} samples ({rows} data rows)",
        run.samples.len()
    );
    Ok(())
}

/// [`write_samplesheet_v1`] into a string.
pub fn samplesheet_v1_string(run: &SequencingRun, catalog: &InstrumentCatalog) -> Result<String> {
    let mut buf = Vec::new();
    write_samplesheet_v1(run, catalog, &mut buf)?;
    Ok(String::from_utf8(buf)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use run_types::{I5Orientation, RunCycles, Sample};

    fn miseq_run() -> Result<SequencingRun> {
        let mut run = SequencingRun::new("MiSeq", "v3");
        run.id = "run-0002".to_string();
        run.run_name = "MiSeq Test Run".to_string();
        run.run_description = "Test, with comma".to_string();
        run.created_by = "testuser".to_string();
        run.created_at = Some("2025-06-15T10:30:00Z".to_string());
        run.run_cycles = Some(RunCycles {
            read1: 150,
            read2: 150,
            index1: 10,
            index2: 10,
        });
        let mut s1 = Sample::new("Sample_001")
            .with_index1("ATTACTCG")?
            .with_index2("TATAGCCT")?;
        s1.sample_name = "Sample One".to_string();
        s1.project = "ProjectA".to_string();
        s1.description = "first sample".to_string();
        let mut s2 = Sample::new("Sample_002").with_index1("TCCGGAGA")?;
        s2.sample_name = "Sample Two".to_string();
        s2.project = "ProjectA".to_string();
        run.samples = vec![s1, s2];
        Ok(run)
    }

    #[test]
    fn test_miseq_sheet() -> Result<()> {
        let catalog = InstrumentCatalog::builtin()?;
        let expected = "\
[Header]
IEMFileVersion,4
Investigator Name,testuser
Experiment Name,MiSeq Test Run
Date,2025-06-15
Workflow,GenerateFASTQ
Application,FASTQ Only
Description,\"Test, with comma\"
Chemistry,Default
Custom_UUID,run-0002

[Reads]
150
150

[Settings]
ReverseComplement,0
BarcodeMismatchesIndex1,1
BarcodeMismatchesIndex2,1

[Data]
Sample_ID,Sample_Name,Sample_Project,index,index2,Description
Sample_001,Sample One,ProjectA,ATTACTCG,TATAGCCT,first sample
Sample_002,Sample Two,ProjectA,TCCGGAGA,,

";
        assert_eq!(samplesheet_v1_string(&miseq_run()?, &catalog)?, expected);
        Ok(())
    }

    #[test]
    fn test_lanes_and_reverse_complement() -> Result<()> {
        let mut catalog = InstrumentCatalog::builtin()?;
        let mut run = miseq_run()?;
        run.instrument = "NovaSeq 6000".to_string();
        run.created_by.clear();
        run.created_at = None;
        run.run_cycles = Some(RunCycles {
            read1: 151,
            read2: 0,
            index1: 8,
            index2: 8,
        });
        run.samples[0].lanes = vec![1, 2];
        run.samples.truncate(1);

        let sheet = samplesheet_v1_string(&run, &catalog)?;
        assert!(!sheet.contains("Investigator Name"));
        assert!(!sheet.contains("Date,"));
        assert!(sheet.contains("[Reads]\n151\n\n"));
        assert!(sheet.ends_with(
            "[Data]\n\
             Lane,Sample_ID,Sample_Name,Sample_Project,index,index2,Description\n\
             1,Sample_001,Sample One,ProjectA,ATTACTCG,TATAGCCT,first sample\n\
             2,Sample_001,Sample One,ProjectA,ATTACTCG,TATAGCCT,first sample\n\n"
        ));

        if let Some(def) = catalog.instruments.get_mut("NovaSeq 6000") {
            def.i5_read_orientation = I5Orientation::ReverseComplement;
        }
        let sheet = samplesheet_v1_string(&run, &catalog)?;
        assert!(sheet.contains("\n1,Sample_001,Sample One,ProjectA,ATTACTCG,AGGCTATA,"));
        Ok(())
    }

    #[test]
    fn test_unsupported_instrument() -> Result<()> {
        let catalog = InstrumentCatalog::builtin()?;
        let mut run = miseq_run()?;
        run.instrument = "NovaSeq X Series".to_string();
        let err = samplesheet_v1_string(&run, &catalog).unwrap_err();
        assert_eq!(
            err.to_string(),
            "instrument 'NovaSeq X Series' does not take v1 sample sheets"
        );
        Ok(())
    }
}
