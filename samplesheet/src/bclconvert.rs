//! BCL Convert sample sheet, format version 2.

use crate::sheet::SheetWriter;
use anyhow::Result;
use itertools::Itertools;
use log::{info, warn};
use run_types::{
    adjust_for_orientation, compute_override_cycles, infer_run_override_cycles, I5Orientation,
    IndexRead, InstrumentCatalog, Sample, SequencingRun,
};
use std::io::Write;

const FILE_FORMAT_VERSION: &str = "2";

/// Per-sample override string: the stored value, else one computed from the
/// run's cycle plan for indexed samples. Adjusted for how the instrument
/// reads i5.
fn sample_override_cycles(
    sample: &Sample,
    run: &SequencingRun,
    i5_read: I5Orientation,
) -> Option<String> {
    let stored = sample.override_cycles.clone().filter(|s| !s.is_empty());
    let computed = || {
        run.run_cycles
            .as_ref()
            .filter(|_| sample.has_index())
            .map(|cycles| compute_override_cycles(sample, cycles))
    };
    stored
        .or_else(computed)
        .map(|oc| adjust_for_orientation(&oc, i5_read))
}

fn write_header<W: Write>(
    sheet: &mut SheetWriter<W>,
    run: &SequencingRun,
    platform: &str,
) -> Result<()> {
    sheet.section("Header")?;
    sheet.row(["FileFormatVersion", FILE_FORMAT_VERSION])?;
    if !run.run_name.is_empty() {
        sheet.row(["RunName", run.run_name.as_str()])?;
    }
    if !run.run_description.is_empty() {
        sheet.row(["RunDescription", run.run_description.as_str()])?;
    }
    sheet.row(["InstrumentPlatform", platform])?;
    sheet.row(["IndexOrientation", "Forward"])?;
    sheet.row(["Custom_UUID", run.id.as_str()])?;
    sheet.end_section()
}

fn write_reads<W: Write>(sheet: &mut SheetWriter<W>, run: &SequencingRun) -> Result<()> {
    sheet.section("Reads")?;
    if let Some(cycles) = run.run_cycles {
        for (key, value) in [
            ("Read1Cycles", cycles.read1),
            ("Read2Cycles", cycles.read2),
            ("Index1Cycles", cycles.index1),
            ("Index2Cycles", cycles.index2),
        ] {
            sheet.row([key, value.to_string().as_str()])?;
        }
    }
    sheet.end_section()
}

/// Write the v2 sample sheet for `run`. Override strings are stored in
/// forward orientation and only flipped here, for instruments that read i5
/// as the reverse complement.
pub fn write_samplesheet_v2<W: Write>(
    run: &SequencingRun,
    catalog: &InstrumentCatalog,
    writer: W,
) -> Result<()> {
    let instrument = catalog.instrument(&run.instrument);
    if instrument.is_none() {
        warn!(
            "instrument '{}' is not in the catalog (known: {})",
            run.instrument,
            catalog.instrument_names().join(", ")
        );
    }
    let platform = instrument
        .and_then(|i| i.samplesheet_name.as_deref())
        .unwrap_or(run.instrument.as_str());
    let i5_read = catalog.i5_orientation(&run.instrument);
    let i5_sheet = catalog.samplesheet_v2_i5_orientation(&run.instrument);
    let run_override = infer_run_override_cycles(&run.samples, run.run_cycles.as_ref());

    let mut sheet = SheetWriter::new(writer);
    write_header(&mut sheet, run, platform)?;
    write_reads(&mut sheet, run)?;

    sheet.section("BCLConvert_Settings")?;
    if let Some(version) = instrument.and_then(|i| i.bclconvert_version.as_deref()) {
        sheet.row(["SoftwareVersion", version])?;
    }
    sheet.row(["FastqCompressionFormat", "gzip"])?;
    if let Some(run_override) = &run_override {
        sheet.row([
            "OverrideCycles",
            adjust_for_orientation(run_override, i5_read).as_str(),
        ])?;
    }
    sheet.end_section()?;

    let has_lanes = run.samples.iter().any(|s| !s.lanes.is_empty());
    let per_sample_override = run_override.is_none();
    let has_mismatches = run.samples.iter().any(|s| {
        s.barcode_mismatches_index1.is_some() || s.barcode_mismatches_index2.is_some()
    });

    sheet.section("BCLConvert_Data")?;
    let mut columns = Vec::new();
    if has_lanes {
        columns.push("Lane");
    }
    columns.extend(["Sample_ID", "Index", "Index2"]);
    if per_sample_override {
        columns.push("OverrideCycles");
    }
    if has_mismatches {
        columns.extend(["BarcodeMismatchesIndex1", "BarcodeMismatchesIndex2"]);
    }
    sheet.row(&columns)?;

    let mut rows = 0;
    for sample in &run.samples {
        let i7 = sample.i7().map(ToString::to_string).unwrap_or_default();
        let i5 = sample
            .i5()
            .map(|seq| i5_sheet.as_read(seq).to_string())
            .unwrap_or_default();
        let override_cycles = if per_sample_override {
            sample_override_cycles(sample, run, i5_read)
        } else {
            None
        };
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
            row.extend([sample.sample_id.clone(), i7.clone(), i5.clone()]);
            if per_sample_override {
                row.push(override_cycles.clone().unwrap_or_default());
            }
            if has_mismatches {
                row.push(run.mismatches_for(sample, IndexRead::I7).to_string());
                row.push(run.mismatches_for(sample, IndexRead::I5).to_string());
            }
            sheet.row(&row)?;
            rows += 1;
        }
    }
    sheet.end_section()?;
    sheet.finish()?;
    info!(
        "wrote v2 sample sheet for {} samples ({rows} data rows)",
        run.samples.len()
    );
    Ok(())
}

/// [`write_samplesheet_v2`] into a string.
pub fn samplesheet_v2_string(run: &SequencingRun, catalog: &InstrumentCatalog) -> Result<String> {
    let mut buf = Vec::new();
    write_samplesheet_v2(run, catalog, &mut buf)?;
    Ok(String::from_utf8(buf)?)
}
