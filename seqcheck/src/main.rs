//! seqcheck
#![deny(missing_docs)]

use anyhow::{Context, Result};
use clap::{self, Parser};
use env_logger::Builder;
use log::{info, LevelFilter};
use preflight::{validate_with_catalog, ExternalIssue};
use run_types::{IndexMode, IndexSlot, InstrumentCatalog, Sample, SequencingRun};
use samplesheet::{load_index_kit, parse_samples, write_samplesheet_v1, write_samplesheet_v2};
use serde::Serialize;
use std::fs::{read_to_string, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Index validation, override cycles and sample sheet export for planned
/// sequencing runs
#[derive(Parser, Debug)]
#[clap(name = "seqcheck", version)]
struct SeqCheck {
    #[clap(subcommand)]
    subcmd: SubCommand,

    /// Log debug messages
    #[clap(long, short, global = true)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum SubCommand {
    /// Validate a run's samples and indexes and print the result as JSON.
    /// Exits with status 1 when the run could not be approved.
    #[clap(name = "validate")]
    Validate(Validate),

    /// Recompute every sample's override cycles and print the updated run.
    #[clap(name = "override-cycles")]
    OverrideCycles(RunArgs),

    /// Write a BCL Convert v2 or IEM v1 sample sheet.
    #[clap(name = "samplesheet")]
    Samplesheet(Samplesheet),

    /// Parse a pasted sample table and print the samples as JSON.
    #[clap(name = "parse-samples")]
    ParseSamples(ParseSamples),

    /// Read an index kit file and print the kit as JSON.
    #[clap(name = "parse-kit")]
    ParseKit(ParseKit),

    /// Assign index kit entries to consecutive samples and print the updated
    /// run.
    #[clap(name = "assign-index")]
    AssignIndex(AssignIndex),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Run description in JSON
    #[clap(long, value_name = "JSON")]
    run: PathBuf,

    /// Instrument catalog in TOML, replacing the built-in catalog
    #[clap(long, value_name = "TOML")]
    instruments: Option<PathBuf>,

    /// Fill a missing cycle plan with the catalog default for the run's
    /// reagent kit
    #[clap(long)]
    default_cycles: bool,
}

impl RunArgs {
    fn load(&self) -> Result<(SequencingRun, InstrumentCatalog)> {
        let mut run: SequencingRun = serde_json::from_str(&read_path(&self.run)?)
            .with_context(|| self.run.display().to_string())?;
        let catalog = InstrumentCatalog::load_or_builtin(self.instruments.as_deref())?;
        if self.default_cycles && run.run_cycles.is_none() {
            if let Some(kit) = run.reagent_kit_cycles {
                let cycles = catalog.default_cycles(kit);
                info!("using default cycle plan {cycles:?} for a {kit}-cycle kit");
                run.run_cycles = Some(cycles);
            }
        }
        Ok((run, catalog))
    }
}

#[derive(Parser, Debug)]
struct Validate {
    #[clap(flatten)]
    run: RunArgs,

    /// Additional issues raised by other tools, as a JSON list of
    /// {"severity": "error"|"warning", "message": "..."}
    #[clap(long, value_name = "JSON")]
    issues: Option<PathBuf>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum SheetFormat {
    /// Illumina Experiment Manager layout
    V1,
    /// BCL Convert layout
    V2,
}

#[derive(Parser, Debug)]
struct Samplesheet {
    #[clap(flatten)]
    run: RunArgs,

    /// Sample sheet version
    #[clap(long, value_enum, default_value = "v2")]
    format: SheetFormat,

    /// Output path; stdout when absent
    #[clap(long, short, value_name = "CSV")]
    output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ParseKit {
    /// Kit file: .csv, .tsv, .json or .toml
    #[clap(long, value_name = "PATH")]
    input: PathBuf,

    /// unique_dual, combinatorial or single; inferred when absent
    #[clap(long)]
    mode: Option<IndexMode>,
}

#[derive(Parser, Debug)]
struct AssignIndex {
    #[clap(flatten)]
    run: RunArgs,

    #[clap(flatten)]
    kit: ParseKit,

    /// Internal id or sample id of the first sample to assign
    #[clap(long, value_name = "SAMPLE")]
    start: String,

    /// pair, i7 or i5
    #[clap(long, default_value = "pair")]
    slot: IndexSlot,

    /// Kit entry names, assigned in order
    #[clap(required = true)]
    names: Vec<String>,
}

#[derive(Parser, Debug)]
struct ParseSamples {
    /// Tab- or comma-separated sample table
    #[clap(long, value_name = "PATH")]
    input: PathBuf,
}

fn read_path(path: &Path) -> Result<String> {
    read_to_string(path).with_context(|| path.display().to_string())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

fn validate(args: &Validate) -> Result<ExitCode> {
    let (run, catalog) = args.run.load()?;
    let mut result = validate_with_catalog(&run, &catalog);
    if let Some(path) = &args.issues {
        let issues: Vec<ExternalIssue> = serde_json::from_str(&read_path(path)?)
            .with_context(|| path.display().to_string())?;
        result.add_external_issues(issues);
    }
    print_json(&result)?;

    match result.check_approval(&run) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(refused) => {
            info!("run cannot be approved: {refused}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn override_cycles(args: &RunArgs) -> Result<ExitCode> {
    let (mut run, _) = args.load()?;
    run.update_override_cycles();
    print_json(&run)?;
    Ok(ExitCode::SUCCESS)
}

fn write_sheet<W: Write>(
    format: SheetFormat,
    run: &SequencingRun,
    catalog: &InstrumentCatalog,
    out: W,
) -> Result<()> {
    match format {
        SheetFormat::V1 => write_samplesheet_v1(run, catalog, out),
        SheetFormat::V2 => write_samplesheet_v2(run, catalog, out),
    }
}

fn samplesheet(args: &Samplesheet) -> Result<ExitCode> {
    let (run, catalog) = args.run.load()?;
    match &args.output {
        Some(path) => {
            let file = File::create(path).with_context(|| path.display().to_string())?;
            write_sheet(args.format, &run, &catalog, BufWriter::new(file))?;
            info!("sample sheet written to {}", path.display());
        }
        None => write_sheet(args.format, &run, &catalog, std::io::stdout().lock())?,
    }
    Ok(ExitCode::SUCCESS)
}

fn parse(args: &ParseSamples) -> Result<ExitCode> {
    let samples: Vec<Sample> = parse_samples(&read_path(&args.input)?)
        .with_context(|| args.input.display().to_string())?
        .into_iter()
        .map(samplesheet::ParsedSample::into_sample)
        .collect();
    info!("parsed {} samples", samples.len());
    print_json(&samples)?;
    Ok(ExitCode::SUCCESS)
}

fn parse_kit(args: &ParseKit) -> Result<ExitCode> {
    let kit = load_index_kit(&args.input, args.mode)?;
    print_json(&kit)?;
    Ok(ExitCode::SUCCESS)
}

fn assign_index(args: &AssignIndex) -> Result<ExitCode> {
    let (mut run, _) = args.run.load()?;
    let kit = load_index_kit(&args.kit.input, args.kit.mode)?;
    let assigned = run.assign_indexes(&kit, &args.start, args.slot, args.names.as_slice())?;
    if assigned < args.names.len() {
        info!(
            "ran out of samples: {} of {} names assigned",
            assigned,
            args.names.len()
        );
    }
    print_json(&run)?;
    Ok(ExitCode::SUCCESS)
}

fn inner_main() -> Result<ExitCode> {
    let opts = SeqCheck::parse();

    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                buf.timestamp(),
                record.level(),
                record.args()
            )
        })
        .filter(
            None,
            if opts.verbose {
                LevelFilter::Debug
            } else {
                LevelFilter::Info
            },
        )
        .init();

    match &opts.subcmd {
        SubCommand::Validate(args) => validate(args),
        SubCommand::OverrideCycles(args) => override_cycles(args),
        SubCommand::Samplesheet(args) => samplesheet(args),
        SubCommand::ParseSamples(args) => parse(args),
        SubCommand::ParseKit(args) => parse_kit(args),
        SubCommand::AssignIndex(args) => assign_index(args),
    }
}

fn main() -> ExitCode {
    match inner_main() {
        Ok(exit_code) => exit_code,
        Err(err) => {
            eprintln!("ERROR: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
