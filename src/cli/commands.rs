use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::cli::args::Cli;
use crate::cli::menu::prompt_pollutant;
use crate::config::Settings;
use crate::error::{ProcessingError, Result};
use crate::models::{MeasurementRecord, Pollutant, PositionRecord};
use crate::processors::{
    scan_source, JoinSummary, MalformedPolicy, SourceScan, TemporalJoin, ThresholdChecker,
    ThresholdReport,
};
use crate::readers::RecordReader;
use crate::utils::constants::{MEASUREMENT_SOURCE, POSITION_SOURCE};
use crate::utils::progress::ProgressReporter;
use crate::writers::AtomicOutput;

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub output: PathBuf,
    pub join: JoinSummary,
    pub threshold: Option<ThresholdReport>,
}

#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub positions: SourceScan,
    pub measurements: SourceScan,
}

pub fn run(cli: Cli) -> Result<()> {
    let settings = resolve_settings(&cli)?;
    let delimiter = settings.delimiter_byte()?;

    if cli.validate_only {
        let report = validate_inputs(&cli.positions, &cli.measurements, delimiter)?;
        return print_validation(&report, cli.json);
    }

    let output = cli
        .output
        .as_deref()
        .ok_or_else(|| ProcessingError::Config("an output path is required".to_string()))?;
    check_distinct_paths(&cli.positions, &cli.measurements, output)?;

    let pollutant = if cli.interactive {
        let stdin = io::stdin();
        Some(prompt_pollutant(&mut stdin.lock(), &mut io::stdout())?)
    } else {
        cli.pollutant
    };

    let silent = cli.quiet || cli.json;
    let report = join_files(
        &cli.positions,
        &cli.measurements,
        output,
        &settings,
        pollutant,
        silent,
    )?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("\n{}", report.join.summary());
        if let Some(termination) = report
            .join
            .termination
            .as_ref()
            .filter(|t| t.is_malformed())
        {
            eprintln!(
                "Warning: a malformed line in {} stopped the join early",
                termination.side()
            );
        }
        if let Some(threshold) = &report.threshold {
            println!("{}", threshold.summary());
        }
        println!("Output written to {}", report.output.display());
    }

    Ok(())
}

/// Merge config file, environment and command-line overrides.
pub fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load(cli.config.as_deref())?;

    if let Some(spread) = cli.spread {
        settings.max_spread = spread;
    }
    if let Some(delimiter) = cli.delimiter {
        settings.delimiter = delimiter.to_string();
    }
    if cli.no_header {
        settings.output_header = false;
    }
    if cli.strict {
        settings.malformed_policy = MalformedPolicy::Fail;
    }

    Ok(settings)
}

/// Join the two inputs into `output`.
///
/// Both inputs are opened before the output is created, and the output only
/// appears at its final path once the join has completed.
pub fn join_files(
    positions_path: &Path,
    measurements_path: &Path,
    output_path: &Path,
    settings: &Settings,
    pollutant: Option<Pollutant>,
    silent: bool,
) -> Result<RunReport> {
    let delimiter = settings.delimiter_byte()?;

    let mut positions: RecordReader<_, PositionRecord> =
        RecordReader::open(positions_path, delimiter, POSITION_SOURCE)?;
    let mut measurements: RecordReader<_, MeasurementRecord> =
        RecordReader::open(measurements_path, delimiter, MEASUREMENT_SOURCE)?;
    positions.skip_header()?;
    measurements.skip_header()?;

    let mut output = AtomicOutput::create(output_path, delimiter, settings.output_header)?;

    info!(
        positions = %positions_path.display(),
        measurements = %measurements_path.display(),
        output = %output_path.display(),
        "joining files"
    );

    let progress = ProgressReporter::new_spinner("Joining records...", silent);
    let join = TemporalJoin::new(positions, measurements, settings.join_config());

    let (summary, threshold) = match pollutant {
        Some(pollutant) => {
            let mut checker = ThresholdChecker::new(pollutant, &settings.limits);
            let summary =
                join.run_with_progress(&mut (&mut output, &mut checker), Some(&progress))?;
            (summary, Some(checker.report()))
        }
        None => (join.run_with_progress(&mut output, Some(&progress))?, None),
    };

    progress.finish_with_message(&format!("Joined {} records", progress.position()));

    let output = output.commit()?;
    info!(path = %output.display(), records = summary.records_emitted, "output committed");

    Ok(RunReport {
        output,
        join: summary,
        threshold,
    })
}

/// Read both inputs in full and report their line counts and problems.
pub fn validate_inputs(
    positions_path: &Path,
    measurements_path: &Path,
    delimiter: u8,
) -> Result<ValidationReport> {
    let mut positions: RecordReader<_, PositionRecord> =
        RecordReader::open(positions_path, delimiter, POSITION_SOURCE)?;
    let mut measurements: RecordReader<_, MeasurementRecord> =
        RecordReader::open(measurements_path, delimiter, MEASUREMENT_SOURCE)?;
    positions.skip_header()?;
    measurements.skip_header()?;

    Ok(ValidationReport {
        positions: scan_source(&mut positions)?,
        measurements: scan_source(&mut measurements)?,
    })
}

fn print_validation(report: &ValidationReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("=== Input Validation ===");
    println!("{}", report.positions.summary());
    println!("{}", report.measurements.summary());

    if report.positions.is_clean() && report.measurements.is_clean() {
        println!("✅ Both inputs can be joined in full");
    } else {
        println!("⚠️  The join will stop early or pair out-of-order records");
    }

    Ok(())
}

fn check_distinct_paths(positions: &Path, measurements: &Path, output: &Path) -> Result<()> {
    if output == positions || output == measurements {
        return Err(ProcessingError::Config(format!(
            "output path {} is also an input",
            output.display()
        )));
    }
    Ok(())
}
