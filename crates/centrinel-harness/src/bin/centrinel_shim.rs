//! CLI entrypoint for the Centrinel shim tooling.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use centrinel_core::cgen::Rewriter;
use centrinel_core::{FeatureSentinels, ShimConfig};
use centrinel_harness::structured_log::{ArtifactIndex, LogEmitter, Stage, validate_log_file};
use centrinel_harness::{
    HarnessError, output_paths, rewrite_file, verify_contracts, write_header, write_rewritten,
};

/// Analysis-time shim tooling.
#[derive(Debug, Parser)]
#[command(name = "centrinel-shim")]
#[command(about = "Header emission, __sync rewriting and contract checks for the Centrinel shim")]
struct Cli {
    /// Shim configuration JSON (defaults to the build defaults plus environment).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Structured JSONL log path (if omitted, logging is discarded).
    #[arg(long, global = true)]
    log: Option<PathBuf>,
    /// Run identifier used in trace IDs.
    #[arg(long, global = true, default_value = "local")]
    run_id: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render the inclusion-point header.
    Header {
        /// Output path (if omitted, prints to stdout).
        #[arg(long)]
        output: Option<PathBuf>,
        /// Artifact index JSON path.
        #[arg(long)]
        artifact_index: Option<PathBuf>,
    },
    /// Rewrite __sync built-in call sites in C sources.
    Rewrite {
        /// C source files.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Output directory; rewritten files keep their names. If omitted,
        /// a single input is printed to stdout.
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Rewrite report JSON path.
        #[arg(long)]
        report: Option<PathBuf>,
        /// Artifact index JSON path.
        #[arg(long)]
        artifact_index: Option<PathBuf>,
    },
    /// Check every normalized built-in against std atomics.
    Verify {
        /// Report JSON path (if omitted, prints to stdout).
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the sentinel facts and effective configuration as JSON.
    Sentinels,
    /// Check a structured JSONL log written by an earlier run.
    ValidateLog {
        /// Log file to check.
        path: PathBuf,
    },
}

fn load_config(path: Option<&Path>) -> Result<ShimConfig, HarnessError> {
    match path {
        Some(path) => Ok(ShimConfig::from_file(path)?),
        None => Ok(ShimConfig::from_env()),
    }
}

fn open_log(path: Option<&Path>, stage: Stage, run_id: &str) -> Result<LogEmitter, HarnessError> {
    match path {
        Some(path) => Ok(LogEmitter::to_file(path, stage, run_id)?),
        None => Ok(LogEmitter::to_sink(stage, run_id)),
    }
}

fn write_index(index: &ArtifactIndex, path: Option<&Path>) -> Result<(), HarnessError> {
    if let Some(path) = path {
        std::fs::write(path, index.to_json()?)?;
    }
    Ok(())
}

fn main() -> Result<(), HarnessError> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Header {
            output,
            artifact_index,
        } => {
            let mut log = open_log(cli.log.as_deref(), Stage::Header, &cli.run_id)?;
            let mut index = ArtifactIndex::new(&cli.run_id);
            let text = write_header(&config, output.as_deref(), &mut log, &mut index)?;
            if output.is_none() {
                print!("{text}");
            }
            log.flush()?;
            write_index(&index, artifact_index.as_deref())?;
        }
        Command::Rewrite {
            inputs,
            output_dir,
            report,
            artifact_index,
        } => {
            if output_dir.is_none() && inputs.len() > 1 {
                return Err(HarnessError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "--output-dir is required with more than one input",
                )));
            }
            let mut log = open_log(cli.log.as_deref(), Stage::Rewrite, &cli.run_id)?;
            let mut index = ArtifactIndex::new(&cli.run_id);
            let mut rewriter = Rewriter::new(config);
            let mut reports = serde_json::Map::new();
            let outputs = match &output_dir {
                Some(dir) => {
                    let paths = output_paths(&inputs, dir)?;
                    std::fs::create_dir_all(dir)?;
                    Some(paths)
                }
                None => None,
            };

            for (n, input) in inputs.iter().enumerate() {
                let run = rewrite_file(&mut rewriter, input, &mut log)?;
                eprintln!(
                    "{}: rewritten={} skipped={}",
                    input.display(),
                    run.report.total_rewritten(),
                    run.report.skipped.len()
                );
                match &outputs {
                    Some(paths) => write_rewritten(&run, &paths[n], &mut index)?,
                    None => print!("{}", run.text),
                }
                reports.insert(
                    input.display().to_string(),
                    serde_json::to_value(&run.report)?,
                );
            }

            if let Some(path) = &report {
                let json = serde_json::to_string_pretty(&reports)?;
                std::fs::write(path, &json)?;
                index.add_bytes(path.display().to_string(), "rewrite_report", json.as_bytes());
            }
            log.flush()?;
            write_index(&index, artifact_index.as_deref())?;
        }
        Command::Verify { output } => {
            let mut log = open_log(cli.log.as_deref(), Stage::Verify, &cli.run_id)?;
            let report = verify_contracts(&mut log)?;
            log.flush()?;
            let json = report.to_json()?;
            match output {
                Some(path) => std::fs::write(path, json)?,
                None => println!("{json}"),
            }
            eprintln!(
                "Contract matrix: total={}, passed={}, failed={}",
                report.total, report.passed, report.failed
            );
            if !report.is_clean() {
                return Err(HarnessError::ContractFailures {
                    failed: report.failed,
                    total: report.total,
                });
            }
        }
        Command::Sentinels => {
            let configured = FeatureSentinels {
                sync_atomics: config.normalize_atomics,
                ..FeatureSentinels::build()
            };
            let doc = serde_json::json!({
                "sentinels": FeatureSentinels::current(),
                "directives": configured.directives(),
                "config": config,
                "process_cross_region_policy": centrinel_membrane::cross_region_policy(),
            });
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        Command::ValidateLog { path } => {
            let (lines, errors) = validate_log_file(&path)?;
            for err in &errors {
                eprintln!("line {}: {}: {}", err.line_number, err.field, err.message);
            }
            eprintln!("{}: {lines} entries, {} error(s)", path.display(), errors.len());
            if !errors.is_empty() {
                return Err(HarnessError::InvalidLog {
                    path: path.display().to_string(),
                    lines,
                    errors: errors.len(),
                });
            }
        }
    }
    Ok(())
}
