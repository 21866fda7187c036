//! File-level drivers for the header emitter, the rewriter and the contract
//! matrix, with structured logging of each step.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use centrinel_core::ShimConfig;
use centrinel_core::cgen::{HeaderOptions, RewriteReport, Rewriter, render_header};

use crate::HarnessError;
use crate::contract_matrix::{ContractReport, run_contract_matrix};
use crate::structured_log::{ArtifactIndex, LogEmitter, LogEntry, LogLevel, Outcome, sha256_hex};

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Render the header for `config`, writing it to `output` when given.
pub fn write_header(
    config: &ShimConfig,
    output: Option<&Path>,
    log: &mut LogEmitter,
    index: &mut ArtifactIndex,
) -> Result<String, HarnessError> {
    config.validate()?;
    let text = render_header(&HeaderOptions::from_config(config));
    let mut entry = LogEntry::new("", LogLevel::Info, "header_rendered")
        .with_outcome(Outcome::Pass)
        .with_details(serde_json::json!({
            "normalize_atomics": config.normalize_atomics,
            "managed_region": config.managed_region,
            "sha256": sha256_hex(text.as_bytes()),
        }));
    if let Some(path) = output {
        std::fs::write(path, &text)?;
        index.add_file(path, "header")?;
        entry = entry.with_artifacts(vec![path.display().to_string()]);
    }
    log.emit_entry(entry)?;
    Ok(text)
}

/// Result of rewriting one file.
#[derive(Debug, Clone)]
pub struct RewriteRun {
    pub text: String,
    pub report: RewriteReport,
    pub source_sha256: String,
}

/// Rewrite the C file at `input`, logging every skipped call site.
pub fn rewrite_file(
    rewriter: &mut Rewriter,
    input: &Path,
    log: &mut LogEmitter,
) -> Result<RewriteRun, HarnessError> {
    let start = Instant::now();
    let bytes = std::fs::read(input)?;
    let source_sha256 = sha256_hex(&bytes);
    let source = String::from_utf8(bytes).map_err(|_| HarnessError::NonUtf8Source {
        path: input.display().to_string(),
    })?;
    let path = input.display().to_string();

    let rewritten = rewriter.rewrite(&source);
    for skipped in &rewritten.report.skipped {
        log.emit_entry(
            LogEntry::new("", LogLevel::Warn, "call_site_skipped")
                .with_builtin(skipped.builtin)
                .with_source(path.as_str(), Some(skipped.line))
                .with_outcome(Outcome::Skip)
                .with_details(serde_json::json!({ "reason": skipped.reason.to_string() })),
        )?;
    }
    log.emit_entry(
        LogEntry::new("", LogLevel::Info, "file_rewritten")
            .with_source(path.as_str(), None)
            .with_outcome(if rewritten.report.passthrough {
                Outcome::Skip
            } else {
                Outcome::Pass
            })
            .with_duration_ms(elapsed_ms(start))
            .with_details(serde_json::json!({
                "rewritten": rewritten.report.total_rewritten(),
                "skipped": rewritten.report.skipped.len(),
                "passthrough": rewritten.report.passthrough,
                "source_sha256": source_sha256,
            })),
    )?;

    Ok(RewriteRun {
        text: rewritten.text,
        report: rewritten.report,
        source_sha256,
    })
}

/// Output path under `dir` for each input, keeping its file name.
///
/// Two inputs with the same file name would overwrite each other, so that is
/// an error.
pub fn output_paths(inputs: &[PathBuf], dir: &Path) -> Result<Vec<PathBuf>, HarnessError> {
    let mut seen: BTreeMap<&std::ffi::OsStr, &Path> = BTreeMap::new();
    let mut paths = Vec::with_capacity(inputs.len());
    for input in inputs {
        let name = input.file_name().unwrap_or(input.as_os_str());
        if let Some(first) = seen.insert(name, input.as_path()) {
            return Err(HarnessError::DuplicateOutput {
                name: name.to_string_lossy().into_owned(),
                first: first.display().to_string(),
                second: input.display().to_string(),
            });
        }
        paths.push(dir.join(name));
    }
    Ok(paths)
}

/// Write a rewritten source to `output` and record it in `index`.
pub fn write_rewritten(
    run: &RewriteRun,
    output: &Path,
    index: &mut ArtifactIndex,
) -> Result<(), HarnessError> {
    std::fs::write(output, &run.text)?;
    index.add_file(output, "rewritten_source")?;
    Ok(())
}

/// Run the contract matrix, logging each failing case and a summary.
pub fn verify_contracts(log: &mut LogEmitter) -> Result<ContractReport, HarnessError> {
    let start = Instant::now();
    let report = run_contract_matrix();
    for case in &report.failures {
        log.emit_entry(
            LogEntry::new("", LogLevel::Error, "contract_mismatch")
                .with_builtin(case.builtin)
                .with_width(case.width)
                .with_outcome(Outcome::Fail)
                .with_details(serde_json::to_value(case)?),
        )?;
    }
    let summary_level = if report.is_clean() {
        LogLevel::Info
    } else {
        LogLevel::Error
    };
    log.emit_entry(
        LogEntry::new("", summary_level, "contract_matrix_done")
            .with_outcome(if report.is_clean() {
                Outcome::Pass
            } else {
                Outcome::Fail
            })
            .with_duration_ms(elapsed_ms(start))
            .with_details(serde_json::json!({
                "total": report.total,
                "passed": report.passed,
                "failed": report.failed,
                "widths": report.widths,
            })),
    )?;
    Ok(report)
}
