//! Structured logging for shim runs.
//!
//! Provides:
//! - [`LogEntry`]: one JSONL record with required and optional fields.
//! - [`ArtifactIndex`]: lists the files a run produced, with SHA-256 digests.
//! - [`LogEmitter`]: writes JSONL lines to a file, stdout, or a buffer.
//! - [`validate_log_line`] / [`validate_log_file`]: schema checks.

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ---------------------------------------------------------------------------
// Log entry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    const NAMES: [&'static str; 5] = ["trace", "debug", "info", "warn", "error"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
    Skip,
    Error,
}

impl Outcome {
    const NAMES: [&'static str; 4] = ["pass", "fail", "skip", "error"];
}

/// Which tool stage produced the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Header,
    Rewrite,
    Verify,
}

impl Stage {
    const NAMES: [&'static str; 3] = ["header", "rewrite", "verify"];
}

/// Canonical structured log entry.
///
/// Required fields: `timestamp`, `trace_id`, `level`, `event`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub trace_id: String,
    pub level: LogLevel,
    pub event: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    /// C name of the built-in concerned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub builtin: Option<String>,
    /// Rust type a contract case ran on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
    /// 1-based source line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_refs: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl LogEntry {
    #[must_use]
    pub fn new(trace_id: impl Into<String>, level: LogLevel, event: impl Into<String>) -> Self {
        Self {
            timestamp: now_utc(),
            trace_id: trace_id.into(),
            level,
            event: event.into(),
            stage: None,
            builtin: None,
            width: None,
            source_path: None,
            line: None,
            outcome: None,
            duration_ms: None,
            artifact_refs: None,
            details: None,
        }
    }

    #[must_use]
    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = Some(stage);
        self
    }

    #[must_use]
    pub fn with_builtin(mut self, builtin: impl Into<String>) -> Self {
        self.builtin = Some(builtin.into());
        self
    }

    #[must_use]
    pub fn with_width(mut self, width: impl Into<String>) -> Self {
        self.width = Some(width.into());
        self
    }

    /// Set the source file and, optionally, the line within it.
    #[must_use]
    pub fn with_source(mut self, path: impl Into<String>, line: Option<usize>) -> Self {
        self.source_path = Some(path.into());
        self.line = line;
        self
    }

    #[must_use]
    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    #[must_use]
    pub fn with_duration_ms(mut self, ms: u64) -> Self {
        self.duration_ms = Some(ms);
        self
    }

    #[must_use]
    pub fn with_artifacts(mut self, refs: Vec<String>) -> Self {
        self.artifact_refs = Some(refs);
        self
    }

    /// Set free-form details.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Serialize to a single JSONL line (no trailing newline).
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ---------------------------------------------------------------------------
// Artifact index
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactEntry {
    pub path: String,
    pub kind: String,
    pub sha256: String,
    pub size_bytes: u64,
}

/// Files produced by one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactIndex {
    pub index_version: u32,
    pub run_id: String,
    pub generated_utc: String,
    pub artifacts: Vec<ArtifactEntry>,
}

impl ArtifactIndex {
    #[must_use]
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            index_version: 1,
            run_id: run_id.into(),
            generated_utc: now_utc(),
            artifacts: Vec::new(),
        }
    }

    /// Record an in-memory artifact.
    pub fn add_bytes(
        &mut self,
        path: impl Into<String>,
        kind: impl Into<String>,
        bytes: &[u8],
    ) -> &mut Self {
        self.artifacts.push(ArtifactEntry {
            path: path.into(),
            kind: kind.into(),
            sha256: sha256_hex(bytes),
            size_bytes: bytes.len() as u64,
        });
        self
    }

    /// Record a file already written to disk.
    pub fn add_file(&mut self, path: &Path, kind: impl Into<String>) -> std::io::Result<&mut Self> {
        let bytes = std::fs::read(path)?;
        Ok(self.add_bytes(path.display().to_string(), kind, &bytes))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

// ---------------------------------------------------------------------------
// Log emitter
// ---------------------------------------------------------------------------

/// Writes structured JSONL log entries.
pub struct LogEmitter {
    writer: Box<dyn Write>,
    seq: u64,
    stage: Stage,
    run_id: String,
}

impl LogEmitter {
    pub fn to_file(path: &Path, stage: Stage, run_id: &str) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::with_writer(
            Box::new(std::io::BufWriter::new(file)),
            stage,
            run_id,
        ))
    }

    /// Discard output; trace IDs are still generated.
    #[must_use]
    pub fn to_sink(stage: Stage, run_id: &str) -> Self {
        Self::with_writer(Box::new(std::io::sink()), stage, run_id)
    }

    /// Write into a caller-owned buffer (for tests).
    #[must_use]
    pub fn to_writer(writer: Box<dyn Write>, stage: Stage, run_id: &str) -> Self {
        Self::with_writer(writer, stage, run_id)
    }

    fn with_writer(writer: Box<dyn Write>, stage: Stage, run_id: &str) -> Self {
        Self {
            writer,
            seq: 0,
            stage,
            run_id: run_id.to_string(),
        }
    }

    fn stage_name(&self) -> &'static str {
        match self.stage {
            Stage::Header => "header",
            Stage::Rewrite => "rewrite",
            Stage::Verify => "verify",
        }
    }

    /// Next trace ID: `<stage>::<run_id>::<seq>`.
    fn next_trace_id(&mut self) -> String {
        self.seq += 1;
        format!("{}::{}::{:03}", self.stage_name(), self.run_id, self.seq)
    }

    /// Emit a bare entry with an auto-generated trace ID.
    pub fn emit(&mut self, level: LogLevel, event: &str) -> std::io::Result<LogEntry> {
        let trace_id = self.next_trace_id();
        let entry = LogEntry::new(trace_id, level, event).with_stage(self.stage);
        let line = entry.to_jsonl().map_err(std::io::Error::other)?;
        writeln!(self.writer, "{line}")?;
        Ok(entry)
    }

    /// Emit a populated entry, filling in trace ID and stage if unset.
    pub fn emit_entry(&mut self, mut entry: LogEntry) -> std::io::Result<()> {
        if entry.trace_id.is_empty() {
            entry.trace_id = self.next_trace_id();
        }
        if entry.stage.is_none() {
            entry.stage = Some(self.stage);
        }
        let line = entry.to_jsonl().map_err(std::io::Error::other)?;
        writeln!(self.writer, "{line}")
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct LogValidationError {
    pub line_number: usize,
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for LogValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "line {}: field '{}': {}",
            self.line_number, self.field, self.message
        )
    }
}

fn check_enum(
    obj: &serde_json::Map<String, serde_json::Value>,
    field: &str,
    allowed: &[&str],
    line_number: usize,
    errors: &mut Vec<LogValidationError>,
) {
    if let Some(value) = obj.get(field).and_then(|v| v.as_str())
        && !allowed.contains(&value)
    {
        errors.push(LogValidationError {
            line_number,
            field: field.to_string(),
            message: format!("invalid {field}: '{value}'"),
        });
    }
}

/// Validate a single JSONL line against the schema.
pub fn validate_log_line(
    line: &str,
    line_number: usize,
) -> Result<LogEntry, Vec<LogValidationError>> {
    let mut errors = Vec::new();

    let value: serde_json::Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            errors.push(LogValidationError {
                line_number,
                field: "<json>".to_string(),
                message: format!("invalid JSON: {e}"),
            });
            return Err(errors);
        }
    };

    let Some(obj) = value.as_object() else {
        errors.push(LogValidationError {
            line_number,
            field: "<root>".to_string(),
            message: "expected JSON object".to_string(),
        });
        return Err(errors);
    };

    for field in ["timestamp", "trace_id", "level", "event"] {
        if !obj.contains_key(field) {
            errors.push(LogValidationError {
                line_number,
                field: field.to_string(),
                message: "required field missing".to_string(),
            });
        }
    }

    check_enum(obj, "level", &LogLevel::NAMES, line_number, &mut errors);
    check_enum(obj, "outcome", &Outcome::NAMES, line_number, &mut errors);
    check_enum(obj, "stage", &Stage::NAMES, line_number, &mut errors);

    if let Some(builtin) = obj.get("builtin").and_then(|v| v.as_str())
        && centrinel_core::SyncBuiltin::from_c_name(builtin).is_none()
    {
        errors.push(LogValidationError {
            line_number,
            field: "builtin".to_string(),
            message: format!("unknown built-in: '{builtin}'"),
        });
    }

    if let Some(trace_id) = obj.get("trace_id").and_then(|v| v.as_str())
        && trace_id.split("::").count() != 3
    {
        errors.push(LogValidationError {
            line_number,
            field: "trace_id".to_string(),
            message: format!(
                "trace_id should follow <stage>::<run_id>::<seq> format, got: '{trace_id}'"
            ),
        });
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    serde_json::from_value::<LogEntry>(value).map_err(|e| {
        vec![LogValidationError {
            line_number,
            field: "<deserialization>".to_string(),
            message: format!("failed to deserialize: {e}"),
        }]
    })
}

/// Validate an entire JSONL file. Returns the non-blank line count and any
/// errors found.
pub fn validate_log_file(path: &Path) -> Result<(usize, Vec<LogValidationError>), std::io::Error> {
    let content = std::fs::read_to_string(path)?;
    let mut all_errors = Vec::new();
    let mut line_count = 0;

    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        line_count += 1;
        if let Err(errs) = validate_log_line(line, i + 1) {
            all_errors.extend(errs);
        }
    }

    Ok((line_count, all_errors))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Civil date for a day count since 1970-01-01 (proleptic Gregorian).
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

fn format_utc(secs: u64, millis: u32) -> String {
    let days = (secs / 86_400) as i64;
    let rem = secs % 86_400;
    let (year, month, day) = civil_from_days(days);
    format!(
        "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}.{millis:03}Z",
        rem / 3600,
        (rem % 3600) / 60,
        rem % 60,
    )
}

fn now_utc() -> String {
    let duration = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    format_utc(duration.as_secs(), duration.subsec_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// `Write` handle onto a shared buffer.
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn log_entry_serializes_required_fields() {
        let entry = LogEntry::new("rewrite::run-1::001", LogLevel::Info, "rewrite_start");
        let json = entry.to_jsonl().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed["timestamp"].is_string());
        assert_eq!(parsed["trace_id"], "rewrite::run-1::001");
        assert_eq!(parsed["level"], "info");
        assert_eq!(parsed["event"], "rewrite_start");
        assert!(parsed.get("stage").is_none());
        assert!(parsed.get("builtin").is_none());
    }

    #[test]
    fn log_entry_with_optional_fields() {
        let entry = LogEntry::new("verify::run-1::002", LogLevel::Error, "case_failed")
            .with_stage(Stage::Verify)
            .with_builtin("__sync_fetch_and_nand")
            .with_width("u16")
            .with_source("src/obj.c", Some(12))
            .with_outcome(Outcome::Fail)
            .with_duration_ms(2)
            .with_artifacts(vec!["report.json".to_string()])
            .with_details(serde_json::json!({"expected": "65523"}));

        let parsed: serde_json::Value = serde_json::from_str(&entry.to_jsonl().unwrap()).unwrap();
        assert_eq!(parsed["stage"], "verify");
        assert_eq!(parsed["builtin"], "__sync_fetch_and_nand");
        assert_eq!(parsed["width"], "u16");
        assert_eq!(parsed["source_path"], "src/obj.c");
        assert_eq!(parsed["line"], 12);
        assert_eq!(parsed["outcome"], "fail");
        assert_eq!(parsed["duration_ms"], 2);
        assert!(parsed["artifact_refs"].is_array());
        assert!(parsed["details"].is_object());
    }

    #[test]
    fn validate_valid_line() {
        let entry = LogEntry::new("header::run-1::001", LogLevel::Info, "header_written")
            .with_stage(Stage::Header);
        let result = validate_log_line(&entry.to_jsonl().unwrap(), 1);
        assert!(result.is_ok(), "valid line should pass: {result:?}");
    }

    #[test]
    fn validate_reports_each_bad_field() {
        let json = r#"{"timestamp":"2026-01-01T00:00:00Z","level":"critical","event":"x","stage":"link","builtin":"__sync_fetch_and_min"}"#;
        let errors = validate_log_line(json, 4).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["trace_id", "level", "stage", "builtin"]);
        assert!(errors[0].to_string().starts_with("line 4: field 'trace_id'"));
    }

    #[test]
    fn validate_invalid_json_and_trace_format() {
        let errors = validate_log_line("not json at all", 1).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "<json>"));

        let json = r#"{"timestamp":"t","trace_id":"no-separator","level":"info","event":"x"}"#;
        let errors = validate_log_line(json, 1).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "trace_id"));
    }

    #[test]
    fn emitter_generates_sequential_trace_ids() {
        let buf = SharedBuf::default();
        let mut emitter = LogEmitter::to_writer(Box::new(buf.clone()), Stage::Rewrite, "run-42");
        let e1 = emitter.emit(LogLevel::Info, "start").unwrap();
        emitter
            .emit_entry(LogEntry::new("", LogLevel::Warn, "skipped").with_source("a.c", Some(3)))
            .unwrap();
        emitter.flush().unwrap();
        assert_eq!(e1.trace_id, "rewrite::run-42::001");

        let text = buf.text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let second = validate_log_line(lines[1], 2).unwrap();
        assert_eq!(second.trace_id, "rewrite::run-42::002");
        assert_eq!(second.stage, Some(Stage::Rewrite));
        assert_eq!(second.line, Some(3));
    }

    #[test]
    fn artifact_index_hashes_content() {
        let mut idx = ArtifactIndex::new("run-001");
        idx.add_bytes("out/centrinel.h", "header", b"abc");
        let parsed: serde_json::Value = serde_json::from_str(&idx.to_json().unwrap()).unwrap();
        assert_eq!(parsed["index_version"], 1);
        assert_eq!(parsed["run_id"], "run-001");
        let artifact = &parsed["artifacts"][0];
        assert_eq!(
            artifact["sha256"],
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(artifact["size_bytes"], 3);
    }

    #[test]
    fn utc_formatting_uses_calendar_dates() {
        assert_eq!(format_utc(0, 0), "1970-01-01T00:00:00.000Z");
        assert_eq!(format_utc(951_782_400, 5), "2000-02-29T00:00:00.005Z");
        assert_eq!(format_utc(1_767_225_599, 999), "2025-12-31T23:59:59.999Z");
    }
}
