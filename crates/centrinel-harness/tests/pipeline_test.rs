//! Integration test: file-level rewrite and header emission with logging.

use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use centrinel_core::ShimConfig;
use centrinel_core::cgen::Rewriter;
use centrinel_harness::structured_log::{
    ArtifactIndex, LogEmitter, Outcome, Stage, sha256_hex, validate_log_file, validate_log_line,
};
use centrinel_harness::{
    HarnessError, output_paths, rewrite_file, verify_contracts, write_header, write_rewritten,
};
use centrinel_membrane::RegionId;

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
    fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().unwrap().clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

fn temp_path(prefix: &str, suffix: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("{prefix}-{}-{nanos}{suffix}", std::process::id()))
}

fn enabled() -> ShimConfig {
    ShimConfig {
        normalize_atomics: true,
        ..ShimConfig::default()
    }
}

const SOURCE: &str = "int take(int *p)\n{\n    __sync_synchronize();\n    return __sync_lock_test_and_set(p, 1) == 0 && __sync_fetch_and_or(p);\n}\n";

#[test]
fn rewrite_file_logs_skips_and_summary() {
    let input = temp_path("centrinel-rewrite", ".c");
    std::fs::write(&input, SOURCE).unwrap();

    let buf = SharedBuf::default();
    let mut log = LogEmitter::to_writer(Box::new(buf.clone()), Stage::Rewrite, "t1");
    let mut rewriter = Rewriter::new(enabled());
    let run = rewrite_file(&mut rewriter, &input, &mut log).unwrap();
    log.flush().unwrap();
    std::fs::remove_file(&input).ok();

    assert_eq!(run.source_sha256, sha256_hex(SOURCE.as_bytes()));
    assert_eq!(run.report.total_rewritten(), 2);
    assert_eq!(run.report.skipped.len(), 1);
    assert_eq!(run.text.lines().count(), SOURCE.lines().count());
    assert!(run.text.contains("    ((void)0);\n"));

    let lines = buf.lines();
    assert_eq!(lines.len(), 2);
    let skipped = validate_log_line(&lines[0], 1).unwrap();
    assert_eq!(skipped.event, "call_site_skipped");
    assert_eq!(skipped.builtin.as_deref(), Some("__sync_fetch_and_or"));
    assert_eq!(skipped.line, Some(4));
    assert_eq!(skipped.outcome, Some(Outcome::Skip));
    let done = validate_log_line(&lines[1], 2).unwrap();
    assert_eq!(done.event, "file_rewritten");
    assert_eq!(done.trace_id, "rewrite::t1::002");
    assert_eq!(done.details.unwrap()["rewritten"], 2);
}

#[test]
fn passthrough_is_logged_as_skip() {
    let input = temp_path("centrinel-passthrough", ".c");
    std::fs::write(&input, SOURCE).unwrap();
    let buf = SharedBuf::default();
    let mut log = LogEmitter::to_writer(Box::new(buf.clone()), Stage::Rewrite, "t2");
    let mut rewriter = Rewriter::new(ShimConfig {
        normalize_atomics: false,
        ..ShimConfig::default()
    });
    let run = rewrite_file(&mut rewriter, &input, &mut log).unwrap();
    std::fs::remove_file(&input).ok();

    assert_eq!(run.text, SOURCE);
    let done = validate_log_line(&buf.lines()[0], 1).unwrap();
    assert_eq!(done.outcome, Some(Outcome::Skip));
}

#[test]
fn non_utf8_source_is_an_error() {
    let input = temp_path("centrinel-binary", ".c");
    std::fs::write(&input, [0xFF_u8, 0xFE, 0x00]).unwrap();
    let mut log = LogEmitter::to_sink(Stage::Rewrite, "t3");
    let result = rewrite_file(&mut Rewriter::new(enabled()), &input, &mut log);
    std::fs::remove_file(&input).ok();
    assert!(matches!(result, Err(HarnessError::NonUtf8Source { .. })));
}

#[test]
fn header_is_written_and_indexed() {
    let output = temp_path("centrinel-header", ".h");
    let mut log = LogEmitter::to_sink(Stage::Header, "t4");
    let mut index = ArtifactIndex::new("t4");
    let text = write_header(&enabled(), Some(output.as_path()), &mut log, &mut index).unwrap();
    let on_disk = std::fs::read_to_string(&output).unwrap();
    std::fs::remove_file(&output).ok();

    assert_eq!(text, on_disk);
    assert_eq!(index.artifacts.len(), 1);
    assert_eq!(index.artifacts[0].kind, "header");
    assert_eq!(index.artifacts[0].sha256, sha256_hex(on_disk.as_bytes()));
}

#[test]
fn header_rejects_reserved_region() {
    let config = ShimConfig {
        managed_region: RegionId::UNMANAGED,
        ..enabled()
    };
    let mut log = LogEmitter::to_sink(Stage::Header, "t5");
    let mut index = ArtifactIndex::new("t5");
    let result = write_header(&config, None, &mut log, &mut index);
    assert!(matches!(result, Err(HarnessError::Config(_))));
    assert!(index.artifacts.is_empty());
}

#[test]
fn verify_logs_single_summary_when_clean() {
    let buf = SharedBuf::default();
    let mut log = LogEmitter::to_writer(Box::new(buf.clone()), Stage::Verify, "t6");
    let report = verify_contracts(&mut log).unwrap();
    assert!(report.is_clean());
    let lines = buf.lines();
    assert_eq!(lines.len(), 1);
    let entry = validate_log_line(&lines[0], 1).unwrap();
    assert_eq!(entry.event, "contract_matrix_done");
    assert_eq!(entry.outcome, Some(Outcome::Pass));
}

#[test]
fn file_log_passes_validation() {
    let input = temp_path("centrinel-logged", ".c");
    let log_path = temp_path("centrinel-log", ".jsonl");
    std::fs::write(&input, SOURCE).unwrap();

    let mut log = LogEmitter::to_file(&log_path, Stage::Rewrite, "t7").unwrap();
    rewrite_file(&mut Rewriter::new(enabled()), &input, &mut log).unwrap();
    log.flush().unwrap();

    let (line_count, errors) = validate_log_file(&log_path).unwrap();
    std::fs::remove_file(&input).ok();
    std::fs::remove_file(&log_path).ok();
    assert_eq!(line_count, 2);
    assert!(errors.is_empty(), "{errors:?}");
}

#[test]
fn rewritten_output_is_indexed_from_disk() {
    let input = temp_path("centrinel-indexed", ".c");
    let output = temp_path("centrinel-indexed-out", ".c");
    std::fs::write(&input, SOURCE).unwrap();
    let mut log = LogEmitter::to_sink(Stage::Rewrite, "t8");
    let run = rewrite_file(&mut Rewriter::new(enabled()), &input, &mut log).unwrap();

    let mut index = ArtifactIndex::new("t8");
    write_rewritten(&run, &output, &mut index).unwrap();
    let on_disk = std::fs::read_to_string(&output).unwrap();
    std::fs::remove_file(&input).ok();
    std::fs::remove_file(&output).ok();

    assert_eq!(on_disk, run.text);
    assert_eq!(index.artifacts.len(), 1);
    assert_eq!(index.artifacts[0].kind, "rewritten_source");
    assert_eq!(index.artifacts[0].size_bytes, run.text.len() as u64);
    assert_eq!(index.artifacts[0].sha256, sha256_hex(run.text.as_bytes()));
}

#[test]
fn output_paths_keep_file_names() {
    let inputs = vec![PathBuf::from("src/a.c"), PathBuf::from("lib/b.c")];
    let paths = output_paths(&inputs, std::path::Path::new("out")).unwrap();
    assert_eq!(paths, vec![PathBuf::from("out/a.c"), PathBuf::from("out/b.c")]);
}

#[test]
fn output_paths_reject_colliding_names() {
    let inputs = vec![
        PathBuf::from("src/util.c"),
        PathBuf::from("main.c"),
        PathBuf::from("lib/util.c"),
    ];
    let err = output_paths(&inputs, std::path::Path::new("out")).unwrap_err();
    match err {
        HarnessError::DuplicateOutput { name, first, second } => {
            assert_eq!(name, "util.c");
            assert_eq!(first, "src/util.c");
            assert_eq!(second, "lib/util.c");
        }
        other => panic!("unexpected error: {other}"),
    }
}
