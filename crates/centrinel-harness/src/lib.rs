//! Tooling around the Centrinel shim.
//!
//! This crate provides:
//! - Contract matrix: the normalized built-ins checked against std atomics
//! - Pipeline: header emission and call-site rewriting of C files on disk
//! - Structured logging: JSONL run logs and a hashed artifact index
//!
//! The `centrinel-shim` binary drives all three.

#![forbid(unsafe_code)]

pub mod contract_matrix;
pub mod pipeline;
pub mod structured_log;

use thiserror::Error;

pub use contract_matrix::{ContractCase, ContractReport, run_contract_matrix};
pub use pipeline::{
    RewriteRun, output_paths, rewrite_file, verify_contracts, write_header, write_rewritten,
};
pub use structured_log::{ArtifactIndex, LogEmitter, LogEntry, LogLevel, Outcome, Stage};

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config: {0}")]
    Config(#[from] centrinel_core::ShimConfigError),
    #[error("{first} and {second} would both be written as {name}")]
    DuplicateOutput {
        name: String,
        first: String,
        second: String,
    },
    #[error("{path} is not valid UTF-8")]
    NonUtf8Source { path: String },
    #[error("contract matrix: {failed} of {total} cases disagree with the atomic reference")]
    ContractFailures { failed: usize, total: usize },
    #[error("log {path}: {errors} invalid field(s) across {lines} line(s)")]
    InvalidLog {
        path: String,
        lines: usize,
        errors: usize,
    },
}
