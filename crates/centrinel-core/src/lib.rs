//! # centrinel-core
//!
//! Analysis-time shim for C sources processed by a region-checking static
//! analyzer.
//!
//! - [`sync`]: non-atomic normalization of the GCC `__sync_*` built-ins.
//! - [`sentinel`]: the presence and feature facts the shim establishes.
//! - [`cgen`]: the inclusion-point header and the call-site rewriter.
//! - [`config`]: the normalizer toggle and [`ShimConfig`].
//!
//! The normalized operations are deliberately not atomic. They exist so an
//! analyzer sees the built-ins' data flow; code built with them must never
//! ship.

#![deny(unsafe_code)]

pub mod cgen;
pub mod config;
pub mod sentinel;
pub mod sync;

pub use config::{ShimConfig, ShimConfigError, sync_atomics_enabled};
pub use sentinel::FeatureSentinels;
pub use sync::{SyncBuiltin, SyncOutcome, SyncScalar, UpdateOp};
