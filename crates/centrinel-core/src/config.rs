//! Shim configuration.
//!
//! The normalizer toggle defaults to the `sync-atomics` cargo feature and may
//! be overridden with the `CENTRINEL_SYNC_ATOMICS` environment variable:
//! - `on` / `1` / `true` / `enabled`: rewrite the `__sync_*` built-ins.
//! - `off` / `0` / `false` / `disabled`: pass them through untouched.
//!
//! Anything else keeps the build default. [`ShimConfig`] gathers the toggle
//! with the region settings and can be loaded from JSON.

use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};

use centrinel_membrane::{CrossRegionPolicy, RegionId, cross_region_policy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sentinel::HACK_SYNC_ATOMICS;

/// Parse an on/off spelling (case-insensitive).
#[must_use]
pub fn parse_toggle(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "on" | "1" | "true" | "yes" | "enabled" => Some(true),
        "off" | "0" | "false" | "no" | "disabled" => Some(false),
        _ => None,
    }
}

// 0=unresolved, 1=enabled, 2=disabled, 255=resolving.
static CACHED_SYNC_ATOMICS: AtomicU8 = AtomicU8::new(0);

const TOGGLE_UNRESOLVED: u8 = 0;
const TOGGLE_ENABLED: u8 = 1;
const TOGGLE_DISABLED: u8 = 2;
const TOGGLE_RESOLVING: u8 = 255;

fn toggle_to_u8(enabled: bool) -> u8 {
    if enabled {
        TOGGLE_ENABLED
    } else {
        TOGGLE_DISABLED
    }
}

/// Whether the normalizer is active for this process (reads the environment
/// on first call, caches thereafter).
///
/// A caller racing the first resolution observes the build default.
#[must_use]
pub fn sync_atomics_enabled() -> bool {
    let cached = CACHED_SYNC_ATOMICS.load(Ordering::Acquire);
    match cached {
        TOGGLE_ENABLED => return true,
        TOGGLE_DISABLED => return false,
        TOGGLE_RESOLVING => return HACK_SYNC_ATOMICS,
        _ => {}
    }

    if CACHED_SYNC_ATOMICS
        .compare_exchange(
            TOGGLE_UNRESOLVED,
            TOGGLE_RESOLVING,
            Ordering::SeqCst,
            Ordering::Relaxed,
        )
        .is_err()
    {
        return match CACHED_SYNC_ATOMICS.load(Ordering::Acquire) {
            TOGGLE_ENABLED => true,
            TOGGLE_DISABLED => false,
            _ => HACK_SYNC_ATOMICS,
        };
    }

    let enabled = std::env::var("CENTRINEL_SYNC_ATOMICS")
        .ok()
        .and_then(|v| parse_toggle(&v))
        .unwrap_or(HACK_SYNC_ATOMICS);
    CACHED_SYNC_ATOMICS.store(toggle_to_u8(enabled), Ordering::Release);
    enabled
}

/// Pin the process-wide normalizer toggle, bypassing the environment.
pub fn set_sync_atomics_enabled(enabled: bool) {
    CACHED_SYNC_ATOMICS.store(toggle_to_u8(enabled), Ordering::Release);
}

#[derive(Debug, Error)]
pub enum ShimConfigError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0} is reserved for unmanaged types and cannot be the managed region")]
    ReservedRegion(RegionId),
}

/// Settings shared by the header emitter and the rewriter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShimConfig {
    /// Rewrite `__sync_*` built-ins (and define the header's guard macro).
    pub normalize_atomics: bool,
    /// Region spelled by `__CENTRINEL_MANAGED_REGION`.
    pub managed_region: RegionId,
    /// Whether accessors of one managed region may reach another.
    pub cross_region: CrossRegionPolicy,
}

impl Default for ShimConfig {
    fn default() -> Self {
        Self {
            normalize_atomics: HACK_SYNC_ATOMICS,
            managed_region: RegionId::MANAGED,
            cross_region: CrossRegionPolicy::Deny,
        }
    }
}

impl ShimConfig {
    /// Defaults with the process environment applied.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            normalize_atomics: sync_atomics_enabled(),
            managed_region: RegionId::MANAGED,
            cross_region: cross_region_policy(),
        }
    }

    /// Parse and validate a JSON document. Missing fields take build defaults.
    pub fn from_json(json: &str) -> Result<Self, ShimConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ShimConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn validate(&self) -> Result<(), ShimConfigError> {
        if !self.managed_region.is_managed() {
            return Err(ShimConfigError::ReservedRegion(self.managed_region));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
