//! Cross-region access configuration.
//!
//! Only one managed region is defined for C sources, so whether code that is
//! an accessor for region A may touch values of region B is left open. The
//! answer is an explicit configuration point, read from the
//! `CENTRINEL_CROSS_REGION` environment variable:
//! - `deny` (default): an accessor may only reach values of its own region.
//! - `allow`: any managed-region accessor may reach any managed region.
//!
//! Raw access (no accessor at all) into a managed region is rejected under
//! both policies.

use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

/// Policy for accessors reaching into a different managed region.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossRegionPolicy {
    #[default]
    Deny,
    Allow,
}

impl CrossRegionPolicy {
    /// Parse from string (case-insensitive). Unknown spellings fall back to `Deny`.
    #[must_use]
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" | "permissive" | "open" | "on" => Self::Allow,
            _ => Self::Deny,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deny => "deny",
            Self::Allow => "allow",
        }
    }

    #[must_use]
    pub const fn permits_cross_region(self) -> bool {
        matches!(self, Self::Allow)
    }
}

// 0=unresolved, 1=Deny, 2=Allow, 255=resolving.
static CACHED_POLICY: AtomicU8 = AtomicU8::new(0);

const POLICY_UNRESOLVED: u8 = 0;
const POLICY_DENY: u8 = 1;
const POLICY_ALLOW: u8 = 2;
const POLICY_RESOLVING: u8 = 255;

fn policy_to_u8(policy: CrossRegionPolicy) -> u8 {
    match policy {
        CrossRegionPolicy::Deny => POLICY_DENY,
        CrossRegionPolicy::Allow => POLICY_ALLOW,
    }
}

fn u8_to_policy(v: u8) -> CrossRegionPolicy {
    match v {
        POLICY_ALLOW => CrossRegionPolicy::Allow,
        _ => CrossRegionPolicy::Deny,
    }
}

/// Process-wide cross-region policy (reads the environment on first call,
/// caches thereafter).
///
/// A caller racing the first resolution observes `Deny`.
#[must_use]
pub fn cross_region_policy() -> CrossRegionPolicy {
    let cached = CACHED_POLICY.load(Ordering::Acquire);
    if cached != POLICY_UNRESOLVED && cached != POLICY_RESOLVING {
        return u8_to_policy(cached);
    }
    if cached == POLICY_RESOLVING {
        return CrossRegionPolicy::Deny;
    }

    if CACHED_POLICY
        .compare_exchange(
            POLICY_UNRESOLVED,
            POLICY_RESOLVING,
            Ordering::SeqCst,
            Ordering::Relaxed,
        )
        .is_err()
    {
        let v = CACHED_POLICY.load(Ordering::Acquire);
        return if v != POLICY_UNRESOLVED && v != POLICY_RESOLVING {
            u8_to_policy(v)
        } else {
            CrossRegionPolicy::Deny
        };
    }

    let policy = std::env::var("CENTRINEL_CROSS_REGION")
        .map(|v| CrossRegionPolicy::from_str_loose(&v))
        .unwrap_or_default();
    CACHED_POLICY.store(policy_to_u8(policy), Ordering::Release);
    policy
}

/// Pin the process-wide policy, bypassing the environment.
pub fn set_cross_region_policy(policy: CrossRegionPolicy) {
    CACHED_POLICY.store(policy_to_u8(policy), Ordering::Release);
}
