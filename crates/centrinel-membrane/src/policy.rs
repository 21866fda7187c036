//! Access decisions for managed regions.

use serde::Serialize;
use thiserror::Error;

use crate::config::CrossRegionPolicy;
use crate::region::RegionId;

/// How an access was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccessDecision {
    /// Target is not managed; anyone may touch it.
    Unrestricted,
    /// Accessor and target share a region.
    SameRegion,
    /// Accessor belongs to another managed region and the policy allows it.
    CrossRegionAllowed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegionAccessError {
    #[error("raw access into {target} outside a region accessor")]
    RawAccess { target: RegionId },
    #[error("accessor for {from} may not reach {target} under the deny policy")]
    CrossRegion { from: RegionId, target: RegionId },
}

/// Decide whether an access into `target` is sanctioned.
///
/// `from` is the region the accessing code is an accessor for; `None` (or the
/// unmanaged region) means a raw field access or dereference.
pub fn check_access(
    from: Option<RegionId>,
    target: RegionId,
    policy: CrossRegionPolicy,
) -> Result<AccessDecision, RegionAccessError> {
    if !target.is_managed() {
        return Ok(AccessDecision::Unrestricted);
    }
    match from {
        None => Err(RegionAccessError::RawAccess { target }),
        Some(from) if !from.is_managed() => Err(RegionAccessError::RawAccess { target }),
        Some(from) if from == target => Ok(AccessDecision::SameRegion),
        Some(_) if policy.permits_cross_region() => Ok(AccessDecision::CrossRegionAllowed),
        Some(from) => Err(RegionAccessError::CrossRegion { from, target }),
    }
}
