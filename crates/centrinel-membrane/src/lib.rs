//! # centrinel-membrane
//!
//! Managed-region tagging for types whose fields must not be reached by raw
//! access.
//!
//! - [`region`]: region identifiers, the [`Managed`] wrapper, and the
//!   capability tokens that gate its accessors.
//! - [`index`]: a type index consumers query by region.
//! - [`policy`]: raw and cross-region access decisions.
//! - [`config`]: the cross-region policy configuration point.
//!
//! Tagging is metadata only: [`Managed`] is `#[repr(transparent)]`.

#![deny(unsafe_code)]

pub mod config;
pub mod index;
pub mod policy;
pub mod region;

pub use config::{CrossRegionPolicy, cross_region_policy, set_cross_region_policy};
pub use index::{RegionIndex, TypeRegionEntry, global_index};
pub use policy::{AccessDecision, RegionAccessError, check_access};
pub use region::{
    Managed, ManagedRegion, Region, RegionCapability, RegionId, RegionMember, Unmanaged,
    region_of,
};
