//! Index of region-tagged types.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use parking_lot::RwLock;
use serde::Serialize;

use crate::config::CrossRegionPolicy;
use crate::policy::{AccessDecision, RegionAccessError, check_access};
use crate::region::{RegionId, RegionMember};

/// Metadata recorded for a tagged type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TypeRegionEntry {
    /// Fully qualified type name (`std::any::type_name`).
    pub type_name: &'static str,
    pub region: RegionId,
    /// Size in bytes.
    pub size: usize,
    /// Alignment in bytes.
    pub align: usize,
}

impl TypeRegionEntry {
    #[must_use]
    pub fn of<T: RegionMember>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            region: T::REGION,
            size: std::mem::size_of::<T>(),
            align: std::mem::align_of::<T>(),
        }
    }

    #[must_use]
    pub const fn is_protected(&self) -> bool {
        self.region.is_managed()
    }
}

/// Concurrent index of tagged types keyed by type name.
///
/// Types that were never registered are treated as unmanaged.
#[derive(Debug, Default)]
pub struct RegionIndex {
    types: RwLock<BTreeMap<&'static str, TypeRegionEntry>>,
}

impl RegionIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `T`. Registering the same type again is a no-op.
    pub fn register<T: RegionMember>(&self) -> TypeRegionEntry {
        let entry = TypeRegionEntry::of::<T>();
        *self.types.write().entry(entry.type_name).or_insert(entry)
    }

    #[must_use]
    pub fn lookup(&self, type_name: &str) -> Option<TypeRegionEntry> {
        self.types.read().get(type_name).copied()
    }

    #[must_use]
    pub fn region_of(&self, type_name: &str) -> RegionId {
        self.lookup(type_name)
            .map_or(RegionId::UNMANAGED, |entry| entry.region)
    }

    /// All registered types in `region`, ordered by name.
    #[must_use]
    pub fn types_in(&self, region: RegionId) -> Vec<TypeRegionEntry> {
        self.types
            .read()
            .values()
            .filter(|entry| entry.region == region)
            .copied()
            .collect()
    }

    /// Distinct managed regions with at least one registered type.
    #[must_use]
    pub fn managed_regions(&self) -> Vec<RegionId> {
        let mut regions: Vec<RegionId> = self
            .types
            .read()
            .values()
            .map(|entry| entry.region)
            .filter(|region| region.is_managed())
            .collect();
        regions.sort_unstable();
        regions.dedup();
        regions
    }

    /// Classify an access to a value of type `type_name` from code that is an
    /// accessor for `from` (`None` for raw field access or dereference).
    pub fn check_access(
        &self,
        from: Option<RegionId>,
        type_name: &str,
        policy: CrossRegionPolicy,
    ) -> Result<AccessDecision, RegionAccessError> {
        check_access(from, self.region_of(type_name), policy)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }
}

static GLOBAL_INDEX: OnceLock<RegionIndex> = OnceLock::new();

/// Process-wide region index.
#[must_use]
pub fn global_index() -> &'static RegionIndex {
    GLOBAL_INDEX.get_or_init(RegionIndex::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::Managed;

    struct Ledger {
        _balance: i64,
    }
    crate::declare_managed!(Ledger);

    struct Scratch {
        _bytes: [u8; 4],
    }
    crate::declare_managed!(unmanaged Scratch);

    #[test]
    fn register_records_region_and_layout() {
        let index = RegionIndex::new();
        let entry = index.register::<Ledger>();
        assert_eq!(entry.region, RegionId::MANAGED);
        assert_eq!(entry.size, 8);
        assert!(entry.is_protected());
        assert_eq!(index.len(), 1);

        index.register::<Ledger>();
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn unregistered_types_are_unmanaged() {
        let index = RegionIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.region_of("no::such::Type"), RegionId::UNMANAGED);
        assert_eq!(
            index.check_access(None, "no::such::Type", CrossRegionPolicy::Deny),
            Ok(AccessDecision::Unrestricted)
        );
    }

    #[test]
    fn protected_types_grouped_by_region() {
        let index = RegionIndex::new();
        index.register::<Ledger>();
        index.register::<Scratch>();
        index.register::<Managed<u32>>();

        let managed = index.types_in(RegionId::MANAGED);
        assert_eq!(managed.len(), 2);
        assert!(managed.iter().all(TypeRegionEntry::is_protected));
        assert_eq!(index.types_in(RegionId::UNMANAGED).len(), 1);
        assert_eq!(index.managed_regions(), vec![RegionId::MANAGED]);
    }

    #[test]
    fn raw_access_rejected_for_registered_managed_type() {
        let index = RegionIndex::new();
        let ledger = index.register::<Ledger>();
        assert!(
            index
                .check_access(None, ledger.type_name, CrossRegionPolicy::Allow)
                .is_err()
        );
        assert_eq!(
            index.check_access(
                Some(RegionId::MANAGED),
                ledger.type_name,
                CrossRegionPolicy::Deny
            ),
            Ok(AccessDecision::SameRegion)
        );
    }

    #[test]
    fn global_index_is_shared() {
        let a = global_index() as *const RegionIndex;
        let b = global_index() as *const RegionIndex;
        assert_eq!(a, b);
    }
}
