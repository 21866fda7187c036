//! Region identifiers and the managed-value wrapper.
//!
//! A type either belongs to no region (identifier 0, freely accessible) or to
//! exactly one managed region. Membership is expressed structurally: a value
//! of a protected type lives inside [`Managed`], whose field is private, so
//! the only way to reach it is through an accessor that presents a
//! [`RegionCapability`] for the same region.

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::config::CrossRegionPolicy;
use crate::policy::{RegionAccessError, check_access};

/// Integer tag naming a protected memory region.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RegionId(u32);

impl RegionId {
    /// Implicit region of every untagged type.
    pub const UNMANAGED: Self = Self(0);
    /// The managed region spelled `__region(1)` in C sources.
    pub const MANAGED: Self = Self(1);

    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Returns true for every identifier except the unmanaged one.
    #[must_use]
    pub const fn is_managed(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "region({})", self.0)
    }
}

/// Type-level marker for a region.
pub trait Region: 'static {
    const ID: RegionId;
    const NAME: &'static str;
}

/// Marker for the unmanaged region (identifier 0).
#[derive(Debug)]
pub enum Unmanaged {}

impl Region for Unmanaged {
    const ID: RegionId = RegionId::UNMANAGED;
    const NAME: &'static str = "unmanaged";
}

/// Marker for the default managed region (identifier 1).
#[derive(Debug)]
pub enum ManagedRegion {}

impl Region for ManagedRegion {
    const ID: RegionId = RegionId::MANAGED;
    const NAME: &'static str = "managed";
}

/// Declare an additional region marker.
///
/// ```
/// centrinel_membrane::declare_region!(pub DeviceRegion = 2);
/// use centrinel_membrane::region::Region;
/// assert_eq!(DeviceRegion::ID.get(), 2);
/// ```
///
/// Identifier 0 is reserved for unmanaged types and is rejected at compile time.
#[macro_export]
macro_rules! declare_region {
    ($(#[$meta:meta])* $vis:vis $name:ident = $id:expr) => {
        $(#[$meta])*
        #[derive(Debug)]
        $vis enum $name {}

        const _: () = assert!($id != 0, "region 0 is reserved for unmanaged types");

        impl $crate::region::Region for $name {
            const ID: $crate::region::RegionId = $crate::region::RegionId::new($id);
            const NAME: &'static str = stringify!($name);
        }
    };
}

/// Region metadata a type carries.
///
/// This is the analyzer-facing half of the tag: [`crate::index::RegionIndex`]
/// keys off it. A type has exactly one `REGION` because it is an associated
/// constant.
pub trait RegionMember {
    const REGION: RegionId;
}

/// Region of `T` according to its metadata.
#[must_use]
pub const fn region_of<T: RegionMember + ?Sized>() -> RegionId {
    T::REGION
}

/// Tag a type with a region.
///
/// With one argument the default managed region is used, which is the Rust
/// spelling of `__CENTRINEL_MANAGED_ATTR`. A second argument names a region
/// marker. `declare_managed!(unmanaged Foo)` records a type as explicitly
/// unprotected.
#[macro_export]
macro_rules! declare_managed {
    (unmanaged $($ty:ty),+ $(,)?) => {
        $(
            impl $crate::region::RegionMember for $ty {
                const REGION: $crate::region::RegionId = $crate::region::RegionId::UNMANAGED;
            }
        )+
    };
    ($ty:ty) => {
        impl $crate::region::RegionMember for $ty {
            const REGION: $crate::region::RegionId = $crate::region::RegionId::MANAGED;
        }
    };
    ($ty:ty, $region:ty) => {
        impl $crate::region::RegionMember for $ty {
            const REGION: $crate::region::RegionId =
                <$region as $crate::region::Region>::ID;
        }
    };
}

declare_managed!(unmanaged
    (), bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64,
    String
);

/// Proof that the holder is a recognized accessor for region `R`.
///
/// Capabilities carry no data. Code the analyzer treats as an accessor mints
/// one with [`RegionCapability::acquire`] and passes it to [`Managed`]'s
/// accessors.
pub struct RegionCapability<R: Region> {
    _region: PhantomData<fn() -> R>,
}

impl<R: Region> RegionCapability<R> {
    #[must_use]
    pub const fn acquire() -> Self {
        Self {
            _region: PhantomData,
        }
    }

    #[must_use]
    pub const fn region(&self) -> RegionId {
        R::ID
    }
}

impl<R: Region> Clone for RegionCapability<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: Region> Copy for RegionCapability<R> {}

impl<R: Region> fmt::Debug for RegionCapability<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegionCapability<{}>({})", R::NAME, R::ID)
    }
}

/// A value of type `T` protected by region `R`.
///
/// `#[repr(transparent)]`: tagging never changes size, alignment, or ABI.
#[repr(transparent)]
pub struct Managed<T, R: Region = ManagedRegion> {
    value: T,
    _region: PhantomData<fn() -> R>,
}

impl<T, R: Region> Managed<T, R> {
    #[must_use]
    pub const fn new(value: T) -> Self {
        Self {
            value,
            _region: PhantomData,
        }
    }

    #[must_use]
    pub const fn region(&self) -> RegionId {
        R::ID
    }

    #[must_use]
    pub fn get(&self, _cap: &RegionCapability<R>) -> &T {
        &self.value
    }

    #[must_use]
    pub fn get_mut(&mut self, _cap: &RegionCapability<R>) -> &mut T {
        &mut self.value
    }

    pub fn with<U>(&self, cap: &RegionCapability<R>, f: impl FnOnce(&T) -> U) -> U {
        f(self.get(cap))
    }

    pub fn with_mut<U>(&mut self, cap: &RegionCapability<R>, f: impl FnOnce(&mut T) -> U) -> U {
        f(self.get_mut(cap))
    }

    /// Store `value`, returning the previous contents.
    pub fn replace(&mut self, _cap: &RegionCapability<R>, value: T) -> T {
        std::mem::replace(&mut self.value, value)
    }

    #[must_use]
    pub fn into_inner(self, _cap: &RegionCapability<R>) -> T {
        self.value
    }

    /// Access from an accessor of region `A`, which may differ from `R`.
    ///
    /// Same-region access always succeeds. Cross-region access is decided by
    /// `policy`.
    pub fn get_from<A: Region>(
        &self,
        cap: &RegionCapability<A>,
        policy: CrossRegionPolicy,
    ) -> Result<&T, RegionAccessError> {
        check_access(Some(cap.region()), R::ID, policy)?;
        Ok(&self.value)
    }

    /// Mutable counterpart of [`Managed::get_from`].
    pub fn get_mut_from<A: Region>(
        &mut self,
        cap: &RegionCapability<A>,
        policy: CrossRegionPolicy,
    ) -> Result<&mut T, RegionAccessError> {
        check_access(Some(cap.region()), R::ID, policy)?;
        Ok(&mut self.value)
    }
}

impl<T, R: Region> RegionMember for Managed<T, R> {
    const REGION: RegionId = R::ID;
}

impl<T: Default, R: Region> Default for Managed<T, R> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone, R: Region> Clone for Managed<T, R> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<T: Copy, R: Region> Copy for Managed<T, R> {}

// Contents stay opaque; printing them would be a raw read.
impl<T, R: Region> fmt::Debug for Managed<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Managed")
            .field("region", &format_args!("{}", R::ID))
            .finish_non_exhaustive()
    }
}
