//! Normalized `__sync_*` operations.
//!
//! Each function performs a plain load, update, and store on `*ptr`. None of
//! them is atomic: they model the value contract of the built-ins for analysis
//! and must never stand in for the real built-ins in a concurrent build.
//!
//! The pointer is an `&mut T` argument, so the expression producing it is
//! evaluated exactly once by the caller and the pointee is read exactly once
//! before it is written.

use super::builtin::UpdateOp;
use super::scalar::SyncScalar;

/// Store `*ptr op value`, return the old value.
#[inline]
pub fn fetch_and_op<T: SyncScalar>(ptr: &mut T, value: T, op: UpdateOp) -> T {
    let old = *ptr;
    *ptr = op.apply(old, value);
    old
}

/// Store `*ptr op value`, return the new value.
#[inline]
pub fn op_and_fetch<T: SyncScalar>(ptr: &mut T, value: T, op: UpdateOp) -> T {
    let new = op.apply(*ptr, value);
    *ptr = new;
    new
}

#[inline]
pub fn fetch_and_add<T: SyncScalar>(ptr: &mut T, value: T) -> T {
    fetch_and_op(ptr, value, UpdateOp::Add)
}

#[inline]
pub fn fetch_and_sub<T: SyncScalar>(ptr: &mut T, value: T) -> T {
    fetch_and_op(ptr, value, UpdateOp::Sub)
}

#[inline]
pub fn fetch_and_or<T: SyncScalar>(ptr: &mut T, value: T) -> T {
    fetch_and_op(ptr, value, UpdateOp::Or)
}

#[inline]
pub fn fetch_and_and<T: SyncScalar>(ptr: &mut T, value: T) -> T {
    fetch_and_op(ptr, value, UpdateOp::And)
}

#[inline]
pub fn fetch_and_xor<T: SyncScalar>(ptr: &mut T, value: T) -> T {
    fetch_and_op(ptr, value, UpdateOp::Xor)
}

/// Returns the old value; leaves `~(old & value)`.
#[inline]
pub fn fetch_and_nand<T: SyncScalar>(ptr: &mut T, value: T) -> T {
    fetch_and_op(ptr, value, UpdateOp::Nand)
}

#[inline]
pub fn add_and_fetch<T: SyncScalar>(ptr: &mut T, value: T) -> T {
    op_and_fetch(ptr, value, UpdateOp::Add)
}

#[inline]
pub fn sub_and_fetch<T: SyncScalar>(ptr: &mut T, value: T) -> T {
    op_and_fetch(ptr, value, UpdateOp::Sub)
}

#[inline]
pub fn or_and_fetch<T: SyncScalar>(ptr: &mut T, value: T) -> T {
    op_and_fetch(ptr, value, UpdateOp::Or)
}

#[inline]
pub fn and_and_fetch<T: SyncScalar>(ptr: &mut T, value: T) -> T {
    op_and_fetch(ptr, value, UpdateOp::And)
}

#[inline]
pub fn xor_and_fetch<T: SyncScalar>(ptr: &mut T, value: T) -> T {
    op_and_fetch(ptr, value, UpdateOp::Xor)
}

/// Stores and returns `~(old & value)`.
#[inline]
pub fn nand_and_fetch<T: SyncScalar>(ptr: &mut T, value: T) -> T {
    op_and_fetch(ptr, value, UpdateOp::Nand)
}

/// Single attempt: store `newval` and return `true` iff `*ptr == oldval`.
#[inline]
pub fn bool_compare_and_swap<T: SyncScalar>(ptr: &mut T, oldval: T, newval: T) -> bool {
    if *ptr == oldval {
        *ptr = newval;
        true
    } else {
        false
    }
}

/// Always returns the value `*ptr` held before the call; stores `newval` iff
/// that value equals `oldval`. Compare the result to `oldval` to learn whether
/// the swap happened.
#[inline]
pub fn val_compare_and_swap<T: SyncScalar>(ptr: &mut T, oldval: T, newval: T) -> T {
    let old = *ptr;
    if old == oldval {
        *ptr = newval;
    }
    old
}

/// Full barrier in the GCC built-ins. No ordering is modeled, so this is a
/// no-op.
#[inline(always)]
pub fn synchronize() {}

/// Store `value` unconditionally, return the old value.
#[inline]
pub fn lock_test_and_set<T: SyncScalar>(ptr: &mut T, value: T) -> T {
    std::mem::replace(ptr, value)
}

/// Store zero.
#[inline]
pub fn lock_release<T: SyncScalar>(ptr: &mut T) {
    *ptr = T::ZERO;
}

/// Call a normalized built-in with the C argument shape.
///
/// Trailing arguments after the required ones (memory-ordering hints in GCC)
/// are accepted and dropped without being evaluated. The
/// pointer expression is evaluated exactly once.
///
/// ```
/// use centrinel_core::sync_call;
///
/// let mut x = 5_i32;
/// let old = sync_call!(fetch_and_add(&mut x, 3));
/// assert_eq!((old, x), (5, 8));
///
/// let ok = sync_call!(bool_compare_and_swap(&mut x, 8, 1, "ignored hint"));
/// assert!(ok);
/// sync_call!(synchronize());
/// ```
#[macro_export]
macro_rules! sync_call {
    (bool_compare_and_swap($ptr:expr, $old:expr, $new:expr $(, $hint:expr)*)) => {
        $crate::sync::bool_compare_and_swap($ptr, $old, $new)
    };
    (val_compare_and_swap($ptr:expr, $old:expr, $new:expr $(, $hint:expr)*)) => {
        $crate::sync::val_compare_and_swap($ptr, $old, $new)
    };
    (synchronize($($hint:expr),*)) => {
        $crate::sync::synchronize()
    };
    (lock_release($ptr:expr $(, $hint:expr)*)) => {
        $crate::sync::lock_release($ptr)
    };
    ($op:ident($ptr:expr, $value:expr $(, $hint:expr)*)) => {
        $crate::sync::$op($ptr, $value)
    };
}
