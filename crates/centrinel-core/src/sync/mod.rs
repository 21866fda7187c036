//! Atomic-builtin normalizer.
//!
//! Rust renditions of the legacy `__sync_*` read-modify-write built-ins as
//! plain, non-atomic load/update/store sequences, plus descriptors that name
//! each built-in and its return contract.

mod builtin;
mod ops;
mod scalar;

pub use builtin::{ReturnContract, SyncBuiltin, SyncOutcome, UpdateOp};
pub use ops::{
    add_and_fetch, and_and_fetch, bool_compare_and_swap, fetch_and_add, fetch_and_and,
    fetch_and_nand, fetch_and_op, fetch_and_or, fetch_and_sub, fetch_and_xor, lock_release,
    lock_test_and_set, nand_and_fetch, op_and_fetch, or_and_fetch, sub_and_fetch, synchronize,
    val_compare_and_swap, xor_and_fetch,
};
pub use scalar::SyncScalar;
