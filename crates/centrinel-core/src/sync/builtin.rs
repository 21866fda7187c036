//! Descriptors for the legacy `__sync_*` built-in family.
//!
//! Reference list: <https://gcc.gnu.org/onlinedocs/gcc/_005f_005fsync-Builtins.html>.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ops;
use super::scalar::SyncScalar;

/// Update rule of the fetch-and-op / op-and-fetch families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateOp {
    Add,
    Sub,
    Or,
    And,
    Xor,
    /// `~(old & value)`; not a plain compound assignment.
    Nand,
}

impl UpdateOp {
    pub const ALL: [Self; 6] = [
        Self::Add,
        Self::Sub,
        Self::Or,
        Self::And,
        Self::Xor,
        Self::Nand,
    ];

    /// New pointee value given the old one and the operand.
    #[inline]
    #[must_use]
    pub fn apply<T: SyncScalar>(self, old: T, value: T) -> T {
        match self {
            Self::Add => old.wrapping_add(value),
            Self::Sub => old.wrapping_sub(value),
            Self::Or => old | value,
            Self::And => old & value,
            Self::Xor => old ^ value,
            Self::Nand => !(old & value),
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Or => "or",
            Self::And => "and",
            Self::Xor => "xor",
            Self::Nand => "nand",
        }
    }

    /// C compound-assignment operator, if the update is expressible as one.
    #[must_use]
    pub const fn compound_assign(self) -> Option<&'static str> {
        match self {
            Self::Add => Some("+="),
            Self::Sub => Some("-="),
            Self::Or => Some("|="),
            Self::And => Some("&="),
            Self::Xor => Some("^="),
            Self::Nand => None,
        }
    }
}

/// What a built-in call yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnContract {
    /// Value of `*ptr` before the update.
    PreUpdate,
    /// Value of `*ptr` after the update.
    PostUpdate,
    /// 1 if the swap happened, 0 otherwise.
    Success,
    Nothing,
}

/// One legacy `__sync_*` built-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SyncBuiltin {
    FetchAndOp(UpdateOp),
    OpAndFetch(UpdateOp),
    BoolCompareAndSwap,
    ValCompareAndSwap,
    Synchronize,
    LockTestAndSet,
    LockRelease,
}

/// Result of evaluating a built-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome<T> {
    Value(T),
    Success(bool),
    Nothing,
}

impl<T: SyncScalar> SyncOutcome<T> {
    /// The outcome as the C expression would yield it, if it yields anything.
    #[must_use]
    pub fn as_c_value(self) -> Option<String> {
        match self {
            Self::Value(v) => Some(v.to_string()),
            Self::Success(ok) => Some(i32::from(ok).to_string()),
            Self::Nothing => None,
        }
    }
}

impl SyncBuiltin {
    pub const ALL: [Self; 17] = [
        Self::FetchAndOp(UpdateOp::Add),
        Self::FetchAndOp(UpdateOp::Sub),
        Self::FetchAndOp(UpdateOp::Or),
        Self::FetchAndOp(UpdateOp::And),
        Self::FetchAndOp(UpdateOp::Xor),
        Self::FetchAndOp(UpdateOp::Nand),
        Self::OpAndFetch(UpdateOp::Add),
        Self::OpAndFetch(UpdateOp::Sub),
        Self::OpAndFetch(UpdateOp::Or),
        Self::OpAndFetch(UpdateOp::And),
        Self::OpAndFetch(UpdateOp::Xor),
        Self::OpAndFetch(UpdateOp::Nand),
        Self::BoolCompareAndSwap,
        Self::ValCompareAndSwap,
        Self::Synchronize,
        Self::LockTestAndSet,
        Self::LockRelease,
    ];

    /// Name as spelled in C sources.
    #[must_use]
    pub const fn c_name(self) -> &'static str {
        match self {
            Self::FetchAndOp(op) => match op {
                UpdateOp::Add => "__sync_fetch_and_add",
                UpdateOp::Sub => "__sync_fetch_and_sub",
                UpdateOp::Or => "__sync_fetch_and_or",
                UpdateOp::And => "__sync_fetch_and_and",
                UpdateOp::Xor => "__sync_fetch_and_xor",
                UpdateOp::Nand => "__sync_fetch_and_nand",
            },
            Self::OpAndFetch(op) => match op {
                UpdateOp::Add => "__sync_add_and_fetch",
                UpdateOp::Sub => "__sync_sub_and_fetch",
                UpdateOp::Or => "__sync_or_and_fetch",
                UpdateOp::And => "__sync_and_and_fetch",
                UpdateOp::Xor => "__sync_xor_and_fetch",
                UpdateOp::Nand => "__sync_nand_and_fetch",
            },
            Self::BoolCompareAndSwap => "__sync_bool_compare_and_swap",
            Self::ValCompareAndSwap => "__sync_val_compare_and_swap",
            Self::Synchronize => "__sync_synchronize",
            Self::LockTestAndSet => "__sync_lock_test_and_set",
            Self::LockRelease => "__sync_lock_release",
        }
    }

    #[must_use]
    pub fn from_c_name(name: &str) -> Option<Self> {
        if !name.starts_with("__sync_") {
            return None;
        }
        Self::ALL.into_iter().find(|b| b.c_name() == name)
    }

    /// Required arguments, the pointer included. Extra trailing arguments are
    /// accepted and ignored.
    #[must_use]
    pub const fn operand_count(self) -> usize {
        match self {
            Self::FetchAndOp(_) | Self::OpAndFetch(_) | Self::LockTestAndSet => 2,
            Self::BoolCompareAndSwap | Self::ValCompareAndSwap => 3,
            Self::Synchronize => 0,
            Self::LockRelease => 1,
        }
    }

    #[must_use]
    pub const fn return_contract(self) -> ReturnContract {
        match self {
            Self::FetchAndOp(_) | Self::ValCompareAndSwap | Self::LockTestAndSet => {
                ReturnContract::PreUpdate
            }
            Self::OpAndFetch(_) => ReturnContract::PostUpdate,
            Self::BoolCompareAndSwap => ReturnContract::Success,
            Self::Synchronize | Self::LockRelease => ReturnContract::Nothing,
        }
    }

    /// Evaluate the normalized operation on `target`.
    ///
    /// `operands` excludes the pointer. Returns `None` if fewer operands are
    /// given than the built-in requires; extra operands are ignored.
    pub fn evaluate<T: SyncScalar>(self, target: &mut T, operands: &[T]) -> Option<SyncOutcome<T>> {
        let needed = self.operand_count().saturating_sub(1);
        if operands.len() < needed {
            return None;
        }
        let outcome = match self {
            Self::FetchAndOp(op) => SyncOutcome::Value(ops::fetch_and_op(target, operands[0], op)),
            Self::OpAndFetch(op) => SyncOutcome::Value(ops::op_and_fetch(target, operands[0], op)),
            Self::BoolCompareAndSwap => SyncOutcome::Success(ops::bool_compare_and_swap(
                target,
                operands[0],
                operands[1],
            )),
            Self::ValCompareAndSwap => SyncOutcome::Value(ops::val_compare_and_swap(
                target,
                operands[0],
                operands[1],
            )),
            Self::Synchronize => {
                ops::synchronize();
                SyncOutcome::Nothing
            }
            Self::LockTestAndSet => SyncOutcome::Value(ops::lock_test_and_set(target, operands[0])),
            Self::LockRelease => {
                ops::lock_release(target);
                SyncOutcome::Nothing
            }
        };
        Some(outcome)
    }
}

impl fmt::Display for SyncBuiltin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.c_name())
    }
}
