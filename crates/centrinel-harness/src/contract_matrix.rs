//! Contract matrix for the normalized built-ins.
//!
//! Every [`SyncBuiltin`] is evaluated over a table of representative values for
//! each integer width and compared against a reference computed with the real
//! `std::sync::atomic` operations on a local atomic. The two must agree on the
//! returned value and on the value left behind.
//!
//! 128-bit widths have no stable std atomic and are not part of the matrix.

use std::collections::BTreeMap;
use std::sync::atomic::{
    AtomicI8, AtomicI16, AtomicI32, AtomicI64, AtomicIsize, AtomicU8, AtomicU16, AtomicU32,
    AtomicU64, AtomicUsize, Ordering, fence,
};

use centrinel_core::sync::{SyncBuiltin, SyncOutcome, SyncScalar, UpdateOp};
use serde::Serialize;

/// A scalar with a std atomic counterpart.
pub trait ReferenceAtomic: SyncScalar {
    /// Representative starting values and operands.
    fn samples() -> Vec<Self>;

    /// Apply `builtin` to a fresh atomic holding `initial`. Returns the
    /// outcome and the value left in the atomic.
    fn reference(builtin: SyncBuiltin, initial: Self, operands: [Self; 2])
    -> (SyncOutcome<Self>, Self);
}

macro_rules! impl_reference_atomic {
    ($($t:ty => $atomic:ty),* $(,)?) => {
        $(
            impl ReferenceAtomic for $t {
                fn samples() -> Vec<Self> {
                    vec![
                        0,
                        1,
                        <$t>::MAX,
                        <$t>::MIN,
                        <$t>::MAX / 3,
                        0x5A5A_5A5A_5A5A_5A5A_u64 as $t,
                    ]
                }

                fn reference(
                    builtin: SyncBuiltin,
                    initial: Self,
                    [a, b]: [Self; 2],
                ) -> (SyncOutcome<Self>, Self) {
                    let cell = <$atomic>::new(initial);
                    let fetch = |op: UpdateOp| match op {
                        UpdateOp::Add => cell.fetch_add(a, Ordering::SeqCst),
                        UpdateOp::Sub => cell.fetch_sub(a, Ordering::SeqCst),
                        UpdateOp::Or => cell.fetch_or(a, Ordering::SeqCst),
                        UpdateOp::And => cell.fetch_and(a, Ordering::SeqCst),
                        UpdateOp::Xor => cell.fetch_xor(a, Ordering::SeqCst),
                        UpdateOp::Nand => cell.fetch_nand(a, Ordering::SeqCst),
                    };
                    let outcome = match builtin {
                        SyncBuiltin::FetchAndOp(op) => SyncOutcome::Value(fetch(op)),
                        SyncBuiltin::OpAndFetch(op) => {
                            fetch(op);
                            SyncOutcome::Value(cell.load(Ordering::SeqCst))
                        }
                        SyncBuiltin::BoolCompareAndSwap => SyncOutcome::Success(
                            cell.compare_exchange(a, b, Ordering::SeqCst, Ordering::SeqCst)
                                .is_ok(),
                        ),
                        SyncBuiltin::ValCompareAndSwap => {
                            match cell.compare_exchange(a, b, Ordering::SeqCst, Ordering::SeqCst) {
                                Ok(prev) | Err(prev) => SyncOutcome::Value(prev),
                            }
                        }
                        SyncBuiltin::Synchronize => {
                            fence(Ordering::SeqCst);
                            SyncOutcome::Nothing
                        }
                        SyncBuiltin::LockTestAndSet => {
                            SyncOutcome::Value(cell.swap(a, Ordering::Acquire))
                        }
                        SyncBuiltin::LockRelease => {
                            cell.store(0, Ordering::Release);
                            SyncOutcome::Nothing
                        }
                    };
                    (outcome, cell.into_inner())
                }
            }
        )*
    };
}

impl_reference_atomic!(
    i8 => AtomicI8,
    i16 => AtomicI16,
    i32 => AtomicI32,
    i64 => AtomicI64,
    isize => AtomicIsize,
    u8 => AtomicU8,
    u16 => AtomicU16,
    u32 => AtomicU32,
    u64 => AtomicU64,
    usize => AtomicUsize,
);

/// One evaluated case. Values are rendered in decimal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractCase {
    pub builtin: &'static str,
    pub width: &'static str,
    pub initial: String,
    pub operands: Vec<String>,
    pub expected_result: Option<String>,
    pub actual_result: Option<String>,
    pub expected_after: String,
    pub actual_after: String,
    pub passed: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuiltinSummary {
    pub cases: usize,
    pub failed: usize,
}

/// Outcome of a matrix run. Only failing cases are retained in full.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContractReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub widths: Vec<&'static str>,
    pub per_builtin: BTreeMap<&'static str, BuiltinSummary>,
    pub failures: Vec<ContractCase>,
}

impl ContractReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.total > 0
    }

    fn record(&mut self, case: ContractCase) {
        self.total += 1;
        let summary = self.per_builtin.entry(case.builtin).or_default();
        summary.cases += 1;
        if case.passed {
            self.passed += 1;
        } else {
            self.failed += 1;
            summary.failed += 1;
            self.failures.push(case);
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Operand pairs worth running for `builtin`: both operands vary only for
/// the compare-and-swap pair.
fn operand_pairs<T: ReferenceAtomic>(builtin: SyncBuiltin, samples: &[T]) -> Vec<[T; 2]> {
    match builtin.operand_count() {
        3 => samples
            .iter()
            .flat_map(|&a| samples.iter().map(move |&b| [a, b]))
            .collect(),
        2 => samples.iter().map(|&a| [a, T::ZERO]).collect(),
        _ => vec![[T::ZERO, T::ZERO]],
    }
}

/// Evaluate one case against the reference.
#[must_use]
pub fn check_case<T: ReferenceAtomic>(
    builtin: SyncBuiltin,
    initial: T,
    operands: [T; 2],
) -> ContractCase {
    let (expected, expected_after) = T::reference(builtin, initial, operands);
    let mut actual_after = initial;
    let actual = builtin
        .evaluate(&mut actual_after, &operands)
        .and_then(SyncOutcome::as_c_value);
    let expected_result = expected.as_c_value();
    let used = builtin.operand_count().saturating_sub(1);
    ContractCase {
        builtin: builtin.c_name(),
        width: T::TYPE_NAME,
        initial: initial.to_string(),
        operands: operands[..used].iter().map(ToString::to_string).collect(),
        passed: actual == expected_result && actual_after == expected_after,
        expected_result,
        actual_result: actual,
        expected_after: expected_after.to_string(),
        actual_after: actual_after.to_string(),
    }
}

/// Run every built-in over the samples of one width.
pub fn run_width<T: ReferenceAtomic>(report: &mut ContractReport) {
    let samples = T::samples();
    report.widths.push(T::TYPE_NAME);
    for builtin in SyncBuiltin::ALL {
        for &initial in &samples {
            for operands in operand_pairs(builtin, &samples) {
                report.record(check_case(builtin, initial, operands));
            }
        }
    }
}

/// Run the full matrix over every width with a std atomic.
#[must_use]
pub fn run_contract_matrix() -> ContractReport {
    let mut report = ContractReport::default();
    run_width::<i8>(&mut report);
    run_width::<i16>(&mut report);
    run_width::<i32>(&mut report);
    run_width::<i64>(&mut report);
    run_width::<isize>(&mut report);
    run_width::<u8>(&mut report);
    run_width::<u16>(&mut report);
    run_width::<u32>(&mut report);
    run_width::<u64>(&mut report);
    run_width::<usize>(&mut report);
    report
}
