//! Scalar types the normalized built-ins operate on.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not};

/// An integer pointee of a `__sync_*` operation.
///
/// Arithmetic wraps on the exact width of `Self`, matching the built-ins'
/// modular semantics for every integer type.
pub trait SyncScalar:
    Copy
    + Eq
    + fmt::Debug
    + fmt::Display
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + BitXor<Output = Self>
    + Not<Output = Self>
    + 'static
{
    const ZERO: Self;
    /// Rust spelling of the type, for reports.
    const TYPE_NAME: &'static str;

    fn wrapping_add(self, rhs: Self) -> Self;
    fn wrapping_sub(self, rhs: Self) -> Self;
}

macro_rules! impl_sync_scalar {
    ($($t:ty),* $(,)?) => {
        $(
            impl SyncScalar for $t {
                const ZERO: Self = 0;
                const TYPE_NAME: &'static str = stringify!($t);

                #[inline]
                fn wrapping_add(self, rhs: Self) -> Self {
                    <$t>::wrapping_add(self, rhs)
                }

                #[inline]
                fn wrapping_sub(self, rhs: Self) -> Self {
                    <$t>::wrapping_sub(self, rhs)
                }
            }
        )*
    };
}

impl_sync_scalar!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize,
);

#[cfg(test)]
mod tests {
    use super::*;

    fn add<T: SyncScalar>(a: T, b: T) -> T {
        SyncScalar::wrapping_add(a, b)
    }

    #[test]
    fn arithmetic_wraps_at_width() {
        assert_eq!(add(u8::MAX, 1), 0);
        assert_eq!(add(i8::MAX, 1), i8::MIN);
        assert_eq!(SyncScalar::wrapping_sub(0_u16, 1), u16::MAX);
        assert_eq!(SyncScalar::wrapping_sub(i64::MIN, 1), i64::MAX);
    }

    #[test]
    fn type_names() {
        assert_eq!(<u32 as SyncScalar>::TYPE_NAME, "u32");
        assert_eq!(<isize as SyncScalar>::TYPE_NAME, "isize");
        assert_eq!(<i128 as SyncScalar>::ZERO, 0);
    }
}
