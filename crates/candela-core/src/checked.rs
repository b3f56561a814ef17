//! Overflow-reporting integer arithmetic.
//!
//! Index and size computations go through [`Checked`], a thin wrapper whose
//! arithmetic reports overflow as an error instead of wrapping, so corrupted
//! sizes never propagate into buffer indexing. One generic type covers every
//! width; the per-width names below are explicit aliases, not generated
//! types.

use num_traits::{CheckedAdd, CheckedDiv, CheckedMul, CheckedSub, PrimInt};
use thiserror::Error;

/// Arithmetic on a fixed-width integer left its representable range.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("integer overflow in checked {op}")]
pub struct OverflowError {
    /// The operation that overflowed ("add", "sub", "mul", "div", "cast").
    pub op: &'static str,
}

/// A fixed-width integer whose arithmetic reports overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Checked<T>(T);

impl<T: PrimInt + CheckedAdd + CheckedSub + CheckedMul + CheckedDiv> Checked<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn get(self) -> T {
        self.0
    }

    pub fn add(self, rhs: Self) -> Result<Self, OverflowError> {
        self.0
            .checked_add(&rhs.0)
            .map(Self)
            .ok_or(OverflowError { op: "add" })
    }

    pub fn sub(self, rhs: Self) -> Result<Self, OverflowError> {
        self.0
            .checked_sub(&rhs.0)
            .map(Self)
            .ok_or(OverflowError { op: "sub" })
    }

    pub fn mul(self, rhs: Self) -> Result<Self, OverflowError> {
        self.0
            .checked_mul(&rhs.0)
            .map(Self)
            .ok_or(OverflowError { op: "mul" })
    }

    /// Division; reports zero divisors and `MIN / -1` as overflow.
    pub fn div(self, rhs: Self) -> Result<Self, OverflowError> {
        self.0
            .checked_div(&rhs.0)
            .map(Self)
            .ok_or(OverflowError { op: "div" })
    }

    /// Convert to another width, reporting values outside the target range.
    pub fn cast<U: PrimInt + CheckedAdd + CheckedSub + CheckedMul + CheckedDiv>(
        self,
    ) -> Result<Checked<U>, OverflowError> {
        num_traits::cast(self.0)
            .map(Checked)
            .ok_or(OverflowError { op: "cast" })
    }
}

impl<T: PrimInt + CheckedAdd + CheckedSub + CheckedMul + CheckedDiv> From<T> for Checked<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

pub type CI8 = Checked<i8>;
pub type CI16 = Checked<i16>;
pub type CI32 = Checked<i32>;
pub type CI64 = Checked<i64>;
pub type CU8 = Checked<u8>;
pub type CU16 = Checked<u16>;
pub type CU32 = Checked<u32>;
pub type CU64 = Checked<u64>;
pub type CUsize = Checked<usize>;

#[cfg(test)]
mod tests {
    use super::*;

    fn overflows_on_max_plus_one<T>(max: T)
    where
        T: PrimInt + CheckedAdd + CheckedSub + CheckedMul + CheckedDiv + std::fmt::Debug,
    {
        let r = Checked::new(max).add(Checked::new(T::one()));
        assert_eq!(r, Err(OverflowError { op: "add" }));
    }

    fn overflows_on_min_minus_one<T>(min: T)
    where
        T: PrimInt + CheckedAdd + CheckedSub + CheckedMul + CheckedDiv + std::fmt::Debug,
    {
        let r = Checked::new(min).sub(Checked::new(T::one()));
        assert_eq!(r, Err(OverflowError { op: "sub" }));
    }

    #[test]
    fn addition_overflow_every_width() {
        overflows_on_max_plus_one(u8::MAX);
        overflows_on_max_plus_one(u16::MAX);
        overflows_on_max_plus_one(u32::MAX);
        overflows_on_max_plus_one(u64::MAX);
        overflows_on_max_plus_one(i8::MAX);
        overflows_on_max_plus_one(i16::MAX);
        overflows_on_max_plus_one(i32::MAX);
        overflows_on_max_plus_one(i64::MAX);
    }

    #[test]
    fn subtraction_overflow_every_width() {
        overflows_on_min_minus_one(u8::MIN);
        overflows_on_min_minus_one(u16::MIN);
        overflows_on_min_minus_one(u32::MIN);
        overflows_on_min_minus_one(u64::MIN);
        overflows_on_min_minus_one(i8::MIN);
        overflows_on_min_minus_one(i16::MIN);
        overflows_on_min_minus_one(i32::MIN);
        overflows_on_min_minus_one(i64::MIN);
    }

    #[test]
    fn multiplication_overflow() {
        assert!(CU32::new(1 << 16).mul(CU32::new(1 << 16)).is_err());
        assert!(CI8::new(64).mul(CI8::new(2)).is_err());
        assert_eq!(CU64::new(3).mul(CU64::new(7)).unwrap().get(), 21);
    }

    #[test]
    fn division_by_zero_and_min_by_minus_one() {
        assert!(CU8::new(1).div(CU8::new(0)).is_err());
        assert!(CI32::new(i32::MIN).div(CI32::new(-1)).is_err());
        assert_eq!(CI32::new(-6).div(CI32::new(2)).unwrap().get(), -3);
    }

    #[test]
    fn narrowing_cast_reports_out_of_range() {
        assert!(CU32::new(300).cast::<u8>().is_err());
        assert!(CI16::new(-1).cast::<u16>().is_err());
        assert_eq!(CU16::new(42).cast::<i8>().unwrap().get(), 42i8);
    }

    #[test]
    fn in_range_arithmetic_is_exact() {
        let n = CU32::new(100).mul(CU32::new(3)).unwrap();
        let n = n.add(CU32::new(5)).unwrap();
        assert_eq!(n.get(), 305);
    }
}
