//! Branch-free integer helpers: min/max, power-of-two rounding, byte swapping.
//!
//! Comparisons work on the unsigned bit pattern. Signed values are biased by
//! flipping the sign bit first, which maps two's-complement order onto
//! unsigned order, so `min(127i8, -128i8) == -128` exactly like `Ord::min`.

mod sealed {
    pub trait Sealed {}
}

/// Fixed-width integers supported by [`min`], [`max`] and [`next_pow2`].
pub trait Integer: Copy + Eq + sealed::Sealed {
    /// Smaller of `self` and `other`.
    fn min_of(self, other: Self) -> Self;
    /// Larger of `self` and `other`.
    fn max_of(self, other: Self) -> Self;
    /// Smallest power of two `>= max(self, 1)`, wrapping to 0 past the width.
    fn next_pow2(self) -> Self;
}

/// Integers whose byte order can be reversed with [`swap_bytes`].
pub trait SwapBytes: Copy + sealed::Sealed {
    /// Value with its bytes in reverse order.
    fn byte_swapped(self) -> Self;
}

macro_rules! impl_unsigned {
    ($($t:ty),* $(,)?) => {$(
        impl sealed::Sealed for $t {}

        impl Integer for $t {
            #[inline]
            fn min_of(self, other: Self) -> Self {
                // all ones when `other` wins
                let mask = (0 as $t).wrapping_sub((other < self) as $t);
                self ^ ((self ^ other) & mask)
            }

            #[inline]
            fn max_of(self, other: Self) -> Self {
                let mask = (0 as $t).wrapping_sub((other > self) as $t);
                self ^ ((self ^ other) & mask)
            }

            #[inline]
            fn next_pow2(self) -> Self {
                let mut v = self.max_of(1).wrapping_sub(1);
                let mut shift = 1;
                while shift < <$t>::BITS {
                    v |= v >> shift;
                    shift <<= 1;
                }
                v.wrapping_add(1)
            }
        }
    )*};
}

macro_rules! impl_signed {
    ($($t:ty => $u:ty),* $(,)?) => {$(
        impl sealed::Sealed for $t {}

        impl Integer for $t {
            #[inline]
            fn min_of(self, other: Self) -> Self {
                const BIAS: $u = 1 << (<$u>::BITS - 1);
                (((self as $u) ^ BIAS).min_of((other as $u) ^ BIAS) ^ BIAS) as $t
            }

            #[inline]
            fn max_of(self, other: Self) -> Self {
                const BIAS: $u = 1 << (<$u>::BITS - 1);
                (((self as $u) ^ BIAS).max_of((other as $u) ^ BIAS) ^ BIAS) as $t
            }

            #[inline]
            fn next_pow2(self) -> Self {
                (self as $u).next_pow2() as $t
            }
        }
    )*};
}

macro_rules! impl_swap {
    ($($t:ty),* $(,)?) => {$(
        impl SwapBytes for $t {
            #[inline]
            fn byte_swapped(self) -> Self {
                self.swap_bytes()
            }
        }
    )*};
}

impl_unsigned!(u8, u16, u32, u64, usize);
impl_signed!(i8 => u8, i16 => u16, i32 => u32, i64 => u64);
impl_swap!(u16, u32, u64, i16, i32, i64);

/// Smaller of two same-width integers.
#[inline]
pub fn min<T: Integer>(x: T, y: T) -> T {
    x.min_of(y)
}

/// Larger of two same-width integers.
#[inline]
pub fn max<T: Integer>(x: T, y: T) -> T {
    x.max_of(y)
}

/// Round up to the next power of two.
///
/// `next_pow2(0) == 1`, powers of two map to themselves, and inputs whose
/// result does not fit the width wrap to 0 (`next_pow2(254u8) == 0`).
#[inline]
pub fn next_pow2<T: Integer>(value: T) -> T {
    value.next_pow2()
}

/// Reverse the byte order of a 16, 32 or 64-bit integer.
#[inline]
pub fn swap_bytes<T: SwapBytes>(value: T) -> T {
    value.byte_swapped()
}
