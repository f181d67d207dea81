//! Wide-integer helpers.
//!
//! Native `u128`/`i128` cover most intermediates. The fast partial round needs
//! one more word: a dot product of twelve `u64 x u64` products can exceed
//! 2^128, so it is accumulated as a 160-bit `(u128, u32)` pair.

/// Splits a `u128` into its `(low, high)` 64-bit halves.
#[inline(always)]
pub const fn split(x: u128) -> (u64, u64) {
    (x as u64, (x >> 64) as u64)
}

/// Joins `(low, high)` 64-bit halves into a `u128`.
#[inline(always)]
pub const fn join(lo: u64, hi: u64) -> u128 {
    ((hi as u128) << 64) | lo as u128
}

/// 160-bit unsigned accumulator: `lo + hi * 2^128`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct U160 {
    /// Low 128 bits.
    pub lo: u128,
    /// Carry word above bit 128.
    pub hi: u32,
}

impl U160 {
    /// The zero accumulator.
    pub const ZERO: U160 = U160 { lo: 0, hi: 0 };

    /// Adds a `u128`, propagating the carry into the high word.
    #[inline(always)]
    pub const fn add_u128(self, y: u128) -> U160 {
        let (lo, over) = self.lo.overflowing_add(y);
        U160 {
            lo,
            hi: self.hi + over as u32,
        }
    }

    /// Adds the full product `x * y` of two `u64` values.
    #[inline(always)]
    pub const fn add_product(self, x: u64, y: u64) -> U160 {
        self.add_u128((x as u128) * (y as u128))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_join_inverse() {
        let x = 0x0123_4567_89ab_cdef_fedc_ba98_7654_3210u128;
        let (lo, hi) = split(x);
        assert_eq!(lo, 0xfedc_ba98_7654_3210);
        assert_eq!(hi, 0x0123_4567_89ab_cdef);
        assert_eq!(join(lo, hi), x);
    }

    #[test]
    fn u160_carries_into_high_word() {
        let acc = U160 {
            lo: u128::MAX,
            hi: 0,
        }
        .add_u128(1);
        assert_eq!(acc, U160 { lo: 0, hi: 1 });
    }

    #[test]
    fn u160_twelve_max_products() {
        let mut acc = U160::ZERO;
        for _ in 0..12 {
            acc = acc.add_product(u64::MAX, u64::MAX);
        }
        // 12 * (2^64 - 1)^2 = 11 * 2^128 + (2^128 - 24 * 2^64 + 12)
        assert_eq!(acc.hi, 11);
        assert_eq!(acc.lo, 0u128.wrapping_sub(24u128 << 64) + 12);
    }
}
