//! Goldilocks field element.
//!
//! Wraps a `u64` that may hold any value in `[0, 2^64)`. Reduction relies on
//! `2^64 ≡ EPSILON` and `2^96 ≡ -1 (mod p)`, so no division is ever needed.

use super::wide;
use super::{inverse, EPSILON, ORDER};
use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::{Product, Sum};
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

/// An element of the Goldilocks field.
///
/// The stored word is not required to be canonical. Equality, hashing,
/// encoding and display all go through [`GoldilocksField::to_canonical_u64`],
/// so `from_canonical_u64(ORDER)` is indistinguishable from zero.
#[derive(Clone, Copy, Default)]
#[repr(transparent)]
pub struct GoldilocksField(u64);

impl GoldilocksField {
    /// The additive identity.
    pub const ZERO: Self = Self(0);

    /// The multiplicative identity.
    pub const ONE: Self = Self(1);

    /// Two.
    pub const TWO: Self = Self(2);

    /// `p - 1`.
    pub const NEG_ONE: Self = Self(ORDER - 1);

    /// Field order.
    pub const ORDER: u64 = ORDER;

    /// Wraps `n` unchanged.
    ///
    /// Values in `[p, 2^64)` are accepted and behave as their residue.
    #[inline(always)]
    pub const fn from_canonical_u64(n: u64) -> Self {
        Self(n)
    }

    /// Wraps an arbitrary `u64`; identical to [`Self::from_canonical_u64`]
    /// because every word is a valid representation.
    #[inline(always)]
    pub const fn from_noncanonical_u64(n: u64) -> Self {
        Self(n)
    }

    /// Reduces the 96-bit value `lo + hi * 2^64`.
    #[inline]
    pub fn from_noncanonical_u96(lo: u64, hi: u32) -> Self {
        reduce128(wide::join(lo, hi as u64))
    }

    /// Reduces a 128-bit value.
    #[inline]
    pub fn from_noncanonical_u128(n: u128) -> Self {
        reduce128(n)
    }

    /// The canonical representative in `[0, p)`.
    #[inline]
    pub const fn to_canonical_u64(self) -> u64 {
        let mut c = self.0;
        // Any u64 is below 2p, so one subtraction suffices.
        if c >= ORDER {
            c -= ORDER;
        }
        c
    }

    /// The stored word, possibly `>= p`.
    #[inline(always)]
    pub const fn to_noncanonical_u64(self) -> u64 {
        self.0
    }

    /// Whether the element is zero (canonically or as `p` itself).
    #[inline]
    pub const fn is_zero(self) -> bool {
        self.to_canonical_u64() == 0
    }

    /// `2 * self`.
    #[inline]
    pub fn double(self) -> Self {
        self + self
    }

    /// `self * self`.
    #[inline]
    pub fn square(self) -> Self {
        self * self
    }

    /// `self^power` by square-and-multiply over all 64 bits of `power`,
    /// least significant bit first.
    pub fn exp_u64(self, power: u64) -> Self {
        let mut current = self;
        let mut product = Self::ONE;

        for j in 0..64 {
            if (power >> j) & 1 != 0 {
                product *= current;
            }
            current = current.square();
        }
        product
    }

    /// `self^(2^n)` by `n` squarings.
    pub fn exp_power_of_2(self, n: usize) -> Self {
        let mut res = self;
        for _ in 0..n {
            res = res.square();
        }
        res
    }

    /// `self + x * y` with a single reduction.
    #[inline]
    pub fn multiply_accumulate(self, x: Self, y: Self) -> Self {
        // (2^64 - 1)^2 + (2^64 - 1) < 2^128, so the sum cannot overflow.
        reduce128((self.0 as u128) + (x.0 as u128) * (y.0 as u128))
    }

    /// `self + from_canonical_u64(k)`.
    #[inline]
    pub fn add_canonical_u64(self, k: u64) -> Self {
        self + Self::from_canonical_u64(k)
    }

    /// Multiplicative inverse, or `None` for zero.
    pub fn try_inverse(self) -> Option<Self> {
        inverse::try_inverse(self)
    }

    /// Multiplicative inverse.
    ///
    /// # Panics
    ///
    /// Panics if `self` is zero.
    #[allow(clippy::panic)]
    pub fn inverse(self) -> Self {
        match self.try_inverse() {
            Some(inv) => inv,
            None => panic!("attempted to invert zero in the Goldilocks field"),
        }
    }

    /// `2^-exp`.
    pub fn inverse_2exp(exp: usize) -> Self {
        inverse::inverse_2exp(exp)
    }

    /// Canonical 8-byte little-endian encoding.
    pub fn to_bytes_le(self) -> [u8; 8] {
        self.to_canonical_u64().to_le_bytes()
    }

    /// Canonical value as 16 lowercase hex digits (big-endian).
    pub fn to_hex(self) -> String {
        hex::encode(self.to_canonical_u64().to_be_bytes())
    }

    /// Parses 16 hex digits (optionally `0x`-prefixed), rejecting values
    /// `>= p`.
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let value = parse_hex_u64(hex_str)?;
        if value >= ORDER {
            return Err(Error::NonCanonicalConstant {
                table: "field element".to_string(),
                value,
            });
        }
        Ok(Self(value))
    }
}

/// Parses a 64-bit big-endian hex string, with or without a `0x` prefix.
pub(crate) fn parse_hex_u64(s: &str) -> Result<u64> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    if digits.is_empty() || digits.len() > 16 {
        return Err(Error::InvalidHex(s.to_string()));
    }
    // hex::decode wants an even number of digits, left-pad to a full word.
    let padded = format!("{:0>16}", digits);
    let bytes = hex::decode(&padded).map_err(|_| Error::InvalidHex(s.to_string()))?;
    let mut arr = [0u8; 8];
    arr.copy_from_slice(&bytes);
    Ok(u64::from_be_bytes(arr))
}

/// Reduces a 128-bit value modulo `p`.
///
/// Splits `x = lo + 2^64 * (hi_lo + 2^32 * hi_hi)` and uses
/// `2^64 ≡ EPSILON`, `2^96 ≡ -1`. The result may be non-canonical.
#[inline(always)]
pub fn reduce128(x: u128) -> GoldilocksField {
    let (x_lo, x_hi) = wide::split(x);
    let x_hi_hi = x_hi >> 32;
    let x_hi_lo = x_hi & EPSILON;

    let (mut t0, borrow) = x_lo.overflowing_sub(x_hi_hi);
    if borrow {
        // t0 wrapped to at least 2^64 - 2^32 + 1, so this cannot underflow.
        t0 -= EPSILON;
    }
    let t1 = x_hi_lo * EPSILON;
    GoldilocksField(add_no_canonicalize(t0, t1))
}

/// `x + y` folding a carry back in as `EPSILON`. Valid when `y <= 2^64 - 2^33 + 1`
/// (true for any `hi_lo * EPSILON`), since the corrected sum then fits.
#[inline(always)]
fn add_no_canonicalize(x: u64, y: u64) -> u64 {
    let (res_wrapped, carry) = x.overflowing_add(y);
    res_wrapped + EPSILON * (carry as u64)
}

impl Add for GoldilocksField {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        let (sum, over) = self.0.overflowing_add(rhs.0);
        let (mut sum, over) = sum.overflowing_add((over as u64) * EPSILON);
        if over {
            // Only reachable when both operands are non-canonical.
            debug_assert!(
                self.0 > ORDER && rhs.0 > ORDER,
                "double overflow in field addition"
            );
            sum += EPSILON;
        }
        Self(sum)
    }
}

impl Sub for GoldilocksField {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        let (diff, under) = self.0.overflowing_sub(rhs.0);
        let (mut diff, under) = diff.overflowing_sub((under as u64) * EPSILON);
        if under {
            // Only reachable when rhs is non-canonical and self is tiny.
            debug_assert!(
                self.0 < EPSILON - 1 && rhs.0 > ORDER,
                "double underflow in field subtraction"
            );
            diff -= EPSILON;
        }
        Self(diff)
    }
}

impl Neg for GoldilocksField {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        if self.is_zero() {
            Self::ZERO
        } else {
            Self(ORDER - self.to_canonical_u64())
        }
    }
}

impl Mul for GoldilocksField {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        reduce128((self.0 as u128) * (rhs.0 as u128))
    }
}

impl Div for GoldilocksField {
    type Output = Self;

    #[allow(clippy::suspicious_arithmetic_impl)]
    fn div(self, rhs: Self) -> Self {
        self * rhs.inverse()
    }
}

impl AddAssign for GoldilocksField {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for GoldilocksField {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign for GoldilocksField {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Sum for GoldilocksField {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, x| acc + x)
    }
}

impl Product for GoldilocksField {
    fn product<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ONE, |acc, x| acc * x)
    }
}

impl PartialEq for GoldilocksField {
    fn eq(&self, other: &Self) -> bool {
        self.to_canonical_u64() == other.to_canonical_u64()
    }
}

impl Eq for GoldilocksField {}

impl Hash for GoldilocksField {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.to_canonical_u64());
    }
}

impl From<u64> for GoldilocksField {
    fn from(val: u64) -> Self {
        Self::from_noncanonical_u64(val)
    }
}

impl From<u32> for GoldilocksField {
    fn from(val: u32) -> Self {
        Self::from_canonical_u64(val as u64)
    }
}

impl fmt::Debug for GoldilocksField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GoldilocksField")
            .field(&self.to_canonical_u64())
            .finish()
    }
}

impl fmt::Display for GoldilocksField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_u64())
    }
}

impl Serialize for GoldilocksField {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", self.to_hex()))
    }
}

impl<'de> Deserialize<'de> for GoldilocksField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        GoldilocksField::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
