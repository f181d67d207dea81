//! Multiplicative inversion by a plus-minus extended binary GCD.
//!
//! Starting from `(f, g) = (x, p)` the loop keeps `c * x ≡ 2^k * f` and
//! `d * x ≡ 2^k * g (mod p)` while shrinking `f` until it reaches 1. The
//! inverse is then `c * 2^-k`. The Bezout coefficients are kept reduced
//! modulo `p` after every update so they fit comfortably in an `i128` and a
//! near-canonical value comes out at the end.

use super::{GoldilocksField, ORDER, TWO_ADICITY};

const ORDER_I128: i128 = ORDER as i128;

/// `2^-TWO_ADICITY = p - (p - 1) / 2^32`.
const INVERSE_2_POW_ADICITY: GoldilocksField =
    GoldilocksField::from_canonical_u64(ORDER - ((ORDER - 1) >> TWO_ADICITY));

/// `2^-exp` in the field.
///
/// For `exp <= 32`, `p - (p - 1) / 2^exp` is exact because `2^32 | p - 1`.
/// Larger exponents multiply in `2^-32` until the remainder fits.
pub fn inverse_2exp(exp: usize) -> GoldilocksField {
    if exp <= TWO_ADICITY {
        return GoldilocksField::from_canonical_u64(ORDER - ((ORDER - 1) >> exp));
    }

    let mut res = INVERSE_2_POW_ADICITY;
    let mut e = exp - TWO_ADICITY;
    while e > TWO_ADICITY {
        res *= INVERSE_2_POW_ADICITY;
        e -= TWO_ADICITY;
    }
    res * GoldilocksField::from_canonical_u64(ORDER - ((ORDER - 1) >> e))
}

/// Inverse of `x`, or `None` when `x ≡ 0`.
pub fn try_inverse(x: GoldilocksField) -> Option<GoldilocksField> {
    let (c, k) = bezout(x.to_canonical_u64())?;
    let scale = inverse_2exp(k as usize);

    match c {
        1 => Some(scale),
        -1 => Some(-scale),
        _ => {
            let (c, adjust) = canonical_coefficient(c);
            debug_assert!(
                adjust.within_bounds(),
                "Bezout coefficient needed {} additions and {} subtractions",
                adjust.additions,
                adjust.subtractions
            );
            Some(GoldilocksField::from_canonical_u64(c) * scale)
        }
    }
}

/// Runs the GCD on a canonical `x`, returning `(c, k)` with
/// `c * x ≡ 2^k (mod p)`. `None` for zero.
pub(crate) fn bezout(x: u64) -> Option<(i128, u32)> {
    if x == 0 {
        return None;
    }

    // Pull out factors of two first so f is odd.
    let k = x.trailing_zeros();
    let f = x >> k;
    if f == 1 {
        return Some((1, k));
    }

    let mut state = GcdState {
        f,
        g: ORDER,
        c: 1,
        d: 0,
        k,
    };

    // Two overflow-safe steps bring both f and g below 2^63.
    state.safe_step();
    if state.f == 1 {
        return Some((state.c, state.k));
    }
    state.safe_step();

    while state.f != 1 {
        state.unchecked_step();
    }
    Some((state.c, state.k))
}

/// Number of `p` corrections needed to canonicalise a coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Adjustments {
    pub(crate) additions: u32,
    pub(crate) subtractions: u32,
}

impl Adjustments {
    /// At most two additions and one subtraction.
    pub(crate) fn within_bounds(self) -> bool {
        self.additions <= 2 && self.subtractions <= 1
    }
}

/// Maps `c` into `[0, p)` by repeated addition or subtraction of `p`.
pub(crate) fn canonical_coefficient(mut c: i128) -> (u64, Adjustments) {
    let mut adjust = Adjustments {
        additions: 0,
        subtractions: 0,
    };
    while c < 0 {
        c += ORDER_I128;
        adjust.additions += 1;
    }
    while c >= ORDER_I128 {
        c -= ORDER_I128;
        adjust.subtractions += 1;
    }
    (c as u64, adjust)
}

struct GcdState {
    f: u64,
    g: u64,
    c: i128,
    d: i128,
    k: u32,
}

impl GcdState {
    #[inline]
    fn order(&mut self) {
        if self.f < self.g {
            std::mem::swap(&mut self.f, &mut self.g);
            std::mem::swap(&mut self.c, &mut self.d);
        }
    }

    /// One step that never overflows, even with `f` close to `2^64`.
    fn safe_step(&mut self) {
        self.order();
        if self.f & 3 == self.g & 3 {
            // f - g ≡ 0 (mod 4)
            self.f -= self.g;
            self.c = (self.c - self.d) % ORDER_I128;
            let kk = self.f.trailing_zeros();
            self.f >>= kk;
            self.d = shl_mod(self.d, kk);
            self.k += kk;
        } else {
            // f + g ≡ 0 (mod 4); compute (f + g) / 4 without the 65-bit sum.
            self.f = (self.f >> 2) + (self.g >> 2) + 1;
            self.c = (self.c + self.d) % ORDER_I128;
            let kk = self.f.trailing_zeros();
            self.f >>= kk;
            self.d = shl_mod(self.d, kk + 2);
            self.k += kk + 2;
        }
    }

    /// One step assuming `f, g < 2^63`, so `f + g` fits in a `u64`.
    fn unchecked_step(&mut self) {
        self.order();
        if self.f & 3 == self.g & 3 {
            self.f -= self.g;
            self.c = (self.c - self.d) % ORDER_I128;
        } else {
            self.f += self.g;
            self.c = (self.c + self.d) % ORDER_I128;
        }
        let kk = self.f.trailing_zeros();
        self.f >>= kk;
        self.d = shl_mod(self.d, kk);
        self.k += kk;
    }
}

/// `(x << shift) mod p` for `|x| < 2^64`, staying inside `i128`.
#[inline]
fn shl_mod(mut x: i128, mut shift: u32) -> i128 {
    while shift > 62 {
        x = (x << 62) % ORDER_I128;
        shift -= 62;
    }
    (x << shift) % ORDER_I128
}
