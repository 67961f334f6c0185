//! Scalar residues modulo a compile-time odd modulus, in Montgomery form.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::iter::{Product, Sum};
use core::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// `x * inv_u32(x) = 1 (mod 2^32)` for odd `x`, by Newton iteration.
pub const fn inv_u32(x: u32) -> u32 {
    assert!(x % 2 == 1);
    let mut inv = 1u32;
    let mut i = 0;
    // each step doubles the number of correct low bits: 1, 2, 4, 8, 16, 32
    while i < 5 {
        inv = inv.wrapping_mul(2u32.wrapping_sub(inv.wrapping_mul(x)));
        i += 1;
    }
    inv
}

/// An integer modulo `M`, stored as `x * 2^32 mod M`.
///
/// The internal representative lies in `[0, 2M)`; [`Residue::val`] gives the canonical value in
/// `[0, M)`. `M` must be odd and at most `2^30 - 1`, which is checked at compile time.
#[derive(Clone, Copy, Default)]
#[repr(transparent)]
pub struct Residue<const M: u32> {
    x: u32,
}

impl<const M: u32> Residue<M> {
    pub(crate) const CHECK_MODULUS: () = assert!(
        M % 2 == 1 && M > 1 && M <= (1 << 30) - 1,
        "modulus must be odd and at most 2^30 - 1"
    );

    /// `-M^{-1} mod 2^32`
    pub(crate) const N_INV: u32 = inv_u32(M).wrapping_neg();
    /// `2^32 mod M`
    const R: u32 = ((1u64 << 32) % M as u64) as u32;
    /// `2^64 mod M`
    pub(crate) const R2: u32 = ((Self::R as u64 * Self::R as u64) % M as u64) as u32;
    /// Exclusive bound of the raw representatives.
    pub(crate) const M2: u32 = 2 * M;

    pub const MODULUS: u32 = M;
    pub const ZERO: Self = Self { x: 0 };
    pub const ONE: Self = Self { x: Self::R };

    /// Montgomery reduction of `l * r`.
    ///
    /// Requires `l * r < 2^32 * M`; returns `l * r / 2^32 mod M` in `[0, 2M)`.
    #[inline(always)]
    pub(crate) const fn mul_reduce(l: u32, r: u32) -> u32 {
        let x = l as u64 * r as u64;
        let q = (x as u32).wrapping_mul(Self::N_INV);
        ((x + q as u64 * M as u64) >> 32) as u32
    }

    /// Builds a residue from an arbitrary `u32`, without requiring `x < M`.
    #[inline]
    pub const fn new(x: u32) -> Self {
        let () = Self::CHECK_MODULUS;
        Self {
            x: Self::mul_reduce(x, Self::R2),
        }
    }

    /// Wraps an internal Montgomery representative, which must lie in `[0, 2M)`.
    #[inline(always)]
    pub(crate) const fn from_raw(x: u32) -> Self {
        Self { x }
    }

    #[inline(always)]
    pub(crate) const fn raw(self) -> u32 {
        self.x
    }

    /// Canonical value in `[0, M)`.
    #[inline]
    pub const fn val(self) -> u32 {
        let y = Self::mul_reduce(self.x, 1);
        if y < M {
            y
        } else {
            y - M
        }
    }

    #[inline(always)]
    const fn canonical_raw(self) -> u32 {
        if self.x >= M {
            self.x - M
        } else {
            self.x
        }
    }

    pub fn pow(self, mut n: u64) -> Self {
        let mut v = self;
        let mut r = Self::ONE;
        while n != 0 {
            if n & 1 == 1 {
                r *= v;
            }
            v *= v;
            n >>= 1;
        }
        r
    }

    /// Multiplicative inverse by Fermat's little theorem.
    ///
    /// Only meaningful when `M` is prime and `self` is nonzero. See [`Residue::try_inv`] for a
    /// checked version.
    pub fn inv(self) -> Self {
        debug_assert!(self != Self::ZERO, "zero has no multiplicative inverse");
        self.pow(M as u64 - 2)
    }

    /// Multiplicative inverse, or `None` for zero. `M` must be prime.
    pub fn try_inv(self) -> Option<Self> {
        if self == Self::ZERO {
            None
        } else {
            Some(self.pow(M as u64 - 2))
        }
    }
}

impl<const M: u32> Add for Residue<M> {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        let x = self.x + rhs.x;
        Self {
            x: x.min(x.wrapping_sub(Self::M2)),
        }
    }
}

impl<const M: u32> Sub for Residue<M> {
    type Output = Self;

    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        let x = self.x + Self::M2 - rhs.x;
        Self {
            x: x.min(x.wrapping_sub(Self::M2)),
        }
    }
}

impl<const M: u32> Mul for Residue<M> {
    type Output = Self;

    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        Self {
            x: Self::mul_reduce(self.x, rhs.x),
        }
    }
}

impl<const M: u32> Neg for Residue<M> {
    type Output = Self;

    #[inline(always)]
    fn neg(self) -> Self {
        Self::ZERO - self
    }
}

impl<const M: u32> AddAssign for Residue<M> {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<const M: u32> SubAssign for Residue<M> {
    #[inline(always)]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl<const M: u32> MulAssign for Residue<M> {
    #[inline(always)]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl<const M: u32> Sum for Residue<M> {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<const M: u32> Product for Residue<M> {
    fn product<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ONE, Mul::mul)
    }
}

impl<const M: u32> PartialEq for Residue<M> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.canonical_raw() == other.canonical_raw()
    }
}

impl<const M: u32> Eq for Residue<M> {}

impl<const M: u32> Hash for Residue<M> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_raw().hash(state);
    }
}

impl<const M: u32> fmt::Debug for Residue<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.val(), f)
    }
}

impl<const M: u32> fmt::Display for Residue<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.val(), f)
    }
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {$(
        impl<const M: u32> From<$t> for Residue<M> {
            #[inline]
            fn from(x: $t) -> Self {
                Self::new((x as u64 % M as u64) as u32)
            }
        }
    )*};
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {$(
        impl<const M: u32> From<$t> for Residue<M> {
            #[inline]
            fn from(x: $t) -> Self {
                Self::new((x as i64).rem_euclid(M as i64) as u32)
            }
        }
    )*};
}

impl_from_unsigned!(u8, u16, u64, usize);
impl_from_signed!(i8, i16, i32, i64, isize);

// `u32` needs no reduction: `new` accepts the whole range
impl<const M: u32> From<u32> for Residue<M> {
    #[inline]
    fn from(x: u32) -> Self {
        Self::new(x)
    }
}

impl<const M: u32> From<Residue<M>> for u32 {
    #[inline]
    fn from(x: Residue<M>) -> Self {
        x.val()
    }
}
