//! Eight residues modulo `M` packed in one 256-bit vector.

use crate::lanes::{Lanes, Portable, U32x8};
use crate::residue::Residue;
use core::fmt;
use core::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// Per-lane selector for [`Residue8::blendv`]: each lane is either all ones or zero.
pub type LaneMask = U32x8;

/// Eight [`Residue<M>`] lanes, each holding a Montgomery representative in `[0, 2M)`.
#[derive(Clone, Copy, Default)]
#[repr(transparent)]
pub struct Residue8<const M: u32> {
    x: U32x8,
}

impl<const M: u32> Residue8<M> {
    pub const ZERO: Self = Self { x: U32x8::ZERO };
    pub const ONE: Self = Self {
        x: U32x8::splat(Residue::<M>::ONE.raw()),
    };

    /// Builds eight residues from arbitrary `u32` lanes, without requiring them to be below `M`.
    #[inline]
    pub fn new(x: [u32; 8]) -> Self {
        let () = Residue::<M>::CHECK_MODULUS;
        let r2 = U32x8::splat(Residue::<M>::R2);
        Self {
            x: Mont8::<Portable, M>::new(Portable).mul_reduce(U32x8(x), r2),
        }
    }

    #[inline]
    pub fn from_array(x: [Residue<M>; 8]) -> Self {
        Self {
            x: U32x8(x.map(Residue::raw)),
        }
    }

    #[inline]
    pub fn from_fn(mut f: impl FnMut(usize) -> Residue<M>) -> Self {
        Self {
            x: U32x8::from_fn(|i| f(i).raw()),
        }
    }

    #[inline(always)]
    pub fn splat(x: Residue<M>) -> Self {
        Self {
            x: U32x8::splat(x.raw()),
        }
    }

    /// `(1, r, r^2, ..., r^7)`
    pub fn powers(r: Residue<M>) -> Self {
        let mut acc = Residue::ONE;
        Self::from_fn(|_| {
            let p = acc;
            acc *= r;
            p
        })
    }

    /// Canonical lane values in `[0, M)`.
    pub fn val(self) -> [u32; 8] {
        self.to_residues().map(Residue::val)
    }

    #[inline]
    pub fn to_residues(self) -> [Residue<M>; 8] {
        self.x.0.map(Residue::from_raw)
    }

    #[inline]
    pub fn get(self, i: usize) -> Residue<M> {
        Residue::from_raw(self.x.0[i])
    }

    #[inline]
    pub fn set(&mut self, i: usize, v: Residue<M>) {
        self.x.0[i] = v.raw();
    }

    /// Sum of the eight lanes.
    pub fn sum(self) -> Residue<M> {
        self.to_residues().into_iter().sum()
    }

    /// `out[i] = self[idx[i] % 8]`.
    #[inline(always)]
    pub fn permute(self, idx: [u32; 8]) -> Self {
        Mont8::new(Portable).permute(self, idx)
    }

    /// `out[i] = self[(i + k) % 8]`.
    #[inline(always)]
    pub fn rotate(self, k: usize) -> Self {
        Mont8::new(Portable).rotate(self, k)
    }

    /// Lane `i` is taken from `rhs` if bit `i` of `MASK` is set.
    #[inline(always)]
    pub fn blend<const MASK: i32>(self, rhs: Self) -> Self {
        Self {
            x: self.x.blend::<MASK>(rhs.x),
        }
    }

    /// Lane `i` is taken from `rhs` where `mask` is all ones. See [`Residue8::mask`].
    #[inline(always)]
    pub fn blendv(self, rhs: Self, mask: LaneMask) -> Self {
        Self {
            x: self.x.blendv(rhs.x, mask),
        }
    }

    /// Lane mask for [`Residue8::blendv`], selecting the lanes where `pred` holds.
    #[inline(always)]
    pub fn mask(pred: impl FnMut(usize) -> bool) -> LaneMask {
        U32x8::mask_from(pred)
    }

    /// Negates the lanes whose bit is set in `MASK`.
    #[inline(always)]
    pub fn neg_masked<const MASK: i32>(self) -> Self {
        Mont8::new(Portable).neg_masked::<MASK>(self)
    }
}

/// [`Residue8`] arithmetic carried out with the lane backend `S`.
///
/// Kernels take one of these by value so the same code runs on [`Portable`] lanes or, inside
/// `V3::vectorize`, on AVX2 registers. The operators on [`Residue8`] use [`Portable`].
#[derive(Copy, Clone, Debug)]
pub(crate) struct Mont8<S, const M: u32> {
    simd: S,
}

impl<S: Lanes, const M: u32> Mont8<S, M> {
    #[inline(always)]
    pub fn new(simd: S) -> Self {
        Self { simd }
    }

    #[inline(always)]
    pub fn add(self, a: Residue8<M>, b: Residue8<M>) -> Residue8<M> {
        let simd = self.simd;
        let x = simd.wrapping_add_u32x8(a.x, b.x);
        let m2 = U32x8::splat(Residue::<M>::M2);
        Residue8 {
            x: simd.min_u32x8(x, simd.wrapping_sub_u32x8(x, m2)),
        }
    }

    #[inline(always)]
    pub fn sub(self, a: Residue8<M>, b: Residue8<M>) -> Residue8<M> {
        let simd = self.simd;
        let x = simd.wrapping_sub_u32x8(a.x, b.x);
        let m2 = U32x8::splat(Residue::<M>::M2);
        Residue8 {
            x: simd.min_u32x8(x, simd.wrapping_add_u32x8(x, m2)),
        }
    }

    #[inline(always)]
    pub fn neg(self, a: Residue8<M>) -> Residue8<M> {
        self.sub(Residue8::ZERO, a)
    }

    /// Montgomery product. Every lane product must be below `2^32 * M`, which holds for
    /// representatives below `2M`.
    #[inline(always)]
    pub fn mul(self, a: Residue8<M>, b: Residue8<M>) -> Residue8<M> {
        Residue8 {
            x: self.mul_reduce(a.x, b.x),
        }
    }

    #[inline(always)]
    fn mul_reduce(self, l: U32x8, r: U32x8) -> U32x8 {
        let simd = self.simd;
        let n_inv = U32x8::splat(Residue::<M>::N_INV);
        let m = U32x8::splat(M);

        let even = simd.mul_even_u32x8(l, r);
        let odd = simd.mul_odd_u32x8(l, r);
        // the low half of each product sits in the even u32 lane
        let even = simd.wrapping_add_u64x4(
            even,
            simd.mul_even_u32x8(simd.mul_even_u32x8(even.as_u32x8(), n_inv).as_u32x8(), m),
        );
        let odd = simd.wrapping_add_u64x4(
            odd,
            simd.mul_even_u32x8(simd.mul_even_u32x8(odd.as_u32x8(), n_inv).as_u32x8(), m),
        );

        // the reduced values are the high halves
        simd.blend_u32x8::<0b0101_0101>(odd.as_u32x8(), simd.shr32_u64x4(even).as_u32x8())
    }

    /// Negates the lanes whose bit is set in `MASK`.
    #[inline(always)]
    pub fn neg_masked<const MASK: i32>(self, a: Residue8<M>) -> Residue8<M> {
        Residue8 {
            x: self.simd.blend_u32x8::<MASK>(a.x, self.neg(a).x),
        }
    }

    /// `out[i] = a[idx[i] % 8]`.
    #[inline(always)]
    pub fn permute(self, a: Residue8<M>, idx: [u32; 8]) -> Residue8<M> {
        Residue8 {
            x: self.simd.permute_u32x8(a.x, U32x8(idx)),
        }
    }

    /// `out[i] = a[(i + k) % 8]`.
    #[inline(always)]
    pub fn rotate(self, a: Residue8<M>, k: usize) -> Residue8<M> {
        Residue8 {
            x: self.simd.permute_u32x8(a.x, U32x8::rotation(k)),
        }
    }
}

impl<const M: u32> Add for Residue8<M> {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        Mont8::new(Portable).add(self, rhs)
    }
}

impl<const M: u32> Sub for Residue8<M> {
    type Output = Self;

    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        Mont8::new(Portable).sub(self, rhs)
    }
}

impl<const M: u32> Mul for Residue8<M> {
    type Output = Self;

    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        Mont8::new(Portable).mul(self, rhs)
    }
}

impl<const M: u32> Mul<Residue<M>> for Residue8<M> {
    type Output = Self;

    #[inline(always)]
    fn mul(self, rhs: Residue<M>) -> Self {
        self * Self::splat(rhs)
    }
}

impl<const M: u32> Neg for Residue8<M> {
    type Output = Self;

    #[inline(always)]
    fn neg(self) -> Self {
        Mont8::new(Portable).neg(self)
    }
}

impl<const M: u32> AddAssign for Residue8<M> {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<const M: u32> SubAssign for Residue8<M> {
    #[inline(always)]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl<const M: u32> MulAssign for Residue8<M> {
    #[inline(always)]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl<const M: u32> PartialEq for Residue8<M> {
    fn eq(&self, other: &Self) -> bool {
        self.to_residues() == other.to_residues()
    }
}

impl<const M: u32> Eq for Residue8<M> {}

impl<const M: u32> fmt::Debug for Residue8<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.val()).finish()
    }
}

impl<const M: u32> From<[u32; 8]> for Residue8<M> {
    #[inline]
    fn from(x: [u32; 8]) -> Self {
        Self::new(x)
    }
}

impl<const M: u32> From<[i32; 8]> for Residue8<M> {
    #[inline]
    fn from(x: [i32; 8]) -> Self {
        Self::from_array(x.map(Residue::from))
    }
}

impl<const M: u32> From<[Residue<M>; 8]> for Residue8<M> {
    #[inline]
    fn from(x: [Residue<M>; 8]) -> Self {
        Self::from_array(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::random;

    const P: u32 = 998_244_353;
    type R8 = Residue8<P>;
    type R = Residue<P>;

    fn r8(x: [i64; 8]) -> R8 {
        R8::from_array(x.map(R::from))
    }

    #[test]
    fn test_construction() {
        let a = r8([1, 2 + P as i64, 3, 4, 5, 6 + P as i64, 7, 8]);
        let b = R8::new([1, 2, 3 + P, 4, 5, 6, 7, 8 + P]);
        let expect = r8([1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(a, expect);
        assert_eq!(b, expect);
        assert_eq!(r8([0, 0, 1, 1, 2, 2, 3, 3]).val(), [0, 0, 1, 1, 2, 2, 3, 3]);
    }

    #[test]
    fn test_arithmetic() {
        let a = r8([1, 2, 3, 4, 5, 6, 7, 8 + 1000]);
        let b = r8([1, 2, 3, 4, 5, 6, 7, 8 + P as i64 - 1000]);
        assert_eq!(a + b, r8([2, 4, 6, 8, 10, 12, 14, 16]));

        let a = r8([11, 22, 33, 44, 55, 66, 77, 88]);
        let b = r8([1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(a - b, r8([10, 20, 30, 40, 50, 60, 70, 80]));

        let a = r8([1, 2, 3, 4, 5, 6, 7, 8]);
        let b = r8([10, 20, 30, 40, 50, 60, 70, 80]);
        assert_eq!(a * b, r8([10, 40, 90, 160, 250, 360, 490, 640]));

        assert_eq!(-a, r8([-1, -2, -3, -4, -5, -6, -7, -8]));
        assert_eq!(a * R::from(3u32), r8([3, 6, 9, 12, 15, 18, 21, 24]));
    }

    #[test]
    fn test_matches_scalar_lanes() {
        for _ in 0..1000 {
            let a = R8::new(random());
            let b = R8::new(random());
            let (sa, sb) = (a.to_residues(), b.to_residues());
            for i in 0..8 {
                assert_eq!((a + b).get(i), sa[i] + sb[i]);
                assert_eq!((a - b).get(i), sa[i] - sb[i]);
                assert_eq!((a * b).get(i), sa[i] * sb[i]);
                assert!((a * b).x.0[i] < R::M2);
                assert!((a - b).x.0[i] < R::M2);
            }
        }
    }

    #[test]
    fn test_equality() {
        let a = r8([1, 2, 3, 4, 5, 6, 7 + P as i64, 8]);
        let b = r8([1, 2, 3 + P as i64, 4, 5 + P as i64, 6, 7, 8]);
        let c = r8([1, 2, 4, 3, 5, 6, 7, 8]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        // distinct representatives of the same residue
        let d = R8 {
            x: U32x8(a.x.0.map(|x| if x < P { x + P } else { x - P })),
        };
        assert_eq!(a, d);
    }

    #[test]
    fn test_lane_movement() {
        let a = r8([0, 10, 20, 30, 40, 50, 60, 70]);
        assert_eq!(
            a.permute([6, 6, 2, 7, 0, 1, 6, 7]),
            r8([60, 60, 20, 70, 0, 10, 60, 70])
        );
        assert_eq!(a.rotate(2), r8([20, 30, 40, 50, 60, 70, 0, 10]));

        let a = r8([1, 2, 3, 4, 5, 6, 7, 8]);
        let b = r8([10, 20, 30, 40, 50, 60, 70, 80]);
        assert_eq!(a.blend::<0b1000_0110>(b), r8([1, 20, 30, 4, 5, 6, 7, 80]));
        assert_eq!(
            a.blendv(b, R8::mask(|i| i < 3)),
            r8([10, 20, 30, 4, 5, 6, 7, 8])
        );
        assert_eq!(
            a.neg_masked::<0b1111_0000>(),
            r8([1, 2, 3, 4, -5, -6, -7, -8])
        );
    }

    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    #[test]
    fn test_avx2_arithmetic_matches_portable() {
        use pulp::x86::V3;

        let Some(simd) = V3::try_new() else {
            return;
        };
        let fast = Mont8::<V3, P>::new(simd);
        let slow = Mont8::<Portable, P>::new(Portable);

        // raw representatives anywhere in [0, 2P), compared bit for bit
        let raw = || R8 {
            x: U32x8::from_fn(|_| random::<u32>() % (2 * P)),
        };
        for _ in 0..1000 {
            let (a, b) = (raw(), raw());
            assert_eq!(fast.add(a, b).x, slow.add(a, b).x);
            assert_eq!(fast.sub(a, b).x, slow.sub(a, b).x);
            assert_eq!(fast.mul(a, b).x, slow.mul(a, b).x);
            assert_eq!(fast.neg(a).x, slow.neg(a).x);
            assert_eq!(
                fast.neg_masked::<0b0110_1001>(a).x,
                slow.neg_masked::<0b0110_1001>(a).x
            );
            let k = random::<usize>() % 8;
            assert_eq!(fast.rotate(a, k).x, slow.rotate(a, k).x);
            let idx = random::<[u32; 8]>().map(|i| i % 8);
            assert_eq!(fast.permute(a, idx).x, slow.permute(a, idx).x);
        }
    }

    #[test]
    fn test_powers_and_sum() {
        let p = R8::powers(R::from(2u32));
        assert_eq!(p.val(), [1, 2, 4, 8, 16, 32, 64, 128]);
        assert_eq!(p.sum().val(), 255);
        assert_eq!(R8::ONE.val(), [1; 8]);
        assert_eq!(R8::from([-1i32, 0, 1, 2, 3, 4, 5, 6]).get(0).val(), P - 1);
    }
}
