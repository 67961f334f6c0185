//! Raw 256-bit lane vectors: eight `u32` lanes or four `u64` lanes.
//!
//! The lane operations are provided by a [`Lanes`] backend. [`Portable`] runs everywhere and
//! is the reference the tests compare against; on x86 the [`pulp::x86::V3`] token lowers the
//! same operations to AVX2 instructions once the CPU has been checked with `V3::try_new()`.
//!
//! The inherent methods on [`U32x8`] and [`U64x4`] go through [`Portable`].

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
use pulp::{cast, x86::V3};

/// Eight `u32` lanes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[repr(C, align(32))]
pub struct U32x8(pub [u32; 8]);

/// Four `u64` lanes. Lane `k` overlaps the `u32` lanes `2k` (low half) and `2k + 1` (high half).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[repr(C, align(32))]
pub struct U64x4(pub [u64; 4]);

/// Lane instruction set.
///
/// Implementors are zero-sized tokens: holding one is proof that the instructions it uses are
/// available on the running CPU.
pub trait Lanes: Copy {
    fn wrapping_add_u32x8(self, a: U32x8, b: U32x8) -> U32x8;
    fn wrapping_sub_u32x8(self, a: U32x8, b: U32x8) -> U32x8;
    fn min_u32x8(self, a: U32x8, b: U32x8) -> U32x8;
    fn max_u32x8(self, a: U32x8, b: U32x8) -> U32x8;

    /// Full 64-bit products of the even lanes `0, 2, 4, 6`.
    fn mul_even_u32x8(self, a: U32x8, b: U32x8) -> U64x4;
    /// Full 64-bit products of the odd lanes `1, 3, 5, 7`.
    fn mul_odd_u32x8(self, a: U32x8, b: U32x8) -> U64x4;

    /// Lane `i` of the result is taken from `b` if bit `i` of `MASK` is set, from `a` otherwise.
    fn blend_u32x8<const MASK: i32>(self, a: U32x8, b: U32x8) -> U32x8;
    /// Lane `i` of the result is taken from `b` if lane `i` of `mask` is all ones, from `a` if
    /// it is zero. `mask` lanes must be either all ones or zero.
    fn blendv_u32x8(self, a: U32x8, b: U32x8, mask: U32x8) -> U32x8;
    /// `out[i] = a[idx[i] % 8]`.
    fn permute_u32x8(self, a: U32x8, idx: U32x8) -> U32x8;

    fn wrapping_add_u64x4(self, a: U64x4, b: U64x4) -> U64x4;
    /// Shifts every lane right by 32 bits.
    fn shr32_u64x4(self, a: U64x4) -> U64x4;
}

/// Lane-by-lane backend, available on every target.
#[derive(Copy, Clone, Debug, Default)]
pub struct Portable;

#[inline(always)]
fn map2(a: U32x8, b: U32x8, f: impl Fn(u32, u32) -> u32) -> U32x8 {
    U32x8(core::array::from_fn(|i| f(a.0[i], b.0[i])))
}

impl Lanes for Portable {
    #[inline(always)]
    fn wrapping_add_u32x8(self, a: U32x8, b: U32x8) -> U32x8 {
        map2(a, b, u32::wrapping_add)
    }

    #[inline(always)]
    fn wrapping_sub_u32x8(self, a: U32x8, b: U32x8) -> U32x8 {
        map2(a, b, u32::wrapping_sub)
    }

    #[inline(always)]
    fn min_u32x8(self, a: U32x8, b: U32x8) -> U32x8 {
        map2(a, b, u32::min)
    }

    #[inline(always)]
    fn max_u32x8(self, a: U32x8, b: U32x8) -> U32x8 {
        map2(a, b, u32::max)
    }

    #[inline(always)]
    fn mul_even_u32x8(self, a: U32x8, b: U32x8) -> U64x4 {
        U64x4(core::array::from_fn(|k| {
            a.0[2 * k] as u64 * b.0[2 * k] as u64
        }))
    }

    #[inline(always)]
    fn mul_odd_u32x8(self, a: U32x8, b: U32x8) -> U64x4 {
        U64x4(core::array::from_fn(|k| {
            a.0[2 * k + 1] as u64 * b.0[2 * k + 1] as u64
        }))
    }

    #[inline(always)]
    fn blend_u32x8<const MASK: i32>(self, a: U32x8, b: U32x8) -> U32x8 {
        U32x8::from_fn(|i| if (MASK >> i) & 1 == 1 { b.0[i] } else { a.0[i] })
    }

    #[inline(always)]
    fn blendv_u32x8(self, a: U32x8, b: U32x8, mask: U32x8) -> U32x8 {
        U32x8::from_fn(|i| (a.0[i] & !mask.0[i]) | (b.0[i] & mask.0[i]))
    }

    #[inline(always)]
    fn permute_u32x8(self, a: U32x8, idx: U32x8) -> U32x8 {
        U32x8::from_fn(|i| a.0[(idx.0[i] % 8) as usize])
    }

    #[inline(always)]
    fn wrapping_add_u64x4(self, a: U64x4, b: U64x4) -> U64x4 {
        U64x4(core::array::from_fn(|k| a.0[k].wrapping_add(b.0[k])))
    }

    #[inline(always)]
    fn shr32_u64x4(self, a: U64x4) -> U64x4 {
        U64x4(a.0.map(|x| x >> 32))
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
impl Lanes for V3 {
    #[inline(always)]
    fn wrapping_add_u32x8(self, a: U32x8, b: U32x8) -> U32x8 {
        U32x8(cast(self.avx2._mm256_add_epi32(cast(a.0), cast(b.0))))
    }

    #[inline(always)]
    fn wrapping_sub_u32x8(self, a: U32x8, b: U32x8) -> U32x8 {
        U32x8(cast(self.avx2._mm256_sub_epi32(cast(a.0), cast(b.0))))
    }

    #[inline(always)]
    fn min_u32x8(self, a: U32x8, b: U32x8) -> U32x8 {
        U32x8(cast(self.avx2._mm256_min_epu32(cast(a.0), cast(b.0))))
    }

    #[inline(always)]
    fn max_u32x8(self, a: U32x8, b: U32x8) -> U32x8 {
        U32x8(cast(self.avx2._mm256_max_epu32(cast(a.0), cast(b.0))))
    }

    #[inline(always)]
    fn mul_even_u32x8(self, a: U32x8, b: U32x8) -> U64x4 {
        U64x4(cast(self.avx2._mm256_mul_epu32(cast(a.0), cast(b.0))))
    }

    #[inline(always)]
    fn mul_odd_u32x8(self, a: U32x8, b: U32x8) -> U64x4 {
        let avx2 = self.avx2;
        U64x4(cast(avx2._mm256_mul_epu32(
            avx2._mm256_srli_epi64::<32>(cast(a.0)),
            avx2._mm256_srli_epi64::<32>(cast(b.0)),
        )))
    }

    #[inline(always)]
    fn blend_u32x8<const MASK: i32>(self, a: U32x8, b: U32x8) -> U32x8 {
        U32x8(cast(
            self.avx2._mm256_blend_epi32::<MASK>(cast(a.0), cast(b.0)),
        ))
    }

    #[inline(always)]
    fn blendv_u32x8(self, a: U32x8, b: U32x8, mask: U32x8) -> U32x8 {
        U32x8(cast(self.avx2._mm256_blendv_epi8(
            cast(a.0),
            cast(b.0),
            cast(mask.0),
        )))
    }

    #[inline(always)]
    fn permute_u32x8(self, a: U32x8, idx: U32x8) -> U32x8 {
        U32x8(cast(
            self.avx2._mm256_permutevar8x32_epi32(cast(a.0), cast(idx.0)),
        ))
    }

    #[inline(always)]
    fn wrapping_add_u64x4(self, a: U64x4, b: U64x4) -> U64x4 {
        U64x4(cast(self.avx2._mm256_add_epi64(cast(a.0), cast(b.0))))
    }

    #[inline(always)]
    fn shr32_u64x4(self, a: U64x4) -> U64x4 {
        U64x4(cast(self.avx2._mm256_srli_epi64::<32>(cast(a.0))))
    }
}

impl U32x8 {
    pub const ZERO: Self = Self([0; 8]);
    pub const ONES: Self = Self([u32::MAX; 8]);

    #[inline(always)]
    pub const fn splat(x: u32) -> Self {
        Self([x; 8])
    }

    #[inline(always)]
    pub const fn from_array(x: [u32; 8]) -> Self {
        Self(x)
    }

    #[inline(always)]
    pub const fn to_array(self) -> [u32; 8] {
        self.0
    }

    #[inline(always)]
    pub fn from_fn(f: impl FnMut(usize) -> u32) -> Self {
        Self(core::array::from_fn(f))
    }

    /// All ones on the lanes `lo <= i < hi`, zero elsewhere.
    #[inline(always)]
    pub fn lane_mask(lo: usize, hi: usize) -> Self {
        Self::mask_from(|i| lo <= i && i < hi)
    }

    /// Lane mask: all ones in lane `i` if `pred(i)`, zero otherwise.
    #[inline(always)]
    pub fn mask_from(mut pred: impl FnMut(usize) -> bool) -> Self {
        Self::from_fn(|i| if pred(i) { u32::MAX } else { 0 })
    }

    /// Lane indices `(i + k) % 8`, for [`Lanes::permute_u32x8`].
    #[inline(always)]
    pub fn rotation(k: usize) -> Self {
        Self::from_fn(|i| ((i + k) % 8) as u32)
    }

    #[inline(always)]
    pub fn wrapping_add(self, rhs: Self) -> Self {
        Portable.wrapping_add_u32x8(self, rhs)
    }

    #[inline(always)]
    pub fn wrapping_sub(self, rhs: Self) -> Self {
        Portable.wrapping_sub_u32x8(self, rhs)
    }

    #[inline(always)]
    pub fn min(self, rhs: Self) -> Self {
        Portable.min_u32x8(self, rhs)
    }

    #[inline(always)]
    pub fn max(self, rhs: Self) -> Self {
        Portable.max_u32x8(self, rhs)
    }

    #[inline(always)]
    pub fn mul_even(self, rhs: Self) -> U64x4 {
        Portable.mul_even_u32x8(self, rhs)
    }

    #[inline(always)]
    pub fn mul_odd(self, rhs: Self) -> U64x4 {
        Portable.mul_odd_u32x8(self, rhs)
    }

    #[inline(always)]
    pub fn blend<const MASK: i32>(self, rhs: Self) -> Self {
        Portable.blend_u32x8::<MASK>(self, rhs)
    }

    #[inline(always)]
    pub fn blendv(self, rhs: Self, mask: Self) -> Self {
        Portable.blendv_u32x8(self, rhs, mask)
    }

    /// `out[i] = self[idx[i] % 8]`.
    #[inline(always)]
    pub fn permute(self, idx: Self) -> Self {
        Portable.permute_u32x8(self, idx)
    }

    /// `out[i] = self[(i + k) % 8]`.
    #[inline(always)]
    pub fn rotate(self, k: usize) -> Self {
        self.permute(Self::rotation(k))
    }

    #[inline(always)]
    pub fn as_u64x4(self) -> U64x4 {
        let x = self.0;
        U64x4(core::array::from_fn(|k| {
            x[2 * k] as u64 | ((x[2 * k + 1] as u64) << 32)
        }))
    }
}

impl U64x4 {
    #[inline(always)]
    pub fn wrapping_add(self, rhs: Self) -> Self {
        Portable.wrapping_add_u64x4(self, rhs)
    }

    #[inline(always)]
    pub fn shr32(self) -> Self {
        Portable.shr32_u64x4(self)
    }

    #[inline(always)]
    pub fn as_u32x8(self) -> U32x8 {
        let x = self.0;
        U32x8(core::array::from_fn(|i| {
            let lane = x[i / 2];
            if i % 2 == 0 {
                lane as u32
            } else {
                (lane >> 32) as u32
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::random;

    fn random_u32x8() -> U32x8 {
        U32x8(random())
    }

    #[test]
    fn test_lane_layout() {
        let x = U32x8([1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(x.as_u64x4().0[0], 1 | (2 << 32));
        assert_eq!(x.as_u64x4().as_u32x8(), x);
    }

    #[test]
    fn test_mul_even_odd() {
        let a = U32x8([u32::MAX, 3, 5, 7, 11, 13, 17, 19]);
        let b = U32x8([u32::MAX, 2, 2, 2, 2, 2, 2, 2]);
        assert_eq!(
            a.mul_even(b).0,
            [u32::MAX as u64 * u32::MAX as u64, 10, 22, 34]
        );
        assert_eq!(a.mul_odd(b).0, [6, 14, 26, 38]);
    }

    #[test]
    fn test_rotate_permute_blend() {
        let x = U32x8([10, 11, 12, 13, 14, 15, 16, 17]);
        assert_eq!(x.rotate(3).0, [13, 14, 15, 16, 17, 10, 11, 12]);
        assert_eq!(x.rotate(0), x);
        assert_eq!(
            x.permute(U32x8([6, 6, 2, 7, 0, 1, 6, 15])).0,
            [16, 16, 12, 17, 10, 11, 16, 17]
        );

        let y = U32x8::splat(0);
        assert_eq!(
            x.blend::<0b1000_0110>(y).0,
            [10, 0, 0, 13, 14, 15, 16, 0]
        );
        let mask = U32x8::lane_mask(5, 8);
        assert_eq!(x.blendv(y, mask).0, [10, 11, 12, 13, 14, 0, 0, 0]);
        assert_eq!(U32x8::lane_mask(2, 4).to_array(), [0, 0, !0, !0, 0, 0, 0, 0]);
    }

    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    fn check_matches_portable(simd: impl Lanes) {
        let p = Portable;
        for _ in 0..1000 {
            let (a, b) = (random_u32x8(), random_u32x8());
            let mask = U32x8::mask_from(|_| random::<bool>());

            assert_eq!(simd.wrapping_add_u32x8(a, b), p.wrapping_add_u32x8(a, b));
            assert_eq!(simd.wrapping_sub_u32x8(a, b), p.wrapping_sub_u32x8(a, b));
            assert_eq!(simd.min_u32x8(a, b), p.min_u32x8(a, b));
            assert_eq!(simd.max_u32x8(a, b), p.max_u32x8(a, b));
            assert_eq!(simd.mul_even_u32x8(a, b), p.mul_even_u32x8(a, b));
            assert_eq!(simd.mul_odd_u32x8(a, b), p.mul_odd_u32x8(a, b));
            assert_eq!(
                simd.blend_u32x8::<0b0101_0101>(a, b),
                p.blend_u32x8::<0b0101_0101>(a, b)
            );
            assert_eq!(
                simd.blend_u32x8::<0b1110_0001>(a, b),
                p.blend_u32x8::<0b1110_0001>(a, b)
            );
            assert_eq!(simd.blendv_u32x8(a, b, mask), p.blendv_u32x8(a, b, mask));
            assert_eq!(simd.permute_u32x8(a, b), p.permute_u32x8(a, b));

            let (c, d) = (a.as_u64x4(), b.as_u64x4());
            assert_eq!(simd.wrapping_add_u64x4(c, d), p.wrapping_add_u64x4(c, d));
            assert_eq!(simd.shr32_u64x4(c), p.shr32_u64x4(c));
        }
    }

    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    #[test]
    fn test_avx2_matches_portable() {
        if let Some(simd) = V3::try_new() {
            check_matches_portable(simd);
        }
    }

    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    #[test]
    fn test_avx2_detected_at_runtime() {
        // no `-C target-feature` is needed for the avx2 backend
        if is_x86_feature_detected!("avx2")
            && is_x86_feature_detected!("fma")
            && is_x86_feature_detected!("bmi1")
            && is_x86_feature_detected!("bmi2")
            && is_x86_feature_detected!("lzcnt")
        {
            assert!(V3::try_new().is_some());
        }
    }
}
