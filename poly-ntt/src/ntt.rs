//! Radix-4 number theoretic transform over sequences of [`Residue8`] blocks.

use crate::error::{Error, ErrorKind, UnwrapResultExt};
use crate::plan::{NttTables, TableCache};
use crate::prime::is_prime32;
use crate::lanes::{Lanes, Portable};
use crate::residue::Residue;
use crate::residue8::{Mont8, Residue8};
use crate::utils::izip;
use std::sync::Arc;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
use pulp::x86::V3;

/// Transform engine for the prime modulus `M`.
///
/// A sequence of `n` blocks holds `8n` coefficients, block `i` lane `j` being coefficient
/// `8i + j`. `n` must be a power of two no larger than [`Ntt::max_blocks`].
///
/// [`Ntt::fwd`] evaluates the coefficients at the `8n`-th roots of unity and leaves the values in
/// bit reversed order. [`Ntt::inv`] undoes it up to a factor of `8n`, which
/// [`Ntt::mul_assign_normalize`] and [`Ntt::normalize`] divide out.
#[derive(Clone, Debug)]
pub struct Ntt<const M: u32> {
    tables: Arc<NttTables<M>>,
}

impl<const M: u32> Ntt<M> {
    const CHECK_PRIME: () = assert!(is_prime32(M), "transform modulus must be prime");

    /// Engine backed by the process-wide table cache.
    pub fn new() -> Self {
        Self::with_cache(TableCache::global())
    }

    pub fn with_cache(cache: &TableCache) -> Self {
        let () = Self::CHECK_PRIME;
        Self {
            tables: cache.get::<M>(),
        }
    }

    pub fn tables(&self) -> &NttTables<M> {
        &self.tables
    }

    pub fn max_blocks(&self) -> usize {
        self.tables.max_blocks()
    }

    /// Checks that a sequence of `blocks` blocks can be transformed.
    pub fn check_len(&self, blocks: usize) -> Result<(), Error> {
        let max_blocks = self.max_blocks();
        if blocks.is_power_of_two() && blocks <= max_blocks {
            Ok(())
        } else {
            Err(ErrorKind::UnsupportedLength { blocks, max_blocks }.into())
        }
    }

    /// Forward transform in place.
    pub fn try_fwd(&self, a: &mut [Residue8<M>]) -> Result<(), Error> {
        self.check_len(a.len())?;
        let tables = &*self.tables;

        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        if let Some(simd) = V3::try_new() {
            fwd_avx2(simd, tables, a);
            return Ok(());
        }
        fwd_scalar(tables, a);
        Ok(())
    }

    /// Inverse transform in place, scaled by `8n`.
    pub fn try_inv(&self, a: &mut [Residue8<M>]) -> Result<(), Error> {
        self.check_len(a.len())?;
        let tables = &*self.tables;

        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        if let Some(simd) = V3::try_new() {
            inv_avx2(simd, tables, a);
            return Ok(());
        }
        inv_scalar(tables, a);
        Ok(())
    }

    /// Same as [`Ntt::try_fwd`], panicking on an unsupported length.
    #[track_caller]
    pub fn fwd(&self, a: &mut [Residue8<M>]) {
        self.try_fwd(a).unwrap_display();
    }

    /// Same as [`Ntt::try_inv`], panicking on an unsupported length.
    #[track_caller]
    pub fn inv(&self, a: &mut [Residue8<M>]) {
        self.try_inv(a).unwrap_display();
    }

    /// `lhs[i] = lhs[i] * rhs[i] / (8n)`, where `n = lhs.len()`.
    pub fn mul_assign_normalize(&self, lhs: &mut [Residue8<M>], rhs: &[Residue8<M>]) {
        assert_eq!(lhs.len(), rhs.len());
        let scale = Residue8::splat(Self::inv_len(lhs.len()));

        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        if let Some(simd) = V3::try_new() {
            simd.vectorize(
                #[inline(always)]
                move || mul_assign_scaled(Mont8::new(simd), lhs, rhs, scale),
            );
            return;
        }
        mul_assign_scaled(Mont8::new(Portable), lhs, rhs, scale);
    }

    /// `values[i] = values[i] / (8n)`, where `n = values.len()`.
    pub fn normalize(&self, values: &mut [Residue8<M>]) {
        let scale = Residue8::splat(Self::inv_len(values.len()));

        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        if let Some(simd) = V3::try_new() {
            simd.vectorize(
                #[inline(always)]
                move || scale_assign(Mont8::new(simd), values, scale),
            );
            return;
        }
        scale_assign(Mont8::new(Portable), values, scale);
    }

    fn inv_len(blocks: usize) -> Residue<M> {
        Residue::from(8 * blocks).inv()
    }
}

impl<const M: u32> Default for Ntt<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn fwd_avx2<const M: u32>(simd: V3, t: &NttTables<M>, a: &mut [Residue8<M>]) {
    simd.vectorize(
        #[inline(always)]
        move || fwd(Mont8::new(simd), t, a),
    );
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn inv_avx2<const M: u32>(simd: V3, t: &NttTables<M>, a: &mut [Residue8<M>]) {
    simd.vectorize(
        #[inline(always)]
        move || inv(Mont8::new(simd), t, a),
    );
}

fn fwd_scalar<const M: u32>(t: &NttTables<M>, a: &mut [Residue8<M>]) {
    fwd(Mont8::new(Portable), t, a);
}

fn inv_scalar<const M: u32>(t: &NttTables<M>, a: &mut [Residue8<M>]) {
    inv(Mont8::new(Portable), t, a);
}

#[inline(always)]
fn mul_assign_scaled<S: Lanes, const M: u32>(
    m: Mont8<S, M>,
    lhs: &mut [Residue8<M>],
    rhs: &[Residue8<M>],
    scale: Residue8<M>,
) {
    for (l, r) in izip!(lhs, rhs) {
        *l = m.mul(m.mul(*l, *r), scale);
    }
}

#[inline(always)]
fn scale_assign<S: Lanes, const M: u32>(
    m: Mont8<S, M>,
    values: &mut [Residue8<M>],
    scale: Residue8<M>,
) {
    for v in values {
        *v = m.mul(*v, scale);
    }
}

/// Length 8 transform within one block, output in bit reversed order.
#[inline(always)]
fn fwd_single<S: Lanes, const M: u32>(
    m: Mont8<S, M>,
    t: &NttTables<M>,
    x: Residue8<M>,
) -> Residue8<M> {
    let x = m.mul(m.add(m.neg_masked::<0b1111_0000>(x), m.rotate(x, 4)), t.step8);
    let x = m.mul(
        m.add(m.neg_masked::<0b1100_1100>(x), m.permute(x, [2, 3, 0, 1, 6, 7, 4, 5])),
        t.step4,
    );
    m.add(m.neg_masked::<0b1010_1010>(x), m.permute(x, [1, 0, 3, 2, 5, 4, 7, 6]))
}

/// Inverse of [`fwd_single`] up to a factor of 8.
#[inline(always)]
fn inv_single<S: Lanes, const M: u32>(
    m: Mont8<S, M>,
    t: &NttTables<M>,
    x: Residue8<M>,
) -> Residue8<M> {
    let x = m.mul(
        m.add(m.neg_masked::<0b1010_1010>(x), m.permute(x, [1, 0, 3, 2, 5, 4, 7, 6])),
        t.istep4,
    );
    let x = m.mul(
        m.add(m.neg_masked::<0b1100_1100>(x), m.permute(x, [2, 3, 0, 1, 6, 7, 4, 5])),
        t.istep8,
    );
    m.add(m.neg_masked::<0b1111_0000>(x), m.rotate(x, 4))
}

#[inline(always)]
fn butterfly2<S: Lanes, const M: u32>(m: Mont8<S, M>, a: &mut [Residue8<M>]) {
    let (lo, hi) = a.split_at_mut(a.len() / 2);
    for (l, r) in izip!(lo, hi) {
        let (x, y) = (*l, *r);
        *l = m.add(x, y);
        *r = m.sub(x, y);
    }
}

#[inline(always)]
fn quarters<const M: u32>(block: &mut [Residue8<M>]) -> [&mut [Residue8<M>]; 4] {
    let len = block.len() / 4;
    let (a0, rest) = block.split_at_mut(len);
    let (a1, rest) = rest.split_at_mut(len);
    let (a2, a3) = rest.split_at_mut(len);
    [a0, a1, a2, a3]
}

#[inline(always)]
fn fwd<S: Lanes, const M: u32>(m: Mont8<S, M>, t: &NttTables<M>, a: &mut [Residue8<M>]) {
    let n = a.len();
    let lg = n.trailing_zeros();

    let mut h = lg;
    if h % 2 == 1 {
        butterfly2(m, a);
        h -= 1;
    }

    let w4 = Residue8::splat(t.w[2]);
    while h >= 2 {
        let mut rot = Residue8::ONE;
        for (k, block) in a.chunks_exact_mut(1 << h).enumerate() {
            let rot2 = m.mul(rot, rot);
            let rot3 = m.mul(rot2, rot);
            let [a0, a1, a2, a3] = quarters(block);
            for (a0, a1, a2, a3) in izip!(a0, a1, a2, a3) {
                let x0 = *a0;
                let x1 = m.mul(*a1, rot);
                let x2 = m.mul(*a2, rot2);
                let x3 = m.mul(*a3, rot3);
                let y = m.mul(m.sub(x1, x3), w4);

                let (s02, d02) = (m.add(x0, x2), m.sub(x0, x2));
                let s13 = m.add(x1, x3);
                *a0 = m.add(s02, s13);
                *a1 = m.sub(s02, s13);
                *a2 = m.add(d02, y);
                *a3 = m.sub(d02, y);
            }
            if (k + 1) << h < n {
                let step = Residue8::splat(t.rot8[(!k).trailing_zeros() as usize + 3]);
                rot = m.mul(rot, step);
            }
        }
        h -= 2;
    }

    let mut rot = Residue8::ONE;
    for (i, x) in a.iter_mut().enumerate() {
        *x = fwd_single(m, t, m.mul(*x, rot));
        if i + 1 < n {
            rot = m.mul(rot, t.rot16i[(!i).trailing_zeros() as usize + 4]);
        }
    }
}

#[inline(always)]
fn inv<S: Lanes, const M: u32>(m: Mont8<S, M>, t: &NttTables<M>, a: &mut [Residue8<M>]) {
    let n = a.len();
    let lg = n.trailing_zeros();

    let mut irot = Residue8::ONE;
    for (i, x) in a.iter_mut().enumerate() {
        *x = m.mul(inv_single(m, t, *x), irot);
        if i + 1 < n {
            irot = m.mul(irot, t.irot16i[(!i).trailing_zeros() as usize + 4]);
        }
    }

    let iw4 = Residue8::splat(t.iw[2]);
    let mut h = 0;
    while h + 2 <= lg {
        h += 2;
        let mut irot = Residue8::ONE;
        for (k, block) in a.chunks_exact_mut(1 << h).enumerate() {
            let irot2 = m.mul(irot, irot);
            let irot3 = m.mul(irot2, irot);
            let [a0, a1, a2, a3] = quarters(block);
            for (a0, a1, a2, a3) in izip!(a0, a1, a2, a3) {
                let x0 = m.add(*a0, *a1);
                let x1 = m.sub(*a0, *a1);
                let x2 = m.add(*a2, *a3);
                let x3 = m.mul(m.sub(*a2, *a3), iw4);

                *a0 = m.add(x0, x2);
                *a1 = m.mul(m.add(x1, x3), irot);
                *a2 = m.mul(m.sub(x0, x2), irot2);
                *a3 = m.mul(m.sub(x1, x3), irot3);
            }
            if (k + 1) << h < n {
                let step = Residue8::splat(t.irot8[(!k).trailing_zeros() as usize + 3]);
                irot = m.mul(irot, step);
            }
        }
    }

    if h + 1 == lg {
        butterfly2(m, a);
    }
}
