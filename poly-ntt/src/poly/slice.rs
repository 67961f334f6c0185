use super::{blocks_for, Poly};
use crate::lanes::U32x8;
use crate::residue8::Residue8;
use core::ops::{Shl, ShlAssign};

impl<const M: u32> Poly<M> {
    /// Truncates or zero-extends to `n` coefficients.
    pub fn resize(&mut self, n: usize) {
        self.len = n;
        self.blocks.resize(blocks_for(n), Residue8::ZERO);
        self.clear_tail();
    }

    /// `dst[dst_start..dst_start + len] = self[start..start + len]`.
    ///
    /// # Panics
    /// If either range is out of bounds.
    pub fn copy_to(&self, start: usize, len: usize, dst: &mut Self, dst_start: usize) {
        assert!(
            start + len <= self.len,
            "source range {start}..{} out of bounds for length {}",
            start + len,
            self.len
        );
        assert!(
            dst_start + len <= dst.len,
            "destination range {dst_start}..{} out of bounds for length {}",
            dst_start + len,
            dst.len
        );
        if len == 0 {
            return;
        }

        let src = &self.blocks;
        let out = &mut dst.blocks;
        let (mut s, mut d, mut len) = (start, dst_start, len);

        if s % 8 == d % 8 {
            let head = len.min(8 - d % 8);
            let mask = U32x8::lane_mask(d % 8, d % 8 + head);
            out[d / 8] = out[d / 8].blendv(src[s / 8], mask);
            s += head;
            d += head;
            len -= head;

            // both cursors are now block aligned
            let whole = len / 8;
            out[d / 8..d / 8 + whole].copy_from_slice(&src[s / 8..s / 8 + whole]);
            s += 8 * whole;
            d += 8 * whole;
            len -= 8 * whole;

            if len > 0 {
                out[d / 8] = out[d / 8].blendv(src[s / 8], U32x8::lane_mask(0, len));
            }
        } else {
            // lane i of a destination block comes from lane (i + shift) % 8 of a source block
            let shift = (s % 8 + 8 - d % 8) % 8;
            let merge = U32x8::lane_mask(8 - shift, 8);
            // the `take` source values starting at `s`, rotated into destination lanes
            let gather = |s: usize, take: usize| {
                let x = src[s / 8].rotate(shift);
                if take > 8 - s % 8 {
                    x.blendv(src[s / 8 + 1].rotate(shift), merge)
                } else {
                    x
                }
            };

            let head = len.min(8 - d % 8);
            let mask = U32x8::lane_mask(d % 8, d % 8 + head);
            out[d / 8] = out[d / 8].blendv(gather(s, head), mask);
            s += head;
            d += head;
            len -= head;

            while len >= 8 {
                out[d / 8] = src[s / 8]
                    .rotate(shift)
                    .blendv(src[s / 8 + 1].rotate(shift), merge);
                s += 8;
                d += 8;
                len -= 8;
            }

            if len > 0 {
                out[d / 8] = out[d / 8].blendv(gather(s, len), U32x8::lane_mask(0, len));
            }
        }
    }

    /// The `len` coefficients starting at `start`.
    ///
    /// # Panics
    /// If the range is out of bounds.
    pub fn substr(&self, start: usize, len: usize) -> Self {
        let mut out = Self::zeros(len);
        self.copy_to(start, len, &mut out, 0);
        out
    }

    /// Reverses the coefficient order in place.
    pub fn reverse(&mut self) {
        let len = self.len;
        self.blocks.reverse();
        for b in &mut self.blocks {
            *b = b.permute([7, 6, 5, 4, 3, 2, 1, 0]);
        }
        // the reversed coefficients now end at the last lane of the last block
        let full = 8 * self.blocks.len();
        self.len = full;

        let mut out = Self::zeros(len);
        self.copy_to(full - len, len, &mut out, 0);
        *self = out;
    }
}

impl<const M: u32> ShlAssign<usize> for Poly<M> {
    /// Multiplies by `x^s`: prepends `s` zero coefficients.
    fn shl_assign(&mut self, s: usize) {
        self.len += s;
        let (q, t) = (s / 8, s % 8);

        if t == 0 {
            let mut blocks = vec![Residue8::ZERO; q];
            blocks.append(&mut self.blocks);
            self.blocks = blocks;
            return;
        }

        self.blocks.resize(blocks_for(self.len), Residue8::ZERO);
        let blocks = &mut self.blocks;
        // lanes >= t come from the block q positions back, lanes < t from the one before it
        let mask = U32x8::lane_mask(t, 8);
        for i in (q + 1..blocks.len()).rev() {
            let lo = blocks[i - 1 - q].rotate(8 - t);
            let hi = blocks[i - q].rotate(8 - t);
            blocks[i] = lo.blendv(hi, mask);
        }
        blocks[q] = Residue8::ZERO.blendv(blocks[0].rotate(8 - t), mask);
        blocks[..q].fill(Residue8::ZERO);
    }
}

impl<const M: u32> Shl<usize> for Poly<M> {
    type Output = Poly<M>;

    fn shl(mut self, s: usize) -> Poly<M> {
        self <<= s;
        self
    }
}

impl<const M: u32> Shl<usize> for &Poly<M> {
    type Output = Poly<M>;

    fn shl(self, s: usize) -> Poly<M> {
        self.clone() << s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::residue::Residue;

    const P: u32 = 998_244_353;
    type Pl = Poly<P>;

    #[test]
    fn test_shift() {
        let a = Pl::from([1u32, 2, 3]);
        assert_eq!(&a << 8, Pl::from([0u32, 0, 0, 0, 0, 0, 0, 0, 1, 2, 3]));
        assert_eq!(&a << 0, a);
        assert_eq!(&a << 3, Pl::from([0u32, 0, 0, 1, 2, 3]));
        assert_eq!(
            (Pl::from([1u32]) << 10).to_vec(),
            [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]
        );
    }

    #[test]
    fn test_shift_across_blocks() {
        let coeffs: Vec<u32> = (1..=29).collect();
        let a = Pl::from(coeffs.clone());
        for s in 0..40 {
            let mut expect = vec![0u32; s];
            expect.extend_from_slice(&coeffs);
            let shifted = &a << s;
            assert_eq!(shifted.len(), 29 + s);
            assert_eq!(shifted.to_vec(), expect, "s = {s}");
            assert_eq!(shifted, Pl::from(expect), "s = {s}");
        }
    }

    #[test]
    fn test_resize() {
        let mut a = Pl::from([1u32, 2, 3]);
        a.resize(6);
        assert_eq!(a, Pl::from([1u32, 2, 3, 0, 0, 0]));

        let mut a = Pl::from([1u32, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        a.resize(2);
        assert_eq!(a, Pl::from([1u32, 2]));
        // stale lanes must not come back
        a.resize(10);
        assert_eq!(a, Pl::from([1u32, 2, 0, 0, 0, 0, 0, 0, 0, 0]));
        a.resize(0);
        assert!(a.is_empty());
        assert!(a.blocks().is_empty());
    }

    #[test]
    fn test_copy_to_exhaustive() {
        for n in 0..=24usize {
            let a: Vec<u32> = (0..n as u32).map(|i| 100 + i).collect();
            let src = Pl::from(a.clone());
            for start in 0..=n {
                for len in 0..=n - start {
                    for m in len..=24 {
                        let b: Vec<u32> = (0..m as u32).map(|i| 10_000 + i).collect();
                        for dst_start in 0..=m - len {
                            let mut expect = b.clone();
                            expect[dst_start..dst_start + len]
                                .copy_from_slice(&a[start..start + len]);

                            let mut dst = Pl::from(b.clone());
                            src.copy_to(start, len, &mut dst, dst_start);
                            assert_eq!(
                                dst.to_vec(),
                                expect,
                                "n = {n}, start = {start}, len = {len}, m = {m}, \
                                 dst_start = {dst_start}"
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_copy_to_checks_bounds() {
        let a = Pl::from([1u32, 2, 3]);
        let mut b = Pl::zeros(2);
        a.copy_to(0, 3, &mut b, 0);
    }

    #[test]
    fn test_substr_and_reverse() {
        let a: Pl = (0..20u32).map(Residue::from).collect();
        assert_eq!(a.substr(5, 10).to_vec(), (5..15).collect::<Vec<u32>>());
        assert!(a.substr(20, 0).is_empty());

        for n in 0..20usize {
            let mut b = a.substr(0, n);
            b.reverse();
            assert_eq!(b.to_vec(), (0..n as u32).rev().collect::<Vec<u32>>());
            assert_eq!(b.len(), n);
        }
    }
}
