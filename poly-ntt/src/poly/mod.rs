//! Dense polynomials with coefficients modulo `M`, stored eight coefficients per block.

mod recurrence;
mod series;
mod slice;

use crate::error::{Error, UnwrapResultExt};
use crate::lanes::U32x8;
use crate::ntt::Ntt;
use crate::residue::Residue;
use crate::residue8::Residue8;
use crate::utils::izip;
use core::fmt;
use core::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// Number of blocks needed to hold `n` coefficients.
#[inline]
pub(crate) const fn blocks_for(n: usize) -> usize {
    (n + 7) / 8
}

/// Polynomial `a[0] + a[1] x + ... + a[n - 1] x^(n - 1)` modulo `M`.
///
/// Coefficient `i` lives in lane `i % 8` of block `i / 8`. Lanes at or past [`Poly::len`] are
/// always zero, so equality and dot products can work block by block.
#[derive(Clone, Default)]
pub struct Poly<const M: u32> {
    len: usize,
    blocks: Vec<Residue8<M>>,
}

impl<const M: u32> Poly<M> {
    /// The empty polynomial, with no coefficients.
    pub fn new() -> Self {
        Self {
            len: 0,
            blocks: Vec::new(),
        }
    }

    /// `n` zero coefficients.
    pub fn zeros(n: usize) -> Self {
        Self {
            len: n,
            blocks: vec![Residue8::ZERO; blocks_for(n)],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn blocks(&self) -> &[Residue8<M>] {
        &self.blocks
    }

    /// Coefficient `i`, or zero past the end.
    pub fn coeff(&self, i: usize) -> Residue<M> {
        if i < self.len {
            self.blocks[i / 8].get(i % 8)
        } else {
            Residue::ZERO
        }
    }

    /// Canonical value of coefficient `i`, or zero past the end.
    pub fn value(&self, i: usize) -> u32 {
        self.coeff(i).val()
    }

    /// Canonical values of all coefficients.
    pub fn to_vec(&self) -> Vec<u32> {
        self.blocks
            .iter()
            .flat_map(|b| b.val())
            .take(self.len)
            .collect()
    }

    /// Zeroes the lanes of the last block that lie past `len`.
    fn clear_tail(&mut self) {
        let used = self.len % 8;
        if used != 0 {
            if let Some(last) = self.blocks.last_mut() {
                *last = last.blendv(Residue8::ZERO, U32x8::lane_mask(used, 8));
            }
        }
    }

    /// Product of `self` and `rhs`, of length `self.len() + rhs.len() - 1`.
    ///
    /// Fails when the product needs a longer transform than `M` supports.
    pub fn try_mul(&self, rhs: &Self) -> Result<Self, Error> {
        if self.is_empty() || rhs.is_empty() {
            return Ok(Self::new());
        }
        let len = self.len + rhs.len - 1;
        let n = blocks_for(len).next_power_of_two();

        let ntt = Ntt::<M>::new();
        ntt.check_len(n)?;

        let mut lhs = Vec::with_capacity(n);
        lhs.extend_from_slice(&self.blocks);
        lhs.resize(n, Residue8::ZERO);
        let mut rhs_ = Vec::with_capacity(n);
        rhs_.extend_from_slice(&rhs.blocks);
        rhs_.resize(n, Residue8::ZERO);

        ntt.fwd(&mut lhs);
        ntt.fwd(&mut rhs_);
        ntt.mul_assign_normalize(&mut lhs, &rhs_);
        ntt.inv(&mut lhs);

        // the cyclic length covers the whole product, so nothing wrapped around
        lhs.truncate(blocks_for(len));
        Ok(Self { len, blocks: lhs })
    }

    fn scale(&mut self, rhs: Residue<M>) {
        let rhs = Residue8::splat(rhs);
        for b in &mut self.blocks {
            *b *= rhs;
        }
    }
}

impl<const M: u32> FromIterator<Residue<M>> for Poly<M> {
    fn from_iter<I: IntoIterator<Item = Residue<M>>>(iter: I) -> Self {
        let mut len = 0;
        let mut blocks = Vec::new();
        let mut current = Residue8::ZERO;
        for x in iter {
            current.set(len % 8, x);
            len += 1;
            if len % 8 == 0 {
                blocks.push(current);
                current = Residue8::ZERO;
            }
        }
        if len % 8 != 0 {
            blocks.push(current);
        }
        Self { len, blocks }
    }
}

impl<const M: u32, T: Into<Residue<M>> + Copy> From<&[T]> for Poly<M> {
    fn from(coeffs: &[T]) -> Self {
        coeffs.iter().map(|&x| x.into()).collect()
    }
}

impl<const M: u32, T: Into<Residue<M>> + Copy, const N: usize> From<[T; N]> for Poly<M> {
    fn from(coeffs: [T; N]) -> Self {
        Self::from(&coeffs[..])
    }
}

impl<const M: u32, T: Into<Residue<M>> + Copy> From<Vec<T>> for Poly<M> {
    fn from(coeffs: Vec<T>) -> Self {
        Self::from(&coeffs[..])
    }
}

impl<const M: u32> PartialEq for Poly<M> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.blocks == other.blocks
    }
}

impl<const M: u32> Eq for Poly<M> {}

impl<const M: u32> fmt::Display for Poly<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, x) in self.to_vec().into_iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            write!(f, "{x}")?;
        }
        write!(f, "]")
    }
}

impl<const M: u32> fmt::Debug for Poly<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl<const M: u32> AddAssign<&Poly<M>> for Poly<M> {
    fn add_assign(&mut self, rhs: &Poly<M>) {
        self.len = self.len.max(rhs.len);
        if self.blocks.len() < rhs.blocks.len() {
            self.blocks.resize(rhs.blocks.len(), Residue8::ZERO);
        }
        for (l, r) in izip!(&mut self.blocks[..rhs.blocks.len()], &rhs.blocks) {
            *l += *r;
        }
    }
}

impl<const M: u32> SubAssign<&Poly<M>> for Poly<M> {
    fn sub_assign(&mut self, rhs: &Poly<M>) {
        self.len = self.len.max(rhs.len);
        if self.blocks.len() < rhs.blocks.len() {
            self.blocks.resize(rhs.blocks.len(), Residue8::ZERO);
        }
        for (l, r) in izip!(&mut self.blocks[..rhs.blocks.len()], &rhs.blocks) {
            *l -= *r;
        }
    }
}

impl<const M: u32> MulAssign<&Poly<M>> for Poly<M> {
    #[track_caller]
    fn mul_assign(&mut self, rhs: &Poly<M>) {
        *self = self.try_mul(rhs).unwrap_display();
    }
}

impl<const M: u32> MulAssign<Residue<M>> for Poly<M> {
    fn mul_assign(&mut self, rhs: Residue<M>) {
        self.scale(rhs);
    }
}

macro_rules! impl_binop {
    ($Op:ident, $op:ident, $OpAssign:ident, $op_assign:ident) => {
        impl<const M: u32> $Op<&Poly<M>> for &Poly<M> {
            type Output = Poly<M>;

            #[track_caller]
            fn $op(self, rhs: &Poly<M>) -> Poly<M> {
                let mut out = self.clone();
                $OpAssign::$op_assign(&mut out, rhs);
                out
            }
        }

        impl<const M: u32> $Op<&Poly<M>> for Poly<M> {
            type Output = Poly<M>;

            #[track_caller]
            fn $op(mut self, rhs: &Poly<M>) -> Poly<M> {
                $OpAssign::$op_assign(&mut self, rhs);
                self
            }
        }

        impl<const M: u32> $Op<Poly<M>> for Poly<M> {
            type Output = Poly<M>;

            #[track_caller]
            fn $op(mut self, rhs: Poly<M>) -> Poly<M> {
                $OpAssign::$op_assign(&mut self, &rhs);
                self
            }
        }

        impl<const M: u32> $OpAssign<Poly<M>> for Poly<M> {
            #[track_caller]
            fn $op_assign(&mut self, rhs: Poly<M>) {
                $OpAssign::$op_assign(self, &rhs);
            }
        }
    };
}

impl_binop!(Add, add, AddAssign, add_assign);
impl_binop!(Sub, sub, SubAssign, sub_assign);
impl_binop!(Mul, mul, MulAssign, mul_assign);

impl<const M: u32> Mul<Residue<M>> for Poly<M> {
    type Output = Poly<M>;

    fn mul(mut self, rhs: Residue<M>) -> Poly<M> {
        self.scale(rhs);
        self
    }
}

impl<const M: u32> Mul<Residue<M>> for &Poly<M> {
    type Output = Poly<M>;

    fn mul(self, rhs: Residue<M>) -> Poly<M> {
        self.clone() * rhs
    }
}

impl<const M: u32> Mul<Poly<M>> for Residue<M> {
    type Output = Poly<M>;

    fn mul(self, rhs: Poly<M>) -> Poly<M> {
        rhs * self
    }
}

impl<const M: u32> Mul<&Poly<M>> for Residue<M> {
    type Output = Poly<M>;

    fn mul(self, rhs: &Poly<M>) -> Poly<M> {
        rhs * self
    }
}

impl<const M: u32> Neg for Poly<M> {
    type Output = Poly<M>;

    fn neg(mut self) -> Poly<M> {
        for b in &mut self.blocks {
            *b = -*b;
        }
        self
    }
}

impl<const M: u32> Neg for &Poly<M> {
    type Output = Poly<M>;

    fn neg(self) -> Poly<M> {
        -self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rand::random;

    const P: u32 = 998_244_353;
    type Pl = Poly<P>;
    type R = Residue<P>;

    #[test]
    fn test_construction() {
        assert_eq!(Pl::from([0u32, 0, 0, 0]), Pl::zeros(4));
        assert_eq!(Pl::from(vec![R::ONE]), Pl::from([1u32]));
        assert_eq!(Pl::from([P + 1, 2]), Pl::from([1i64, 2]));
        assert_eq!(Pl::new().len(), 0);
        assert!(Pl::new().is_empty());
        assert_eq!(Pl::zeros(17).blocks().len(), 3);

        let collected: Pl = (1..=10u32).map(R::from).collect();
        assert_eq!(collected.to_vec(), (1..=10).collect::<Vec<u32>>());
    }

    #[test]
    fn test_values() {
        let a = Pl::from([0u32, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]);
        assert_eq!(a.to_vec(), (0..12).collect::<Vec<u32>>());
        assert_eq!(a.value(10), 10);
        assert_eq!(a.value(12), 0);
        assert_eq!(a.value(100), 0);
        assert_eq!(a.coeff(3), R::from(3u32));
        assert_eq!(a.to_string(), "[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]");
        assert_eq!(format!("{:?}", Pl::from([-1i32])), format!("[{}]", P - 1));
    }

    #[test]
    fn test_add_sub() {
        let a = Pl::from([0u32, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        let b = Pl::from([100u32, 200]);
        let sum = Pl::from([100u32, 201, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        assert_eq!(&a + &b, sum);
        assert_eq!(&b + &a, sum);

        assert_eq!(
            &a - &b,
            Pl::from([-100i32, -199, 2, 3, 4, 5, 6, 7, 8, 9, 10])
        );
        assert_eq!(
            &b - &a,
            Pl::from([100i32, 199, -2, -3, -4, -5, -6, -7, -8, -9, -10])
        );
        assert_eq!(-&a + a.clone(), Pl::zeros(11));

        let mut c = b.clone();
        c += &a;
        assert_eq!(c, sum);
        c -= a;
        assert_eq!(c, Pl::from([100u32, 200, 0, 0, 0, 0, 0, 0, 0, 0, 0]));
    }

    #[test]
    fn test_mul() {
        let a = Pl::from([1u32, 2, 3]);
        let b = Pl::from([4u32, 5, 6]);
        assert_eq!(&a * &b, Pl::from([4u32, 13, 28, 27, 18]));

        let a = Pl::from([1u32; 9]);
        let b = Pl::from([-1i32, 1]);
        assert_eq!(a * b, Pl::from([-1i32, 0, 0, 0, 0, 0, 0, 0, 0, 1]));

        let a = Pl::from([1u32, 2, 3, 4, 5]);
        assert_eq!(&a * R::from(2u32), Pl::from([2u32, 4, 6, 8, 10]));
        assert_eq!(R::from(-2i32) * &a, Pl::from([-2i32, -4, -6, -8, -10]));

        assert!((&a * &Pl::new()).is_empty());
        assert!((&Pl::new() * &a).is_empty());
    }

    #[test]
    fn test_mul_matches_schoolbook() {
        for (n, m) in [(1, 1), (7, 9), (8, 8), (33, 20), (100, 3)] {
            let a: Pl = (0..n).map(|_| R::from(random::<u32>())).collect();
            let b: Pl = (0..m).map(|_| R::from(random::<u32>())).collect();
            let mut expect = vec![R::ZERO; n + m - 1];
            for i in 0..n {
                for j in 0..m {
                    expect[i + j] += a.coeff(i) * b.coeff(j);
                }
            }
            let c = &a * &b;
            assert_eq!(c.len(), n + m - 1);
            assert_eq!(c, Pl::from(expect));
        }
    }

    #[test]
    fn test_mul_too_long_for_modulus() {
        // 97 - 1 = 3 * 2^5, so transforms stop at 4 blocks of 8 lanes
        let a = Poly::<97>::from([1u32; 16]);
        assert_eq!((&a * &a).len(), 31);

        let b = Poly::<97>::from([1u32; 20]);
        let err = b.try_mul(&b).unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::UnsupportedLength {
                blocks: 8,
                max_blocks: 4
            }
        );
    }
}
