use super::Poly;
use crate::residue::Residue;
use crate::residue8::Residue8;
use crate::utils::izip;

impl<const M: u32> Poly<M> {
    /// `sum_i self[i] * rhs[i]` over the common length.
    pub fn dot(&self, rhs: &Self) -> Residue<M> {
        let n = self.blocks.len().min(rhs.blocks.len());
        let mut acc = Residue8::ZERO;
        for (l, r) in izip!(&self.blocks[..n], &rhs.blocks[..n]) {
            acc += *l * *r;
        }
        acc.sum()
    }

    /// Shortest linear recurrence satisfied by the coefficients, by Berlekamp-Massey.
    ///
    /// Returns the connection polynomial `c` with `c[0] = 1` and
    /// `c[0] a[i] + c[1] a[i - 1] + ... + c[L] a[i - L] = 0` for `L <= i < n`, where
    /// `L = c.len() - 1`. `M` must be prime.
    pub fn berlekamp_massey(&self) -> Self {
        // `c` and `b` are kept reversed: their last coefficient multiplies the newest term
        let mut b = Self::from([-1i32]);
        let mut c = Self::from([-1i32]);
        let mut y = Residue::ONE;

        for end in 1..=self.len {
            let l = c.len();
            let m = b.len() + 1;
            b.resize(m);

            let x = c.dot(&self.substr(end - l, l));
            if x == Residue::ZERO {
                continue;
            }
            let freq = x * y.inv();

            if l < m {
                let mut shifted = Self::zeros(m);
                c.copy_to(0, l, &mut shifted, m - l);
                let prev = core::mem::replace(&mut c, shifted - &b * freq);
                b = prev;
                y = x;
            } else {
                let mut shifted = Self::zeros(l);
                b.copy_to(0, m, &mut shifted, l - m);
                c -= shifted * freq;
            }
        }

        // the newest-term coefficient never moves away from -1, make it one
        let lead = c.coeff(c.len() - 1);
        c *= lead.inv();
        c.reverse();
        c
    }

    /// Coefficients `d[1..=L]` of the shortest recurrence `a[i] = d[1] a[i - 1] + ... + d[L] a[i - L]`.
    pub fn find_linear_recurrence(&self) -> Vec<u32> {
        let c = self.berlekamp_massey();
        (1..c.len()).map(|j| (-c.coeff(j)).val()).collect()
    }
}
