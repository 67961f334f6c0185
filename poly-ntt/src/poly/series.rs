use super::Poly;
use crate::error::{Error, ErrorKind, UnwrapResultExt};
use crate::residue::Residue;

impl<const M: u32> Poly<M> {
    /// First `m` coefficients of the power series `1 / self`.
    ///
    /// # Panics
    /// If the constant term is not one, or if the iteration needs a transform longer than `M`
    /// supports. See [`Poly::try_inv`] for the general case.
    #[track_caller]
    pub fn inv(&self, m: usize) -> Self {
        assert!(
            self.coeff(0) == Residue::ONE,
            "power series inverse expects a constant term of one"
        );
        self.newton_inv(m).unwrap_display()
    }

    /// First `m` coefficients of the power series `1 / self`, for any invertible constant term.
    pub fn try_inv(&self, m: usize) -> Result<Self, Error> {
        let a0_inv = self
            .coeff(0)
            .try_inv()
            .ok_or(ErrorKind::NonInvertibleConstantTerm)?;
        let monic = self * a0_inv;
        Ok(monic.newton_inv(m)? * a0_inv)
    }

    /// Newton iteration `g <- 2g - g^2 f`, doubling the number of correct terms each round.
    /// Requires a constant term of one.
    fn newton_inv(&self, m: usize) -> Result<Self, Error> {
        let two = Residue::from(2u32);
        let mut res = Self::from([Residue::<M>::ONE]);
        let mut i = 1;
        while i < m {
            let mut prefix = Self::zeros(2 * i);
            self.copy_to(0, self.len.min(2 * i), &mut prefix, 0);

            let sq = res.try_mul(&res)?;
            res = &res * two - sq.try_mul(&prefix)?;
            res.resize(2 * i);
            i *= 2;
        }
        res.resize(m);
        Ok(res)
    }
}
