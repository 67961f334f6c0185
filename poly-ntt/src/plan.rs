//! Per-modulus twiddle tables and the process-wide cache they live in.

use crate::prime::exp_mod32;
use crate::residue::Residue;
use crate::residue8::Residue8;
use crate::roots::{primitive_root, two_adicity};
use std::any::Any;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

/// Roots of unity and twiddle factors for transforms modulo the prime `M`.
///
/// Entries are indexed by `log2` of the transform size they belong to, so most vectors have
/// `two_adicity(M) + 1` entries and leave the indices below their first meaningful one set to
/// one.
#[derive(Clone, Debug)]
pub struct NttTables<const M: u32> {
    ord2: u32,
    /// `w[i]` is a primitive `2^i`-th root of unity, `w[i] = w[i + 1]^2`
    pub(crate) w: Vec<Residue<M>>,
    /// `iw[i] = w[i]^{-1}`
    pub(crate) iw: Vec<Residue<M>>,
    /// `rot8[i] = w[i] * iw[3] * ... * iw[i - 1]`, for `i >= 3`
    pub(crate) rot8: Vec<Residue<M>>,
    pub(crate) irot8: Vec<Residue<M>>,
    /// `rot16i[i] = (1, r, ..., r^7)` with `r = w[i] * iw[4] * ... * iw[i - 1]`, for `i >= 4`
    pub(crate) rot16i: Vec<Residue8<M>>,
    pub(crate) irot16i: Vec<Residue8<M>>,
    /// twiddles of the in-vector 8-point butterflies
    pub(crate) step8: Residue8<M>,
    pub(crate) step4: Residue8<M>,
    pub(crate) istep8: Residue8<M>,
    pub(crate) istep4: Residue8<M>,
}

/// `rot[i] = w[i] * prod_{first <= j < i} iw[j]` for `first <= i <= ord2`, one below `first`.
fn rotations<const M: u32>(
    w: &[Residue<M>],
    iw: &[Residue<M>],
    first: usize,
) -> Vec<Residue<M>> {
    let mut rot = vec![Residue::ONE; w.len()];
    let mut prod = Residue::ONE;
    for i in first..w.len() {
        rot[i] = w[i] * prod;
        prod *= iw[i];
    }
    rot
}

impl<const M: u32> NttTables<M> {
    pub fn new() -> Self {
        let ord2 = two_adicity(M);
        let g = primitive_root(M);

        let len = ord2 as usize + 1;
        let mut w = vec![Residue::ONE; len];
        let mut iw = vec![Residue::ONE; len];
        w[ord2 as usize] = Residue::new(exp_mod32(M, g, ((M - 1) >> ord2) as u64));
        iw[ord2 as usize] = w[ord2 as usize].inv();
        for i in (0..ord2 as usize).rev() {
            w[i] = w[i + 1] * w[i + 1];
            iw[i] = iw[i + 1] * iw[i + 1];
        }

        let rot8 = rotations(&w, &iw, 3);
        let irot8 = rotations(&iw, &w, 3);
        let rot16i = rotations(&w, &iw, 4)
            .into_iter()
            .map(Residue8::powers)
            .collect();
        let irot16i = rotations(&iw, &w, 4)
            .into_iter()
            .map(Residue8::powers)
            .collect();

        let root = |v: &[Residue<M>], i: usize| v.get(i).copied().unwrap_or(Residue::ONE);
        let (w4, w8) = (root(&w, 2), root(&w, 3));
        let (iw4, iw8) = (root(&iw, 2), root(&iw, 3));
        let one = Residue::ONE;

        let step8 = Residue8::from_array([one, one, one, one, one, w8, w8 * w8, w8 * w8 * w8]);
        let istep8 =
            Residue8::from_array([one, one, one, one, one, iw8, iw8 * iw8, iw8 * iw8 * iw8]);
        let step4 = Residue8::from_array([one, one, one, w4, one, one, one, w4]);
        let istep4 = Residue8::from_array([one, one, one, iw4, one, one, one, iw4]);

        let tables = Self {
            ord2,
            w,
            iw,
            rot8,
            irot8,
            rot16i,
            irot16i,
            step8,
            step4,
            istep8,
            istep4,
        };
        log::debug!(
            "built transform tables for modulus {M}: primitive root {g}, two-adicity {ord2}, \
             up to {} blocks",
            tables.max_blocks()
        );
        tables
    }

    /// `log2` of the longest power-of-two transform `M` supports.
    pub fn ord2(&self) -> u32 {
        self.ord2
    }

    /// Largest number of 8-lane blocks a transform may have, zero if `M` cannot support even a
    /// single block.
    pub fn max_blocks(&self) -> usize {
        if self.ord2 < 3 {
            0
        } else {
            1 << (self.ord2 - 3)
        }
    }

    /// `w[i]`, a primitive `2^i`-th root of unity.
    pub fn root(&self, i: usize) -> Residue<M> {
        self.w[i]
    }

    /// `iw[i]`, the inverse of [`NttTables::root`].
    pub fn inv_root(&self, i: usize) -> Residue<M> {
        self.iw[i]
    }
}

impl<const M: u32> Default for NttTables<M> {
    fn default() -> Self {
        Self::new()
    }
}

type TableMap = RwLock<HashMap<u32, Arc<OnceLock<Arc<dyn Any + Send + Sync>>>>>;

/// Lazily built [`NttTables`], one per modulus, shared between threads.
///
/// Concurrent first uses of the same modulus build the tables exactly once; the map's write
/// lock is never held while building.
#[derive(Default)]
pub struct TableCache(TableMap);

static TABLES: OnceLock<TableCache> = OnceLock::new();

impl TableCache {
    pub fn new() -> Self {
        Self(RwLock::new(HashMap::new()))
    }

    /// The process-wide cache.
    pub fn global() -> &'static Self {
        TABLES.get_or_init(Self::new)
    }

    /// Tables for `M`, built on first use.
    pub fn get<const M: u32>(&self) -> Arc<NttTables<M>> {
        let get_tables = || {
            let tables = self.0.read().unwrap();
            let slot = tables.get(&M).cloned();
            drop(tables);

            slot.map(|s| {
                s.get_or_init(|| Arc::new(NttTables::<M>::new()) as Arc<dyn Any + Send + Sync>)
                    .clone()
            })
        };

        let any = get_tables().unwrap_or_else(|| {
            log::trace!("no transform tables cached for modulus {M}");
            // insert an empty slot and release the write lock before building into it
            let mut tables = self.0.write().unwrap();
            if let Entry::Vacant(v) = tables.entry(M) {
                v.insert(Arc::new(OnceLock::new()));
            }
            drop(tables);

            get_tables().unwrap()
        });

        // slots are keyed by `M`, so the stored value is always `NttTables<M>`
        any.downcast::<NttTables<M>>().unwrap()
    }
}
