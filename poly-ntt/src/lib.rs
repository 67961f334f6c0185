//! Polynomial arithmetic modulo a 30-bit prime, built on a radix-4 number theoretic transform.
//!
//! Residues are kept in Montgomery form and processed eight at a time ([`Residue8`]). The
//! transforms pick AVX2 at runtime when the CPU supports it and fall back to a portable
//! lane-by-lane backend otherwise. The modulus is a const generic parameter:
//! `Residue<998244353>` and `Poly<998244353>` are distinct types, and moduli that are even or not
//! below `2^30` are rejected when the type is first used.
//!
//! # Example
//!
//! ```
//! use poly_ntt::Poly;
//!
//! const P: u32 = 998_244_353;
//!
//! let a = Poly::<P>::from([1u32, 2, 3]);
//! let b = Poly::<P>::from([4u32, 5, 6]);
//! assert_eq!((&a * &b).to_vec(), [4, 13, 28, 27, 18]);
//!
//! // 1 / (1 - x)
//! let f = Poly::<P>::from([1i32, -1]);
//! assert_eq!(f.inv(4).to_vec(), [1, 1, 1, 1]);
//!
//! // a[i] = a[i - 1] + a[i - 2]
//! let fib = Poly::<P>::from([0u32, 1, 1, 2, 3, 5, 8, 13]);
//! assert_eq!(fib.find_linear_recurrence(), [1, 1]);
//! ```
//!
//! Transform tables are built once per modulus and shared through [`TableCache::global`]. The
//! crate logs through the [`log`] facade and never installs a logger itself.

pub(crate) mod utils;

mod error;
mod lanes;
mod ntt;
mod plan;
mod poly;
mod residue;
mod residue8;

/// Primality testing and prime search over `u32`.
pub mod prime;
/// Primitive roots and roots of unity.
pub mod roots;

pub use error::{Error, ErrorKind, UnwrapResultExt};
pub use lanes::{Lanes, Portable, U32x8, U64x4};
pub use ntt::Ntt;
pub use plan::{NttTables, TableCache};
pub use poly::Poly;
pub use residue::Residue;
pub use residue8::{LaneMask, Residue8};
