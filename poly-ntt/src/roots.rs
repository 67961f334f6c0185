use crate::prime::exp_mod32;

/// Number of factors of two in `p - 1`, i.e. `log2` of the longest power-of-two transform the
/// prime `p` supports.
pub const fn two_adicity(p: u32) -> u32 {
    (p - 1).trailing_zeros()
}

/// Distinct prime factors of `n`, in increasing order. At most 9 distinct primes divide a
/// `u32`.
const fn distinct_prime_factors(n: u32) -> ([u32; 10], usize) {
    let mut divs = [0u32; 10];
    let mut count = 0;
    let mut x = n;
    let mut d = 2u32;
    while (d as u64) * (d as u64) <= x as u64 {
        if x % d == 0 {
            divs[count] = d;
            count += 1;
            while x % d == 0 {
                x /= d;
            }
        }
        d += if d == 2 { 1 } else { 2 };
    }
    if x > 1 {
        divs[count] = x;
        count += 1;
    }
    (divs, count)
}

/// Smallest generator of the multiplicative group modulo the prime `p`.
///
/// `g` is a generator iff `g^((p - 1) / q) != 1` for every prime `q` dividing `p - 1`.
pub const fn primitive_root(p: u32) -> u32 {
    if p == 2 {
        return 1;
    }
    let (divs, count) = distinct_prime_factors(p - 1);

    let mut g = 2;
    loop {
        let mut ok = true;
        let mut i = 0;
        while i < count {
            if exp_mod32(p, g, ((p - 1) / divs[i]) as u64) == 1 {
                ok = false;
                break;
            }
            i += 1;
        }
        if ok {
            return g;
        }
        g += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prime::{is_prime32, largest_prime_in_arithmetic_progression32};

    #[test]
    fn test_two_adicity() {
        // 998244353 = 119 * 2^23 + 1
        assert_eq!(two_adicity(998_244_353), 23);
        // 469762049 = 7 * 2^26 + 1
        assert_eq!(two_adicity(469_762_049), 26);
        assert_eq!(two_adicity(3), 1);
    }

    #[test]
    fn test_known_primitive_roots() {
        assert_eq!(primitive_root(998_244_353), 3);
        assert_eq!(primitive_root(469_762_049), 3);
        assert_eq!(primitive_root(167_772_161), 3);
        assert_eq!(primitive_root(754_974_721), 11);
        assert_eq!(primitive_root(7), 3);
    }

    #[test]
    fn test_primitive_root_generates_the_group() {
        let p = largest_prime_in_arithmetic_progression32(1 << 10, 1, 0, 1 << 20).unwrap();
        assert!(is_prime32(p));
        let g = primitive_root(p);

        let mut seen = vec![false; p as usize];
        let mut x = 1u32;
        for _ in 0..p - 1 {
            assert!(!seen[x as usize]);
            seen[x as usize] = true;
            x = ((x as u64 * g as u64) % p as u64) as u32;
        }
        assert_eq!(x, 1);
    }
}
