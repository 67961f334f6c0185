//! Plain (non-Montgomery) modular arithmetic on `u32`, usable in const contexts.
//!
//! These are the slow reference routines: table construction, compile-time checks on the
//! modulus and test oracles go through them, the kernels never do.

#[inline(always)]
pub const fn mul_mod32(modulus: u32, x: u32, y: u32) -> u32 {
    ((x as u64 * y as u64) % modulus as u64) as u32
}

pub const fn exp_mod32(modulus: u32, base: u32, pow: u64) -> u32 {
    if modulus == 1 {
        return 0;
    }
    if pow == 0 {
        1
    } else {
        let mut pow = pow;
        let mut y = 1;
        let mut x = base % modulus;

        while pow > 1 {
            if pow % 2 == 1 {
                y = mul_mod32(modulus, x, y);
            }
            x = mul_mod32(modulus, x, x);
            pow /= 2;
        }
        mul_mod32(modulus, x, y)
    }
}

const fn is_prime_miller_rabin_iter(n: u32, s: u32, d: u32, a: u32) -> bool {
    let mut x = exp_mod32(n, a, d as u64);
    let n_minus_1 = n - 1;
    if x == 1 || x == n_minus_1 {
        true
    } else {
        let mut count = 0;
        while count < s - 1 {
            x = mul_mod32(n, x, x);
            if x == n_minus_1 {
                return true;
            }
            count += 1;
        }
        false
    }
}

pub const fn is_prime32(n: u32) -> bool {
    // 0 and 1 are not prime
    if n < 2 {
        return false;
    }

    #[rustfmt::skip]
    {
        if n %  2 == 0 { return n ==  2; }
        if n %  3 == 0 { return n ==  3; }
        if n %  5 == 0 { return n ==  5; }
        if n %  7 == 0 { return n ==  7; }
        if n % 11 == 0 { return n == 11; }
        if n % 13 == 0 { return n == 13; }
        if n % 61 == 0 { return n == 61; }
    };

    // deterministic miller rabin test, the bases {2, 7, 61} cover every n < 4_759_123_141
    // https://en.wikipedia.org/wiki/Miller-Rabin_primality_test#Testing_against_small_sets_of_bases
    let mut s = 0;
    let mut d = n - 1;

    while d % 2 == 0 {
        s += 1;
        d /= 2;
    }

    is_prime_miller_rabin_iter(n, s, d, 2)
        && is_prime_miller_rabin_iter(n, s, d, 7)
        && is_prime_miller_rabin_iter(n, s, d, 61)
}

/// Largest prime of the form `factor * x + offset` in the range
/// `[lo, hi]`.
pub const fn largest_prime_in_arithmetic_progression32(
    factor: u32,
    offset: u32,
    lo: u32,
    hi: u32,
) -> Option<u32> {
    if lo > hi {
        return None;
    }

    let a = factor;
    let b = offset;
    // lo <= ax + b <= hi
    // (lo - b)/a <= x <= (hi - b)/a

    if b > hi {
        return None;
    }

    if a == 0 {
        if lo <= b && b <= hi && is_prime32(b) {
            return Some(b);
        } else {
            return None;
        }
    }

    let lo_b = if lo > b { lo } else { b };
    let mut x_lo = (lo_b - b) / a;
    if (lo_b - b) % a != 0 {
        x_lo += 1;
    }

    let x_hi = (hi - b) / a;
    if x_lo > x_hi {
        return None;
    }

    let mut x = x_hi;
    loop {
        let val = a * x + b;
        if is_prime32(val) {
            return Some(val);
        }

        if x == x_lo {
            return None;
        }
        x -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_prime() {
        let primes_under_200 = [
            2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83,
            89, 97, 101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179,
            181, 191, 193, 197, 199,
        ];

        for n in 0..200 {
            assert_eq!(primes_under_200.contains(&n), is_prime32(n));
        }
        assert!(is_prime32(998_244_353));
        assert!(is_prime32(469_762_049));
        assert!(is_prime32(167_772_161));
        assert!(is_prime32(1_073_479_681));
        // strong pseudoprimes to small bases
        assert!(!is_prime32(2_047));
        assert!(!is_prime32(1_373_653));
        assert!(!is_prime32(25_326_001));
        assert!(!is_prime32(3_215_031_751));
        assert!(!is_prime32(998_244_353 * 3));
    }

    #[test]
    fn test_exp_mod() {
        let p = 998_244_353;
        assert_eq!(exp_mod32(p, 3, 0), 1);
        assert_eq!(exp_mod32(p, 3, p as u64 - 1), 1);
        assert_eq!(exp_mod32(p, 2, 10), 1024);
        assert_eq!(exp_mod32(1, 5, 3), 0);
    }

    #[test]
    #[rustfmt::skip]
    fn test_prime_search() {
        assert_eq!(largest_prime_in_arithmetic_progression32(0, 2, 1, 4), Some(2));
        assert_eq!(largest_prime_in_arithmetic_progression32(0, 2, 2, 1), None);
        assert_eq!(largest_prime_in_arithmetic_progression32(1, 0, 14, 16), None);
        assert_eq!(largest_prime_in_arithmetic_progression32(1, 0, 14, 17), Some(17));
        assert_eq!(largest_prime_in_arithmetic_progression32(2, 1, 17, 18), Some(17));

        let p = largest_prime_in_arithmetic_progression32(1 << 23, 1, 0, 1 << 30).unwrap();
        assert!(is_prime32(p));
        assert_eq!(p % (1 << 23), 1);
        assert!(p >= 998_244_353);
    }
}
