use log::{info, LevelFilter};
use poly_ntt::prime::largest_prime_in_arithmetic_progression32;
use poly_ntt::{Ntt, Poly, Residue, Residue8};
use rand::random;
use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

// largest prime below 2^30 that supports transforms of 2^20 coefficients
const P: u32 = match largest_prime_in_arithmetic_progression32(1 << 20, 1, 0, (1 << 30) - 1) {
    Some(p) => p,
    None => panic!("no suitable prime"),
};

fn main() {
    let verb = if std::env::args().any(|arg| arg == "-v" || arg == "--verbose") {
        LevelFilter::Trace
    } else {
        LevelFilter::Info
    };
    CombinedLogger::init(vec![TermLogger::new(
        verb,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )])
    .unwrap();

    let polynomial_size = 1024;
    info!("modulus {P}, polynomial size {polynomial_size}");

    let lhs: Vec<u32> = (0..polynomial_size).map(|_| random::<u32>() % P).collect();
    let rhs: Vec<u32> = (0..polynomial_size).map(|_| random::<u32>() % P).collect();

    // method 1: schoolbook algorithm
    let add = |x: u32, y: u32| ((x as u64 + y as u64) % P as u64) as u32;
    let mul = |x: u32, y: u32| ((x as u64 * y as u64) % P as u64) as u32;
    let mut full_convolution = vec![0; 2 * polynomial_size - 1];
    for i in 0..polynomial_size {
        for j in 0..polynomial_size {
            full_convolution[i + j] = add(full_convolution[i + j], mul(lhs[i], rhs[j]));
        }
    }

    // method 2: polynomial product
    let product = Poly::<P>::from(&lhs[..]) * Poly::<P>::from(&rhs[..]);
    assert_eq!(product.to_vec(), full_convolution);
    info!("polynomial product matches the schoolbook convolution");

    // method 3: transform by hand, as a cyclic convolution of twice the size
    let ntt = Ntt::<P>::new();
    let blocks = 2 * polynomial_size / 8;
    let to_blocks = |coeffs: &[u32]| -> Vec<Residue8<P>> {
        (0..blocks)
            .map(|b| {
                Residue8::from_fn(|i| {
                    coeffs
                        .get(8 * b + i)
                        .map_or(Residue::ZERO, |&x| Residue::from(x))
                })
            })
            .collect()
    };
    let mut lhs_ntt = to_blocks(&lhs);
    let rhs_ntt = {
        let mut v = to_blocks(&rhs);
        ntt.fwd(&mut v);
        v
    };
    ntt.fwd(&mut lhs_ntt);
    ntt.mul_assign_normalize(&mut lhs_ntt, &rhs_ntt);
    ntt.inv(&mut lhs_ntt);
    let cyclic: Vec<u32> = lhs_ntt.iter().flat_map(|b| b.val()).collect();
    assert_eq!(cyclic[..full_convolution.len()], full_convolution[..]);
    assert_eq!(cyclic[full_convolution.len()], 0);
    info!("transform of {blocks} blocks matches the schoolbook convolution");

    // recover the recurrence behind the first terms of a power series inverse
    let denominator = Poly::<P>::from([1i32, -3, 5, -7]);
    let series = denominator.inv(64);
    let recurrence = series.find_linear_recurrence();
    info!("1 / {denominator} satisfies a[i] = sum d[j] a[i - j] with d = {recurrence:?}");
    assert_eq!(recurrence, [3, P - 5, 7]);

    println!("Success!");
}
