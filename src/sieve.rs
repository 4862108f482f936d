// ===========================================================================
// PrimeSieve — small-prime trial division, the cheap filter that runs
// before the expensive Miller-Rabin pass.
//
// The fast table below is a static list of small odd primes that a
// candidate is rejected against before any modular exponentiation is
// attempted. `generate_sieve` additionally sieves up to ~2048 primes on
// demand for a slower, more selective second pass.
// ===========================================================================

use num_bigint::BigUint;
use num_traits::{One, Zero};

/// First 100 odd primes, the fast-path table.
pub const SMALL_PRIMES: &[u64] = &[
    3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
    101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191, 193,
    197, 199, 211, 223, 227, 229, 233, 239, 241, 251, 257, 263, 269, 271, 277, 281, 283, 293, 307,
    311, 313, 317, 331, 337, 347, 349, 353, 359, 367, 373, 379, 383, 389, 397, 401, 409, 419, 421,
    431, 433, 439, 443, 449, 457, 461, 463, 467, 479, 487, 491, 499, 503, 509, 521, 523, 541,
];

/// Sieves the first `k` odd primes with a classic sieve of Eratosthenes,
/// for a slower, more selective pass over up to ~2048 primes. Falls back
/// to a slice of `SMALL_PRIMES` if `k` is small enough that it's already
/// covered.
pub fn generate_sieve(k: usize) -> Vec<u64> {
    if k <= SMALL_PRIMES.len() {
        return SMALL_PRIMES[..k].to_vec();
    }
    // Overestimate the upper bound via the prime number theorem so the
    // sieve array is large enough to contain k primes.
    let k_f = k as f64;
    let upper = (k_f * (k_f.ln() + k_f.ln().ln())) as u64 + 10;
    let mut is_composite = vec![false; (upper + 1) as usize];
    let mut primes = Vec::with_capacity(k);
    for n in 2..=upper {
        if !is_composite[n as usize] {
            if n != 2 {
                primes.push(n);
                if primes.len() == k {
                    break;
                }
            }
            let mut m = n * n;
            while m <= upper {
                is_composite[m as usize] = true;
                m += n;
            }
        }
    }
    primes
}

/// Returns `true` ("composite") if `n` is divisible by any small prime in
/// `table`, `false` ("possibly prime") otherwise. Never claims primality
/// definitively. `n` itself equal to a table entry is not flagged.
pub fn is_composite_by_small_primes(n: &BigUint, table: &[u64]) -> bool {
    if n.is_zero() || n == &BigUint::from(1u32) {
        return true;
    }
    for &p in table {
        let bp = BigUint::from(p);
        if n == &bp {
            return false;
        }
        if (n % &bp).is_zero() {
            return true;
        }
    }
    false
}

/// The mod-2^N reciprocal identity: `p | n` iff `mask_to_width(n * recip,
/// width) <= recip - 1`, where `recip = ceil(2^width / p)`. Mathematically
/// equivalent to `n % p == 0` and unit-tested against it below; kept as a
/// separate entry point because it is the literal form of the divisibility
/// test the small-prime sieve is specified against, independent of whether
/// `BigUint`'s own `%` operator is trusted.
pub fn divides_via_reciprocal(n: &BigUint, p: u64, width: u64) -> bool {
    let bp = BigUint::from(p);
    let pow2 = BigUint::one() << width;
    let recip = (&pow2 + &bp - BigUint::one()) / &bp; // ceil(2^width / p)
    let product = n * &recip;
    let masked = crate::bigint::mask_to_width(&product, width);
    masked <= &recip - BigUint::one()
}

/// `PrimeSieve` bundles a small-prime table with the trial-division test,
/// so callers that want the larger generated sieve for a slower/stronger
/// pass don't have to thread the table through by hand.
pub struct PrimeSieve {
    table: Vec<u64>,
}

impl PrimeSieve {
    /// The default fast-path sieve: the first 100 small primes.
    pub fn fast() -> Self {
        PrimeSieve { table: SMALL_PRIMES.to_vec() }
    }

    /// The larger, slower sieve: the first `k` small primes (up to ~2048).
    pub fn generated(k: usize) -> Self {
        PrimeSieve { table: generate_sieve(k) }
    }

    pub fn divides_any(&self, n: &BigUint) -> bool {
        is_composite_by_small_primes(n, &self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_sieve_produces_actual_primes() {
        let primes = generate_sieve(300);
        assert_eq!(primes.len(), 300);
        for &p in &primes {
            assert!(is_prime_trial(p), "{p} is not prime");
        }
        // Monotonic.
        assert!(primes.windows(2).all(|w| w[0] < w[1]));
    }

    fn is_prime_trial(n: u64) -> bool {
        if n < 2 {
            return false;
        }
        let mut i = 2u64;
        while i * i <= n {
            if n % i == 0 {
                return false;
            }
            i += 1;
        }
        true
    }

    #[test]
    fn small_prime_sieve_flags_composites() {
        let sieve = PrimeSieve::fast();
        assert!(sieve.divides_any(&BigUint::from(9u32)));
        assert!(!sieve.divides_any(&BigUint::from(997u32))); // itself a small prime
        assert!(!sieve.divides_any(&BigUint::from(1009u32))); // prime, not in table
    }

    #[test]
    fn generated_sieve_matches_fast_table_prefix() {
        let generated = generate_sieve(50);
        assert_eq!(&generated[..], &SMALL_PRIMES[..50]);
    }

    #[test]
    fn reciprocal_identity_matches_native_rem() {
        let width = 32;
        for n in 2u64..400 {
            let big_n = BigUint::from(n);
            for &p in &SMALL_PRIMES[..10] {
                let expected = n % p == 0;
                assert_eq!(
                    divides_via_reciprocal(&big_n, p, width),
                    expected,
                    "n={n} p={p}"
                );
            }
        }
    }
}
