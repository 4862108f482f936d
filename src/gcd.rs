// ===========================================================================
// Gcd — binary (Stein's) GCD over BigUint, and the lcm it makes cheap.
//
// Strips common factors of two, then repeatedly subtracts the smaller
// from the larger and strips factors of two from the difference, using
// only shifts, subtractions, and comparisons (no division).
// ===========================================================================

use num_bigint::BigUint;
use num_traits::Zero;

use crate::bigint::ctz;

pub fn gcd(a: &BigUint, b: &BigUint) -> BigUint {
    if a.is_zero() {
        return b.clone();
    }
    if b.is_zero() {
        return a.clone();
    }

    let mut u = a.clone();
    let mut v = b.clone();

    let shift = ctz(&u).min(ctz(&v));
    u >>= ctz(&u);
    v >>= ctz(&v);

    loop {
        // Invariant: both u and v are odd here.
        if u > v {
            std::mem::swap(&mut u, &mut v);
        }
        v -= &u;
        if v.is_zero() {
            break;
        }
        v >>= ctz(&v);
    }

    u << shift
}

pub fn lcm(a: &BigUint, b: &BigUint) -> BigUint {
    if a.is_zero() || b.is_zero() {
        return BigUint::zero();
    }
    let g = gcd(a, b);
    (a / &g) * b
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::RandBigInt;
    use rand::thread_rng;

    fn gcd_euclid(a: &BigUint, b: &BigUint) -> BigUint {
        let (mut a, mut b) = (a.clone(), b.clone());
        while !b.is_zero() {
            let r = &a % &b;
            a = b;
            b = r;
        }
        a
    }

    #[test]
    fn matches_euclidean_gcd_small_values() {
        for a in 0u32..200 {
            for b in 0u32..200 {
                let a = BigUint::from(a);
                let b = BigUint::from(b);
                assert_eq!(gcd(&a, &b), gcd_euclid(&a, &b), "a={a} b={b}");
            }
        }
    }

    #[test]
    fn matches_euclidean_gcd_random_large_values() {
        let mut rng = thread_rng();
        for _ in 0..50 {
            let a = rng.gen_biguint(300);
            let b = rng.gen_biguint(300);
            assert_eq!(gcd(&a, &b), gcd_euclid(&a, &b));
        }
    }

    #[test]
    fn gcd_of_coprime_is_one() {
        let a = BigUint::from(35u32);
        let b = BigUint::from(64u32);
        assert_eq!(gcd(&a, &b), BigUint::from(1u32));
    }

    #[test]
    fn both_zero_is_zero() {
        assert_eq!(gcd(&BigUint::zero(), &BigUint::zero()), BigUint::zero());
    }

    #[test]
    fn lcm_matches_definition() {
        let a = BigUint::from(21u32);
        let b = BigUint::from(6u32);
        assert_eq!(lcm(&a, &b), BigUint::from(42u32));
    }
}
