// ===========================================================================
// BarrettReducer — division-free modular reduction, plus the shared
// modular-exponentiation routine every other module in this crate builds
// its modpow calls on top of (Miller-Rabin, SafePrimeGen's Fermat check,
// BbsGenerator's step/seek).
// ===========================================================================

use num_bigint::BigUint;
use num_traits::{One, Zero};

/// Precomputes `mu = floor(2^(2N)/m) + 1` for a modulus `m` of at most N
/// bits, then reduces values via the one-multiply approximation
/// `r ~= ((mu*v) >> 2N) * m`, which is exact or one multiple of `m` too
/// large. The conditional final subtraction below is not optional — a
/// Barrett reducer that omits it returns an occasionally-wrong residue.
#[derive(Clone, Debug)]
pub struct BarrettReducer {
    modulus: BigUint,
    mu: BigUint,
    /// Bit width N used to derive `mu`; the reduction's "2N" shift amount
    /// is `2 * width`.
    width: u64,
}

impl BarrettReducer {
    pub fn new(modulus: BigUint) -> Self {
        assert!(!modulus.is_zero(), "Barrett reducer modulus must be nonzero");
        let width = modulus.bits();
        let shift = 2 * width;
        let mu = (BigUint::one() << shift) / &modulus + BigUint::one();
        BarrettReducer { modulus, mu, width }
    }

    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    /// Reduces `v` modulo `self.modulus()`. Valid for any `v`, not just
    /// `v < m^2`: values wider than the precomputed shift fall back to the
    /// exact `%` operator, since the one-multiply approximation is only
    /// guaranteed correct for `v < m^2`.
    pub fn reduce(&self, v: &BigUint) -> BigUint {
        if v.bits() > 2 * self.width {
            return v % &self.modulus;
        }
        let shift = 2 * self.width;
        let t = (&self.mu * v) >> shift;
        let mut r = v - &(t * &self.modulus);
        // The approximation above can undershoot by at most one multiple
        // of `m` in either direction for v < m^2; loop (bounded, in
        // practice 0-2 iterations) rather than a single conditional
        // subtract so callers outside the v < m^2 regime still get a
        // canonical residue.
        while r >= self.modulus {
            r -= &self.modulus;
        }
        r
    }

    pub fn mul_mod(&self, a: &BigUint, b: &BigUint) -> BigUint {
        self.reduce(&(a * b))
    }

    pub fn square_mod(&self, a: &BigUint) -> BigUint {
        self.reduce(&(a * a))
    }

    /// Right-to-left binary modular exponentiation: `base^exp mod modulus`.
    /// Both the accumulator and the base are kept reduced via `reduce`
    /// after every multiply/square, matching the algorithm used
    /// identically by Miller-Rabin, the Fermat shortcut, and `seek`.
    pub fn pow_mod(&self, base: &BigUint, exp: &BigUint) -> BigUint {
        let mut result = BigUint::one() % &self.modulus;
        let mut base = self.reduce(base);
        let mut exp = exp.clone();
        while !exp.is_zero() {
            if exp.bit(0) {
                result = self.mul_mod(&result, &base);
            }
            base = self.square_mod(&base);
            exp >>= 1;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::RandBigInt;
    use rand::thread_rng;

    #[test]
    fn reduce_matches_native_rem_for_small_values() {
        let m = BigUint::from(97u32);
        let reducer = BarrettReducer::new(m.clone());
        for v in 0u32..500 {
            let v = BigUint::from(v);
            assert_eq!(reducer.reduce(&v), &v % &m);
        }
    }

    #[test]
    fn reduce_matches_native_rem_for_random_moduli() {
        let mut rng = thread_rng();
        for _ in 0..50 {
            let m = rng.gen_biguint(256) | BigUint::one();
            if m.is_zero() {
                continue;
            }
            let reducer = BarrettReducer::new(m.clone());
            for _ in 0..10 {
                let v = rng.gen_biguint(512) % (&m * &m);
                assert_eq!(reducer.reduce(&v), &v % &m, "mismatch for modulus {m}");
            }
        }
    }

    #[test]
    fn pow_mod_matches_biguint_modpow() {
        let m = BigUint::from(1_000_000_007u64);
        let reducer = BarrettReducer::new(m.clone());
        let base = BigUint::from(12345u32);
        let exp = BigUint::from(98765u32);
        assert_eq!(reducer.pow_mod(&base, &exp), base.modpow(&exp, &m));
    }

    #[test]
    fn pow_mod_zero_exponent_is_one_mod_m() {
        let m = BigUint::from(13u32);
        let reducer = BarrettReducer::new(m.clone());
        assert_eq!(reducer.pow_mod(&BigUint::from(5u32), &BigUint::zero()), BigUint::one());
    }
}
