// ===========================================================================
// MillerRabin — probabilistic primality test.
//
// n - 1 = 2^s * d (d odd), then for k rounds: sample a witness a in
// [2, n-2], compute y = a^d mod n, and square up to s-1 times looking for
// y == n-1. Any round that finds neither 1 nor a path to n-1 proves n
// composite.
// ===========================================================================

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};

use crate::barrett::BarrettReducer;
use crate::bigint::{ctz, sample_range};
use crate::entropy::EntropySource;
use crate::error::BbsError;

/// Default round count: error probability <= 4^-64 = 2^-128.
pub const DEFAULT_ROUNDS: u32 = 64;

pub struct MillerRabin {
    rounds: u32,
}

impl MillerRabin {
    pub fn new() -> Self {
        MillerRabin { rounds: DEFAULT_ROUNDS }
    }

    /// A non-default round count, used internally by the Fermat-shortcut
    /// caller in SafePrimeGen (which already has independent evidence of
    /// primality from the Sophie Germain side) and by tests that want a
    /// faster, looser check.
    pub fn with_rounds(rounds: u32) -> Self {
        MillerRabin { rounds }
    }

    /// Returns `true` ("probably prime") or `false` ("composite"). `n`
    /// must be odd and greater than 3; smaller or even inputs are handled
    /// by the small-prime cases below.
    pub fn is_probably_prime(
        &self,
        n: &BigUint,
        entropy: &dyn EntropySource,
    ) -> Result<bool, BbsError> {
        if n <= &BigUint::one() {
            return Ok(false);
        }
        if n == &BigUint::from(2u32) || n == &BigUint::from(3u32) {
            return Ok(true);
        }
        if n.is_even() {
            return Ok(false);
        }

        let n_minus_1 = n - BigUint::one();
        let s = ctz(&n_minus_1);
        let d = &n_minus_1 >> s;

        let reducer = BarrettReducer::new(n.clone());
        let two = BigUint::from(2u32);
        let n_minus_2 = n - &two;

        'witness: for _ in 0..self.rounds {
            // sample_range's upper bound is exclusive, but the witness
            // range [2, n-2] is closed on both ends, so widen by one to
            // let a actually reach n-2.
            let a = sample_range(entropy, &two, &(&n_minus_2 + BigUint::one()))?;
            let mut y = reducer.pow_mod(&a, &d);
            if y == BigUint::one() || y == n_minus_1 {
                continue 'witness;
            }
            for _ in 0..s.saturating_sub(1) {
                y = reducer.square_mod(&y);
                if y == n_minus_1 {
                    continue 'witness;
                }
                if y == BigUint::one() {
                    // A nontrivial square root of 1 was found: n is
                    // composite (Rabin's strengthening of Fermat).
                    return Ok(false);
                }
            }
            return Ok(false);
        }
        Ok(true)
    }
}

impl Default for MillerRabin {
    fn default() -> Self {
        MillerRabin::new()
    }
}
