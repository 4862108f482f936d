// ===========================================================================
// SafePrimeGen — produces Sophie Germain-safe primes for BBS.
//
// For each candidate: sample cand in [0, 2^(bits-2)), force the low two
// bits to 1 (so r = 2*cand+1 is = 3 mod 4) and the top bit to fix the bit
// length, then accept r iff it survives the small-prime sieve, a full
// Miller-Rabin pass, and the Fermat shortcut (2^(r-1) == 1 mod r, which
// together with cand's already-established primality proves r prime
// without a second full Miller-Rabin pass on cand itself).
//
// The parallel path races W worker threads against each other: each
// searches independently, and they share an Arc<AtomicBool> "found" flag
// and an Arc<Mutex<Option<BigUint>>> result slot so exactly one winner
// publishes.
// ===========================================================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use num_bigint::BigUint;
use num_traits::One;

use crate::barrett::BarrettReducer;
use crate::bigint::sample_below_pow2;
use crate::entropy::EntropySource;
use crate::error::BbsError;
use crate::miller_rabin::MillerRabin;
use crate::sieve::PrimeSieve;

/// Floor below which a single safe prime can't carry a meaningful share
/// of an N-bit modulus.
pub const MIN_PRIME_BITS: u32 = 64;

/// Upper bound on how many candidates a single-threaded search will try
/// before giving up and reporting a bit-width problem rather than looping
/// forever on an unreachable request.
const MAX_ATTEMPTS: u64 = 1_000_000;

/// Generates one Sophie Germain-safe prime of `bits` bits: p = 2*p' + 1,
/// with p' prime and p == 3 (mod 4).
pub fn generate_one(bits: u32, entropy: &dyn EntropySource) -> Result<BigUint, BbsError> {
    if bits < MIN_PRIME_BITS {
        return Err(BbsError::InvalidBitWidth { requested: bits, minimum: MIN_PRIME_BITS });
    }

    let fast_sieve = PrimeSieve::fast();
    let mr = MillerRabin::new();
    let sample_bits = (bits - 2) as u64; // candidate sampled in [0, 2^(bits-2))
    let top_bit = (bits - 3) as u64; // fixes the candidate's bit length

    for _ in 0..MAX_ATTEMPTS {
        let mut cand = sample_below_pow2(entropy, sample_bits)?;
        cand.set_bit(0, true);
        cand.set_bit(1, true);
        cand.set_bit(top_bit, true);

        if fast_sieve.divides_any(&cand) {
            continue;
        }
        if !mr.is_probably_prime(&cand, entropy)? {
            continue;
        }

        let r = (&cand << 1) + BigUint::one();

        if fast_sieve.divides_any(&r) {
            continue;
        }
        if !mr.is_probably_prime(&r, entropy)? {
            continue;
        }
        if !fermat_check(&r, entropy)? {
            continue;
        }

        return Ok(r);
    }

    Err(BbsError::InvalidBitWidth { requested: bits, minimum: MIN_PRIME_BITS })
}

/// 2^(r-1) == 1 (mod r). Exploits the theorem that if `cand = (r-1)/2` is
/// already known prime, this Fermat check alone is enough to prove `r`
/// prime, sparing a second Miller-Rabin pass on `cand`.
fn fermat_check(r: &BigUint, _entropy: &dyn EntropySource) -> Result<bool, BbsError> {
    let reducer = BarrettReducer::new(r.clone());
    let r_minus_1 = r - BigUint::one();
    Ok(reducer.pow_mod(&BigUint::from(2u32), &r_minus_1) == BigUint::one())
}

/// Generates a distinct pair (p, q), each of `bits` bits, suitable as BBS
/// factors. `workers`: `None` runs the search single-threaded; `Some(w)`
/// fans out `w` threads per prime, racing to publish the first hit.
pub fn generate_pair(
    bits: u32,
    entropy: Arc<dyn EntropySource>,
    workers: Option<usize>,
) -> Result<(BigUint, BigUint), BbsError> {
    let p = match workers {
        Some(w) if w > 1 => generate_one_parallel(bits, entropy.clone(), w)?,
        _ => generate_one(bits, entropy.as_ref())?,
    };

    loop {
        let q = match workers {
            Some(w) if w > 1 => generate_one_parallel(bits, entropy.clone(), w)?,
            _ => generate_one(bits, entropy.as_ref())?,
        };
        if q != p {
            return Ok((p, q));
        }
    }
}

/// Races `workers` threads against each other searching for one safe
/// prime of `bits` bits. Exactly one worker's result is published.
pub fn generate_one_parallel(
    bits: u32,
    entropy: Arc<dyn EntropySource>,
    workers: usize,
) -> Result<BigUint, BbsError> {
    let found = Arc::new(AtomicBool::new(false));
    let slot: Arc<Mutex<Option<BigUint>>> = Arc::new(Mutex::new(None));
    let err_slot: Arc<Mutex<Option<BbsError>>> = Arc::new(Mutex::new(None));

    thread::scope(|scope| {
        for _ in 0..workers {
            let found = Arc::clone(&found);
            let slot = Arc::clone(&slot);
            let err_slot = Arc::clone(&err_slot);
            let entropy = Arc::clone(&entropy);
            scope.spawn(move || {
                match search_until_found(bits, entropy.as_ref(), &found) {
                    Ok(Some(r)) => {
                        let mut guard = slot.lock().expect("safe-prime result mutex poisoned");
                        if guard.is_none() {
                            *guard = Some(r);
                            found.store(true, Ordering::SeqCst);
                        }
                    }
                    Ok(None) => {
                        // Another worker published first; nothing to do.
                    }
                    Err(e) => {
                        let mut guard = err_slot.lock().expect("safe-prime error mutex poisoned");
                        if guard.is_none() {
                            *guard = Some(e);
                        }
                        found.store(true, Ordering::SeqCst);
                    }
                }
            });
        }
    });

    if let Some(e) = err_slot.lock().expect("safe-prime error mutex poisoned").take() {
        return Err(e);
    }
    slot.lock()
        .expect("safe-prime result mutex poisoned")
        .take()
        .ok_or(BbsError::InvalidBitWidth { requested: bits, minimum: MIN_PRIME_BITS })
}

/// One worker's search loop: tries candidates until it finds a safe
/// prime or observes that another worker already has.
fn search_until_found(
    bits: u32,
    entropy: &dyn EntropySource,
    found: &AtomicBool,
) -> Result<Option<BigUint>, BbsError> {
    if bits < MIN_PRIME_BITS {
        return Err(BbsError::InvalidBitWidth { requested: bits, minimum: MIN_PRIME_BITS });
    }

    let fast_sieve = PrimeSieve::fast();
    let mr = MillerRabin::new();
    let sample_bits = (bits - 2) as u64;
    let top_bit = (bits - 3) as u64;

    while !found.load(Ordering::SeqCst) {
        let mut cand = sample_below_pow2(entropy, sample_bits)?;
        cand.set_bit(0, true);
        cand.set_bit(1, true);
        cand.set_bit(top_bit, true);

        if fast_sieve.divides_any(&cand) {
            continue;
        }
        if !mr.is_probably_prime(&cand, entropy)? {
            continue;
        }

        let r = (&cand << 1) + BigUint::one();

        if fast_sieve.divides_any(&r) {
            continue;
        }
        if !mr.is_probably_prime(&r, entropy)? {
            continue;
        }
        if !fermat_check(&r, entropy)? {
            continue;
        }

        return Ok(Some(r));
    }
    Ok(None)
}
