// ===========================================================================
// Fixed-width-integer helpers over a runtime-length bigint.
//
// A modulus width N is chosen at construction time rather than baked into
// a type, so a single binary can serve arbitrary bit-widths. This backs
// every width with `num_bigint::BigUint` and recovers the fixed-width
// flavor the rest of the crate wants — mask-to-width ("mod 2^N" on a value
// that's conceptually already N-or-fewer bits), trailing-zero count, and a
// fixed N/8-byte little-endian codec — as free functions over it.
// ===========================================================================

use num_bigint::BigUint;
use num_traits::Zero;

use crate::entropy::EntropySource;
use crate::error::BbsError;

/// Truncates `v` to its low `bits` bits — the "mod 2^bits" operation a
/// fixed-width register gives you for free via wraparound. Used by
/// `BarrettReducer` (the 2N-bit shift) and `PrimeSieve` (the reciprocal
/// identity).
pub fn mask_to_width(v: &BigUint, bits: u64) -> BigUint {
    let mask = (BigUint::from(1u32) << bits) - BigUint::from(1u32);
    v.clone() & mask
}

/// Counts trailing zero bits. Returns 0 for zero itself (callers that care
/// about that edge case — Gcd's double-zero short circuit — check for it
/// separately).
pub fn ctz(v: &BigUint) -> u64 {
    if v.is_zero() {
        return 0;
    }
    let mut n = v.clone();
    let mut count = 0u64;
    // BigUint has no native trailing_zeros; walk bytes first to skip whole
    // zero bytes quickly, then finish the remaining byte bit by bit.
    let bytes = n.to_bytes_le();
    for byte in &bytes {
        if *byte == 0 {
            count += 8;
        } else {
            count += byte.trailing_zeros() as u64;
            return count;
        }
    }
    // Only reachable if `to_bytes_le` returned all zero bytes, which can't
    // happen for a non-zero BigUint, but keep `n` alive to satisfy the
    // borrow checker's view of the loop above without an unused warning.
    let _ = &mut n;
    count
}

/// Encodes `v` as exactly `byte_len` little-endian bytes. Panics if `v`
/// doesn't fit — callers are expected to have already bounded `v` to the
/// declared width.
pub fn to_bytes_le_fixed(v: &BigUint, byte_len: usize) -> Vec<u8> {
    let mut bytes = v.to_bytes_le();
    assert!(
        bytes.len() <= byte_len,
        "value does not fit in {byte_len} bytes"
    );
    bytes.resize(byte_len, 0);
    bytes
}

/// Decodes a little-endian byte slice into a `BigUint`.
pub fn from_bytes_le(bytes: &[u8]) -> BigUint {
    BigUint::from_bytes_le(bytes)
}

/// Draws a uniformly random value in `[0, 2^bits)` from `entropy`.
pub fn sample_below_pow2(entropy: &dyn EntropySource, bits: u64) -> Result<BigUint, BbsError> {
    let byte_len = ((bits + 7) / 8) as usize;
    let mut buf = vec![0u8; byte_len.max(1)];
    entropy.fill(&mut buf)?;
    let mut v = from_bytes_le(&buf);
    // If bits isn't a multiple of 8, mask off the excess high bits of the
    // top byte so the result is uniform over exactly [0, 2^bits).
    v = mask_to_width(&v, bits);
    Ok(v)
}

/// Draws a value uniformly in `[lo, hi)` by rejection sampling over the
/// smallest power-of-two superset of the range. Used for Miller-Rabin's
/// witness sampling and SafePrimeGen's coprimality rejection.
pub fn sample_range(
    entropy: &dyn EntropySource,
    lo: &BigUint,
    hi: &BigUint,
) -> Result<BigUint, BbsError> {
    assert!(lo < hi, "sample_range requires lo < hi");
    let span = hi - lo;
    let bits = span.bits();
    loop {
        let candidate = sample_below_pow2(entropy, bits)?;
        if candidate < span {
            return Ok(lo + candidate);
        }
    }
}
