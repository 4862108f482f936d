// ===========================================================================
// Centralized error handling for the BBS generator core.
//
// Every module uses this type instead of panic!/assert!/unwrap() on
// recoverable paths. The caller (CLI, a library consumer) receives an
// Err(...) and can respond without the process dying mid-computation.
// ===========================================================================

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum BbsError {
    /// The entropy source could not be read (e.g. `/dev/urandom` open/read
    /// failure surfaced through the OS-backed `OsEntropySource`).
    EntropyUnavailable(String),

    /// Requested modulus bit-width is too small to carve two distinct
    /// safe primes of roughly bits/2 each out of.
    InvalidBitWidth { requested: u32, minimum: u32 },

    /// Reserved for callers outside Rust's type system (e.g. an FFI layer)
    /// that can pass a negative seek position. The native `seek(i: u64)`
    /// entry point cannot produce this variant itself.
    InvalidSeek,

    /// A persisted state record failed its coherence check on load
    /// (e.g. `x` not in `(1, modulus)`, or `pos` couldn't be represented).
    StateCorrupt,

    /// Invalid hexadecimal payload in a persisted state field.
    HexParseError,

    /// A hex field in a persisted state record exceeded the allowed
    /// length — rejected before the costly BigUint parse, not after.
    HexFieldTooLong { actual: usize, maximum: usize },
}

impl fmt::Display for BbsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BbsError::EntropyUnavailable(msg) =>
                write!(f, "entropy source unavailable: {msg}"),
            BbsError::InvalidBitWidth { requested, minimum } =>
                write!(f, "bit width {requested} too small, minimum is {minimum}"),
            BbsError::InvalidSeek =>
                write!(f, "seek position must be non-negative"),
            BbsError::StateCorrupt =>
                write!(f, "persisted generator state failed its coherence check"),
            BbsError::HexParseError =>
                write!(f, "invalid hexadecimal field in persisted state"),
            BbsError::HexFieldTooLong { actual, maximum } =>
                write!(f, "hex field too long: {actual} characters (maximum {maximum})"),
        }
    }
}

impl std::error::Error for BbsError {}
