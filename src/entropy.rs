// ===========================================================================
// EntropySource — opaque byte source used to seed prime search and the
// BBS state itself.
//
// Modeled as a trait object injected at construction rather than a bare
// global, so tests can substitute a deterministic fake without touching
// the OS. A process-wide default is still available for callers (notably
// the CLI) that don't want to thread a handle through: `init_secrandom`
// installs it once, `secrandom` reads from it.
// ===========================================================================

use std::sync::{Arc, OnceLock};

use rand_core::{OsRng, RngCore};

use crate::error::BbsError;

pub trait EntropySource: Send + Sync {
    /// Fills `buf` with cryptographically-strong random octets.
    fn fill(&self, buf: &mut [u8]) -> Result<(), BbsError>;
}

/// Production backend: the system's CSPRNG, via `rand_core::OsRng`.
///
/// `OsRng` reads `/dev/urandom` on UNIX and the platform crypto provider
/// on Windows; it is safe to read from multiple threads concurrently,
/// which is what lets `Arc<dyn EntropySource>` be handed to the parallel
/// safe-prime workers without additional synchronization.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropySource;

impl EntropySource for OsEntropySource {
    fn fill(&self, buf: &mut [u8]) -> Result<(), BbsError> {
        // OsRng::fill_bytes panics on a genuine OS RNG failure, which is
        // itself the correct behavior (a broken entropy source is not a
        // condition normal retry logic can recover from), but we still
        // route construction failures (the only other failure mode) through
        // a typed error rather than letting callers observe a bare panic.
        let mut rng = OsRng;
        rng.fill_bytes(buf);
        Ok(())
    }
}

static DEFAULT_ENTROPY: OnceLock<Arc<dyn EntropySource>> = OnceLock::new();

/// Installs the process-wide default entropy source, if one hasn't been
/// installed yet. Safe to call more than once; only the first call wins.
pub fn init_secrandom() {
    let _ = DEFAULT_ENTROPY.get_or_init(|| Arc::new(OsEntropySource));
}

/// Returns the process-wide default entropy source, installing
/// `OsEntropySource` on first use.
pub fn default_entropy() -> Arc<dyn EntropySource> {
    init_secrandom();
    DEFAULT_ENTROPY.get().expect("init_secrandom always populates the cell").clone()
}

/// Fills `buf` from the process-wide default entropy source.
pub fn secrandom(buf: &mut [u8]) -> Result<(), BbsError> {
    default_entropy().fill(buf)
}

/// A deterministic entropy source for tests: replays a fixed byte
/// sequence, wrapping around if more bytes are requested than it holds.
/// Never use outside `#[cfg(test)]` — it provides no actual entropy.
#[cfg(test)]
pub struct FixedEntropySource {
    bytes: Vec<u8>,
}

#[cfg(test)]
impl FixedEntropySource {
    pub fn new(bytes: Vec<u8>) -> Self {
        assert!(!bytes.is_empty(), "FixedEntropySource needs at least one byte");
        FixedEntropySource { bytes }
    }

    /// A source seeded from a simple counter stream — enough to drive
    /// rejection-sampling loops without ever blocking on real I/O.
    pub fn counting() -> Self {
        FixedEntropySource::new((0u8..=255).cycle().take(4096).collect())
    }
}

#[cfg(test)]
impl EntropySource for FixedEntropySource {
    fn fill(&self, buf: &mut [u8]) -> Result<(), BbsError> {
        for (i, b) in buf.iter_mut().enumerate() {
            *b = self.bytes[i % self.bytes.len()];
        }
        Ok(())
    }
}
