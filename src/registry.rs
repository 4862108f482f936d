// ===========================================================================
// GeneratorRegistry — thread-safe holder for a running BbsGenerator.
//
// Wraps a generator in Arc<RwLock<Option<BbsGenerator>>> so multiple
// handles can share one running stream. Reads (position, modulus, whether
// a generator is loaded) take a shared lock; advancing the stream borrows
// the generator mutably through a closure so its internal state never has
// to be cloned out of the registry.
// ===========================================================================

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use num_bigint::BigUint;

use crate::bbs::BbsGenerator;

#[derive(Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// No generator has been loaded into the registry yet.
    NoGenerator,
    /// The lock was poisoned by a panicking thread mid-access.
    LockPoisoned,
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::NoGenerator => write!(f, "no generator loaded in the registry"),
            RegistryError::LockPoisoned => write!(f, "registry lock poisoned"),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Clonable at the cost of an atomic increment (Arc), so every worker
/// thread that wants to pull bits from the same stream can hold its own
/// handle.
#[derive(Clone)]
pub struct GeneratorRegistry {
    inner: Arc<RwLock<Option<BbsGenerator>>>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        GeneratorRegistry { inner: Arc::new(RwLock::new(None)) }
    }

    pub fn with_generator(gen: BbsGenerator) -> Self {
        GeneratorRegistry { inner: Arc::new(RwLock::new(Some(gen))) }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Option<BbsGenerator>>, RegistryError> {
        self.inner.read().map_err(|_| RegistryError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Option<BbsGenerator>>, RegistryError> {
        self.inner.write().map_err(|_| RegistryError::LockPoisoned)
    }

    /// Loads (or replaces) the generator. Dropping the previous one
    /// zeroizes its retained factors, if any.
    pub fn set_generator(&self, gen: BbsGenerator) -> Result<(), RegistryError> {
        *self.write()? = Some(gen);
        Ok(())
    }

    pub fn clear(&self) -> Result<(), RegistryError> {
        *self.write()? = None;
        Ok(())
    }

    pub fn has_generator(&self) -> bool {
        self.read().ok().map(|g| g.is_some()).unwrap_or(false)
    }

    pub fn position(&self) -> Result<u64, RegistryError> {
        let guard = self.read()?;
        guard.as_ref().map(|g| g.pos()).ok_or(RegistryError::NoGenerator)
    }

    pub fn modulus(&self) -> Result<BigUint, RegistryError> {
        let guard = self.read()?;
        guard.as_ref().map(|g| g.modulus().clone()).ok_or(RegistryError::NoGenerator)
    }

    /// Runs `f` with shared read access to the generator, without
    /// advancing it. Useful for inspecting `x`/`pos` without a clone.
    pub fn with_generator<F, T>(&self, f: F) -> Result<T, RegistryError>
    where
        F: FnOnce(&BbsGenerator) -> T,
    {
        let guard = self.read()?;
        guard.as_ref().map(f).ok_or(RegistryError::NoGenerator)
    }

    /// Runs `f` with exclusive mutable access — the path `next_bit`,
    /// `next_bytes`, and `seek` go through, since all three advance the
    /// shared state. The generator's internal BigUints never leave the
    /// registry except through whatever `f` chooses to return.
    pub fn with_generator_mut<F, T>(&self, f: F) -> Result<T, RegistryError>
    where
        F: FnOnce(&mut BbsGenerator) -> T,
    {
        let mut guard = self.write()?;
        guard.as_mut().map(f).ok_or(RegistryError::NoGenerator)
    }

    pub fn next_bytes(&self, n: usize) -> Result<Vec<u8>, RegistryError> {
        self.with_generator_mut(|g| g.next_byte_vec(n))
    }

    pub fn seek(&self, i: u64) -> Result<(), RegistryError> {
        self.with_generator_mut(|g| g.seek(i))
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
