// Module declarations, in dependency order.
pub mod error;
pub mod entropy;
pub mod bigint;
pub mod barrett;
pub mod sieve;
pub mod gcd;
pub mod miller_rabin;
pub mod safe_prime;
pub mod bbs;
pub mod persist;
pub mod registry;

pub use bbs::{verify_coprime, BbsGenerator};
pub use entropy::{default_entropy, init_secrandom, secrandom, EntropySource, OsEntropySource};
pub use error::BbsError;
pub use persist::{load_state, save_state, BbsStateJson};
pub use registry::{GeneratorRegistry, RegistryError};
pub use safe_prime::{generate_one, generate_pair, MIN_PRIME_BITS};
