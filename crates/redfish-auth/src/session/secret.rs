//! Random source for session identifiers and signing secrets.

use std::sync::{Mutex, PoisonError};

use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

/// Owned random source handed to the session manager.
///
/// Production code uses [`SecretSource::from_entropy`]; tests can use
/// [`SecretSource::seeded`] for reproducible ids and secrets.
pub struct SecretSource {
    rng: Mutex<StdRng>,
}

impl SecretSource {
    /// Seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic source.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// A secret of `len` characters from `[A-Za-z0-9]`.
    pub fn generate_secret(&self, len: usize) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        (&mut *rng)
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }

    /// A random (version 4) session identifier.
    pub fn session_id(&self) -> Uuid {
        let mut bytes = [0u8; 16];
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .fill(&mut bytes);
        uuid::Builder::from_random_bytes(bytes).into_uuid()
    }
}

impl Default for SecretSource {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl std::fmt::Debug for SecretSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretSource").finish_non_exhaustive()
    }
}
