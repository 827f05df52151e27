//! Randomness seam for token generation.

use crate::error::RandomError;

/// A source of unpredictable bytes.
///
/// Production must use a cryptographically strong source; deterministic
/// implementations are for tests only.
pub trait RandomSource: Send + Sync {
    fn fill(&self, buf: &mut [u8]) -> Result<(), RandomError>;

    /// Human-readable name of this source.
    fn name(&self) -> &str;
}

/// The operating system CSPRNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&self, buf: &mut [u8]) -> Result<(), RandomError> {
        getrandom::getrandom(buf).map_err(|e| RandomError::Unavailable(e.to_string()))
    }

    fn name(&self) -> &str {
        "os-random"
    }
}
